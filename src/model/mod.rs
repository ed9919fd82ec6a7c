//! Canonical data models served by the cache.
//!
//! Every provider adapter maps its own response shape into these types.
//! Field names serialize in the public PascalCase form (`ArtistName`,
//! `ProviderIds`, ...) so a record looks the same no matter which provider
//! produced it.
//!
//! # Entities
//!
//! - [`Artist`] - an artist, optionally with embedded albums and their tracks
//! - [`Album`] - a release with its credited artist, labels and tracklist
//! - [`Track`] - a single recording
//!
//! [`CachedRecord`] wraps any of these with the store's primary key and the
//! time it was last refreshed; [`CachedSearch`] does the same for the result
//! list of one search.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Provider name → provider-native id.
pub type ProviderIds = BTreeMap<String, String>;

/// The fixed set of entity kinds the cache understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Artist,
    Album,
    Track,
}

impl EntityKind {
    /// All kinds, in a stable order.
    pub const ALL: [EntityKind; 3] = [EntityKind::Artist, EntityKind::Album, EntityKind::Track];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Artist => "artist",
            EntityKind::Album => "album",
            EntityKind::Track => "track",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "artist" | "artists" => Ok(EntityKind::Artist),
            "album" | "albums" => Ok(EntityKind::Album),
            "track" | "tracks" => Ok(EntityKind::Track),
            other => Err(format!("unknown entity kind: {other}")),
        }
    }
}

/// A reference to an image hosted by a provider.
///
/// Providers either report pixel dimensions or a named size bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImageRef {
    Sized {
        #[serde(rename = "Url")]
        url: String,
        #[serde(rename = "Size")]
        size: String,
    },
    Dimensions {
        #[serde(rename = "Url")]
        url: String,
        #[serde(rename = "Height", default, skip_serializing_if = "Option::is_none")]
        height: Option<u32>,
        #[serde(rename = "Width", default, skip_serializing_if = "Option::is_none")]
        width: Option<u32>,
    },
}

impl ImageRef {
    pub fn url(&self) -> &str {
        match self {
            ImageRef::Sized { url, .. } | ImageRef::Dimensions { url, .. } => url,
        }
    }
}

/// An artist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Artist {
    pub id: String,
    pub artist_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<ImageRef>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub albums: Option<Vec<AlbumRef>>,
    #[serde(default)]
    pub provider_ids: ProviderIds,
}

/// An album embedded in an [`Artist`] record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AlbumRef {
    pub id: String,
    pub album_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default)]
    pub tracks: Vec<Track>,
}

/// The artist credited on an [`Album`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AlbumArtist {
    /// Composite id, when the provider identifies the artist
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub artist_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist_url: Option<String>,
}

/// A record label credit on an [`Album`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Label {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_number: Option<String>,
    #[serde(default)]
    pub provider_ids: ProviderIds,
}

/// An album.
///
/// Search results may omit the credited artist; full records always carry it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Album {
    pub id: String,
    pub album_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<AlbumArtist>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genres: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<Label>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<ImageRef>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracks: Option<Vec<Track>>,
    #[serde(default)]
    pub provider_ids: ProviderIds,
}

/// A track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Track {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explicit: Option<bool>,
    #[serde(default, skip_serializing_if = "ProviderIds::is_empty")]
    pub provider_ids: ProviderIds,
}

/// One canonical record of any kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CanonicalRecord {
    Artist(Artist),
    Album(Album),
    Track(Track),
}

impl CanonicalRecord {
    pub fn kind(&self) -> EntityKind {
        match self {
            CanonicalRecord::Artist(_) => EntityKind::Artist,
            CanonicalRecord::Album(_) => EntityKind::Album,
            CanonicalRecord::Track(_) => EntityKind::Track,
        }
    }

    /// The composite id of the record.
    pub fn id(&self) -> &str {
        match self {
            CanonicalRecord::Artist(a) => &a.id,
            CanonicalRecord::Album(a) => &a.id,
            CanonicalRecord::Track(t) => &t.id,
        }
    }

    pub fn provider_ids(&self) -> &ProviderIds {
        match self {
            CanonicalRecord::Artist(a) => &a.provider_ids,
            CanonicalRecord::Album(a) => &a.provider_ids,
            CanonicalRecord::Track(t) => &t.provider_ids,
        }
    }

    /// Serialize to a JSON tree (used for validation and storage).
    pub fn to_value(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }

    /// Rebuild a record of a known kind from its JSON tree.
    pub fn from_value(kind: EntityKind, value: serde_json::Value) -> serde_json::Result<Self> {
        Ok(match kind {
            EntityKind::Artist => CanonicalRecord::Artist(serde_json::from_value(value)?),
            EntityKind::Album => CanonicalRecord::Album(serde_json::from_value(value)?),
            EntityKind::Track => CanonicalRecord::Track(serde_json::from_value(value)?),
        })
    }
}

impl From<Artist> for CanonicalRecord {
    fn from(artist: Artist) -> Self {
        CanonicalRecord::Artist(artist)
    }
}

impl From<Album> for CanonicalRecord {
    fn from(album: Album) -> Self {
        CanonicalRecord::Album(album)
    }
}

impl From<Track> for CanonicalRecord {
    fn from(track: Track) -> Self {
        CanonicalRecord::Track(track)
    }
}

/// A canonical record as held by the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CachedRecord {
    /// Store primary key (stable across refreshes)
    #[serde(skip)]
    pub key: i64,
    #[serde(flatten)]
    pub record: CanonicalRecord,
    /// When the record was last fetched from a provider
    #[serde(rename = "LastUpdate")]
    pub last_update: DateTime<Utc>,
}

impl CachedRecord {
    pub fn kind(&self) -> EntityKind {
        self.record.kind()
    }

    /// Age of the record relative to `now`.
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now.signed_duration_since(self.last_update)
    }
}

/// Search results as held by the store, keyed by kind and query.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedSearch {
    pub results: Vec<CanonicalRecord>,
    pub last_update: DateTime<Utc>,
}

impl CachedSearch {
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now.signed_duration_since(self.last_update)
    }
}
