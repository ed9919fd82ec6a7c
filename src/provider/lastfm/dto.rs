//! Last.fm API Data Transfer Objects
//!
//! Last.fm's JSON is a mechanical translation of its XML API, which shows:
//! - a list with one entry comes back as a bare object ([`OneOrMany`])
//! - empty containers come back as `""` instead of `{}` ([`MaybeEmpty`])
//! - text nodes live under `"#text"` and attributes under `"@attr"`
//!
//! Failures arrive with HTTP 200 and an [`ApiError`] body.
//! DO NOT use these types outside the lastfm module - convert to canonical types.

use serde::{Deserialize, Serialize};

pub use crate::provider::xml::OneOrMany;

/// `{"error": 6, "message": "The artist you supplied could not be found"}`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiError {
    pub error: i64,
    pub message: String,
}

/// A container that is `""` when empty
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum MaybeEmpty<T> {
    Present(T),
    Empty(String),
}

impl<T> MaybeEmpty<T> {
    pub fn into_option(self) -> Option<T> {
        match self {
            MaybeEmpty::Present(value) => Some(value),
            MaybeEmpty::Empty(_) => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Image {
    #[serde(rename = "#text", default)]
    pub url: String,
    /// "small", "medium", "large", "extralarge", "mega" or ""
    #[serde(default)]
    pub size: String,
}

// ---- search ----

/// `artist.search`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArtistSearchResponse {
    pub results: ArtistSearchResults,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArtistSearchResults {
    pub artistmatches: MaybeEmpty<ArtistMatches>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArtistMatches {
    #[serde(default)]
    pub artist: OneOrMany<ArtistMatch>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArtistMatch {
    pub name: String,
    #[serde(default)]
    pub mbid: String,
    pub url: Option<String>,
    #[serde(default)]
    pub image: Vec<Image>,
}

/// `album.search`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AlbumSearchResponse {
    pub results: AlbumSearchResults,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AlbumSearchResults {
    pub albummatches: MaybeEmpty<AlbumMatches>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AlbumMatches {
    #[serde(default)]
    pub album: OneOrMany<AlbumMatch>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AlbumMatch {
    pub name: String,
    /// Artist name (not an object in search results)
    pub artist: String,
    #[serde(default)]
    pub mbid: String,
    #[serde(default)]
    pub image: Vec<Image>,
}

/// `track.search`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TrackSearchResponse {
    pub results: TrackSearchResults,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TrackSearchResults {
    pub trackmatches: MaybeEmpty<TrackMatches>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TrackMatches {
    #[serde(default)]
    pub track: OneOrMany<TrackMatch>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TrackMatch {
    pub name: String,
    pub artist: String,
    #[serde(default)]
    pub mbid: String,
}

// ---- lookups ----

/// `artist.getinfo`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArtistInfoResponse {
    pub artist: ArtistInfo,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArtistInfo {
    pub name: String,
    #[serde(default)]
    pub mbid: String,
    pub url: Option<String>,
    #[serde(default)]
    pub image: Vec<Image>,
    pub bio: Option<Wiki>,
}

/// Biography or album wiki. `summary` ends with a "Read more" link.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Wiki {
    pub summary: Option<String>,
    pub content: Option<String>,
}

/// `artist.gettopalbums`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TopAlbumsResponse {
    pub topalbums: TopAlbums,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TopAlbums {
    #[serde(default)]
    pub album: OneOrMany<TopAlbum>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TopAlbum {
    pub name: String,
    #[serde(default)]
    pub mbid: String,
}

/// `album.getinfo`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AlbumInfoResponse {
    pub album: AlbumInfo,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AlbumInfo {
    pub name: String,
    pub artist: String,
    #[serde(default)]
    pub mbid: String,
    pub url: Option<String>,
    #[serde(default)]
    pub image: Vec<Image>,
    pub tracks: Option<MaybeEmpty<AlbumTracks>>,
    pub tags: Option<MaybeEmpty<Tags>>,
    pub wiki: Option<Wiki>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AlbumTracks {
    #[serde(default)]
    pub track: OneOrMany<AlbumTrack>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AlbumTrack {
    pub name: String,
    #[serde(default)]
    pub mbid: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Tags {
    #[serde(default)]
    pub tag: OneOrMany<Tag>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Tag {
    pub name: String,
}

/// `track.getinfo`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TrackInfoResponse {
    pub track: TrackInfo,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TrackInfo {
    pub name: String,
    #[serde(default)]
    pub mbid: String,
    pub url: Option<String>,
}
