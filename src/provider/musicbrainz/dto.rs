//! Response shapes of the MusicBrainz web service (`fmt=json`, kebab-case keys).
//!
//! Only the adapter reads these; everything else sees canonical records.
//! Docs: https://musicbrainz.org/doc/MusicBrainz_API

use serde::{Deserialize, Serialize};

/// `GET artist?query=`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArtistSearchResponse {
    #[serde(default)]
    pub artists: Vec<Artist>,
}

/// `GET release-group?query=`
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ReleaseGroupSearchResponse {
    #[serde(default)]
    pub release_groups: Vec<ReleaseGroup>,
}

/// `GET recording?query=`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RecordingSearchResponse {
    #[serde(default)]
    pub recordings: Vec<Recording>,
}

/// Artist (search hit or `GET artist/{id}`)
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Artist {
    /// MusicBrainz artist ID
    pub id: String,
    pub name: String,
    pub sort_name: Option<String>,
    /// Shown as the artist overview
    pub disambiguation: Option<String>,
    /// Person, Group, ...
    #[serde(rename = "type")]
    pub artist_type: Option<String>,
    /// Search relevance, 0-100
    pub score: Option<u32>,
}

/// One entry of an `artist-credit` list
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArtistCredit {
    pub artist: CreditedArtist,
    /// Name as printed on the release
    pub name: Option<String>,
    /// Text placed after this credit, e.g. " & "
    pub joinphrase: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CreditedArtist {
    pub id: String,
    pub name: String,
}

/// Release group, the album-level search hit
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ReleaseGroup {
    pub id: String,
    pub title: String,
    /// Album, Single, EP, ...
    pub primary_type: Option<String>,
    pub first_release_date: Option<String>,
    #[serde(default)]
    pub artist_credit: Vec<ArtistCredit>,
}

/// `GET release/{id}?inc=artist-credits+labels+recordings+genres`
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Release {
    pub id: String,
    pub title: String,
    /// YYYY, YYYY-MM, or YYYY-MM-DD
    pub date: Option<String>,
    pub disambiguation: Option<String>,
    #[serde(default)]
    pub artist_credit: Vec<ArtistCredit>,
    #[serde(default)]
    pub label_info: Vec<LabelInfo>,
    /// Discs
    #[serde(default)]
    pub media: Vec<Medium>,
    #[serde(default)]
    pub genres: Vec<Genre>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct LabelInfo {
    pub catalog_number: Option<String>,
    pub label: Option<Label>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Label {
    pub id: String,
    pub name: String,
}

/// One disc, tape or side
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Medium {
    pub position: Option<u32>,
    pub format: Option<String>,
    #[serde(default)]
    pub tracks: Vec<Track>,
}

/// Track on a medium
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Track {
    /// Track (not recording) ID
    pub id: String,
    pub title: String,
    pub recording: Option<RecordingRef>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RecordingRef {
    pub id: String,
    pub video: Option<bool>,
}

/// Recording (search hit or `GET recording/{id}?inc=artist-credits`)
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Recording {
    pub id: String,
    pub title: String,
    /// Milliseconds
    pub length: Option<u64>,
    pub disambiguation: Option<String>,
    #[serde(default)]
    pub artist_credit: Vec<ArtistCredit>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Genre {
    pub name: String,
    #[serde(default)]
    pub count: u32,
}
