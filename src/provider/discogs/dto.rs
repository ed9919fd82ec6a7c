//! Discogs API Data Transfer Objects
//!
//! These types match what the Discogs API returns. Only fields the adapter
//! reads are declared; serde ignores the rest.
//! DO NOT use these types outside the discogs module - convert to canonical types.
//!
//! Example search response:
//! ```json
//! {
//!   "pagination": {"page": 1, "pages": 3, "per_page": 50, "items": 120},
//!   "results": [{
//!     "id": 125246,
//!     "type": "artist",
//!     "title": "Nirvana",
//!     "thumb": "https://i.discogs.com/...",
//!     "resource_url": "https://api.discogs.com/artists/125246"
//!   }]
//! }
//! ```

use serde::{Deserialize, Serialize};

/// `GET database/search`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<SearchResult>,
}

/// One database search hit (artist, master or release)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchResult {
    pub id: u64,
    /// Artist name, or "Artist - Title" for masters and releases
    pub title: String,
    pub thumb: Option<String>,
    pub cover_image: Option<String>,
    /// Release year as a string ("1991")
    pub year: Option<String>,
    #[serde(default)]
    pub genre: Vec<String>,
    #[serde(default)]
    pub label: Vec<String>,
    pub resource_url: Option<String>,
}

/// `GET artists/{id}`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArtistResponse {
    pub id: u64,
    pub name: String,
    pub profile: Option<String>,
    #[serde(default)]
    pub images: Vec<Image>,
    pub uri: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Image {
    pub uri: String,
    pub height: Option<u32>,
    pub width: Option<u32>,
    /// "primary" or "secondary"
    #[serde(rename = "type")]
    pub image_type: Option<String>,
}

/// `GET releases/{id}`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReleaseResponse {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub artists: Vec<ReleaseArtist>,
    /// 0 when unknown
    pub year: Option<i32>,
    #[serde(default)]
    pub genres: Vec<String>,
    pub notes: Option<String>,
    #[serde(default)]
    pub labels: Vec<LabelCredit>,
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub tracklist: Vec<TracklistEntry>,
    pub uri: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReleaseArtist {
    pub id: u64,
    pub name: String,
    pub resource_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LabelCredit {
    pub id: Option<u64>,
    pub name: String,
    pub catno: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TracklistEntry {
    /// "A1", "2", ... Empty for headings
    #[serde(default)]
    pub position: String,
    pub title: String,
    /// "track", "heading" or "index"
    #[serde(rename = "type_")]
    pub entry_type: Option<String>,
}
