//! MusicBrainz API integration
//!
//! Serves artists, albums (releases) and tracks (recordings). Album searches
//! hit release groups; album lookups hit releases, which carry tracklists.
//!
//! API docs: https://musicbrainz.org/doc/MusicBrainz_API

mod adapter;
mod client;
pub mod dto;
pub mod xml_dto;

pub use adapter::{search_albums, search_artists, search_tracks, to_album, to_artist, to_track};
pub use client::{DEFAULT_BASE_URI, DEFAULT_MIN_INTERVAL, MusicBrainzClient};
