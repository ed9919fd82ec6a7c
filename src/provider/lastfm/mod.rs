//! Last.fm API integration
//!
//! Serves artists, albums and tracks keyed by MusicBrainz ids. Results
//! without an mbid are dropped: they can't be looked up again by id.
//!
//! API docs: https://www.last.fm/api

mod adapter;
mod client;
pub mod dto;

pub use adapter::{search_albums, search_artists, search_tracks, to_album, to_album_ref, to_artist, to_track};
pub use client::{DEFAULT_BASE_URI, LastFmClient};
