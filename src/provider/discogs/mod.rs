//! Discogs API integration
//!
//! Serves artist and album (release) records. Discogs has no standalone
//! track lookup, so track searches come back empty and track gets are
//! unsupported.
//!
//! API docs: https://www.discogs.com/developers

mod adapter;
mod client;
pub mod dto;

pub use adapter::{search_albums, search_artists, to_album, to_artist};
pub use client::{DEFAULT_BASE_URI, DiscogsClient};
