//! Adapter layer: Convert Last.fm DTOs to canonical records
//!
//! Last.fm keys everything by MusicBrainz id; the mbid is the native id.
//! Lookups echo the mbid back only sometimes, so lookup mappers take the
//! requested id as a fallback.

use super::dto;
use crate::model::{Album, AlbumArtist, AlbumRef, Artist, CanonicalRecord, ImageRef, Track};
use crate::provider::{ProviderError, non_empty, provider_ids, record_id};

/// Convert `artist.search` matches, dropping those without an mbid.
pub fn search_artists(
    provider: &str,
    response: dto::ArtistSearchResponse,
) -> Result<Vec<CanonicalRecord>, ProviderError> {
    let matches = response
        .results
        .artistmatches
        .into_option()
        .map(|m| m.artist.into_vec())
        .unwrap_or_default();

    matches
        .into_iter()
        .filter(|m| !m.mbid.is_empty())
        .map(|m| {
            Ok(CanonicalRecord::Artist(Artist {
                id: record_id(provider, &m.mbid)?,
                artist_name: m.name,
                overview: None,
                images: images(&m.image),
                albums: None,
                provider_ids: provider_ids(provider, &m.mbid),
            }))
        })
        .collect()
}

/// Convert `album.search` matches, dropping those without an mbid.
pub fn search_albums(
    provider: &str,
    response: dto::AlbumSearchResponse,
) -> Result<Vec<CanonicalRecord>, ProviderError> {
    let matches = response
        .results
        .albummatches
        .into_option()
        .map(|m| m.album.into_vec())
        .unwrap_or_default();

    matches
        .into_iter()
        .filter(|m| !m.mbid.is_empty())
        .map(|m| {
            Ok(CanonicalRecord::Album(Album {
                id: record_id(provider, &m.mbid)?,
                album_name: m.name,
                artist: credited_artist(&m.artist),
                year: None,
                genres: None,
                overview: None,
                labels: None,
                images: images(&m.image),
                tracks: None,
                provider_ids: provider_ids(provider, &m.mbid),
            }))
        })
        .collect()
}

/// Convert `track.search` matches, dropping those without an mbid.
pub fn search_tracks(
    provider: &str,
    response: dto::TrackSearchResponse,
) -> Result<Vec<CanonicalRecord>, ProviderError> {
    let matches = response
        .results
        .trackmatches
        .into_option()
        .map(|m| m.track.into_vec())
        .unwrap_or_default();

    matches
        .into_iter()
        .filter(|m| !m.mbid.is_empty())
        .map(|m| {
            Ok(CanonicalRecord::Track(Track {
                id: record_id(provider, &m.mbid)?,
                title: m.name,
                explicit: None,
                provider_ids: provider_ids(provider, &m.mbid),
            }))
        })
        .collect()
}

/// Convert `artist.getinfo` plus the artist's resolved albums.
pub fn to_artist(
    provider: &str,
    requested_id: &str,
    info: dto::ArtistInfo,
    albums: Vec<AlbumRef>,
) -> Result<Artist, ProviderError> {
    let native_id = native_or(&info.mbid, requested_id);
    Ok(Artist {
        id: record_id(provider, native_id)?,
        artist_name: info.name,
        overview: info.bio.as_ref().and_then(summary),
        images: images(&info.image),
        albums: (!albums.is_empty()).then_some(albums),
        provider_ids: provider_ids(provider, native_id),
    })
}

/// Convert `album.getinfo` into a full album record.
pub fn to_album(provider: &str, requested_id: &str, info: dto::AlbumInfo) -> Result<Album, ProviderError> {
    let native_id = native_or(&info.mbid, requested_id).to_string();
    let tracks = album_tracks(provider, &native_id, info.tracks)?;
    let genres: Vec<String> = info
        .tags
        .and_then(dto::MaybeEmpty::into_option)
        .map(|t| t.tag.into_vec().into_iter().map(|tag| tag.name).collect())
        .unwrap_or_default();

    Ok(Album {
        id: record_id(provider, &native_id)?,
        album_name: info.name,
        artist: credited_artist(&info.artist),
        year: None,
        genres: (!genres.is_empty()).then_some(genres),
        overview: info.wiki.as_ref().and_then(summary),
        labels: None,
        images: images(&info.image),
        tracks: (!tracks.is_empty()).then_some(tracks),
        provider_ids: provider_ids(provider, &native_id),
    })
}

/// Convert `album.getinfo` into an album embedded in an artist record.
///
/// Returns `None` for albums without an mbid or without a tracklist.
pub fn to_album_ref(provider: &str, info: dto::AlbumInfo) -> Result<Option<AlbumRef>, ProviderError> {
    if info.mbid.is_empty() {
        return Ok(None);
    }
    let tracks = album_tracks(provider, &info.mbid, info.tracks)?;
    if tracks.is_empty() {
        return Ok(None);
    }
    Ok(Some(AlbumRef {
        id: record_id(provider, &info.mbid)?,
        album_name: info.name,
        year: None,
        tracks,
    }))
}

/// Convert `track.getinfo`.
pub fn to_track(provider: &str, requested_id: &str, info: dto::TrackInfo) -> Result<Track, ProviderError> {
    let native_id = native_or(&info.mbid, requested_id);
    Ok(Track {
        id: record_id(provider, native_id)?,
        title: info.name,
        explicit: None,
        provider_ids: provider_ids(provider, native_id),
    })
}

/// Tracks without their own mbid get `<album mbid>:<position>`.
fn album_tracks(
    provider: &str,
    album_id: &str,
    tracks: Option<dto::MaybeEmpty<dto::AlbumTracks>>,
) -> Result<Vec<Track>, ProviderError> {
    let tracks = tracks
        .and_then(dto::MaybeEmpty::into_option)
        .map(|t| t.track.into_vec())
        .unwrap_or_default();

    tracks
        .into_iter()
        .enumerate()
        .map(|(index, track)| {
            let native_id = if track.mbid.is_empty() {
                format!("{album_id}:{}", index + 1)
            } else {
                track.mbid
            };
            Ok(Track {
                id: record_id(provider, &native_id)?,
                title: track.name,
                explicit: None,
                provider_ids: provider_ids(provider, &native_id),
            })
        })
        .collect()
}

fn native_or<'a>(mbid: &'a str, requested: &'a str) -> &'a str {
    if mbid.is_empty() { requested } else { mbid }
}

/// Last.fm only names the artist; there is no id to carry.
fn credited_artist(name: &str) -> Option<AlbumArtist> {
    non_empty(Some(name)).map(|artist_name| AlbumArtist {
        id: None,
        artist_name,
        artist_url: None,
    })
}

fn images(images: &[dto::Image]) -> Option<Vec<ImageRef>> {
    let refs: Vec<ImageRef> = images
        .iter()
        .filter(|img| !img.url.is_empty())
        .map(|img| ImageRef::Sized {
            url: img.url.clone(),
            size: img.size.clone(),
        })
        .collect();
    (!refs.is_empty()).then_some(refs)
}

/// Summary text without the trailing "Read more on Last.fm" link.
fn summary(wiki: &dto::Wiki) -> Option<String> {
    let text = wiki.summary.as_deref()?;
    let text = match text.find("<a href") {
        Some(cut) => &text[..cut],
        None => text,
    };
    non_empty(Some(text))
}
