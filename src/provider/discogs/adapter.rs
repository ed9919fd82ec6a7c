//! Adapter layer: Convert Discogs DTOs to canonical records
//!
//! This is the ONLY place where Discogs DTO types are converted to canonical
//! types. Record ids are composite ids built from the configured provider
//! name, so the same code serves any name the adapter is registered under.

use super::dto;
use crate::model::{Album, AlbumArtist, Artist, CanonicalRecord, ImageRef, Label, Track};
use crate::provider::{ProviderError, non_empty, parse_year, provider_ids, record_id};

/// Convert artist search hits.
pub fn search_artists(
    provider: &str,
    response: dto::SearchResponse,
) -> Result<Vec<CanonicalRecord>, ProviderError> {
    response
        .results
        .into_iter()
        .map(|hit| {
            let native_id = hit.id.to_string();
            let images = thumbnail(&hit);
            Ok(CanonicalRecord::Artist(Artist {
                id: record_id(provider, &native_id)?,
                artist_name: hit.title,
                overview: None,
                images,
                albums: None,
                provider_ids: provider_ids(provider, &native_id),
            }))
        })
        .collect()
}

/// Convert master search hits. Titles come back as "Artist - Album".
pub fn search_albums(
    provider: &str,
    response: dto::SearchResponse,
) -> Result<Vec<CanonicalRecord>, ProviderError> {
    response
        .results
        .into_iter()
        .map(|hit| {
            let native_id = hit.id.to_string();
            let (artist_name, album_name) = split_title(&hit.title);
            Ok(CanonicalRecord::Album(Album {
                id: record_id(provider, &native_id)?,
                album_name,
                // Master search hits name the artist without identifying it
                artist: artist_name.map(|name| AlbumArtist {
                    id: None,
                    artist_name: name,
                    artist_url: None,
                }),
                year: parse_year(hit.year.as_deref()),
                genres: (!hit.genre.is_empty()).then(|| hit.genre.clone()),
                overview: None,
                labels: None,
                images: thumbnail(&hit),
                tracks: None,
                provider_ids: provider_ids(provider, &native_id),
            }))
        })
        .collect()
}

/// Convert a full artist lookup.
pub fn to_artist(provider: &str, response: dto::ArtistResponse) -> Result<Artist, ProviderError> {
    let native_id = response.id.to_string();
    Ok(Artist {
        id: record_id(provider, &native_id)?,
        artist_name: response.name,
        overview: non_empty(response.profile.as_deref()),
        images: images(&response.images),
        albums: None,
        provider_ids: provider_ids(provider, &native_id),
    })
}

/// Convert a full release lookup.
///
/// A release without any credited artist can't be served as an album.
pub fn to_album(provider: &str, response: dto::ReleaseResponse) -> Result<Album, ProviderError> {
    let native_id = response.id.to_string();

    let credited = response.artists.first().ok_or_else(|| {
        ProviderError::invalid(format!("release {} has no credited artist", response.id))
    })?;
    let artist = AlbumArtist {
        id: Some(record_id(provider, &credited.id.to_string())?),
        artist_name: clean_artist_name(&credited.name),
        artist_url: credited.resource_url.clone(),
    };

    let labels: Vec<Label> = response
        .labels
        .iter()
        .map(|label| Label {
            name: label.name.clone(),
            catalog_number: non_empty(label.catno.as_deref()).filter(|c| c != "none"),
            provider_ids: label
                .id
                .map(|id| provider_ids(provider, &id.to_string()))
                .unwrap_or_default(),
        })
        .collect();

    let tracks = response
        .tracklist
        .iter()
        .filter(|entry| entry.entry_type.as_deref().unwrap_or("track") == "track")
        .filter(|entry| !entry.position.is_empty())
        .map(|entry| {
            let track_native = format!("{}:{}", response.id, entry.position);
            Ok(Track {
                id: record_id(provider, &track_native)?,
                title: entry.title.clone(),
                explicit: None,
                provider_ids: provider_ids(provider, &track_native),
            })
        })
        .collect::<Result<Vec<_>, ProviderError>>()?;

    Ok(Album {
        id: record_id(provider, &native_id)?,
        album_name: response.title,
        artist: Some(artist),
        year: response.year.filter(|y| *y > 0),
        genres: (!response.genres.is_empty()).then_some(response.genres),
        overview: non_empty(response.notes.as_deref()),
        labels: (!labels.is_empty()).then_some(labels),
        images: images(&response.images),
        tracks: (!tracks.is_empty()).then_some(tracks),
        provider_ids: provider_ids(provider, &native_id),
    })
}

fn thumbnail(hit: &dto::SearchResult) -> Option<Vec<ImageRef>> {
    let url = non_empty(hit.cover_image.as_deref()).or_else(|| non_empty(hit.thumb.as_deref()))?;
    Some(vec![ImageRef::Dimensions {
        url,
        height: None,
        width: None,
    }])
}

fn images(images: &[dto::Image]) -> Option<Vec<ImageRef>> {
    let refs: Vec<ImageRef> = images
        .iter()
        .filter(|img| !img.uri.is_empty())
        .map(|img| ImageRef::Dimensions {
            url: img.uri.clone(),
            height: img.height,
            width: img.width,
        })
        .collect();
    (!refs.is_empty()).then_some(refs)
}

/// Split "Artist - Title". Titles without the delimiter are album-only.
fn split_title(title: &str) -> (Option<String>, String) {
    match title.split_once(" - ") {
        Some((artist, album)) if !artist.trim().is_empty() && !album.trim().is_empty() => {
            (Some(clean_artist_name(artist)), album.trim().to_string())
        }
        _ => (None, title.trim().to_string()),
    }
}

/// Strip Discogs' numeric disambiguation suffix: "Nirvana (2)" → "Nirvana".
fn clean_artist_name(name: &str) -> String {
    let trimmed = name.trim();
    if let Some(open) = trimmed.rfind(" (")
        && let Some(digits) = trimmed[open + 2..].strip_suffix(')')
        && !digits.is_empty()
        && digits.chars().all(|c| c.is_ascii_digit())
    {
        return trimmed[..open].to_string();
    }
    trimmed.to_string()
}
