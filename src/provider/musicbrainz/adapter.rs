//! Adapter layer: Convert MusicBrainz DTOs to canonical records
//!
//! This is the ONLY place where MusicBrainz DTO types are converted to
//! canonical types. If MusicBrainz changes its response format, only this
//! file and dto.rs need to change.

use super::dto;
use crate::model::{Album, AlbumArtist, Artist, CanonicalRecord, Label, Track};
use crate::provider::{ProviderError, non_empty, parse_year, provider_ids, record_id};

/// Public artist page, used as the credited artist's URL
const ARTIST_URL: &str = "https://musicbrainz.org/artist/";

/// Genres kept per album
const MAX_GENRES: usize = 5;

pub fn search_artists(
    provider: &str,
    response: dto::ArtistSearchResponse,
) -> Result<Vec<CanonicalRecord>, ProviderError> {
    response
        .artists
        .into_iter()
        .map(|artist| to_artist(provider, artist).map(CanonicalRecord::from))
        .collect()
}

/// Release groups stand in for albums in search results.
pub fn search_albums(
    provider: &str,
    response: dto::ReleaseGroupSearchResponse,
) -> Result<Vec<CanonicalRecord>, ProviderError> {
    response
        .release_groups
        .into_iter()
        .map(|group| {
            Ok(CanonicalRecord::Album(Album {
                id: record_id(provider, &group.id)?,
                album_name: group.title,
                artist: credited_artist(provider, &group.artist_credit)?,
                year: parse_year(group.first_release_date.as_deref()),
                genres: None,
                overview: None,
                labels: None,
                images: None,
                tracks: None,
                provider_ids: provider_ids(provider, &group.id),
            }))
        })
        .collect()
}

pub fn search_tracks(
    provider: &str,
    response: dto::RecordingSearchResponse,
) -> Result<Vec<CanonicalRecord>, ProviderError> {
    response
        .recordings
        .into_iter()
        .map(|recording| to_track(provider, recording).map(CanonicalRecord::from))
        .collect()
}

/// Artists carry no albums; the disambiguation comment becomes the overview.
pub fn to_artist(provider: &str, artist: dto::Artist) -> Result<Artist, ProviderError> {
    Ok(Artist {
        id: record_id(provider, &artist.id)?,
        artist_name: artist.name,
        overview: non_empty(artist.disambiguation.as_deref()),
        images: None,
        albums: None,
        provider_ids: provider_ids(provider, &artist.id),
    })
}

/// Convert a release lookup.
///
/// Track ids are recording ids, so every track can be fetched on its own.
pub fn to_album(provider: &str, release: dto::Release) -> Result<Album, ProviderError> {
    let artist = credited_artist(provider, &release.artist_credit)?
        .ok_or_else(|| ProviderError::invalid(format!("release {} has no artist credit", release.id)))?;

    let labels: Vec<Label> = release
        .label_info
        .iter()
        .filter_map(|info| {
            let label = info.label.as_ref()?;
            Some(Label {
                name: label.name.clone(),
                catalog_number: non_empty(info.catalog_number.as_deref()),
                provider_ids: provider_ids(provider, &label.id),
            })
        })
        .collect();

    let tracks = release
        .media
        .iter()
        .flat_map(|medium| medium.tracks.iter())
        .map(|track| {
            let native_id = track.recording.as_ref().map_or(track.id.as_str(), |r| r.id.as_str());
            Ok(Track {
                id: record_id(provider, native_id)?,
                title: track.title.clone(),
                explicit: None,
                provider_ids: provider_ids(provider, native_id),
            })
        })
        .collect::<Result<Vec<_>, ProviderError>>()?;

    let genres = extract_genres(&release.genres);

    Ok(Album {
        id: record_id(provider, &release.id)?,
        album_name: release.title,
        artist: Some(artist),
        year: parse_year(release.date.as_deref()),
        genres: (!genres.is_empty()).then_some(genres),
        overview: non_empty(release.disambiguation.as_deref()),
        labels: (!labels.is_empty()).then_some(labels),
        images: None,
        tracks: (!tracks.is_empty()).then_some(tracks),
        provider_ids: provider_ids(provider, &release.id),
    })
}

pub fn to_track(provider: &str, recording: dto::Recording) -> Result<Track, ProviderError> {
    Ok(Track {
        id: record_id(provider, &recording.id)?,
        title: recording.title,
        explicit: None,
        provider_ids: provider_ids(provider, &recording.id),
    })
}

/// The first credited artist, named with the full credit string.
fn credited_artist(provider: &str, credits: &[dto::ArtistCredit]) -> Result<Option<AlbumArtist>, ProviderError> {
    let (Some(first), Some(name)) = (credits.first(), build_artist_string(credits)) else {
        return Ok(None);
    };
    Ok(Some(AlbumArtist {
        id: Some(record_id(provider, &first.artist.id)?),
        artist_name: name,
        artist_url: Some(format!("{ARTIST_URL}{}", first.artist.id)),
    }))
}

/// Build a combined artist string from artist credits
fn build_artist_string(credits: &[dto::ArtistCredit]) -> Option<String> {
    if credits.is_empty() {
        return None;
    }

    let mut result = String::new();
    for credit in credits {
        // Credited name wins over the official one
        let name = credit.name.as_ref().unwrap_or(&credit.artist.name);
        result.push_str(name);
        if let Some(ref join) = credit.joinphrase {
            result.push_str(join);
        }
    }

    Some(result)
}

/// Most-voted genres first
fn extract_genres(genres: &[dto::Genre]) -> Vec<String> {
    let mut sorted: Vec<_> = genres.iter().collect();
    sorted.sort_by(|a, b| b.count.cmp(&a.count));
    sorted.into_iter().take(MAX_GENRES).map(|g| g.name.clone()).collect()
}
