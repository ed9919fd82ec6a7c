//! MusicBrainz XML responses (`ws/2` without `fmt=json`).
//!
//! These read the tree built by [`crate::provider::xml::to_tree`]: ids and
//! other attributes sit under `@` keys, numbers arrive as text, and every
//! `*-list` element wraps a child that may occur once or many times. Each
//! shape converts into its JSON counterpart in [`super::dto`], so one adapter
//! serves both formats.

use serde::Deserialize;

use super::dto;
use crate::provider::xml::{OneOrMany, Text};

/// The `<metadata>` document root
#[derive(Debug, Deserialize)]
pub struct Document<T> {
    pub metadata: T,
}

#[derive(Debug, Deserialize)]
pub struct ArtistLookup {
    pub artist: Artist,
}

#[derive(Debug, Deserialize)]
pub struct ReleaseLookup {
    pub release: Release,
}

#[derive(Debug, Deserialize)]
pub struct RecordingLookup {
    pub recording: Recording,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ArtistSearch {
    pub artist_list: Option<ArtistList>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ReleaseGroupSearch {
    pub release_group_list: Option<ReleaseGroupList>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RecordingSearch {
    pub recording_list: Option<RecordingList>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ArtistList {
    #[serde(default)]
    pub artist: OneOrMany<Artist>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ReleaseGroupList {
    #[serde(default)]
    pub release_group: OneOrMany<ReleaseGroup>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RecordingList {
    #[serde(default)]
    pub recording: OneOrMany<Recording>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Artist {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@type")]
    pub artist_type: Option<String>,
    /// Search relevance, in the `ext` namespace
    #[serde(rename = "@ns2:score", alias = "@score")]
    pub score: Option<String>,
    pub name: String,
    pub sort_name: Option<String>,
    pub disambiguation: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ArtistCredit {
    #[serde(default)]
    pub name_credit: OneOrMany<NameCredit>,
}

#[derive(Debug, Deserialize)]
pub struct NameCredit {
    #[serde(rename = "@joinphrase")]
    pub joinphrase: Option<String>,
    pub name: Option<String>,
    pub artist: CreditedArtist,
}

#[derive(Debug, Deserialize)]
pub struct CreditedArtist {
    #[serde(rename = "@id")]
    pub id: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ReleaseGroup {
    #[serde(rename = "@id")]
    pub id: String,
    pub title: String,
    pub primary_type: Option<Text>,
    pub first_release_date: Option<String>,
    pub artist_credit: Option<ArtistCredit>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Release {
    #[serde(rename = "@id")]
    pub id: String,
    pub title: String,
    pub date: Option<String>,
    pub disambiguation: Option<String>,
    pub artist_credit: Option<ArtistCredit>,
    pub label_info_list: Option<LabelInfoList>,
    pub medium_list: Option<MediumList>,
    pub genre_list: Option<GenreList>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LabelInfoList {
    #[serde(default)]
    pub label_info: OneOrMany<LabelInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LabelInfo {
    pub catalog_number: Option<String>,
    pub label: Option<Label>,
}

#[derive(Debug, Deserialize)]
pub struct Label {
    #[serde(rename = "@id")]
    pub id: String,
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct MediumList {
    #[serde(default)]
    pub medium: OneOrMany<Medium>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Medium {
    pub position: Option<String>,
    pub format: Option<Text>,
    pub track_list: Option<TrackList>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TrackList {
    #[serde(default)]
    pub track: OneOrMany<Track>,
}

/// Track on a medium. The title is omitted when it matches the recording's.
#[derive(Debug, Deserialize)]
pub struct Track {
    #[serde(rename = "@id")]
    pub id: String,
    pub title: Option<String>,
    pub recording: Option<TrackRecording>,
}

#[derive(Debug, Deserialize)]
pub struct TrackRecording {
    #[serde(rename = "@id")]
    pub id: String,
    pub title: Option<String>,
    pub video: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Recording {
    #[serde(rename = "@id")]
    pub id: String,
    pub title: String,
    pub length: Option<String>,
    pub disambiguation: Option<String>,
    pub artist_credit: Option<ArtistCredit>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GenreList {
    #[serde(default)]
    pub genre: OneOrMany<Genre>,
}

#[derive(Debug, Deserialize)]
pub struct Genre {
    #[serde(rename = "@count")]
    pub count: Option<String>,
    pub name: String,
}

// ---- conversions into the JSON shapes ----

fn credits(credit: Option<ArtistCredit>) -> Vec<dto::ArtistCredit> {
    credit
        .map(|c| c.name_credit.into_vec())
        .unwrap_or_default()
        .into_iter()
        .map(|nc| dto::ArtistCredit {
            artist: dto::CreditedArtist {
                id: nc.artist.id,
                name: nc.artist.name,
            },
            name: nc.name,
            joinphrase: nc.joinphrase,
        })
        .collect()
}

fn list<L: Default, T>(list: Option<L>, items: impl FnOnce(L) -> OneOrMany<T>) -> Vec<T> {
    items(list.unwrap_or_default()).into_vec()
}

impl From<Artist> for dto::Artist {
    fn from(artist: Artist) -> Self {
        Self {
            id: artist.id,
            name: artist.name,
            sort_name: artist.sort_name,
            disambiguation: artist.disambiguation,
            artist_type: artist.artist_type,
            score: artist.score.and_then(|s| s.parse().ok()),
        }
    }
}

impl From<ReleaseGroup> for dto::ReleaseGroup {
    fn from(group: ReleaseGroup) -> Self {
        Self {
            id: group.id,
            title: group.title,
            primary_type: group.primary_type.map(Text::into_string),
            first_release_date: group.first_release_date,
            artist_credit: credits(group.artist_credit),
        }
    }
}

impl From<Recording> for dto::Recording {
    fn from(recording: Recording) -> Self {
        Self {
            id: recording.id,
            title: recording.title,
            length: recording.length.and_then(|l| l.parse().ok()),
            disambiguation: recording.disambiguation,
            artist_credit: credits(recording.artist_credit),
        }
    }
}

impl From<Track> for dto::Track {
    fn from(track: Track) -> Self {
        let recording_title = track.recording.as_ref().and_then(|r| r.title.clone());
        Self {
            id: track.id,
            title: track.title.or(recording_title).unwrap_or_default(),
            recording: track.recording.map(|r| dto::RecordingRef {
                id: r.id,
                video: r.video.map(|v| v == "true"),
            }),
        }
    }
}

impl From<Release> for dto::Release {
    fn from(release: Release) -> Self {
        Self {
            id: release.id,
            title: release.title,
            date: release.date,
            disambiguation: release.disambiguation,
            artist_credit: credits(release.artist_credit),
            label_info: list(release.label_info_list, |l| l.label_info)
                .into_iter()
                .map(|info| dto::LabelInfo {
                    catalog_number: info.catalog_number,
                    label: info.label.map(|label| dto::Label {
                        id: label.id,
                        name: label.name,
                    }),
                })
                .collect(),
            media: list(release.medium_list, |l| l.medium)
                .into_iter()
                .map(|medium| dto::Medium {
                    position: medium.position.and_then(|p| p.parse().ok()),
                    format: medium.format.map(Text::into_string),
                    tracks: list(medium.track_list, |l| l.track)
                        .into_iter()
                        .map(dto::Track::from)
                        .collect(),
                })
                .collect(),
            genres: list(release.genre_list, |l| l.genre)
                .into_iter()
                .map(|genre| dto::Genre {
                    name: genre.name,
                    count: genre.count.and_then(|c| c.parse().ok()).unwrap_or(0),
                })
                .collect(),
        }
    }
}

impl From<ArtistLookup> for dto::Artist {
    fn from(lookup: ArtistLookup) -> Self {
        lookup.artist.into()
    }
}

impl From<ReleaseLookup> for dto::Release {
    fn from(lookup: ReleaseLookup) -> Self {
        lookup.release.into()
    }
}

impl From<RecordingLookup> for dto::Recording {
    fn from(lookup: RecordingLookup) -> Self {
        lookup.recording.into()
    }
}

impl From<ArtistSearch> for dto::ArtistSearchResponse {
    fn from(search: ArtistSearch) -> Self {
        Self {
            artists: list(search.artist_list, |l| l.artist)
                .into_iter()
                .map(dto::Artist::from)
                .collect(),
        }
    }
}

impl From<ReleaseGroupSearch> for dto::ReleaseGroupSearchResponse {
    fn from(search: ReleaseGroupSearch) -> Self {
        Self {
            release_groups: list(search.release_group_list, |l| l.release_group)
                .into_iter()
                .map(dto::ReleaseGroup::from)
                .collect(),
        }
    }
}

impl From<RecordingSearch> for dto::RecordingSearchResponse {
    fn from(search: RecordingSearch) -> Self {
        Self {
            recordings: list(search.recording_list, |l| l.recording)
                .into_iter()
                .map(dto::Recording::from)
                .collect(),
        }
    }
}
