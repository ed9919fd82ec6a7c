//! Response validation against declared shapes.
//!
//! One JSON Schema per (entity kind, operation) lives in `schemas/` and is
//! embedded at compile time. `get` schemas are closed at the top level
//! (unknown fields are rejected); `search` schemas only check the fields a
//! result list needs.
//!
//! Adapters validate every record they produce. A failed check becomes
//! [`ProviderError::InvalidUpstreamData`] for that call only.

use std::collections::HashMap;

use jsonschema::{Draft, JSONSchema};
use once_cell::sync::Lazy;
use serde_json::Value;

use super::domain::{Operation, ProviderError};
use crate::model::{CanonicalRecord, EntityKind};

fn parse_schema(source: &str) -> Value {
    serde_json::from_str(source).expect("embedded schema is valid JSON")
}

static ARTIST_GET: Lazy<Value> = Lazy::new(|| parse_schema(include_str!("../../schemas/artist.get.json")));
static ALBUM_GET: Lazy<Value> = Lazy::new(|| parse_schema(include_str!("../../schemas/album.get.json")));
static TRACK_GET: Lazy<Value> = Lazy::new(|| parse_schema(include_str!("../../schemas/track.get.json")));
static ARTIST_SEARCH: Lazy<Value> =
    Lazy::new(|| parse_schema(include_str!("../../schemas/artist.search.json")));
static ALBUM_SEARCH: Lazy<Value> =
    Lazy::new(|| parse_schema(include_str!("../../schemas/album.search.json")));
static TRACK_SEARCH: Lazy<Value> =
    Lazy::new(|| parse_schema(include_str!("../../schemas/track.search.json")));

fn schema_document(kind: EntityKind, operation: Operation) -> &'static Value {
    match (kind, operation) {
        (EntityKind::Artist, Operation::Get) => &*ARTIST_GET,
        (EntityKind::Album, Operation::Get) => &*ALBUM_GET,
        (EntityKind::Track, Operation::Get) => &*TRACK_GET,
        (EntityKind::Artist, Operation::Search) => &*ARTIST_SEARCH,
        (EntityKind::Album, Operation::Search) => &*ALBUM_SEARCH,
        (EntityKind::Track, Operation::Search) => &*TRACK_SEARCH,
    }
}

/// Compiled schemas for every (kind, operation) pair
pub struct ResponseValidator {
    schemas: HashMap<(EntityKind, Operation), JSONSchema>,
}

impl ResponseValidator {
    /// Compile all embedded schemas.
    pub fn new() -> Self {
        let mut schemas = HashMap::new();
        for kind in EntityKind::ALL {
            for operation in [Operation::Search, Operation::Get] {
                let compiled = JSONSchema::options()
                    .with_draft(Draft::Draft7)
                    .compile(schema_document(kind, operation))
                    .expect("embedded schema compiles");
                schemas.insert((kind, operation), compiled);
            }
        }
        Self { schemas }
    }

    /// Whether `payload` has the declared shape for `kind` and `operation`.
    pub fn validate(&self, kind: EntityKind, operation: Operation, payload: &Value) -> bool {
        self.schemas
            .get(&(kind, operation))
            .is_some_and(|schema| schema.is_valid(payload))
    }

    /// Like [`validate`](Self::validate), but describes what is wrong.
    pub fn check(&self, kind: EntityKind, operation: Operation, payload: &Value) -> Result<(), ProviderError> {
        let Some(schema) = self.schemas.get(&(kind, operation)) else {
            return Err(ProviderError::invalid(format!("no schema for {operation} {kind}")));
        };

        schema.validate(payload).map_err(|errors| {
            let details: Vec<String> = errors
                .take(3)
                .map(|e| format!("{} at {}", e, e.instance_path))
                .collect();
            ProviderError::invalid(format!("{operation} {kind} response rejected: {}", details.join("; ")))
        })
    }

    /// Validate a single record produced by a `get` handler.
    pub fn check_record(&self, record: CanonicalRecord) -> Result<CanonicalRecord, ProviderError> {
        let value = record
            .to_value()
            .map_err(|e| ProviderError::invalid(e.to_string()))?;
        self.check(record.kind(), Operation::Get, &value)?;
        Ok(record)
    }

    /// Validate a result list produced by a `search` handler.
    pub fn check_results(
        &self,
        kind: EntityKind,
        records: Vec<CanonicalRecord>,
    ) -> Result<Vec<CanonicalRecord>, ProviderError> {
        if let Some(other) = records.iter().find(|r| r.kind() != kind) {
            return Err(ProviderError::invalid(format!(
                "{kind} search returned a {} record",
                other.kind()
            )));
        }
        let value = serde_json::to_value(&records).map_err(|e| ProviderError::invalid(e.to_string()))?;
        self.check(kind, Operation::Search, &value)?;
        Ok(records)
    }
}

impl Default for ResponseValidator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn artist_payload() -> Value {
        json!({
            "Id": "lastfm-abc",
            "ArtistName": "Massive Attack",
            "Albums": [{
                "Id": "lastfm-alb",
                "AlbumName": "Mezzanine",
                "Tracks": [{"Id": "lastfm-t1", "Title": "Angel"}]
            }],
            "ProviderIds": {"lastfm": "abc"}
        })
    }

    #[test]
    fn test_all_schemas_compile() {
        let validator = ResponseValidator::new();
        assert_eq!(validator.schemas.len(), 6);
    }

    #[test]
    fn test_valid_artist_get() {
        let validator = ResponseValidator::new();
        assert!(validator.validate(EntityKind::Artist, Operation::Get, &artist_payload()));
    }

    #[test]
    fn test_get_missing_required_field_rejected() {
        let validator = ResponseValidator::new();
        let mut payload = artist_payload();
        payload.as_object_mut().unwrap().remove("ArtistName");

        assert!(!validator.validate(EntityKind::Artist, Operation::Get, &payload));
        let err = validator
            .check(EntityKind::Artist, Operation::Get, &payload)
            .unwrap_err();
        assert!(matches!(err, ProviderError::InvalidUpstreamData(_)));
    }

    #[test]
    fn test_get_is_closed_at_top_level() {
        let validator = ResponseValidator::new();
        let mut payload = artist_payload();
        payload["Followers"] = json!(12);
        assert!(!validator.validate(EntityKind::Artist, Operation::Get, &payload));
    }

    #[test]
    fn test_embedded_album_needs_tracks() {
        let validator = ResponseValidator::new();
        let mut payload = artist_payload();
        payload["Albums"][0]["Tracks"] = json!([]);
        assert!(!validator.validate(EntityKind::Artist, Operation::Get, &payload));
    }

    #[test]
    fn test_album_get_requires_artist() {
        let validator = ResponseValidator::new();
        let payload = json!({
            "Id": "discogs-1",
            "AlbumName": "Nevermind",
            "ProviderIds": {"discogs": "1"}
        });
        assert!(!validator.validate(EntityKind::Album, Operation::Get, &payload));

        let mut with_artist = payload.clone();
        with_artist["Artist"] = json!({"Id": "discogs-125246", "ArtistName": "Nirvana"});
        assert!(validator.validate(EntityKind::Album, Operation::Get, &with_artist));
    }

    #[test]
    fn test_album_artist_id_is_optional_but_never_empty() {
        let validator = ResponseValidator::new();
        let mut payload = json!({
            "Id": "lastfm-1",
            "AlbumName": "Believe",
            "Artist": {"ArtistName": "Cher"},
            "ProviderIds": {"lastfm": "1"}
        });
        assert!(validator.validate(EntityKind::Album, Operation::Get, &payload));

        payload["Artist"]["Id"] = json!("");
        assert!(!validator.validate(EntityKind::Album, Operation::Get, &payload));
    }

    #[test]
    fn test_search_allows_unknown_fields() {
        let validator = ResponseValidator::new();
        let payload = json!([
            {"Id": "discogs-1", "ArtistName": "Nirvana", "Score": 100},
            {"Id": "discogs-2", "ArtistName": "Nirvana (2)"}
        ]);
        assert!(validator.validate(EntityKind::Artist, Operation::Search, &payload));
        assert!(validator.validate(EntityKind::Artist, Operation::Search, &json!([])));
    }

    #[test]
    fn test_search_item_without_name_rejected() {
        let validator = ResponseValidator::new();
        let payload = json!([{"Id": "discogs-1", "ArtistName": ""}]);
        assert!(!validator.validate(EntityKind::Artist, Operation::Search, &payload));
    }

    #[test]
    fn test_check_results_rejects_mixed_kinds() {
        let validator = ResponseValidator::new();
        let track = CanonicalRecord::Track(crate::model::Track {
            id: "lastfm-t".to_string(),
            title: "Teardrop".to_string(),
            explicit: None,
            provider_ids: Default::default(),
        });
        assert!(validator.check_results(EntityKind::Artist, vec![track]).is_err());
    }
}
