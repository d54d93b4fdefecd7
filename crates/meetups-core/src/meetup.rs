//! Meetup records.
//!
//! This module provides the two record types the store works with:
//! - [`Meetup`]: an event identified by `id` with a favorite flag and an open
//!   set of opaque fields (title, address, image URL, ...)
//! - [`MeetupPatch`]: a partial record merged onto an existing [`Meetup`]

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// JSON key of the identifier.
pub const ID_KEY: &str = "id";

/// JSON key of the favorite flag.
pub const FAVORITE_KEY: &str = "isFavorite";

/// A meetup record.
///
/// Only `id` and `is_favorite` are typed. Every other field is carried as an
/// opaque JSON value and never validated.
///
/// A numeric `id` is read as its decimal string. `isFavorite` defaults to
/// false when absent but must be a boolean when present, so a record with
/// `"isFavorite": "yes"` fails to deserialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meetup {
    /// Identity of the record. Uniqueness is assumed, not enforced.
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    /// Whether the user marked this meetup as a favorite.
    #[serde(default)]
    pub is_favorite: bool,
    /// Remaining fields, flattened next to `id` and `isFavorite`.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Meetup {
    /// Creates a meetup with only an identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            is_favorite: false,
            fields: Map::new(),
        }
    }

    /// Builder method to set a field.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_field(key, value);
        self
    }

    /// Builder method to set the favorite flag.
    pub fn with_favorite(mut self, is_favorite: bool) -> Self {
        self.is_favorite = is_favorite;
        self
    }

    /// Sets a field by its JSON key.
    ///
    /// `id` and `isFavorite` go to the typed fields. A numeric `id` is
    /// stored as a string; any other mistyped value is ignored.
    pub fn set_field(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        match key.as_str() {
            ID_KEY => match id_from_value(value) {
                Ok(id) => self.id = id,
                Err(value) => tracing::debug!(value = %value, "Ignoring invalid id"),
            },
            FAVORITE_KEY => {
                if let Value::Bool(flag) = value {
                    self.is_favorite = flag;
                } else {
                    tracing::debug!(value = %value, "Ignoring non-boolean isFavorite");
                }
            }
            _ => {
                self.fields.insert(key, value);
            }
        }
    }

    /// Returns an opaque field.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Returns an opaque field if it holds a string.
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.field(key).and_then(Value::as_str)
    }

    /// Returns the title, if any.
    pub fn title(&self) -> Option<&str> {
        self.str_field("title")
    }

    /// Returns where the meetup takes place (`address`, falling back to `location`).
    pub fn location(&self) -> Option<&str> {
        self.str_field("address")
            .or_else(|| self.str_field("location"))
    }

    /// Shallow-merges a patch onto this record.
    ///
    /// Each key present in the patch overwrites the same key here; everything
    /// else is left untouched.
    pub fn apply(&mut self, patch: &MeetupPatch) {
        if let Some(ref id) = patch.id {
            self.id.clone_from(id);
        }
        if let Some(flag) = patch.is_favorite {
            self.is_favorite = flag;
        }
        for (key, value) in &patch.fields {
            self.fields.insert(key.clone(), value.clone());
        }
    }

    /// Returns a copy of this record with the patch merged on.
    pub fn merged(&self, patch: &MeetupPatch) -> Self {
        let mut meetup = self.clone();
        meetup.apply(patch);
        meetup
    }
}

fn id_from_value(value: Value) -> Result<String, Value> {
    match value {
        Value::String(id) => Ok(id),
        Value::Number(number) => Ok(number.to_string()),
        other => Err(other),
    }
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    id_from_value(Value::deserialize(deserializer)?).map_err(|value| {
        serde::de::Error::custom(format!("id must be a string or a number, got {}", value))
    })
}

/// A partial meetup used by updates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetupPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_favorite: Option<bool>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl MeetupPatch {
    /// Creates an empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set a field, routing `id` and `isFavorite` like
    /// [`Meetup::set_field`].
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        let value = value.into();
        match key.as_str() {
            ID_KEY => match id_from_value(value) {
                Ok(id) => self.id = Some(id),
                Err(other) => tracing::debug!(value = %other, "Ignoring invalid id in patch"),
            },
            FAVORITE_KEY => match value {
                Value::Bool(flag) => self.is_favorite = Some(flag),
                other => tracing::debug!(value = %other, "Ignoring non-boolean isFavorite in patch"),
            },
            _ => {
                self.fields.insert(key, value);
            }
        }
        self
    }

    /// Builder method to set the favorite flag.
    pub fn with_favorite(mut self, is_favorite: bool) -> Self {
        self.is_favorite = Some(is_favorite);
        self
    }

    /// Returns true if applying this patch would change nothing.
    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.is_favorite.is_none() && self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_meetup() -> Meetup {
        Meetup::new("m1")
            .with_field("title", "Coding Bootcamp")
            .with_field("address", "27th Nerd Road, 32523 New York")
            .with_field("contactEmail", "code@test.com")
    }

    mod meetup {
        use super::*;

        #[test]
        fn basic_creation() {
            let meetup = Meetup::new("m1");
            assert_eq!(meetup.id, "m1");
            assert!(!meetup.is_favorite);
            assert!(meetup.fields.is_empty());
            assert_eq!(meetup.title(), None);
        }

        #[test]
        fn accessors() {
            let meetup = sample_meetup();
            assert_eq!(meetup.title(), Some("Coding Bootcamp"));
            assert_eq!(meetup.location(), Some("27th Nerd Road, 32523 New York"));
            assert_eq!(meetup.str_field("contactEmail"), Some("code@test.com"));
            assert_eq!(meetup.field("missing"), None);
        }

        #[test]
        fn location_falls_back() {
            let meetup = Meetup::new("m1").with_field("location", "Berlin");
            assert_eq!(meetup.location(), Some("Berlin"));
        }

        #[test]
        fn reserved_keys_route_to_typed_fields() {
            let meetup = Meetup::new("m1")
                .with_field("id", "m2")
                .with_field("isFavorite", true);
            assert_eq!(meetup.id, "m2");
            assert!(meetup.is_favorite);
            assert!(meetup.fields.is_empty());
        }

        #[test]
        fn mistyped_reserved_keys_are_ignored() {
            let meetup = Meetup::new("m1")
                .with_field("id", json!(["m2"]))
                .with_field("isFavorite", "yes");
            assert_eq!(meetup.id, "m1");
            assert!(!meetup.is_favorite);
            assert!(meetup.fields.is_empty());
        }

        #[test]
        fn deserializes_camel_case() {
            let meetup: Meetup = serde_json::from_value(json!({
                "id": "m1",
                "isFavorite": true,
                "title": "Swim Together",
                "imageUrl": "https://example.com/swim.jpg"
            }))
            .unwrap();
            assert_eq!(meetup.id, "m1");
            assert!(meetup.is_favorite);
            assert_eq!(meetup.title(), Some("Swim Together"));
            assert_eq!(
                meetup.str_field("imageUrl"),
                Some("https://example.com/swim.jpg")
            );
            assert!(!meetup.fields.contains_key("isFavorite"));
        }

        #[test]
        fn numeric_id_reads_as_string() {
            let meetups: Vec<Meetup> =
                serde_json::from_value(json!([{ "id": 7, "title": "Seven" }, { "id": "m8" }]))
                    .unwrap();
            assert_eq!(meetups[0].id, "7");
            assert_eq!(meetups[1].id, "m8");
            assert_eq!(Meetup::new("m1").with_field("id", 42).id, "42");
        }

        #[test]
        fn id_of_another_type_is_rejected() {
            let err = serde_json::from_value::<Meetup>(json!({ "id": true })).unwrap_err();
            assert!(err.to_string().contains("id must be a string or a number"));
        }

        #[test]
        fn non_boolean_favorite_is_rejected() {
            let result = serde_json::from_value::<Meetup>(json!({ "id": "m1", "isFavorite": "yes" }));
            assert!(result.is_err());
        }

        #[test]
        fn favorite_defaults_to_false() {
            let meetup: Meetup = serde_json::from_value(json!({ "id": "m1" })).unwrap();
            assert!(!meetup.is_favorite);
        }

        #[test]
        fn serializes_flat() {
            let value = serde_json::to_value(sample_meetup().with_favorite(true)).unwrap();
            assert_eq!(
                value,
                json!({
                    "id": "m1",
                    "isFavorite": true,
                    "title": "Coding Bootcamp",
                    "address": "27th Nerd Road, 32523 New York",
                    "contactEmail": "code@test.com"
                })
            );
        }
    }

    mod patch {
        use super::*;

        #[test]
        fn merge_overwrites_only_present_keys() {
            let meetup = sample_meetup();
            let patch = MeetupPatch::new().with_field("title", "T");
            let merged = meetup.merged(&patch);

            assert_eq!(merged.id, "m1");
            assert_eq!(merged.title(), Some("T"));
            assert_eq!(merged.location(), meetup.location());
            assert_eq!(merged.str_field("contactEmail"), Some("code@test.com"));
            assert_eq!(merged.is_favorite, meetup.is_favorite);
        }

        #[test]
        fn merge_typed_fields() {
            let patch = MeetupPatch::new()
                .with_field("id", "m9")
                .with_favorite(true);
            let merged = sample_meetup().merged(&patch);
            assert_eq!(merged.id, "m9");
            assert!(merged.is_favorite);
        }

        #[test]
        fn merge_adds_new_keys() {
            let patch = MeetupPatch::new().with_field("x", 1);
            let merged = sample_meetup().merged(&patch);
            assert_eq!(merged.field("x"), Some(&json!(1)));
        }

        #[test]
        fn empty_patch() {
            assert!(MeetupPatch::new().is_empty());
            assert!(!MeetupPatch::new().with_favorite(false).is_empty());
            assert!(MeetupPatch::new().with_field("id", 3).is_empty());

            let meetup = sample_meetup();
            assert_eq!(meetup.merged(&MeetupPatch::new()), meetup);
        }

        #[test]
        fn deserializes_partial() {
            let patch: MeetupPatch =
                serde_json::from_value(json!({ "title": "New", "isFavorite": false })).unwrap();
            assert_eq!(patch.id, None);
            assert_eq!(patch.is_favorite, Some(false));
            assert_eq!(patch.fields.get("title"), Some(&json!("New")));
        }
    }
}
