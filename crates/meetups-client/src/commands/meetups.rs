//! Meetup commands: seed a store, apply one mutation, render the result.

use std::path::Path;

use meetups_core::{
    FormatOptions, Meetup, MeetupPatch, MeetupStore, OutputFormat, OutputFormatter,
};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::cli::Command;
use crate::error::{ClientError, ClientResult};

/// How to render the resulting list.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub format: OutputFormat,
    pub format_options: FormatOptions,
    pub no_meetups_text: String,
    pub favorites_only: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            format: OutputFormat::Tty,
            format_options: FormatOptions::default(),
            no_meetups_text: "No meetups".to_string(),
            favorites_only: false,
        }
    }
}

/// Reads a JSON array of meetups.
pub fn load_meetups(path: &Path) -> ClientResult<Vec<Meetup>> {
    let content = std::fs::read_to_string(path).map_err(|e| ClientError::read(path, e))?;
    serde_json::from_str(&content).map_err(|source| ClientError::InvalidMeetups {
        path: path.to_path_buf(),
        source,
    })
}

/// Builds a store and fills it from `file`, if given.
pub fn seed_store(file: Option<&Path>) -> ClientResult<MeetupStore> {
    let store = MeetupStore::new();
    if let Some(path) = file {
        let meetups = load_meetups(path)?;
        info!(path = %path.display(), count = meetups.len(), "Loaded meetups");
        store.set_meetups(meetups);
    } else {
        debug!("No meetups file, starting empty");
    }
    Ok(store)
}

/// Applies a mutating command to the store.
///
/// `list` and `config` leave the store untouched.
pub fn apply(store: &MeetupStore, command: &Command) -> ClientResult<()> {
    match command {
        Command::Add {
            id,
            favorite,
            fields,
        } => {
            let meetup = fields
                .iter()
                .fold(Meetup::new(id.clone()).with_favorite(*favorite), |m, (k, v)| {
                    m.with_field(k.clone(), v.clone())
                });
            store.add_meetup(meetup);
        }
        Command::Update {
            id,
            favorite,
            fields,
        } => {
            let patch = build_patch(*favorite, fields);
            if patch.is_empty() {
                warn!(id = %id, "Nothing to update");
            }
            store.update_meetup(id, patch)?;
        }
        Command::Remove { id } => {
            if store.remove_meetup(id) == 0 {
                warn!(id = %id, "No meetup with this id");
            }
        }
        Command::Favorite { id } => {
            store.toggle_favorite(id)?;
        }
        Command::List { .. } | Command::Config { .. } => {}
    }
    Ok(())
}

fn build_patch(favorite: Option<bool>, fields: &[(String, Value)]) -> MeetupPatch {
    let patch = fields
        .iter()
        .fold(MeetupPatch::new(), |p, (k, v)| p.with_field(k.clone(), v.clone()));
    match favorite {
        Some(flag) => patch.with_favorite(flag),
        None => patch,
    }
}

/// Renders the meetups for output.
pub fn render(meetups: &[Meetup], options: &RenderOptions) -> ClientResult<String> {
    let selected: Vec<Meetup> = meetups
        .iter()
        .filter(|m| !options.favorites_only || m.is_favorite)
        .cloned()
        .collect();
    let formatter = OutputFormatter::new(options.format_options.clone());

    match options.format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(
            &formatter.format_json(&selected),
        )?),
        OutputFormat::Tty if selected.is_empty() => Ok(options.no_meetups_text.clone()),
        OutputFormat::Tty => Ok(formatter.format_tty(&selected).join("\n")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const FETCHED: &str = r#"[
        {"id": "m1", "title": "Coding Bootcamp", "address": "Nerd Road", "isFavorite": true},
        {"id": "m2", "title": "Swim Together", "address": "Pool Lane"}
    ]"#;

    fn seeded() -> MeetupStore {
        MeetupStore::with_meetups(serde_json::from_str(FETCHED).unwrap())
    }

    fn ids(store: &MeetupStore) -> Vec<String> {
        store.meetups().iter().map(|m| m.id.clone()).collect()
    }

    mod seeding {
        use super::*;

        #[test]
        fn from_file() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("meetups.json");
            std::fs::write(&path, FETCHED).unwrap();

            let store = seed_store(Some(path.as_path())).unwrap();
            assert_eq!(ids(&store), vec!["m1", "m2"]);
            assert_eq!(store.version(), 1);
        }

        #[test]
        fn without_file() {
            let store = seed_store(None).unwrap();
            assert!(store.is_empty());
        }

        #[test]
        fn missing_file() {
            let dir = tempfile::tempdir().unwrap();
            let err = seed_store(Some(dir.path().join("nope.json").as_path())).unwrap_err();
            assert!(matches!(err, ClientError::Read { .. }));
        }

        #[test]
        fn numeric_ids() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("meetups.json");
            std::fs::write(&path, r#"[{"id": 1, "title": "One"}, {"id": "m2"}]"#).unwrap();

            let store = seed_store(Some(path.as_path())).unwrap();
            assert_eq!(ids(&store), vec!["1", "m2"]);
            assert!(store.toggle_favorite("1").unwrap());
        }

        #[test]
        fn not_an_array() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("meetups.json");
            std::fs::write(&path, r#"{"id": "m1"}"#).unwrap();

            let err = load_meetups(&path).unwrap_err();
            assert!(matches!(err, ClientError::InvalidMeetups { .. }));
            assert!(err.to_string().starts_with("invalid meetups file"));
        }
    }

    mod commands {
        use super::*;

        #[test]
        fn add_prepends_with_fields() {
            let store = seeded();
            apply(
                &store,
                &Command::Add {
                    id: "m3".to_string(),
                    favorite: true,
                    fields: vec![("title".to_string(), json!("Book Club"))],
                },
            )
            .unwrap();

            assert_eq!(ids(&store), vec!["m3", "m1", "m2"]);
            let added = store.get("m3").unwrap();
            assert!(added.is_favorite);
            assert_eq!(added.title(), Some("Book Club"));
        }

        #[test]
        fn update_merges() {
            let store = seeded();
            apply(
                &store,
                &Command::Update {
                    id: "m2".to_string(),
                    favorite: Some(true),
                    fields: vec![("title".to_string(), json!("Swim Faster"))],
                },
            )
            .unwrap();

            let updated = store.get("m2").unwrap();
            assert_eq!(updated.title(), Some("Swim Faster"));
            assert_eq!(updated.location(), Some("Pool Lane"));
            assert!(updated.is_favorite);
        }

        #[test]
        fn update_missing_is_an_error() {
            let store = seeded();
            let err = apply(
                &store,
                &Command::Update {
                    id: "nope".to_string(),
                    favorite: None,
                    fields: vec![("x".to_string(), json!(1))],
                },
            )
            .unwrap_err();
            assert_eq!(err.to_string(), "meetup not found: nope");
            assert_eq!(ids(&store), vec!["m1", "m2"]);
        }

        #[test]
        fn remove_and_favorite() {
            let store = seeded();
            apply(&store, &Command::Remove { id: "m1".to_string() }).unwrap();
            apply(&store, &Command::Remove { id: "m1".to_string() }).unwrap();
            apply(&store, &Command::Favorite { id: "m2".to_string() }).unwrap();

            assert_eq!(ids(&store), vec!["m2"]);
            assert!(store.get("m2").unwrap().is_favorite);
        }

        #[test]
        fn favorite_missing_is_an_error() {
            let store = seeded();
            let err = apply(&store, &Command::Favorite { id: "x".to_string() }).unwrap_err();
            assert!(matches!(err, ClientError::Store(_)));
        }

        #[test]
        fn list_is_read_only() {
            let store = seeded();
            apply(&store, &Command::List { favorites: false }).unwrap();
            assert_eq!(store.version(), 0);
        }
    }

    mod rendering {
        use super::*;

        #[test]
        fn tty() {
            let store = seeded();
            let output = render(&store.meetups(), &RenderOptions::default()).unwrap();
            insta::assert_snapshot!(output, @r"
            * Coding Bootcamp @ Nerd Road [m1]
              Swim Together @ Pool Lane [m2]
            ");
        }

        #[test]
        fn tty_empty() {
            let output = render(&[], &RenderOptions::default()).unwrap();
            assert_eq!(output, "No meetups");
        }

        #[test]
        fn favorites_only() {
            let store = seeded();
            let options = RenderOptions {
                favorites_only: true,
                ..RenderOptions::default()
            };
            let output = render(&store.meetups(), &options).unwrap();
            assert_eq!(output, "* Coding Bootcamp @ Nerd Road [m1]");
        }

        #[test]
        fn json() {
            let store = seeded();
            let options = RenderOptions {
                format: OutputFormat::Json,
                ..RenderOptions::default()
            };
            let output = render(&store.meetups(), &options).unwrap();
            let value: Value = serde_json::from_str(&output).unwrap();
            assert_eq!(value["count"], json!(2));
            assert_eq!(value["favorite_count"], json!(1));
            assert_eq!(value["meetups"][1]["title"], json!("Swim Together"));
            assert_eq!(value["meetups"][1]["isFavorite"], json!(false));
        }
    }
}
