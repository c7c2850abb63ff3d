use std::fs;
use std::path::Path;
use std::sync::Arc;

use include_dir::{include_dir, Dir};
use tracing::{info, warn};

use super::document::{parse, LoadOptions};
use super::model::{ContentKey, Subject, TestContent};
use crate::error::ContentError;

static CONTENT_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/assets/content");

/// Holds the current validated content snapshot.
///
/// Reloading swaps the snapshot only when the new document validates, so a
/// session holding an earlier `Arc<TestContent>` keeps reading the old data.
#[derive(Debug, Clone)]
pub struct ContentStore {
    snapshot: Arc<TestContent>,
    options: LoadOptions,
}

impl ContentStore {
    /// Validates a document without creating a store.
    pub fn load(source: &str, options: &LoadOptions) -> Result<TestContent, ContentError> {
        parse(source, options)
    }

    pub fn from_json(source: &str, options: LoadOptions) -> Result<Self, ContentError> {
        let content = Self::load(source, &options)?;
        info!(subjects = content.subject_count(), "loaded test content");
        Ok(Self {
            snapshot: Arc::new(content),
            options,
        })
    }

    pub fn from_path<P: AsRef<Path>>(path: P, options: LoadOptions) -> Result<Self, ContentError> {
        let source = read_source(path.as_ref())?;
        Self::from_json(&source, options)
    }

    /// Loads a document compiled into the binary, e.g. `sample`.
    pub fn bundled(name: &str, options: LoadOptions) -> Result<Self, ContentError> {
        let source = bundled_source(name)?;
        Self::from_json(source, options)
    }

    /// Names of the documents compiled into the binary.
    pub fn bundled_names() -> Vec<&'static str> {
        let mut names: Vec<&'static str> = CONTENT_DIR
            .files()
            .filter_map(|f| f.path().file_stem().and_then(|s| s.to_str()))
            .collect();
        names.sort_unstable();
        names
    }

    pub fn snapshot(&self) -> Arc<TestContent> {
        Arc::clone(&self.snapshot)
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    pub fn subjects_for(&self, key: ContentKey) -> &[Subject] {
        self.snapshot.subjects_for(key)
    }

    /// Replaces the snapshot; on error the previous snapshot stays in place.
    pub fn reload(&mut self, source: &str) -> Result<(), ContentError> {
        match Self::load(source, &self.options) {
            Ok(content) => {
                info!(subjects = content.subject_count(), "reloaded test content");
                self.snapshot = Arc::new(content);
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "content reload rejected, keeping previous snapshot");
                Err(err)
            }
        }
    }

    pub fn reload_path<P: AsRef<Path>>(&mut self, path: P) -> Result<(), ContentError> {
        let source = read_source(path.as_ref())?;
        self.reload(&source)
    }
}

fn read_source(path: &Path) -> Result<String, ContentError> {
    fs::read_to_string(path).map_err(|source| ContentError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn bundled_source(name: &str) -> Result<&'static str, ContentError> {
    CONTENT_DIR
        .get_file(format!("{name}.json"))
        .and_then(|file| file.contents_utf8())
        .ok_or_else(|| ContentError::UnknownBundle {
            name: name.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::Module;
    use crate::error::ContentErrorKind;

    const READING_ONLY: &str = r#"{
        "reading_subjects": { "academic": [
            { "id": "P1", "body": "Text.", "questions": [ { "id": "Q1" }, { "id": "Q2" } ] }
        ] }
    }"#;

    fn reading_options() -> LoadOptions {
        LoadOptions::requiring([ContentKey::Reading(Module::Academic)])
    }

    #[test]
    fn bundled_sample_satisfies_all_sections() {
        let store = ContentStore::bundled("sample", LoadOptions::default()).unwrap();
        for key in ContentKey::ALL {
            assert!(
                !store.subjects_for(key).is_empty(),
                "bundled sample should provide {key}"
            );
        }
    }

    #[test]
    fn bundled_names_lists_sample() {
        assert!(ContentStore::bundled_names().contains(&"sample"));
    }

    #[test]
    fn unknown_bundle_is_an_error() {
        let err = ContentStore::bundled("nope", LoadOptions::default()).unwrap_err();
        assert_eq!(err.kind(), ContentErrorKind::UnknownBundle);
    }

    #[test]
    fn failed_reload_keeps_previous_snapshot() {
        let mut store = ContentStore::from_json(READING_ONLY, reading_options()).unwrap();
        let before = store.snapshot();

        let err = store.reload("{}").unwrap_err();
        assert_eq!(err.kind(), ContentErrorKind::MissingSection);
        assert_eq!(*store.snapshot(), *before);
    }

    #[test]
    fn reload_does_not_disturb_held_snapshots() {
        let mut store = ContentStore::from_json(READING_ONLY, reading_options()).unwrap();
        let held = store.snapshot();

        let replacement = READING_ONLY.replace("\"P1\"", "\"P9\"");
        store.reload(&replacement).unwrap();

        let key = ContentKey::Reading(Module::Academic);
        assert_eq!(held.subjects_for(key)[0].id, "P1");
        assert_eq!(store.subjects_for(key)[0].id, "P9");
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ContentStore::from_path(dir.path().join("absent.json"), reading_options())
            .unwrap_err();
        assert_eq!(err.kind(), ContentErrorKind::Io);
    }

    #[test]
    fn loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subjects.json");
        std::fs::write(&path, READING_ONLY).unwrap();
        let store = ContentStore::from_path(&path, reading_options()).unwrap();
        assert_eq!(store.snapshot().subject_count(), 1);
    }
}
