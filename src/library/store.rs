use super::recording::Recording;
use super::RecordingSource;
use crate::audio;
use crate::error::LibraryError;
use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Id of the built-in chant sound
pub const CHANT_RECORDING_ID: &str = "default-meditation";

/// Shortest clip accepted into the library
pub const MIN_CLIP_DURATION: Duration = Duration::from_millis(500);

/// Longest clip accepted into the library
pub const MAX_CLIP_DURATION: Duration = Duration::from_secs(3 * 60);

const BUILTIN_SOUNDS: [(&str, &str, &str); 2] = [
    (CHANT_RECORDING_ID, "Om Chant Meditation", "Om-chant.aac"),
    (
        "tibetan-bowl",
        "Tibetan Singing Bowl Meditation",
        "tibetan-bowl.aac",
    ),
];

/// Recording library: built-in sounds followed by user recordings
///
/// User recordings are persisted as a JSON array at `index_path`.
pub struct RecordingLibrary {
    index_path: PathBuf,
    /// When set, only clips under this directory can be imported
    import_dir: Option<PathBuf>,
    recordings: RwLock<Vec<Recording>>,
}

impl RecordingLibrary {
    /// Open the library, loading user recordings from `index_path`
    ///
    /// A missing index file is an empty library.
    pub fn open(
        index_path: impl Into<PathBuf>,
        defaults: Vec<Recording>,
    ) -> Result<Self, LibraryError> {
        let index_path = index_path.into();

        let user_recordings: Vec<Recording> = match fs::read(&index_path) {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        info!(
            "Recording library loaded: {} built-in, {} user ({})",
            defaults.len(),
            user_recordings.len(),
            index_path.display()
        );

        let mut recordings = defaults;
        recordings.extend(user_recordings.into_iter().map(|mut r| {
            r.is_default = false;
            r
        }));

        Ok(Self {
            index_path,
            import_dir: None,
            recordings: RwLock::new(recordings),
        })
    }

    /// Confine imports to clips under `dir`
    ///
    /// Relative import paths are resolved against `dir`.
    pub fn with_import_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.import_dir = Some(dir.into());
        self
    }

    /// Built-in sounds resolved under `sounds_dir`
    ///
    /// Durations are probed when the file is readable and left at 0 otherwise.
    pub fn builtin_defaults(sounds_dir: &Path) -> Vec<Recording> {
        BUILTIN_SOUNDS
            .iter()
            .map(|(id, name, file)| {
                let path = sounds_dir.join(file);
                let duration = match audio::probe(&path) {
                    Ok(info) => info.duration_ms(),
                    Err(e) => {
                        debug!("Built-in sound {} not probed: {:#}", id, e);
                        0
                    }
                };

                Recording {
                    id: id.to_string(),
                    name: name.to_string(),
                    uri: path.display().to_string(),
                    duration,
                    created_at: 0,
                    is_default: true,
                }
            })
            .collect()
    }

    pub fn list(&self) -> Vec<Recording> {
        self.read().clone()
    }

    /// Import a clip from disk as a new user recording
    ///
    /// With an import directory set, `path` must resolve to a file inside it.
    pub fn import(&self, path: impl AsRef<Path>) -> Result<Recording, LibraryError> {
        let resolved = self.resolve_import(path.as_ref())?;
        let path = resolved.as_path();
        let info = audio::probe(path)?;

        if info.duration < MIN_CLIP_DURATION {
            return Err(LibraryError::InvalidClip(format!(
                "{} is {}ms long, minimum is {}ms",
                path.display(),
                info.duration_ms(),
                MIN_CLIP_DURATION.as_millis()
            )));
        }
        if info.duration > MAX_CLIP_DURATION {
            return Err(LibraryError::InvalidClip(format!(
                "{} is {}ms long, maximum is {}ms",
                path.display(),
                info.duration_ms(),
                MAX_CLIP_DURATION.as_millis()
            )));
        }

        let uri = fs::canonicalize(path)?.display().to_string();

        let mut recordings = self.write();
        let created_at = Utc::now().timestamp_millis();

        // Ids are creation timestamps; bump past any import in the same millisecond
        let mut id_ms = created_at;
        while recordings.iter().any(|r| r.id == id_ms.to_string()) {
            id_ms += 1;
        }

        let user_count = recordings.iter().filter(|r| !r.is_default).count();
        let recording = Recording {
            id: id_ms.to_string(),
            name: format!("Your Recording {}", user_count + 1),
            uri,
            duration: info.duration_ms(),
            created_at,
            is_default: false,
        };

        recordings.push(recording.clone());
        if let Err(e) = self.persist(&recordings) {
            recordings.pop();
            return Err(e);
        }

        info!(
            "Imported recording {} ({}, {}ms)",
            recording.id, recording.name, recording.duration
        );

        Ok(recording)
    }

    /// Delete a user recording
    pub fn delete(&self, id: &str) -> Result<(), LibraryError> {
        let mut recordings = self.write();

        let index = recordings
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| LibraryError::NotFound(id.to_string()))?;

        if recordings[index].is_default {
            return Err(LibraryError::DefaultRecording(id.to_string()));
        }

        let removed = recordings.remove(index);
        if let Err(e) = self.persist(&recordings) {
            recordings.insert(index, removed);
            return Err(e);
        }

        info!("Deleted recording {}", id);
        Ok(())
    }

    /// Resolve an import path against the import directory, if any
    ///
    /// Missing files and files outside the directory yield the same error.
    fn resolve_import(&self, path: &Path) -> Result<PathBuf, LibraryError> {
        let Some(import_dir) = &self.import_dir else {
            return Ok(path.to_path_buf());
        };

        let root = fs::canonicalize(import_dir)?;
        fs::canonicalize(root.join(path))
            .ok()
            .filter(|resolved| resolved.starts_with(&root) && resolved.is_file())
            .ok_or_else(|| LibraryError::NotImportable(path.display().to_string()))
    }

    fn persist(&self, recordings: &[Recording]) -> Result<(), LibraryError> {
        let user_recordings: Vec<&Recording> =
            recordings.iter().filter(|r| !r.is_default).collect();

        if let Some(parent) = self.index_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_vec_pretty(&user_recordings)?;
        fs::write(&self.index_path, json).inspect_err(|e| {
            warn!(
                "Failed to write recording index {}: {}",
                self.index_path.display(),
                e
            )
        })?;

        Ok(())
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Recording>> {
        self.recordings
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Recording>> {
        self.recordings
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl RecordingSource for RecordingLibrary {
    fn find_by_id(&self, id: &str) -> Option<Recording> {
        self.read().iter().find(|r| r.id == id).cloned()
    }
}
