use std::fs;
use std::io::Write;
use std::sync::Mutex;

use camino::{Utf8Path, Utf8PathBuf};
use directories::ProjectDirs;
use sceneit_config::SESSION_STORAGE_KEY;
use sceneit_core::Session;
use serde_json::{Map, Value};

use crate::error::StorageError;

const QUALIFIER: &str = "com";
const ORG: &str = "sceneit";
const APP: &str = "client";
const STORAGE_FILE: &str = "storage.json";

/// Holder of the authenticated session. Absence means unauthenticated.
pub trait SessionStore: Send + Sync + 'static {
    fn get(&self) -> Result<Option<Session>, StorageError>;
    fn set(&self, session: &Session) -> Result<(), StorageError>;
    fn clear(&self) -> Result<(), StorageError>;
}

/// Key-value JSON file standing in for browser local storage. The session
/// lives under [`SESSION_STORAGE_KEY`]; other keys are preserved on write.
pub struct FileSessionStore {
    path: Utf8PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `storage.json` in the platform config directory.
    pub fn in_config_dir() -> Result<Self, StorageError> {
        let proj_dirs =
            ProjectDirs::from(QUALIFIER, ORG, APP).ok_or(StorageError::NoConfigDir)?;
        let dir = Utf8PathBuf::from_path_buf(proj_dirs.config_dir().to_path_buf())
            .map_err(|p| StorageError::InvalidPath(p.to_string_lossy().into_owned()))?;
        Ok(Self::new(dir.join(STORAGE_FILE)))
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    fn read_all(&self) -> Result<Map<String, Value>, StorageError> {
        if !self.path.exists() {
            return Ok(Map::new());
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(StorageError::Corrupt(format!(
                "{} does not hold a JSON object",
                self.path
            ))),
            Err(e) => Err(StorageError::Corrupt(format!("{}: {e}", self.path))),
        }
    }

    fn write_all(&self, map: &Map<String, Value>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(map)?;
        atomic_write(&self.path, json.as_bytes())
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self) -> Result<Option<Session>, StorageError> {
        let map = self.read_all()?;
        match map.get(SESSION_STORAGE_KEY) {
            None | Some(Value::Null) => Ok(None),
            Some(v) => serde_json::from_value(v.clone())
                .map(Some)
                .map_err(|e| StorageError::Corrupt(format!("{SESSION_STORAGE_KEY}: {e}"))),
        }
    }

    fn set(&self, session: &Session) -> Result<(), StorageError> {
        let mut map = match self.read_all() {
            Ok(map) => map,
            Err(StorageError::Corrupt(reason)) => {
                tracing::warn!("Storage corrupted at {}, resetting: {}", self.path, reason);
                Map::new()
            }
            Err(e) => return Err(e),
        };
        map.insert(SESSION_STORAGE_KEY.to_string(), serde_json::to_value(session)?);
        self.write_all(&map)
    }

    fn clear(&self) -> Result<(), StorageError> {
        let mut map = match self.read_all() {
            Ok(map) => map,
            Err(StorageError::Corrupt(_)) => Map::new(),
            Err(e) => return Err(e),
        };
        map.remove(SESSION_STORAGE_KEY);
        self.write_all(&map)
    }
}

#[derive(Default)]
pub struct MemorySessionStore {
    inner: Mutex<Option<Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: Session) -> Self {
        Self {
            inner: Mutex::new(Some(session)),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self) -> Result<Option<Session>, StorageError> {
        Ok(self.inner.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    fn set(&self, session: &Session) -> Result<(), StorageError> {
        *self.inner.lock().unwrap_or_else(|e| e.into_inner()) = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        *self.inner.lock().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }
}

fn atomic_write(path: &Utf8Path, contents: &[u8]) -> Result<(), StorageError> {
    let tmp_path = Utf8PathBuf::from(format!("{path}.tmp"));

    let mut file = fs::File::create(&tmp_path)?;
    file.write_all(contents)?;
    file.sync_all()?;
    drop(file);

    match fs::rename(&tmp_path, path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
            fs::remove_file(path).ok();
            fs::rename(&tmp_path, path)?;
        }
        Err(e) => {
            fs::remove_file(&tmp_path).ok();
            return Err(e.into());
        }
    }

    Ok(())
}
