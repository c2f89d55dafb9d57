//! Person-list persistence
//!
//! The store treats storage as infallible and local: implementations log and
//! swallow their own failures.

use kin_model::Person;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const PERSONS_FILE: &str = "persons.json";
const TREE_NAME_FILE: &str = "tree_name.txt";

/// Key-value persistence for the current tree
#[cfg_attr(test, mockall::automock)]
pub trait PersonStorage: Send + Sync {
    /// Replace the persisted person list
    fn save(&self, persons: &[Person]);

    /// Persisted person list, empty when nothing was saved
    fn load(&self) -> Vec<Person>;

    /// Forget the person list and the tree name
    fn clear(&self);

    /// Replace the persisted tree name
    fn save_name(&self, name: &str);

    /// Persisted tree name, empty when nothing was saved
    fn load_name(&self) -> String;
}

/// Process-local storage
#[derive(Debug, Default)]
pub struct MemoryStorage {
    persons: Mutex<Vec<Person>>,
    name: Mutex<String>,
}

impl MemoryStorage {
    /// Create empty storage
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl PersonStorage for MemoryStorage {
    fn save(&self, persons: &[Person]) {
        *self.persons.lock() = persons.to_vec();
    }

    fn load(&self) -> Vec<Person> {
        self.persons.lock().clone()
    }

    fn clear(&self) {
        self.persons.lock().clear();
        self.name.lock().clear();
    }

    fn save_name(&self, name: &str) {
        *self.name.lock() = name.to_string();
    }

    fn load_name(&self) -> String {
        self.name.lock().clone()
    }
}

/// Storage in a directory: `persons.json` plus `tree_name.txt`
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    dir: PathBuf,
}

impl JsonFileStorage {
    /// Storage rooted at `dir`; the directory is created on first save
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Storage directory
    #[inline]
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn write(&self, file: &str, contents: &[u8]) {
        let path = self.dir.join(file);
        let result = std::fs::create_dir_all(&self.dir).and_then(|()| std::fs::write(&path, contents));
        match result {
            Ok(()) => debug!(path = %path.display(), bytes = contents.len(), "saved"),
            Err(e) => warn!(path = %path.display(), error = %e, "failed to save"),
        }
    }

    fn remove(&self, file: &str) {
        let path = self.dir.join(file);
        if let Err(e) = std::fs::remove_file(&path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %path.display(), error = %e, "failed to remove");
            }
        }
    }
}

impl PersonStorage for JsonFileStorage {
    fn save(&self, persons: &[Person]) {
        match serde_json::to_vec(persons) {
            Ok(bytes) => self.write(PERSONS_FILE, &bytes),
            Err(e) => warn!(error = %e, "failed to serialize persons"),
        }
    }

    fn load(&self) -> Vec<Person> {
        let path = self.dir.join(PERSONS_FILE);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read persons");
                return Vec::new();
            }
        };
        serde_json::from_slice(&bytes).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "ignoring unreadable persons file");
            Vec::new()
        })
    }

    fn clear(&self) {
        self.remove(PERSONS_FILE);
        self.remove(TREE_NAME_FILE);
    }

    fn save_name(&self, name: &str) {
        self.write(TREE_NAME_FILE, name.as_bytes());
    }

    fn load_name(&self) -> String {
        std::fs::read_to_string(self.dir.join(TREE_NAME_FILE)).unwrap_or_default()
    }
}
