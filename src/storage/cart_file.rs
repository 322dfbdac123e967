use crate::cart::CartState;
use crate::model::StorageError;
use crate::storage::CartPersistence;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

/// Carts stored as one JSON document on disk.
pub struct JsonCartFile {
    path: PathBuf,
}

impl JsonCartFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CartPersistence for JsonCartFile {
    fn load(&self) -> Result<Option<CartState>, StorageError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn save(&self, state: &CartState) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(state)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}
