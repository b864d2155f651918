use std::{io::ErrorKind, path::PathBuf};

use shuttle_domain::{ServiceError, ServiceResult, auth::SessionStore};

/// Keeps the sealed session token in a single file.
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn io_error(&self, action: &str, e: std::io::Error) -> ServiceError {
        ServiceError::Internal(format!(
            "Failed to {} session file {}: {}",
            action,
            self.path.display(),
            e
        ))
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> ServiceResult<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => {
                let sealed = contents.trim();
                Ok((!sealed.is_empty()).then(|| sealed.to_string()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.io_error("read", e)),
        }
    }

    fn save(&self, sealed: &str) -> ServiceResult<()> {
        std::fs::write(&self.path, sealed).map_err(|e| self.io_error("write", e))
    }

    fn clear(&self) -> ServiceResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error("remove", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_and_clear() {
        let path = std::env::temp_dir().join(format!("shuttle-session-{}", uuid::Uuid::new_v4()));
        let store = FileSessionStore::new(path.clone());
        assert_eq!(store.load().unwrap(), None);

        store.save("sealed-token").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("sealed-token"));

        store.clear().unwrap();
        assert!(!path.exists());
        store.clear().unwrap();
    }
}
