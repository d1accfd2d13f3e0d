use std::path::Path;

use crate::error::TesterError;
use crate::sandbox::Sandbox;

/// Run-scoped execution context that owns the sandbox session and file access.
pub struct ExecutionContext<S> {
    sandbox: S,
}

impl<S: Sandbox> ExecutionContext<S> {
    pub fn new(sandbox: S) -> Self {
        Self { sandbox }
    }

    pub fn sandbox(&self) -> &S {
        &self.sandbox
    }

    pub fn read_file_bytes(&self, file: &Path) -> Result<Vec<u8>, TesterError> {
        std::fs::read(file).map_err(|error| TesterError::io(file, error))
    }

    pub fn read_file_utf8(&self, file: &Path) -> Result<String, TesterError> {
        let source = self.read_file_bytes(file)?;
        String::from_utf8(source).map_err(|error| {
            TesterError::io(
                file,
                std::io::Error::new(std::io::ErrorKind::InvalidData, error),
            )
        })
    }

    /// Lists the `*.js` files directly inside `folder`, sorted by path.
    pub fn list_test_files(&self, folder: &Path) -> Result<Vec<std::path::PathBuf>, TesterError> {
        let entries = std::fs::read_dir(folder).map_err(|error| TesterError::io(folder, error))?;
        let mut files = Vec::new();
        for entry in entries {
            let path = entry.map_err(|error| TesterError::io(folder, error))?.path();
            if path.is_file() && path.extension().is_some_and(|extension| extension == "js") {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}
