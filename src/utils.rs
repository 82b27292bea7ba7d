// ABOUTME: Path helpers for the slide-deck application
// ABOUTME: Validates deck roots and output locations before work starts

use crate::errors::{DeckError, Result};
use log::warn;
use std::path::{Path, PathBuf};

/// Validate that a file exists
pub fn validate_file_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(DeckError::PathNotFoundError(path.to_path_buf()));
    }
    if !path.is_file() {
        return Err(DeckError::ValidationError(format!(
            "Path is not a file: {:?}",
            path
        )));
    }
    Ok(())
}

/// Validate that a deck root exists and is a directory
pub fn validate_directory_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(DeckError::PathNotFoundError(path.to_path_buf()));
    }
    if !path.is_dir() {
        return Err(DeckError::ValidationError(format!(
            "Path is not a directory: {:?}",
            path
        )));
    }
    Ok(())
}

/// Ensure a directory exists, creating it if necessary
pub fn ensure_directory_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    } else if !path.is_dir() {
        return Err(DeckError::ValidationError(format!(
            "Path exists but is not a directory: {:?}",
            path
        )));
    }
    Ok(())
}

/// Ensure the directory an output file goes into exists
pub fn ensure_parent_directory_exists(file_path: &Path) -> Result<()> {
    match file_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => ensure_directory_exists(parent),
        _ => Ok(()),
    }
}

/// Check that files can be created in `path` by writing and removing a probe file
pub fn validate_directory_writable(path: &Path) -> Result<()> {
    ensure_directory_exists(path)?;

    let probe = path.join(format!(".slide-deck-{}.tmp", uuid::Uuid::new_v4()));
    match std::fs::File::create(&probe) {
        Ok(_) => {
            if let Err(e) = std::fs::remove_file(&probe) {
                warn!("Failed to clean up probe file {:?}: {}", probe, e);
            }
            Ok(())
        }
        Err(e) => Err(DeckError::ValidationError(format!(
            "Directory is not writable: {:?} - {}",
            path, e
        ))),
    }
}

/// Get the absolute path
pub fn get_absolute_path(path: &Path) -> Result<PathBuf> {
    std::fs::canonicalize(path).map_err(|e| {
        DeckError::ValidationError(format!("Failed to get absolute path for {:?}: {}", path, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn parent_of_bare_file_name_is_fine() {
        assert!(ensure_parent_directory_exists(Path::new("export.pdf")).is_ok());
    }

    #[test]
    fn creates_missing_output_directories() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("out/nested/deck.pdf");
        ensure_parent_directory_exists(&output).unwrap();
        assert!(dir.path().join("out/nested").is_dir());
        validate_directory_writable(&dir.path().join("out")).unwrap();
    }

    #[test]
    fn file_is_not_a_directory() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("index.html");
        std::fs::write(&file, "<html></html>").unwrap();

        assert!(validate_file_exists(&file).is_ok());
        assert!(matches!(
            validate_directory_exists(&file),
            Err(DeckError::ValidationError(_))
        ));
        assert!(matches!(
            validate_file_exists(&dir.path().join("missing.html")),
            Err(DeckError::PathNotFoundError(_))
        ));
    }
}
