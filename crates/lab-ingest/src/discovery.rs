//! Input file discovery for batch runs.

use std::path::{Path, PathBuf};

use crate::error::{IngestError, Result};

/// Lists all CSV files in a directory.
///
/// Returns files sorted by filename. Subdirectories are not searched.
pub fn list_csv_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(IngestError::DirectoryNotFound {
            path: dir.to_path_buf(),
        });
    }

    let mut files = Vec::new();

    let entries = std::fs::read_dir(dir).map_err(|e| IngestError::DirectoryRead {
        path: dir.to_path_buf(),
        source: e,
    })?;

    for entry_result in entries {
        let entry = entry_result.map_err(|e| IngestError::DirectoryRead {
            path: dir.to_path_buf(),
            source: e,
        })?;

        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        // Check for .csv extension (case-insensitive)
        let is_csv = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

        // Skip outputs written by a previous run into the same folder
        if is_csv && !is_generated_output(&path) {
            files.push(path);
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    Ok(files)
}

/// Output files carry a `_structured` or `_reshaped_` marker in their stem.
pub fn is_generated_output(path: &Path) -> bool {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .is_some_and(|stem| stem.ends_with("_structured") || stem.contains("_reshaped_"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        for name in &[
            "plate_b.csv",
            "Plate_A.CSV",
            "notes.txt",
            "plate_b_structured.csv",
        ] {
            std::fs::write(dir.path().join(name), "header\ndata").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.csv")).unwrap();
        dir
    }

    #[test]
    fn test_list_csv_files() {
        let dir = create_test_dir();
        let files = list_csv_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["Plate_A.CSV", "plate_b.csv"]);
    }

    #[test]
    fn test_list_csv_files_empty_dir() {
        let dir = TempDir::new().unwrap();
        assert!(list_csv_files(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_list_csv_files_not_a_directory() {
        let dir = TempDir::new().unwrap();
        let file_path = dir.path().join("test.csv");
        std::fs::write(&file_path, "data").unwrap();

        let result = list_csv_files(&file_path);
        assert!(matches!(result, Err(IngestError::DirectoryNotFound { .. })));
    }
}
