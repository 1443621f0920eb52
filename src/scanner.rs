//! Discovery of route manifest files.

use anyhow::Result;
use log::warn;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// File extensions recognised as route manifests
pub const MANIFEST_EXTENSIONS: [&str; 3] = ["yaml", "yml", "json"];

/// Recursively collects manifest files below a root directory.
pub struct FileScanner {
    root_path: PathBuf,
}

/// Manifest files found by a scan, in file name order
pub struct ScanResult {
    pub manifest_files: Vec<PathBuf>,
    pub warnings: Vec<String>,
}

/// Checks whether a path has a manifest extension.
///
/// # Arguments
///
/// * `path` - File path to check; the extension is compared case-insensitively
///
/// # Returns
///
/// Returns `true` for `.yaml`, `.yml` and `.json` files.
pub fn is_manifest_file(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| MANIFEST_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

impl FileScanner {
    /// Creates a scanner rooted at a directory.
    ///
    /// # Arguments
    ///
    /// * `root_path` - Directory to search recursively
    pub fn new(root_path: PathBuf) -> Self {
        Self { root_path }
    }

    /// Walks the root, skipping hidden and `target` directories.
    ///
    /// Entries that cannot be read are recorded as warnings rather than failing the scan.
    ///
    /// # Returns
    ///
    /// Returns a [`ScanResult`] with manifest paths in file name order (directories are
    /// visited depth-first) and any warnings collected along the way.
    ///
    /// # Errors
    ///
    /// Currently always succeeds; the `Result` leaves room for fatal walk errors.
    pub fn scan(&self) -> Result<ScanResult> {
        let mut manifest_files = Vec::new();
        let mut warnings = Vec::new();

        for entry in WalkDir::new(&self.root_path)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                if e.path() == self.root_path {
                    return true;
                }

                let file_name = e.file_name().to_string_lossy();
                !file_name.starts_with('.') && file_name != "target"
            })
        {
            match entry {
                Ok(entry) => {
                    let path = entry.path();
                    if path.is_file() && is_manifest_file(path) {
                        manifest_files.push(path.to_path_buf());
                    }
                }
                Err(e) => {
                    let warning = format!("Failed to access path: {}", e);
                    warn!("{}", warning);
                    warnings.push(warning);
                }
            }
        }

        Ok(ScanResult {
            manifest_files,
            warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn file_names(result: &ScanResult) -> Vec<String> {
        result
            .manifest_files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect()
    }

    #[test]
    fn test_scan_filters_non_manifest_files() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::write(root.join("routes.yaml"), "resources: []").unwrap();
        fs::write(root.join("extra.JSON"), "{}").unwrap();
        fs::write(root.join("readme.md"), "# README").unwrap();
        fs::write(root.join("main.rs"), "fn main() {}").unwrap();

        let result = FileScanner::new(root.to_path_buf()).scan().unwrap();

        assert!(result.warnings.is_empty());
        assert_eq!(file_names(&result), vec!["extra.JSON", "routes.yaml"]);
    }

    #[test]
    fn test_scan_nested_directories_in_name_order() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::create_dir_all(root.join("b/inner")).unwrap();
        fs::create_dir(root.join("a")).unwrap();
        fs::write(root.join("b/inner/z.yml"), "").unwrap();
        fs::write(root.join("a/y.yaml"), "").unwrap();
        fs::write(root.join("x.json"), "{}").unwrap();

        let result = FileScanner::new(root.to_path_buf()).scan().unwrap();

        assert_eq!(file_names(&result), vec!["y.yaml", "z.yml", "x.json"]);
    }

    #[test]
    fn test_scan_skips_hidden_and_target_directories() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::create_dir(root.join(".git")).unwrap();
        fs::create_dir(root.join("target")).unwrap();
        fs::write(root.join(".git/config.yaml"), "").unwrap();
        fs::write(root.join("target/out.json"), "{}").unwrap();
        fs::write(root.join("routes.yaml"), "").unwrap();

        let result = FileScanner::new(root.to_path_buf()).scan().unwrap();

        assert_eq!(file_names(&result), vec!["routes.yaml"]);
    }

    #[test]
    fn test_scan_empty_directory() {
        let temp_dir = TempDir::new().unwrap();
        let result = FileScanner::new(temp_dir.path().to_path_buf()).scan().unwrap();

        assert!(result.manifest_files.is_empty());
        assert!(result.warnings.is_empty());
    }
}
