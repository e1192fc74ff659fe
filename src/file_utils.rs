use anyhow::{Result, Context};
use chrono::Local;
use log::warn;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

// @module: File and directory utilities

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path)
                .with_context(|| format!("Failed to create directory: {:?}", path))?;
        }
        Ok(())
    }

    /// Read a file to a string
    pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
        fs::read_to_string(&path)
            .with_context(|| format!("Failed to read file: {:?}", path.as_ref()))
    }

    /// Write a string to a file
    pub fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        // Ensure the parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                Self::ensure_dir(parent)?;
            }
        }

        fs::write(&path, content)
            .with_context(|| format!("Failed to write to file: {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Remove a temporary file, logging instead of failing.
    ///
    /// Returns whether the file is gone afterwards.
    pub fn remove_quietly<P: AsRef<Path>>(path: P) -> bool {
        let path = path.as_ref();
        match fs::remove_file(path) {
            Ok(()) => true,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
            Err(e) => {
                warn!("Failed to remove temporary file {:?}: {}", path, e);
                false
            }
        }
    }

    // @generates: Unique-ish path in dir, e.g. <dir>/1529519279001-part-0.mp4
    pub fn stamped_path<P: AsRef<Path>>(dir: P, suffix: &str) -> PathBuf {
        let stamp = Local::now().timestamp_millis();
        dir.as_ref().join(format!("{}{}", stamp, suffix))
    }

    /// Find files directly in `dir` whose name starts with `prefix` and ends with `extension`
    pub fn find_files_with_prefix<P: AsRef<Path>>(dir: P, prefix: &str, extension: &str) -> Result<Vec<PathBuf>> {
        let mut result = Vec::new();
        let extension = extension.trim_start_matches('.');

        for entry in WalkDir::new(dir.as_ref()).max_depth(1) {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let name = entry.file_name().to_string_lossy();
            let ext_matches = path
                .extension()
                .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case(extension));
            if name.starts_with(prefix) && ext_matches {
                result.push(path.to_path_buf());
            }
        }

        result.sort();
        Ok(result)
    }
}
