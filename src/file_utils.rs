use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::subtitle_processor::NATIVE_HEADER;

// @module: File and directory utilities

// @const: Common video containers ffmpeg reads
const VIDEO_EXTENSIONS: [&str; 14] = [
    "mp4", "mkv", "avi", "mov", "wmv", "flv", "webm", "m4v",
    "mpg", "mpeg", "ogv", "ts", "mts", "m2ts",
];

// @const: Bytes inspected when the extension is not conclusive
const SNIFF_BYTES: u64 = 64;

// @const: Suffix added to preview renders
const PREVIEW_SUFFIX: &str = "_debug";

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.as_os_str().is_empty() && !path.exists() {
            fs::create_dir_all(path)
                .with_context(|| format!("Failed to create directory: {}", path.display()))?;
        }
        Ok(())
    }

    /// Read a file to a string
    pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
        fs::read_to_string(&path)
            .with_context(|| format!("Failed to read file: {:?}", path.as_ref()))
    }

    /// Write a string to a file atomically.
    ///
    /// The content goes to a temporary file next to the target which is then
    /// renamed over it, so a failed write never leaves a truncated output.
    pub fn write_atomic<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        let path = path.as_ref();
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        Self::ensure_dir(&parent)?;

        let mut temp = NamedTempFile::new_in(&parent)
            .with_context(|| format!("Failed to create temporary file in: {}", parent.display()))?;
        temp.write_all(content.as_bytes())
            .with_context(|| format!("Failed to write to file: {:?}", path))?;
        temp.as_file()
            .sync_all()
            .with_context(|| format!("Failed to flush file: {:?}", path))?;
        temp.persist(path)
            .with_context(|| format!("Failed to move output into place: {:?}", path))?;

        Ok(())
    }

    /// Remove a file if present, reporting whether something was deleted
    pub fn remove_if_exists<P: AsRef<Path>>(path: P) -> Result<bool> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(path).with_context(|| format!("Failed to remove file: {:?}", path))?;
        Ok(true)
    }

    /// Output path of a preview render: `clip.mp4` becomes `clip_debug.mp4`
    pub fn preview_output_path<P: AsRef<Path>>(output: P) -> PathBuf {
        let output = output.as_ref();
        let stem = output.file_stem().unwrap_or_default().to_string_lossy();

        let mut file_name = format!("{}{}", stem, PREVIEW_SUFFIX);
        if let Some(ext) = output.extension() {
            file_name.push('.');
            file_name.push_str(&ext.to_string_lossy());
        }

        output.with_file_name(file_name)
    }

    /// Detect whether a file is a native subtitle, an overlay script or a video
    pub fn detect_file_type<P: AsRef<Path>>(path: P) -> Result<FileType> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(anyhow::anyhow!("File does not exist: {:?}", path));
        }

        if let Some(ext) = path.extension() {
            let ext_str = ext.to_string_lossy().to_lowercase();

            match ext_str.as_str() {
                "vtt" => return Ok(FileType::Subtitle),
                "ass" => return Ok(FileType::OverlayScript),
                _ if VIDEO_EXTENSIONS.contains(&ext_str.as_str()) => return Ok(FileType::Video),
                _ => {}
            }
        }

        // Fall back to examining the first bytes of the file
        let prefix = Self::read_prefix(path, SNIFF_BYTES)?;
        let content = String::from_utf8_lossy(&prefix);
        let content = content.trim_start_matches('\u{feff}');
        if content.starts_with(NATIVE_HEADER) {
            return Ok(FileType::Subtitle);
        }
        if content.starts_with("[Script Info]") {
            return Ok(FileType::OverlayScript);
        }

        Ok(FileType::Unknown)
    }

    /// Read at most `limit` bytes from the start of a file
    fn read_prefix(path: &Path, limit: u64) -> Result<Vec<u8>> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open file: {:?}", path))?;
        let mut prefix = Vec::with_capacity(limit as usize);
        file.take(limit)
            .read_to_end(&mut prefix)
            .with_context(|| format!("Failed to read file: {:?}", path))?;
        Ok(prefix)
    }
}

/// Enum representing different file types
#[derive(Debug, PartialEq, Eq)]
pub enum FileType {
    /// Native subtitle file (WebVTT)
    Subtitle,
    /// Overlay script (ASS)
    OverlayScript,
    /// Video file supported by ffmpeg
    Video,
    /// Unknown file type
    Unknown,
}
