//! The file tray: whatever the user drops on the window, held for the
//! session. Identity is the path; a second drop of the same path is
//! ignored. Sizes are read on first display, not at drop time, and a file
//! that has vanished keeps its entry with the size unknown.

use std::fs;
use std::path::{Path, PathBuf};

use crate::next_record_id;
use crate::script;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrayFile {
    pub id: u64,
    pub name: String,
    pub path: PathBuf,
    size: Option<u64>,
    size_checked: bool,
}

impl TrayFile {
    pub fn new(path: PathBuf) -> Self {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            id: next_record_id(),
            name,
            path,
            size: None,
            size_checked: false,
        }
    }

    /// Byte size, resolved lazily and cached. `None` once resolution has
    /// failed (file gone, unreadable).
    pub fn size(&mut self) -> Option<u64> {
        if !self.size_checked {
            self.size_checked = true;
            self.size = fs::metadata(&self.path).ok().map(|meta| meta.len());
        }
        self.size
    }
}

pub fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

pub fn open(file: &TrayFile) {
    log::info!("tray: opening {}", file.name);
    script::open_path(&file.path);
}

#[derive(Debug, Default)]
pub struct TrayManager {
    files: Vec<TrayFile>,
}

impl TrayManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn files(&self) -> &[TrayFile] {
        &self.files
    }

    /// Render-time access; sizing needs `&mut` for the lazy fill.
    pub fn files_mut(&mut self) -> &mut [TrayFile] {
        &mut self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Appends unless the path is already held. Returns true when appended.
    pub fn add(&mut self, path: impl Into<PathBuf>) -> bool {
        let path = path.into();
        if self.files.iter().any(|file| file.path == path) {
            return false;
        }
        self.files.push(TrayFile::new(path));
        true
    }

    /// Idempotent: removing an id that is not held is a no-op.
    pub fn remove(&mut self, id: u64) -> bool {
        let before = self.files.len();
        self.files.retain(|file| file.id != id);
        self.files.len() != before
    }

    pub fn clear(&mut self) -> bool {
        if self.files.is_empty() {
            return false;
        }
        self.files.clear();
        true
    }

    pub fn holds(&self, path: &Path) -> bool {
        self.files.iter().any(|file| file.path == path)
    }
}
