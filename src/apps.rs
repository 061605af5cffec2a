//! Launcher grid data: `.app` bundles enumerated from the usual application
//! directories. Missing directories are skipped, an empty scan falls back to
//! the sample entries, and launching goes through the system `open` handler.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::thread;

use crate::next_record_id;
use crate::script;

pub const APP_SUFFIX: &str = ".app";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppEntry {
    pub id: u64,
    pub name: String,
    pub bundle_id: String,
    pub path: PathBuf,
}

impl AppEntry {
    pub fn new(
        name: impl Into<String>,
        bundle_id: impl Into<String>,
        path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            id: next_record_id(),
            name: name.into(),
            bundle_id: bundle_id.into(),
            path: path.into(),
        }
    }
}

/// The fixed scan list, plus the per-user applications folder when the home
/// directory is known.
pub fn default_app_directories() -> Vec<PathBuf> {
    let mut roots = vec![
        PathBuf::from("/Applications"),
        PathBuf::from("/System/Applications"),
        PathBuf::from("/Applications/Utilities"),
    ];
    if let Some(home) = dirs::home_dir() {
        roots.push(home.join("Applications"));
    }
    roots
}

/// Non-recursive enumeration of `.app` entries under each root, sorted by
/// name. Unreadable roots are skipped.
pub fn discover_apps(roots: &[PathBuf]) -> Vec<AppEntry> {
    let mut found = Vec::new();
    for root in roots {
        let entries = match fs::read_dir(root) {
            Ok(entries) => entries,
            Err(err) => {
                log::debug!("apps: skipping {}: {err}", root.display());
                continue;
            }
        };
        for entry in entries.flatten() {
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            let Some(stem) = name.strip_suffix(APP_SUFFIX) else {
                continue;
            };
            let path = entry.path();
            let bundle_id =
                read_bundle_identifier(&path).unwrap_or_else(|| fallback_bundle_id(stem));
            found.push(AppEntry {
                id: next_record_id(),
                name: stem.to_string(),
                bundle_id,
                path,
            });
        }
    }
    found.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
    found
}

/// Best-effort CFBundleIdentifier from a bundle's Info.plist. Only the XML
/// form is readable this way; binary plists (and anything else odd) yield
/// `None` and the caller falls back to a name-derived slug.
pub fn read_bundle_identifier(app_path: &Path) -> Option<String> {
    let plist_path = app_path.join("Contents").join("Info.plist");
    let text = fs::read_to_string(plist_path).ok()?;
    let key_pos = text.find("<key>CFBundleIdentifier</key>")?;
    let rest = &text[key_pos..];
    let open = rest.find("<string>")? + "<string>".len();
    let close = rest[open..].find("</string>")? + open;
    let value = rest[open..close].trim();
    (!value.is_empty()).then(|| value.to_string())
}

pub fn fallback_bundle_id(name: &str) -> String {
    let slug: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();
    format!("local.{}", slug.trim_matches('-'))
}

pub fn sample_apps() -> Vec<AppEntry> {
    vec![
        AppEntry::new(
            "System Settings",
            "com.apple.systempreferences",
            "/System/Applications/System Settings.app",
        ),
        AppEntry::new(
            "Activity Monitor",
            "com.apple.ActivityMonitor",
            "/System/Applications/Utilities/Activity Monitor.app",
        ),
        AppEntry::new(
            "Calculator",
            "com.apple.calculator",
            "/System/Applications/Calculator.app",
        ),
    ]
}

/// Case-insensitive substring filter; a blank query keeps everything.
pub fn filter_apps<'a>(apps: &'a [AppEntry], query: &str) -> Vec<&'a AppEntry> {
    let query = query.trim();
    if query.is_empty() {
        return apps.iter().collect();
    }
    let needle = query.to_lowercase();
    apps.iter()
        .filter(|app| app.name.to_lowercase().contains(&needle))
        .collect()
}

pub fn launch(entry: &AppEntry) {
    log::info!("apps: launching {} ({})", entry.name, entry.bundle_id);
    script::open_path(&entry.path);
}

pub struct AppsManager {
    roots: Vec<PathBuf>,
    apps: Vec<AppEntry>,
    pending: Option<Receiver<Vec<AppEntry>>>,
}

impl AppsManager {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self {
            roots,
            apps: Vec::new(),
            pending: None,
        }
    }

    pub fn apps(&self) -> &[AppEntry] {
        &self.apps
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// Rescans off-thread; an empty scan falls back to the sample entries.
    pub fn load(&mut self) {
        let roots = self.roots.clone();
        let (tx, rx) = mpsc::channel();
        self.pending = Some(rx);
        thread::spawn(move || {
            let discovered = discover_apps(&roots);
            let apps = if discovered.is_empty() {
                sample_apps()
            } else {
                discovered
            };
            let _ = tx.send(apps);
        });
    }

    /// Drains a finished scan, if any. Returns true when the list changed.
    pub fn poll(&mut self) -> bool {
        let Some(rx) = &self.pending else {
            return false;
        };
        let mut replaced = None;
        while let Ok(apps) = rx.try_recv() {
            replaced = Some(apps);
        }
        match replaced {
            Some(apps) => {
                log::info!("apps: found {} applications", apps.len());
                self.apps = apps;
                self.pending = None;
                true
            }
            None => false,
        }
    }

    /// Idempotent: removing an id that is not held is a no-op.
    pub fn remove(&mut self, id: u64) -> bool {
        let before = self.apps.len();
        self.apps.retain(|app| app.id != id);
        self.apps.len() != before
    }

    pub fn clear(&mut self) -> bool {
        if self.apps.is_empty() {
            return false;
        }
        self.apps.clear();
        true
    }
}
