//! # Reconciliation
//!
//! Pure diffing between a local directory and the contents of a remote
//! album. Nothing here talks to the network; callers pass in freshly fetched
//! remote state.
//!
//! A local file and a remote photo are the same photo when the file's
//! *title key* (`{directory name}{separator}{file stem}`) equals the remote
//! title. Two files whose keys collide are indistinguishable to these
//! functions.

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use bridge_traits::RemoteRecord;
use core_runtime::config::UploaderConfig;
use serde::Serialize;

/// Derives photoset titles and photo title keys from local paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleScheme {
    separator: String,
    photoset: Option<String>,
}

impl Default for TitleScheme {
    fn default() -> Self {
        Self::new(core_runtime::config::DEFAULT_TITLE_SEPARATOR)
    }
}

impl TitleScheme {
    pub fn new(separator: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
            photoset: None,
        }
    }

    /// Scheme whose title keys use `title` as the album part instead of the
    /// file's parent directory name.
    pub fn for_photoset(&self, title: impl Into<String>) -> Self {
        Self {
            separator: self.separator.clone(),
            photoset: Some(title.into()),
        }
    }

    pub fn from_config(config: &UploaderConfig) -> Self {
        Self::new(config.title_separator.clone())
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// Photoset title for a resolved directory: its last path component.
    ///
    /// `None` for paths without one (`/`, or unresolved `.` and `..`).
    pub fn photoset_title_for_directory(&self, directory: &Path) -> Option<String> {
        directory
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
    }

    /// Title key of a local file.
    ///
    /// ```
    /// use core_batch::reconcile::TitleScheme;
    /// use std::path::Path;
    ///
    /// let scheme = TitleScheme::default();
    /// assert_eq!(scheme.title_key(Path::new("/pics/Lisbon/IMG_7.jpg")), "Lisbon - IMG_7");
    /// ```
    pub fn title_key(&self, file: &Path) -> String {
        let album = match &self.photoset {
            Some(title) => Cow::Borrowed(title.as_str()),
            None => file
                .parent()
                .and_then(Path::file_name)
                .map(|name| name.to_string_lossy())
                .unwrap_or_default(),
        };
        let stem = file
            .file_stem()
            .map(|stem| stem.to_string_lossy())
            .unwrap_or_default();
        format!("{}{}{}", album, self.separator, stem)
    }
}

/// Local files with no remote photo of the same title, in local order.
pub fn compute_missing(
    scheme: &TitleScheme,
    local_files: &[PathBuf],
    remote: &[RemoteRecord],
) -> Vec<PathBuf> {
    let present: HashSet<&str> = remote.iter().map(|record| record.title.as_str()).collect();
    local_files
        .iter()
        .filter(|file| !present.contains(scheme.title_key(file).as_str()))
        .cloned()
        .collect()
}

/// Title keys of local files still absent from the remote titles.
pub fn compute_leftovers(
    scheme: &TitleScheme,
    local_files: &[PathBuf],
    remote_titles: &[String],
) -> Vec<String> {
    let present: HashSet<&str> = remote_titles.iter().map(String::as_str).collect();
    local_files
        .iter()
        .map(|file| scheme.title_key(file))
        .filter(|key| !present.contains(key.as_str()))
        .collect()
}

/// Titles that occur more than once, with their count, in first-seen order.
pub fn compute_duplicate_titles(remote_titles: &[String]) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut order = Vec::new();
    for title in remote_titles {
        let count = counts.entry(title.as_str()).or_insert(0);
        if *count == 0 {
            order.push(title.as_str());
        }
        *count += 1;
    }

    order
        .into_iter()
        .filter_map(|title| {
            let count = counts[title];
            (count > 1).then(|| (title.to_string(), count))
        })
        .collect()
}

/// Post-run diagnostics. Reported, never acted on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuditReport {
    pub leftovers: Vec<String>,
    pub duplicates: Vec<(String, usize)>,
}

impl AuditReport {
    pub fn is_clean(&self) -> bool {
        self.leftovers.is_empty() && self.duplicates.is_empty()
    }
}

/// Audit a local directory listing against freshly fetched album contents.
pub fn audit(scheme: &TitleScheme, local_files: &[PathBuf], remote: &[RemoteRecord]) -> AuditReport {
    let titles: Vec<String> = remote.iter().map(|record| record.title.clone()).collect();
    AuditReport {
        leftovers: compute_leftovers(scheme, local_files, &titles),
        duplicates: compute_duplicate_titles(&titles),
    }
}
