//! Profile directory scanning.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::ParseError;
use crate::profile::{Profile, ProfileDecoder};

/// File extensions treated as profiles, compared case-insensitively.
const PROFILE_EXTENSIONS: [&str; 2] = ["icc", "icm"];

/// Result of a directory scan.
#[derive(Debug, Default)]
pub struct ScanReport {
    pub profiles: Vec<Profile>,
    /// Files that looked like profiles but failed to parse.
    pub failures: Vec<(PathBuf, ParseError)>,
}

fn is_profile_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                PROFILE_EXTENSIONS
                    .iter()
                    .any(|known| ext.eq_ignore_ascii_case(known))
            })
}

/// Parse every `.icc`/`.icm` file directly inside each directory.
///
/// A file that fails to parse is recorded in `failures` and the scan goes
/// on. Missing directories are skipped.
pub fn scan_profiles<P: AsRef<Path>>(decoder: &ProfileDecoder, dirs: &[P]) -> ScanReport {
    let mut report = ScanReport::default();

    for dir in dirs {
        let dir = dir.as_ref();
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) => {
                debug!(dir = %dir.display(), error = %err, "skipping profile directory");
                continue;
            }
        };

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| is_profile_file(path))
            .collect();
        paths.sort();

        for path in paths {
            match decoder.parse_from_path(&path) {
                Ok(profile) => report.profiles.push(profile),
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "failed to parse profile");
                    report.failures.push((path, err));
                }
            }
        }
    }

    debug!(
        profiles = report.profiles.len(),
        failures = report.failures.len(),
        "profile scan complete"
    );
    report
}
