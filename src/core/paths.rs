//! Path helpers for the transaction directory and signed output naming.

use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, TimeZone};
use regex::Regex;

/// Extension given to signed transactions.
pub const SIGNED_EXTENSION: &str = "txn";

/// Directory holding transactions on a mounted stick.
///
/// `directory` is joined onto the mount point and `..`/`.` components are
/// resolved syntactically, so the result never needs the filesystem.
pub fn transaction_root(mount_path: &Path, directory: &Path) -> PathBuf {
    normalize_syntactic(&mount_path.join(directory))
}

/// Output path for the signed form of `tx_path`.
///
/// `suffix` may contain `{time}`, which expands to `%Y-%m-%d_%H-%M-%S`.
pub fn signed_output_path<Tz>(tx_path: &Path, suffix: &str, now: &DateTime<Tz>) -> PathBuf
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let stem = tx_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stamp = now.format("%Y-%m-%d_%H-%M-%S").to_string();
    let name = format!(
        "{stem}{}.{SIGNED_EXTENSION}",
        suffix.replace("{time}", &stamp)
    );
    tx_path.with_file_name(name)
}

/// Matches file names produced by [`signed_output_path`] for `suffix`, with
/// `{time}` standing for any non-empty text. `None` for an empty suffix,
/// where signed and unsigned names cannot be told apart.
pub fn signed_name_pattern(suffix: &str) -> Result<Option<Regex>, regex::Error> {
    if suffix.is_empty() {
        return Ok(None);
    }
    let body = suffix
        .split("{time}")
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".+");
    Regex::new(&format!(r"{body}\.{SIGNED_EXTENSION}$")).map(Some)
}

fn normalize_syntactic(path: &Path) -> PathBuf {
    let mut components = Vec::new();
    for component in path.components() {
        match component {
            Component::Prefix(..) | Component::RootDir | Component::Normal(_) => {
                components.push(component);
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if let Some(Component::Normal(_)) = components.last() {
                    components.pop();
                }
            }
        }
    }
    components.into_iter().collect()
}
