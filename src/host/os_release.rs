//! Linux distribution identification files
//!
//! Reads `os-release(5)` and falls back to the older `/etc/lsb-release`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, fs as fs_error};

/// Identification fields read from a distribution file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DistroInfo {
    pub id: String,
    pub id_like: Vec<String>,
    pub name: Option<String>,
    pub pretty_name: Option<String>,
    pub version_id: String,
}

/// Parse `KEY=value` lines, unquoting and unescaping values
///
/// Lines that are not assignments (comments, blanks, garbage) are ignored.
pub fn parse_assignments(content: &str) -> BTreeMap<String, String> {
    let mut fields = BTreeMap::new();

    for line in content.lines() {
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            continue;
        }
        fields.insert(key.to_string(), unescape(unquote(value.trim_end())));
    }

    fields
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(&next) = chars.peek() {
                if matches!(next, '\\' | '$' | '"' | '\'' | '`') {
                    out.push(next);
                    chars.next();
                    continue;
                }
            }
        }
        out.push(c);
    }

    out
}

/// Interpret os-release fields. Returns `None` without an `ID`.
pub fn from_os_release(content: &str) -> Option<DistroInfo> {
    let mut fields = parse_assignments(content);
    let id = fields.remove("ID").filter(|id| !id.is_empty())?;

    Some(DistroInfo {
        id: id.to_lowercase(),
        id_like: fields
            .remove("ID_LIKE")
            .map(|like| like.split_whitespace().map(str::to_lowercase).collect())
            .unwrap_or_default(),
        name: fields.remove("NAME"),
        pretty_name: fields.remove("PRETTY_NAME"),
        version_id: fields.remove("VERSION_ID").unwrap_or_default(),
    })
}

/// Interpret lsb-release fields. Returns `None` without a `DISTRIB_ID`.
pub fn from_lsb_release(content: &str) -> Option<DistroInfo> {
    let mut fields = parse_assignments(content);
    let name = fields.remove("DISTRIB_ID").filter(|id| !id.is_empty())?;

    Some(DistroInfo {
        id: name.to_lowercase(),
        id_like: Vec::new(),
        pretty_name: fields.remove("DISTRIB_DESCRIPTION"),
        name: Some(name),
        version_id: fields.remove("DISTRIB_RELEASE").unwrap_or_default(),
    })
}

/// Read the first existing os-release candidate, then fall back to lsb-release
///
/// Only the first existing os-release file is consulted. If it is missing or
/// carries no `ID`, the lsb-release file is tried.
pub fn read_distro_info(os_release_files: &[PathBuf], lsb_release: &Path) -> Result<Option<DistroInfo>> {
    if let Some(path) = os_release_files.iter().find(|p| p.is_file()) {
        let content = fs::read_to_string(path).map_err(|e| fs_error::read_failed(path, e))?;
        tracing::debug!("Read distribution info from {}", path.display());

        if let Some(info) = from_os_release(&content) {
            return Ok(Some(info));
        }
        tracing::debug!("{} has no ID, trying {}", path.display(), lsb_release.display());
    }

    if lsb_release.is_file() {
        let content =
            fs::read_to_string(lsb_release).map_err(|e| fs_error::read_failed(lsb_release, e))?;
        return Ok(from_lsb_release(&content));
    }

    Ok(None)
}
