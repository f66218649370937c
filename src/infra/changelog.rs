//! Persisted history of applied redirects.
//!
//! Stored as a JSON object `{ "token": ["alt", ...] }`; an empty list marks
//! a token that was reset. A missing file is an empty history.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use crate::core::error::DialangError;
use crate::core::redirect::History;
use crate::infra::io::{read_json_file, write_atomic};

pub fn load(path: &Path) -> Result<History> {
    if !path.exists() {
        debug!(path = %path.display(), "no changelog yet, starting empty");
        return Ok(History::new());
    }
    // Zero-length file counts as "created empty"
    if fs::metadata(path).map(|m| m.len() == 0).unwrap_or(false) {
        return Ok(History::new());
    }
    match read_json_file::<History>(path, "changelog") {
        Ok(history) => Ok(history),
        Err(e) => match e.downcast::<DialangError>() {
            Ok(DialangError::InvalidJson { reason, .. }) => Err(DialangError::InvalidJson {
                source_name: format!("changelog {}", path.display()),
                reason,
            }
            .into()),
            Ok(other) => Err(other.into()),
            Err(e) => Err(e),
        },
    }
}

pub fn save(path: &Path, history: &History) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(history).context("Failed to serialize changelog")?;
    write_atomic(path, json.as_bytes())?;
    debug!(path = %path.display(), entries = history.len(), "changelog saved");
    Ok(())
}
