use std::fs;
use std::io::{self, IsTerminal, Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;

use crate::core::error::DialangError;

/// Parse JSON text, reporting failures as `InvalidJson` for `source_name`
pub fn parse_json<T: DeserializeOwned>(text: &str, source_name: &str) -> Result<T, DialangError> {
    serde_json::from_str(text).map_err(|e| DialangError::invalid_json(source_name, &e))
}

/// Read and parse a JSON file; a missing file is `FileNotFound`
pub fn read_json_file<T: DeserializeOwned>(path: &Path, what: &'static str) -> Result<T> {
    let text = match fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(DialangError::FileNotFound {
                what,
                path: path.to_path_buf(),
            }
            .into());
        }
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read {}", path.display()));
        }
    };
    Ok(parse_json(&text, &path.display().to_string())?)
}

/// Read JSON from standard input, hinting at the expected shape on a terminal
pub fn read_json_stdin<T: DeserializeOwned>(quiet: bool) -> Result<T> {
    let stdin = io::stdin();
    if stdin.is_terminal() && !quiet {
        eprintln!(
            "Input omitted. Enter a JSON object mapping tokens to lists of alternatives below, \
             then press Ctrl+D (pass -h to see the command usage)."
        );
    }

    let mut text = String::new();
    stdin
        .lock()
        .read_to_string(&mut text)
        .context("Failed to read standard input")?;
    Ok(parse_json(&text, "standard input")?)
}

/// Atomic write with robust temp file strategy
pub fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    // Prefer same-dir tempfile so the rename stays on one filesystem
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    // Preserve original permissions
    let perms = fs::metadata(path).map(|m| m.permissions()).ok();

    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;

    if let Some(perms) = perms {
        fs::set_permissions(tmp.path(), perms).context("set temp permissions")?;
    }

    tmp.persist(path)
        .with_context(|| format!("Failed to replace {}", path.display()))?;

    Ok(())
}
