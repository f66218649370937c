use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cli::Cli;
use crate::core::error::DialangError;

/// Config files probed in the working directory, first hit wins
const CONFIG_FILES: [&str; 2] = ["dialang.toml", ".dialang.toml"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config
{
    /// Root of the language source tree (CPython checkout)
    pub source_root: Option<PathBuf>,

    /// Grammar file, relative to the source root
    pub grammar_path: PathBuf,

    /// History of applied redirects
    pub changelog: PathBuf,
}

impl Default for Config
{
    fn default() -> Self
    {
        Self {
            source_root: None,
            grammar_path: PathBuf::from("Grammar/python.gram"),
            changelog: PathBuf::from(".dialang/grammar_changelog.json"),
        }
    }
}

/// Fully resolved paths for one run
#[derive(Debug, Clone, PartialEq)]
pub struct Settings
{
    pub source_root: PathBuf,
    pub grammar_file: PathBuf,
    pub changelog: PathBuf,
}

/// Load `dialang.toml` (if any) layered under `DIALANG_*` environment variables
pub fn load_config() -> Result<Config>
{
    load_config_from(Path::new("."))
}

pub fn load_config_from(dir: &Path) -> Result<Config>
{
    let mut builder = config::Config::builder();

    for name in &CONFIG_FILES
    {
        let path = dir.join(name);
        if path.exists()
        {
            debug!(path = %path.display(), "loading config file");
            builder = builder.add_source(config::File::from(path));
            break;
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("DIALANG")
            .prefix_separator("_")
            .separator("__"),
    );

    let cfg = builder
        .build()
        .context("Failed to load configuration")?;
    let parsed: Config = cfg
        .try_deserialize()
        .context("Failed to parse configuration")?;

    Ok(parsed)
}

impl Config
{
    /// Values given on the command line take precedence
    pub fn overlay(
        mut self,
        cli: &Cli,
    ) -> Self
    {
        if let Some(root) = &cli.source_root
        {
            self.source_root = Some(root.clone());
        }
        if let Some(grammar) = &cli.grammar
        {
            self.grammar_path = grammar.clone();
        }
        if let Some(changelog) = &cli.changelog
        {
            self.changelog = changelog.clone();
        }
        self
    }

    /// Overlay CLI flags and resolve the grammar path under the source root
    pub fn resolve(
        self,
        cli: &Cli,
    ) -> Result<Settings, DialangError>
    {
        let config = self.overlay(cli);
        let source_root = config
            .source_root
            .ok_or_else(|| {
                DialangError::InvalidArguments(
                    "no source root given; pass -r <source-root> or set source_root in dialang.toml"
                        .to_string(),
                )
            })?;

        Ok(Settings {
            grammar_file: source_root.join(config.grammar_path),
            source_root,
            changelog: config.changelog,
        })
    }

    pub fn to_toml(&self) -> Result<String>
    {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }
}
