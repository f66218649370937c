//! **dialang** - Redirect grammar keywords and operators to synonyms
//!
//! Rewrites single-quoted tokens of a CPython grammar file into alternation
//! groups and keeps a changelog so later runs extend or reset them.

/// Command-line interface with clap integration
pub mod cli;

/// Core processing - token redirects and the grammar run
pub mod core {
    /// Error taxonomy with exit-code mapping
    pub mod error;
    pub use error::{DialangError, finish_with_exit};

    /// Token spelling model and the redirect applicator
    pub mod redirect;
    pub use redirect::{Applied, History, Redirects, TokenMap, TokenSpelling, apply};

    /// Grammar file pipeline: load, apply, preview or write back
    pub mod grammar;
    pub use grammar::{RunSummary, fix_grammar, run as grammar_run};
}

/// Infrastructure - configuration, I/O and changelog persistence
pub mod infra {
    /// Layered configuration (dialang.toml + DIALANG_* env)
    pub mod config;
    pub use self::config::{Config, Settings, load_config};

    /// JSON input loading and atomic writes
    pub mod io;

    /// Persisted history of applied redirects
    pub mod changelog;
}

pub use crate::cli::{AppContext, Cli};
pub use crate::core::{DialangError, History, Redirects, TokenSpelling, apply, grammar_run};
pub use crate::infra::{Config, load_config};
