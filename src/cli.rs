use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// Shared application context for global flags
#[derive(Clone, Debug)]
pub struct AppContext {
    pub quiet: bool,    // --quiet
    pub no_color: bool, // --no-color
    pub dry_run: bool,  // --dry-run
}

#[derive(Parser, Debug)]
#[command(name = "dialang")]
#[command(
    about = "Redirect grammar keywords and operators to user-chosen synonyms",
    long_about = "Rewrites single-quoted tokens in a CPython grammar file into alternation groups, \
                  e.g. {\"del\": [\"yeet\"]} turns 'del' into ('del' | 'yeet'). \
                  An empty list resets a token back to its original spelling."
)]
#[command(version)]
pub struct Cli {
    /// JSON file mapping tokens to lists of alternatives (reads stdin when omitted)
    #[arg(short = 'i', long = "input-file", value_name = "FILE")]
    pub input_file: Option<PathBuf>,

    /// Root of the language source tree holding the grammar file
    #[arg(short = 'r', long = "source-root", value_name = "DIR")]
    pub source_root: Option<PathBuf>,

    /// Grammar file path relative to the source root [default: Grammar/python.gram]
    #[arg(long, value_name = "PATH")]
    pub grammar: Option<PathBuf>,

    /// Changelog of applied redirects [default: .dialang/grammar_changelog.json]
    #[arg(long, value_name = "PATH")]
    pub changelog: Option<PathBuf>,

    /// Print the grammar diff without writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    pub print_config: bool,

    /// Suppress status output
    #[arg(short, long)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn context(&self) -> AppContext {
        AppContext {
            quiet: self.quiet,
            no_color: self.no_color,
            dry_run: self.dry_run,
        }
    }
}
