//! Error taxonomy and exit-code mapping

use std::path::PathBuf;

use anyhow::Result;

/// Domain errors that end a run with a dedicated exit code
#[derive(thiserror::Error, Debug)]
pub enum DialangError {
    /// Missing or contradictory command-line / config values
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// Input file, source root or grammar file does not exist
    #[error("{what} not found at '{}'", path.display())]
    FileNotFound { what: &'static str, path: PathBuf },

    /// Redirect input or changelog is not a JSON object of string lists
    #[error("{source_name} is not valid JSON: {reason}")]
    InvalidJson { source_name: String, reason: String },

    /// Token that cannot be written as a single-quoted grammar literal
    #[error("unsupported token '{token}': {reason}")]
    UnsupportedToken { token: String, reason: String },
}

impl DialangError {
    pub fn unsupported(token: &str, reason: impl Into<String>) -> Self {
        Self::UnsupportedToken {
            token: token.to_string(),
            reason: reason.into(),
        }
    }

    pub fn invalid_json(source_name: impl Into<String>, err: &serde_json::Error) -> Self {
        Self::InvalidJson {
            source_name: source_name.into(),
            reason: err.to_string(),
        }
    }

    /// Exit codes: 0=success, 1=io/internal, 2=bad input, 3=unsupported token
    pub fn exit_code(&self) -> i32 {
        match self {
            DialangError::InvalidArguments(_)
            | DialangError::FileNotFound { .. }
            | DialangError::InvalidJson { .. } => 2,
            DialangError::UnsupportedToken { .. } => 3,
        }
    }
}

/// Exit code for any error bubbling out of a run
pub fn exit_code_for(e: &anyhow::Error) -> i32 {
    e.chain()
        .find_map(|cause| cause.downcast_ref::<DialangError>())
        .map_or(1, DialangError::exit_code)
}

/// Convert Result<()> to exit codes for the CLI harness
pub fn finish_with_exit(result: Result<()>) -> ! {
    match result {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(exit_code_for(&e));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_exit_codes() {
        let bad_json: Result<()> = Err(DialangError::InvalidJson {
            source_name: "stdin".into(),
            reason: "eof".into(),
        }
        .into());
        assert_eq!(exit_code_for(&bad_json.unwrap_err()), 2);

        let wrapped: Result<()> = Err(DialangError::unsupported("del", "quote"))
            .context("Failed to apply redirects");
        assert_eq!(exit_code_for(&wrapped.unwrap_err()), 3);

        assert_eq!(exit_code_for(&anyhow::anyhow!("disk full")), 1);
    }

    #[test]
    fn test_messages() {
        let e = DialangError::FileNotFound {
            what: "grammar file",
            path: PathBuf::from("/tmp/x/Grammar/python.gram"),
        };
        assert_eq!(
            e.to_string(),
            "grammar file not found at '/tmp/x/Grammar/python.gram'"
        );
    }
}
