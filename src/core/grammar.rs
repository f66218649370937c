//! Grammar redirect run: load inputs, rewrite the grammar file, persist history.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use similar::TextDiff;
use tracing::{debug, info, instrument};

use crate::cli::{AppContext, Cli};
use crate::core::error::DialangError;
use crate::core::redirect::{RedirectAction, RedirectReport, Redirects, apply};
use crate::infra::changelog;
use crate::infra::config::{Settings, load_config};
use crate::infra::io::{read_json_file, read_json_stdin, write_atomic};

/// What a run did, for reporting
#[derive(Debug)]
pub struct RunSummary {
    pub grammar_file: PathBuf,
    pub reports: Vec<RedirectReport>,
    pub changed: bool,
    pub written: bool,
}

pub fn run(cli: &Cli, ctx: &AppContext) -> Result<()> {
    let settings = load_config()?.resolve(cli)?;

    let redirects: Redirects = match &cli.input_file {
        Some(path) => read_json_file(path, "input file")?,
        None => read_json_stdin(ctx.quiet)?,
    };

    let summary = fix_grammar(&settings, &redirects, ctx)?;

    if !ctx.quiet {
        print_summary(&summary, ctx);
    }
    Ok(())
}

/// Apply `redirects` to the grammar file described by `settings`
#[instrument(skip_all, fields(grammar = %settings.grammar_file.display()))]
pub fn fix_grammar(settings: &Settings, redirects: &Redirects, ctx: &AppContext) -> Result<RunSummary> {
    if !settings.source_root.is_dir() {
        return Err(DialangError::FileNotFound {
            what: "source root",
            path: settings.source_root.clone(),
        }
        .into());
    }

    let history = changelog::load(&settings.changelog)?;
    let content = read_grammar(&settings.grammar_file)?;
    debug!(bytes = content.len(), "opened the grammar file");

    let applied = apply(&content, redirects, &history).context("Failed to apply redirects")?;
    let changed = applied.changed(&content);

    if ctx.dry_run {
        if !ctx.quiet {
            print_diff(&settings.grammar_file, &content, &applied.text, ctx);
        }
        return Ok(RunSummary {
            grammar_file: settings.grammar_file.clone(),
            reports: applied.reports,
            changed,
            written: false,
        });
    }

    if changed {
        write_atomic(&settings.grammar_file, applied.text.as_bytes())?;
    }
    changelog::save(&settings.changelog, &applied.history)?;
    info!(changed, "applied the grammar changes");

    Ok(RunSummary {
        grammar_file: settings.grammar_file.clone(),
        reports: applied.reports,
        changed,
        written: true,
    })
}

fn read_grammar(path: &Path) -> Result<String> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(DialangError::FileNotFound {
            what: "grammar file",
            path: path.to_path_buf(),
        }
        .into()),
        Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
    }
}

/// Unified diff of the grammar change
pub fn render_diff(path: &Path, before: &str, after: &str) -> String {
    let name = path.display().to_string();
    let diff = TextDiff::from_lines(before, after);
    diff.unified_diff()
        .context_radius(2)
        .header(&format!("a/{name}"), &format!("b/{name}"))
        .to_string()
}

fn print_diff(path: &Path, before: &str, after: &str, ctx: &AppContext) {
    if before == after {
        println!("No changes to {}", path.display());
        return;
    }
    for line in render_diff(path, before, after).lines() {
        if ctx.no_color {
            println!("{line}");
        } else if line.starts_with('+') {
            println!("{}", line.green());
        } else if line.starts_with('-') {
            println!("{}", line.red());
        } else if line.starts_with("@@") {
            println!("{}", line.cyan());
        } else {
            println!("{line}");
        }
    }
}

fn print_summary(summary: &RunSummary, ctx: &AppContext) {
    if summary.written && !summary.changed {
        println!("Grammar already up to date: {}", summary.grammar_file.display());
    } else if summary.written {
        if ctx.no_color {
            println!("Successfully applied the grammar changes!");
        } else {
            println!("{}", "Successfully applied the grammar changes!".green());
        }
    } else {
        println!("DRY RUN: {} left untouched", summary.grammar_file.display());
    }

    for report in &summary.reports {
        let verb = match report.action {
            RedirectAction::Add => "redirected",
            RedirectAction::Reset => "reset",
        };
        let line = format!("  '{}' {verb}: {} occurrence(s)", report.token, report.replaced);
        if report.replaced == 0 && !ctx.no_color {
            println!("{}", line.yellow());
        } else {
            println!("{line}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::redirect::TokenMap;
    use tempfile::TempDir;

    fn ctx(dry_run: bool) -> AppContext {
        AppContext {
            quiet: true,
            no_color: true,
            dry_run,
        }
    }

    fn fixture() -> (TempDir, Settings) {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("cpython");
        fs::create_dir_all(root.join("Grammar")).unwrap();
        fs::write(
            root.join("Grammar/python.gram"),
            "del_stmt: 'del' del_targets\nassert_stmt: 'assert' expression\n",
        )
        .unwrap();
        let settings = Settings {
            grammar_file: root.join("Grammar/python.gram"),
            changelog: dir.path().join(".dialang/grammar_changelog.json"),
            source_root: root,
        };
        (dir, settings)
    }

    fn redirects(json: &str) -> Redirects {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_fix_grammar_writes_file_and_changelog() {
        let (_dir, settings) = fixture();

        let summary = fix_grammar(&settings, &redirects(r#"{"del": ["yeet"]}"#), &ctx(false)).unwrap();
        assert!(summary.changed && summary.written);

        let grammar = fs::read_to_string(&settings.grammar_file).unwrap();
        assert_eq!(
            grammar,
            "del_stmt: ('del' | 'yeet') del_targets\nassert_stmt: 'assert' expression\n"
        );
        let history = changelog::load(&settings.changelog).unwrap();
        assert_eq!(history.get("del"), Some(&["yeet".to_string()][..]));
    }

    #[test]
    fn test_runs_compose_through_changelog() {
        let (_dir, settings) = fixture();
        let original = fs::read_to_string(&settings.grammar_file).unwrap();

        fix_grammar(&settings, &redirects(r#"{"del": ["yeet"]}"#), &ctx(false)).unwrap();
        fix_grammar(&settings, &redirects(r#"{"del": ["yeet", "kill"]}"#), &ctx(false)).unwrap();
        assert!(fs::read_to_string(&settings.grammar_file)
            .unwrap()
            .contains("('del' | 'yeet' | 'kill')"));

        fix_grammar(&settings, &redirects(r#"{"del": null}"#), &ctx(false)).unwrap();
        assert_eq!(fs::read_to_string(&settings.grammar_file).unwrap(), original);
    }

    #[test]
    fn test_dry_run_touches_nothing() {
        let (_dir, settings) = fixture();
        let original = fs::read_to_string(&settings.grammar_file).unwrap();

        let summary = fix_grammar(&settings, &redirects(r#"{"assert": ["insist"]}"#), &ctx(true)).unwrap();
        assert!(summary.changed);
        assert!(!summary.written);
        assert_eq!(fs::read_to_string(&settings.grammar_file).unwrap(), original);
        assert!(!settings.changelog.exists());
    }

    #[test]
    fn test_missing_source_root() {
        let (_dir, mut settings) = fixture();
        settings.source_root = settings.source_root.join("nope");

        let err = fix_grammar(&settings, &TokenMap::new(), &ctx(false)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DialangError>(),
            Some(DialangError::FileNotFound { what: "source root", .. })
        ));
    }

    #[test]
    fn test_missing_grammar_file() {
        let (_dir, mut settings) = fixture();
        settings.grammar_file = settings.source_root.join("Grammar/missing.gram");

        let err = fix_grammar(&settings, &TokenMap::new(), &ctx(false)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DialangError>(),
            Some(DialangError::FileNotFound { what: "grammar file", .. })
        ));
    }

    #[test]
    fn test_render_diff_shows_rewrite() {
        let diff = render_diff(Path::new("python.gram"), "x: 'del'\n", "x: ('del' | 'yeet')\n");
        assert!(diff.contains("-x: 'del'"));
        assert!(diff.contains("+x: ('del' | 'yeet')"));
        assert!(diff.contains("a/python.gram"));
    }
}
