//! Redirect applicator
//!
//! Rewrites single-quoted grammar tokens into alternation groups:
//! - `'del'` + `["yeet"]` becomes `('del' | 'yeet')`
//! - a later edit targets the group recorded in the history, not the literal
//! - an empty alternative list resets the group back to `'del'`

use anyhow::Result;
use indexmap::IndexMap;
use regex::{NoExpand, Regex};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, instrument};

use crate::core::error::DialangError;

/// Ordered mapping of token -> alternatives, deserialized from JSON.
/// `null` and `[]` both mean "reset".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenMap(#[serde(deserialize_with = "nullable_lists")] IndexMap<String, Vec<String>>);

/// Redirects requested for one invocation
pub type Redirects = TokenMap;

/// Previously applied redirects, as persisted in the changelog
pub type History = TokenMap;

fn nullable_lists<'de, D>(de: D) -> std::result::Result<IndexMap<String, Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: IndexMap<String, Option<Vec<String>>> = IndexMap::deserialize(de)?;
    Ok(raw
        .into_iter()
        .map(|(k, v)| (k, v.unwrap_or_default()))
        .collect())
}

impl TokenMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, token: impl Into<String>, alternatives: Vec<String>) {
        self.0.insert(token.into(), alternatives);
    }

    pub fn get(&self, token: &str) -> Option<&[String]> {
        self.0.get(token).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K, V, I> FromIterator<(K, I)> for TokenMap
where
    K: Into<String>,
    V: Into<String>,
    I: IntoIterator<Item = V>,
{
    fn from_iter<T: IntoIterator<Item = (K, I)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, alts)| (k.into(), alts.into_iter().map(Into::into).collect()))
                .collect(),
        )
    }
}

/// The spelling set a token currently has in the grammar text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSpelling {
    pub original: String,
    pub alternatives: Vec<String>,
}

impl TokenSpelling {
    pub fn bare(original: impl Into<String>) -> Self {
        Self {
            original: original.into(),
            alternatives: Vec::new(),
        }
    }

    pub fn with_alternatives(original: impl Into<String>, alternatives: Vec<String>) -> Self {
        Self {
            original: original.into(),
            alternatives,
        }
    }

    /// Spelling currently in the text for `token`, according to `history`
    pub fn current(token: &str, history: &History) -> Self {
        match history.get(token) {
            Some(alts) => Self::with_alternatives(token, alts.to_vec()),
            None => Self::bare(token),
        }
    }

    pub fn is_group(&self) -> bool {
        !self.alternatives.is_empty()
    }

    fn words(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.original.as_str()).chain(self.alternatives.iter().map(String::as_str))
    }

    /// Regex source matching this spelling in grammar text.
    /// Groups match with or without their parentheses.
    pub fn pattern_source(&self) -> String {
        if !self.is_group() {
            return quoted_pattern(&self.original);
        }
        let inner = self
            .words()
            .map(quoted_pattern)
            .collect::<Vec<_>>()
            .join(r"[ \t]*\|[ \t]*");
        format!(r"\([ \t]*{inner}[ \t]*\)|{inner}")
    }

    pub fn pattern(&self) -> Result<Regex> {
        Ok(Regex::new(&self.pattern_source())?)
    }

    /// Text this spelling is written as
    pub fn replacement(&self) -> String {
        if !self.is_group() {
            return format!("'{}'", self.original);
        }
        let inner = self
            .words()
            .map(|w| format!("'{w}'"))
            .collect::<Vec<_>>()
            .join(" | ");
        format!("({inner})")
    }
}

fn quoted_pattern(word: &str) -> String {
    format!("'{}'", regex::escape(word))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RedirectAction {
    Add,
    Reset,
}

/// Outcome of one redirect entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RedirectReport {
    pub token: String,
    pub action: RedirectAction,
    pub replaced: usize,
}

/// Result of applying a whole redirect batch
#[derive(Debug, Clone)]
pub struct Applied {
    pub text: String,
    pub history: History,
    pub reports: Vec<RedirectReport>,
}

impl Applied {
    pub fn changed(&self, before: &str) -> bool {
        self.text != before
    }
}

/// Reject tokens that cannot be expressed as a single-quoted literal, and
/// alternatives that would overlap another token's spelling set
pub fn validate(redirects: &Redirects, history: &History) -> Result<(), DialangError> {
    for (token, alternatives) in redirects.iter() {
        check_word(token, token)?;
        for (i, alt) in alternatives.iter().enumerate() {
            check_word(token, alt)?;
            if alt == token {
                return Err(DialangError::unsupported(
                    token,
                    format!("alternative '{alt}' repeats the original token"),
                ));
            }
            if alternatives[..i].contains(alt) {
                return Err(DialangError::unsupported(
                    token,
                    format!("alternative '{alt}' is listed twice"),
                ));
            }
        }
    }

    // Spelling sets once this batch is applied
    let mut merged = history.clone();
    for (token, alternatives) in redirects.iter() {
        merged.insert(token.as_str(), alternatives.clone());
    }

    for (token, alternatives) in redirects.iter() {
        for alt in alternatives {
            let owner = merged
                .iter()
                .find(|(other, alts)| *other != token && (*other == alt || alts.contains(alt)));
            if let Some((owner, _)) = owner {
                return Err(DialangError::unsupported(
                    token,
                    format!("alternative '{alt}' is already spelled by token '{owner}'"),
                ));
            }
        }
        let owner = merged
            .iter()
            .find(|(other, alts)| *other != token && alts.contains(token));
        if let Some((owner, _)) = owner {
            return Err(DialangError::unsupported(
                token,
                format!("'{token}' is an alternative of token '{owner}'"),
            ));
        }
    }
    Ok(())
}

fn check_word(token: &str, word: &str) -> Result<(), DialangError> {
    if word.is_empty() {
        return Err(DialangError::unsupported(token, "empty token"));
    }
    if word.contains(['\'', '"', '\\']) {
        return Err(DialangError::unsupported(
            token,
            format!("{word:?} contains a quote or backslash"),
        ));
    }
    if word.chars().any(char::is_whitespace) {
        return Err(DialangError::unsupported(
            token,
            format!("{word:?} contains whitespace"),
        ));
    }
    Ok(())
}

/// Apply `redirects` to `text`, starting from `history`.
/// Entries run in order; each one sees the history left by the previous.
#[instrument(skip_all, fields(redirects = redirects.len()))]
pub fn apply(text: &str, redirects: &Redirects, history: &History) -> Result<Applied> {
    validate(redirects, history)?;

    let mut text = text.to_string();
    let mut history = history.clone();
    let mut reports = Vec::with_capacity(redirects.len());

    for (token, alternatives) in redirects.iter() {
        let current = TokenSpelling::current(token, &history);

        let (action, replaced) = if alternatives.is_empty() {
            let replaced = reset_token(&mut text, &current)?;
            if replaced == 0 && current.is_group() {
                return Err(DialangError::unsupported(
                    token,
                    format!(
                        "recorded group {} not found in grammar text; the changelog is out of sync",
                        current.replacement()
                    ),
                )
                .into());
            }
            (RedirectAction::Reset, replaced)
        } else {
            let target = TokenSpelling::with_alternatives(token.as_str(), alternatives.clone());
            (RedirectAction::Add, add_alternatives(&mut text, &current, &target)?)
        };

        if replaced == 0 {
            debug!(token = %token, "token not found in grammar text");
        } else {
            debug!(token = %token, ?action, replaced, "rewrote token");
        }

        history.insert(token.as_str(), alternatives.clone());
        reports.push(RedirectReport {
            token: token.clone(),
            action,
            replaced,
        });
    }

    Ok(Applied {
        text,
        history,
        reports,
    })
}

fn add_alternatives(text: &mut String, current: &TokenSpelling, target: &TokenSpelling) -> Result<usize> {
    // The bare literal is always a valid target, even when a group exists.
    let source = if current.is_group() {
        format!(
            "{}|{}",
            current.pattern_source(),
            TokenSpelling::bare(current.original.as_str()).pattern_source()
        )
    } else {
        current.pattern_source()
    };
    replace_all(text, &Regex::new(&source)?, &target.replacement())
}

fn reset_token(text: &mut String, current: &TokenSpelling) -> Result<usize> {
    if !current.is_group() {
        return Ok(0);
    }
    let bare = TokenSpelling::bare(current.original.as_str());
    replace_all(text, &current.pattern()?, &bare.replacement())
}

fn replace_all(text: &mut String, re: &Regex, replacement: &str) -> Result<usize> {
    let replaced = re.find_iter(text).count();
    if replaced > 0 {
        *text = re.replace_all(text, NoExpand(replacement)).into_owned();
    }
    Ok(replaced)
}
