// Branch pattern management - deterministic, sanitized work-item identifiers

pub mod generator;

pub use generator::{BranchManager, NamedBranch};

use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

use crate::providers::ProviderError;

/// Names git itself gives meaning to; never acceptable for a new branch.
/// The check is skipped when checking out a branch that already exists.
pub const RESERVED_NAMES: &[&str] = &["HEAD", "main", "master", "origin", "refs"];

static BRANCH_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9\-_/.]{1,100}$").expect("branch name regex is valid")
});

#[derive(Debug, Error)]
pub enum BranchError {
    #[error("'{name}' is a reserved ref name")]
    Reserved { name: String },
    #[error("'{name}' is not a valid branch name")]
    Invalid { name: String },
    #[error(transparent)]
    Vcs(#[from] ProviderError),
}

/// Strip disallowed characters, truncate to 100, collapse repeated `.`/`-`
/// runs, then trim leading/trailing `.`/`-`.
pub fn sanitize(raw: &str) -> String {
    let kept: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '/' | '.'))
        .take(100)
        .collect();

    let mut collapsed = String::with_capacity(kept.len());
    let mut prev: Option<char> = None;
    for c in kept.chars() {
        if matches!(c, '.' | '-') && prev == Some(c) {
            continue;
        }
        collapsed.push(c);
        prev = Some(c);
    }

    collapsed
        .trim_matches(|c| matches!(c, '.' | '-'))
        .to_string()
}

pub fn is_reserved(name: &str) -> bool {
    RESERVED_NAMES.iter().any(|r| *r == name)
}

/// Reject names git would misinterpret. Applied when creating a new branch.
pub fn validate_new_branch_name(name: &str) -> Result<(), BranchError> {
    if is_reserved(name) {
        return Err(BranchError::Reserved {
            name: name.to_string(),
        });
    }
    if !BRANCH_NAME_RE.is_match(name) {
        return Err(BranchError::Invalid {
            name: name.to_string(),
        });
    }
    Ok(())
}
