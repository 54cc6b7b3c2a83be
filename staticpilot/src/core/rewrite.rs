//! Validation of oracle-proposed web-server rewrite rules.

use std::sync::LazyLock;

use regex::Regex;

use crate::core::sanitize::sanitize;

/// Known-good single-page-app rule, used whenever a proposal is rejected.
///
/// It ends in a closing brace, so it does not itself satisfy
/// [`is_valid_rewrite_rules`]; it is never validated.
pub const DEFAULT_REWRITE_RULES: &str = "location / {\n    try_files $uri /index.html;\n}";

static ROOT_LOCATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"location\s+/\s*\{").expect("root location pattern should compile")
});

/// Rules chosen for the release bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteSelection {
    pub rules: String,
    /// True when the oracle reply was rejected and the default was used.
    pub used_default: bool,
}

/// Pick the rules to ship from an oracle reply.
///
/// Code fences are unwrapped first. A reply that fails [`is_valid_rewrite_rules`]
/// is replaced by [`DEFAULT_REWRITE_RULES`]; selection never fails.
pub fn select_rewrite_rules(reply: &str) -> RewriteSelection {
    let candidate = sanitize(reply);
    if is_valid_rewrite_rules(&candidate) {
        RewriteSelection {
            rules: candidate,
            used_default: false,
        }
    } else {
        RewriteSelection {
            rules: DEFAULT_REWRITE_RULES.to_string(),
            used_default: true,
        }
    }
}

/// Minimal structural check for an nginx `location /` block.
///
/// Requires non-empty text containing a root `location /` block opener,
/// balanced braces, and a final `;` statement terminator. A reply whose last
/// character is the block's closing brace is rejected.
pub fn is_valid_rewrite_rules(text: &str) -> bool {
    let text = text.trim();
    if text.is_empty() || !ROOT_LOCATION.is_match(text) {
        return false;
    }
    if !braces_balanced(text) {
        return false;
    }
    text.ends_with(';')
}

fn braces_balanced(text: &str) -> bool {
    let mut depth = 0usize;
    for ch in text.chars() {
        match ch {
            '{' => depth += 1,
            '}' => match depth.checked_sub(1) {
                Some(next) => depth = next,
                None => return false,
            },
            _ => {}
        }
    }
    depth == 0
}
