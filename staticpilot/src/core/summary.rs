//! Bounded textual observations of executed commands.

use crate::core::types::ExecutionResult;

/// Default character budget for a single observation.
pub const OBSERVATION_LIMIT_CHARS: usize = 6000;
/// Appended when an observation was cut at the budget.
pub const TRUNCATION_MARKER: &str = "\n...(truncated)";

const EMPTY_STREAM: &str = "(none)";

/// Rendered observation of one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    pub text: String,
    /// True when the text was cut at the budget and the marker appended.
    pub truncated: bool,
}

/// Render an execution result with the default budget.
pub fn summarize(result: &ExecutionResult) -> String {
    summarize_with_limit(result, OBSERVATION_LIMIT_CHARS).text
}

/// Render `exit_code`, `stdout` and `stderr` sections, cut at `limit_chars`.
///
/// The text never exceeds `limit_chars + TRUNCATION_MARKER` characters. The
/// marker is appended exactly when the full text was longer than the limit,
/// which `truncated` reports independently of the command's own output.
pub fn summarize_with_limit(result: &ExecutionResult, limit_chars: usize) -> Observation {
    let combined = format!(
        "exit_code: {}\nstdout:\n{}\nstderr:\n{}",
        result.exit_code,
        or_none(&result.stdout),
        or_none(&result.stderr),
    );
    truncate_chars(combined, limit_chars)
}

fn or_none(stream: &str) -> &str {
    if stream.is_empty() { EMPTY_STREAM } else { stream }
}

fn truncate_chars(mut text: String, limit_chars: usize) -> Observation {
    match text.char_indices().nth(limit_chars) {
        None => Observation {
            text,
            truncated: false,
        },
        Some((cut, _)) => {
            text.truncate(cut);
            text.push_str(TRUNCATION_MARKER);
            Observation {
                text,
                truncated: true,
            }
        }
    }
}
