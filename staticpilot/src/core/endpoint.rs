//! Normalization of the configured chat endpoint URL.

const COMPLETIONS_SUFFIX: &str = "/chat/completions";

/// Resolve a base URL into a full chat-completions endpoint.
///
/// - Trailing slashes are dropped.
/// - URLs already ending in `/chat/completions` are kept.
/// - URLs ending in `/v1` get `/chat/completions` appended.
/// - Anything else gets `/v1/chat/completions` appended.
pub fn chat_completions_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.ends_with(COMPLETIONS_SUFFIX) {
        trimmed.to_string()
    } else if trimmed.ends_with("/v1") {
        format!("{trimmed}{COMPLETIONS_SUFFIX}")
    } else {
        format!("{trimmed}/v1{COMPLETIONS_SUFFIX}")
    }
}
