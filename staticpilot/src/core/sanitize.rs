//! Normalization of raw oracle replies into commands.
//!
//! Every trust decision about oracle output lives here: fence stripping and
//! completion detection. The loop only ever sees a [`Reply`].

use crate::error::ProtocolError;

const FENCE: char = '`';
const MIN_FENCE_LEN: usize = 3;

/// Interpreted oracle reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// The reply equals the completion token exactly.
    Complete,
    /// Any other non-empty text, to be executed verbatim.
    Command(String),
}

/// Trim a raw reply and unwrap a surrounding fenced code block, if any.
///
/// The opening fence (three or more backticks plus an optional language tag)
/// and the closing fence are removed, then the inner text is trimmed again.
/// No other transformation is applied.
pub fn sanitize(raw: &str) -> String {
    let trimmed = raw.trim();
    match strip_fence(trimmed) {
        Some(inner) => inner.trim().to_string(),
        None => trimmed.to_string(),
    }
}

/// Sanitize `raw` and classify it against `completion_token`.
///
/// The token matches by exact string equality after sanitizing. An empty
/// result is a protocol violation.
pub fn interpret(raw: &str, completion_token: &str) -> Result<Reply, ProtocolError> {
    let command = sanitize(raw);
    if command.is_empty() {
        return Err(ProtocolError::EmptyReply);
    }
    if command == completion_token {
        return Ok(Reply::Complete);
    }
    Ok(Reply::Command(command))
}

fn strip_fence(text: &str) -> Option<&str> {
    let fence_len = text.len() - text.trim_start_matches(FENCE).len();
    if fence_len < MIN_FENCE_LEN {
        return None;
    }
    let after_open = &text[fence_len..];
    let body = match after_open.split_once('\n') {
        Some((tag, body)) => {
            // A backtick in the tag means this is not an opening fence line.
            if tag.contains(FENCE) {
                return None;
            }
            body
        }
        // Single-line form: ```npm run build```
        None => after_open,
    };
    let body = body.trim_end();
    let close_len = body.len() - body.trim_end_matches(FENCE).len();
    if close_len >= MIN_FENCE_LEN {
        Some(&body[..body.len() - close_len])
    } else {
        Some(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKEN: &str = "操作完成";

    #[test]
    fn trims_plain_command() {
        assert_eq!(sanitize("  npm install \n"), "npm install");
    }

    #[test]
    fn strips_fence_with_language_tag() {
        assert_eq!(sanitize("```bash\nnpm run build\n```"), "npm run build");
        assert_eq!(sanitize("```sh\n  cd app && npm ci  \n```\n"), "cd app && npm ci");
        assert_eq!(
            sanitize("````shell-session\nyarn build\n````"),
            "yarn build"
        );
    }

    #[test]
    fn strips_fence_without_language_tag() {
        assert_eq!(sanitize("```\nls -la\n```"), "ls -la");
    }

    #[test]
    fn strips_single_line_fence() {
        assert_eq!(sanitize("```pnpm build```"), "pnpm build");
    }

    #[test]
    fn keeps_multiline_fenced_body() {
        assert_eq!(
            sanitize("```bash\ncd web\nnpm ci\n```"),
            "cd web\nnpm ci"
        );
    }

    #[test]
    fn strips_unterminated_opening_fence() {
        assert_eq!(sanitize("```bash\nnpm run build"), "npm run build");
    }

    #[test]
    fn inline_backticks_are_untouched() {
        assert_eq!(sanitize("echo `date`"), "echo `date`");
    }

    #[test]
    fn completion_token_matches_after_trimming() {
        assert_eq!(interpret(&format!("\n  {TOKEN}  \n"), TOKEN), Ok(Reply::Complete));
        assert_eq!(
            interpret(&format!("```\n{TOKEN}\n```"), TOKEN),
            Ok(Reply::Complete)
        );
    }

    #[test]
    fn completion_token_requires_exact_match() {
        assert_eq!(
            interpret(&format!("{TOKEN}。"), TOKEN),
            Ok(Reply::Command(format!("{TOKEN}。")))
        );
        assert_eq!(
            interpret("done", "DONE"),
            Ok(Reply::Command("done".to_string()))
        );
        assert_eq!(
            interpret("echo DONE", "DONE"),
            Ok(Reply::Command("echo DONE".to_string()))
        );
    }

    #[test]
    fn empty_reply_is_protocol_error() {
        assert_eq!(interpret("   \n", TOKEN), Err(ProtocolError::EmptyReply));
        assert_eq!(interpret("```bash\n\n```", TOKEN), Err(ProtocolError::EmptyReply));
    }
}
