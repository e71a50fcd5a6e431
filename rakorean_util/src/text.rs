/// Display length of a post summary, counted in characters.
pub const SUMMARY_LENGTH: usize = 100;

/// Cut `content` down to `max_chars` characters, appending `...` when anything was cut.
/// Counts characters rather than bytes so Hangul is never split mid-codepoint.
pub fn truncate_chars(content: &str, max_chars: usize) -> String {
    match content.char_indices().nth(max_chars) {
        Some((end, _)) => format!("{}...", &content[..end]),
        None => content.to_string(),
    }
}

/// The part before `@` of an email address, if it is not empty.
pub fn email_local_part(email: &str) -> Option<&str> {
    let local = email.split('@').next()?.trim();
    (!local.is_empty()).then_some(local)
}

/// Return the trimmed text, or `None` if nothing is left.
pub fn non_blank(text: &str) -> Option<&str> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}
