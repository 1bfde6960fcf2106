pub mod comments;
pub mod follows;
pub mod groups;
pub mod posts;
pub mod users;

/// Number of leading characters of a post or comment used as its short form.
pub const POST_LENGTH: usize = 15;

/// Returns the first `POST_LENGTH` characters of `text`.
pub fn truncate_text(text: &str) -> &str {
    match text.char_indices().nth(POST_LENGTH) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
