//! Keyword routing of normalized input text.

/// Leading word that turns a message into a note.
pub const NOTE_KEYWORD: &str = "мысль";
/// Leading word that turns a message into a structured query.
pub const QUERY_KEYWORD: &str = "база";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Note text after the keyword, lower-cased and trimmed. May be empty.
    NoteCapture(String),
    /// Question after the keyword, lower-cased and trimmed. May be empty.
    StructuredQuery(String),
    /// The original text, untouched.
    Chat(String),
}

impl Intent {
    pub fn name(&self) -> &'static str {
        match self {
            Intent::NoteCapture(_) => "note",
            Intent::StructuredQuery(_) => "query",
            Intent::Chat(_) => "chat",
        }
    }
}

/// Pick the branch for `text`. The note keyword is checked first.
///
/// Matching is a plain prefix test on the trimmed, lower-cased text, so
/// "мысли" also counts as the note keyword.
pub fn classify(text: &str) -> Intent {
    let normalized = text.trim().to_lowercase();

    if let Some(rest) = normalized.strip_prefix(NOTE_KEYWORD) {
        return Intent::NoteCapture(rest.trim().to_string());
    }
    if let Some(rest) = normalized.strip_prefix(QUERY_KEYWORD) {
        return Intent::StructuredQuery(rest.trim().to_string());
    }
    Intent::Chat(text.to_string())
}
