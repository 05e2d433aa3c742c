use std::fmt;

/// Represents the pagination cursor.
///
/// A cursor is handed out by one fetch and consumed by the next one. It has no
/// meaning outside that pair of calls and is never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Cursor {
    /// No page has been fetched yet.
    #[default]
    None,

    /// Server-side scroll context.
    Scroll { id: String },
}

impl Cursor {
    pub fn scroll(id: impl Into<String>) -> Self {
        Cursor::Scroll { id: id.into() }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Cursor::None)
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cursor::None => f.write_str("none"),
            // Scroll ids are long base64 blobs, only a prefix is useful in logs.
            Cursor::Scroll { id } => {
                let prefix: String = id.chars().take(16).collect();
                write!(f, "scroll:{prefix}")
            }
        }
    }
}
