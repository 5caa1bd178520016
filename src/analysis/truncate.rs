//! Content budget enforcement.

use tracing::warn;

/// How the content was clipped to fit the budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Truncation {
    /// Content fit within the budget.
    None,
    /// Cut at the last line break before the budget, `at` chars in.
    AtLineBreak { at: usize },
    /// No line break before the budget; cut at exactly the budget.
    HardCut,
}

/// Content clipped to at most `budget` characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundedContent<'a> {
    text: &'a str,
    truncation: Truncation,
}

impl<'a> BoundedContent<'a> {
    pub fn text(&self) -> &'a str {
        self.text
    }

    pub fn truncation(&self) -> Truncation {
        self.truncation
    }

    pub fn is_truncated(&self) -> bool {
        self.truncation != Truncation::None
    }
}

/// Clip `text` to at most `budget` characters without splitting a record.
///
/// When the text is over budget, the cut is made at the last `\n` before the
/// budget (the newline itself is dropped). If there is none, the text is cut
/// at exactly `budget` characters. Lengths are counted in chars, so cuts
/// always land on UTF-8 boundaries.
pub fn truncate(text: &str, budget: usize) -> BoundedContent<'_> {
    // Byte length bounds the char count from above.
    if text.len() <= budget {
        return unchanged(text);
    }

    let cutoff = match text.char_indices().nth(budget) {
        Some((byte_idx, _)) => byte_idx,
        None => return unchanged(text),
    };

    let head = &text[..cutoff];
    match head.rfind('\n') {
        Some(newline) => {
            let at = head[..newline].chars().count();
            warn!(
                at,
                budget, "Content truncated at last line break to avoid splitting a record"
            );
            BoundedContent {
                text: &head[..newline],
                truncation: Truncation::AtLineBreak { at },
            }
        }
        None => {
            warn!(budget, "Content truncated at hard character limit");
            BoundedContent {
                text: head,
                truncation: Truncation::HardCut,
            }
        }
    }
}

fn unchanged(text: &str) -> BoundedContent<'_> {
    BoundedContent {
        text,
        truncation: Truncation::None,
    }
}
