//! Slash context detection
//!
//! Recognises a `//` trigger followed by a run of non-whitespace (the query)
//! ending at the cursor. The trigger only counts at the start of the text or
//! right after whitespace, so `https://x` never opens the palette. Zero-width
//! marker characters some hosts inject are ignored for that check.

use host_dom::text::utf16_len;
use host_dom::{CursorSnapshot, FieldShape};
use serde::Serialize;

pub const TRIGGER: &str = "//";

/// Where the trigger sits, per field shape.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum SlashSpan {
    /// Value-backed field; UTF-16 offsets of the trigger start and the caret
    PlainField { start: usize, end: usize },
    /// Editable container; byte index of the trigger in `before`
    RichField {
        slash_index: usize,
        before: String,
        after: String,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SlashContext {
    pub query: String,
    pub span: SlashSpan,
}

impl SlashContext {
    pub fn shape(&self) -> FieldShape {
        match self.span {
            SlashSpan::PlainField { .. } => FieldShape::PlainValue,
            SlashSpan::RichField { .. } => FieldShape::RichEditable,
        }
    }
}

/// Trigger match inside the text preceding the cursor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TriggerMatch {
    /// Byte index of the first `/`
    pub slash_index: usize,
    pub query: String,
}

fn is_zero_width(ch: char) -> bool {
    matches!(ch, '\u{200B}'..='\u{200D}' | '\u{2060}' | '\u{FEFF}')
}

/// Find a trigger that runs up to the end of `text`.
pub fn match_trigger(text: &str) -> Option<TriggerMatch> {
    // The trigger and query must both sit inside the trailing non-whitespace run.
    let run_start = text
        .char_indices()
        .rev()
        .find(|(_, ch)| ch.is_whitespace())
        .map(|(idx, ch)| idx + ch.len_utf8())
        .unwrap_or(0);
    let slash_index = run_start + text[run_start..].find(TRIGGER)?;
    let query = text[slash_index + TRIGGER.len()..].to_string();

    let preceding: String = text[..slash_index]
        .chars()
        .filter(|ch| !is_zero_width(*ch))
        .collect();
    match preceding.chars().last() {
        None => Some(TriggerMatch { slash_index, query }),
        Some(ch) if ch.is_whitespace() => Some(TriggerMatch { slash_index, query }),
        Some(_) => None,
    }
}

/// Detect the slash context for the current cursor snapshot.
pub fn detect(snapshot: &CursorSnapshot) -> Option<SlashContext> {
    match snapshot {
        CursorSnapshot::Plain { before, caret } => {
            let found = match_trigger(before)?;
            let span_units = utf16_len(&before[found.slash_index..]);
            Some(SlashContext {
                query: found.query,
                span: SlashSpan::PlainField {
                    start: caret.saturating_sub(span_units),
                    end: *caret,
                },
            })
        }
        CursorSnapshot::Rich {
            before,
            after,
            collapsed,
        } => {
            if !collapsed {
                return None;
            }
            let found = match_trigger(before)?;
            Some(SlashContext {
                query: found.query,
                span: SlashSpan::RichField {
                    slash_index: found.slash_index,
                    before: before.clone(),
                    after: after.clone(),
                },
            })
        }
    }
}
