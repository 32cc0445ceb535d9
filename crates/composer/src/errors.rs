//! Composer errors

use host_dom::{DomError, FieldShape};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ComposeError {
    /// The underlying host write failed
    #[error("host write failed: {0}")]
    Dom(#[from] DomError),

    /// A slash context captured for one field shape was applied to another
    #[error("slash context is for a {context:?} field, input is {input:?}")]
    ShapeMismatch {
        context: FieldShape,
        input: FieldShape,
    },

    /// The rich-field trigger index no longer falls on a char boundary
    #[error("slash index {index} out of bounds for text of length {len}")]
    SlashIndex { index: usize, len: usize },
}

impl ComposeError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, ComposeError::Dom(err) if err.is_retryable())
    }
}
