//! Text injection for host input fields
//!
//! `Composer` hides the two field shapes hosts use behind one contract. Plain
//! fields are written through the native value setter so the host framework
//! sees an `input` event. Rich fields go through selection edits and an
//! `insertText` notification, since hosts re-render them from their own model
//! and drop direct DOM writes.

pub mod errors;

use std::sync::Arc;

use host_dom::{FieldShape, HostPage, InputHandle, RichEditMode};
use langqueue_core_types::InsertionMode;
use slash_detect::{SlashContext, SlashSpan};
use tracing::debug;

pub use errors::ComposeError;

#[derive(Clone)]
pub struct Composer {
    page: Arc<dyn HostPage>,
}

impl Composer {
    pub fn new(page: Arc<dyn HostPage>) -> Self {
        Self { page }
    }

    /// Current field text; empty when the field cannot be read.
    pub async fn get_text(&self, handle: &InputHandle) -> String {
        self.page
            .read_text(&handle.element, handle.shape)
            .await
            .unwrap_or_default()
    }

    /// Replace the whole field content.
    pub async fn set_text(&self, handle: &InputHandle, value: &str) -> Result<(), ComposeError> {
        debug!(element = %handle.element, chars = value.chars().count(), "set text");
        match handle.shape {
            FieldShape::PlainValue => self.page.write_value(&handle.element, value).await?,
            FieldShape::RichEditable => {
                self.page
                    .edit_rich(&handle.element, RichEditMode::ReplaceAll, value)
                    .await?
            }
        }
        Ok(())
    }

    /// Append on a new line, or behave like `set_text` on an empty field.
    pub async fn append_text(
        &self,
        handle: &InputHandle,
        value: &str,
    ) -> Result<(), ComposeError> {
        let existing = self
            .page
            .read_text(&handle.element, handle.shape)
            .await?;
        debug!(
            element = %handle.element,
            existing = existing.chars().count(),
            "append text"
        );
        match handle.shape {
            FieldShape::PlainValue => {
                let next = if existing.is_empty() {
                    value.to_string()
                } else {
                    format!("{existing}\n{value}")
                };
                self.page.write_value(&handle.element, &next).await?;
            }
            FieldShape::RichEditable => {
                let chunk = if existing.is_empty() {
                    value.to_string()
                } else {
                    format!("\n{value}")
                };
                self.page
                    .edit_rich(&handle.element, RichEditMode::AppendAtEnd, &chunk)
                    .await?;
            }
        }
        Ok(())
    }

    /// Write `value` according to the insertion mode.
    pub async fn insert(
        &self,
        handle: &InputHandle,
        mode: InsertionMode,
        value: &str,
    ) -> Result<(), ComposeError> {
        match mode {
            InsertionMode::Overwrite => self.set_text(handle, value).await,
            InsertionMode::Append => self.append_text(handle, value).await,
        }
    }

    /// Replace the trigger span of `context` with `replacement`, keeping the
    /// text after the cursor.
    pub async fn replace_range(
        &self,
        handle: &InputHandle,
        context: &SlashContext,
        replacement: &str,
    ) -> Result<(), ComposeError> {
        if context.shape() != handle.shape {
            return Err(ComposeError::ShapeMismatch {
                context: context.shape(),
                input: handle.shape,
            });
        }
        match &context.span {
            SlashSpan::PlainField { start, end } => {
                self.page
                    .set_range_text(&handle.element, replacement, *start, *end)
                    .await?;
            }
            SlashSpan::RichField {
                slash_index,
                before,
                after,
            } => {
                let head = before.get(..*slash_index).ok_or(ComposeError::SlashIndex {
                    index: *slash_index,
                    len: before.len(),
                })?;
                let next = format!("{head}{replacement}{after}");
                self.page
                    .edit_rich(&handle.element, RichEditMode::ReplaceAll, &next)
                    .await?;
            }
        }
        Ok(())
    }
}
