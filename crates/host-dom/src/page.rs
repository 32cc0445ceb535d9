//! The `HostPage` port

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::element::{ElementRef, ElementState, FieldShape};
use crate::errors::DomError;

/// Where the page currently is.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostLocation {
    pub hostname: String,
    pub url: String,
}

impl HostLocation {
    pub fn new(hostname: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            url: url.into(),
        }
    }

    /// Build from a full URL, extracting the host component.
    pub fn from_url(url: &str) -> Self {
        let without_scheme = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
        let authority = without_scheme
            .split(['/', '?', '#'])
            .next()
            .unwrap_or_default();
        let host = authority.rsplit_once('@').map(|(_, h)| h).unwrap_or(authority);
        let hostname = host.split(':').next().unwrap_or_default();
        Self::new(hostname.to_ascii_lowercase(), url)
    }
}

/// Rich-field edit performed through the host's selection machinery.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RichEditMode {
    /// Select the whole content, delete it, insert the text
    ReplaceAll,
    /// Collapse the selection to the end and insert the text there
    AppendAtEnd,
}

/// Text around the cursor of a focused field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CursorSnapshot {
    /// Value-backed field: text before the caret and the caret offset
    /// (UTF-16 code units, as the host reports it)
    Plain { before: String, caret: usize },
    /// Editable container: text of the ranges before and after the selection
    Rich {
        before: String,
        after: String,
        collapsed: bool,
    },
}

/// DOM capabilities required from a host page.
///
/// Implementations must not panic on missing nodes: a stale reference yields
/// `Ok(None)` from `describe` and `Err(DomError::Detached)` from mutations.
#[async_trait]
pub trait HostPage: Send + Sync {
    async fn location(&self) -> Result<HostLocation, DomError>;

    /// All elements matching `selector`, in document order
    async fn query_all(&self, selector: &str) -> Result<Vec<ElementRef>, DomError>;

    /// Descendants of `root` matching `selector`, in document order
    async fn query_within(
        &self,
        root: &ElementRef,
        selector: &str,
    ) -> Result<Vec<ElementRef>, DomError>;

    async fn element_by_id(&self, id: &str) -> Result<Option<ElementRef>, DomError>;

    /// Current state, or `None` if the element is no longer connected
    async fn describe(&self, element: &ElementRef) -> Result<Option<ElementState>, DomError>;

    /// Nearest `<form>` ancestor (inclusive)
    async fn closest_form(&self, element: &ElementRef) -> Result<Option<ElementRef>, DomError>;

    async fn click(&self, element: &ElementRef) -> Result<(), DomError>;

    /// Native `requestSubmit`; `Ok(false)` when the form does not support it
    async fn request_submit(&self, form: &ElementRef) -> Result<bool, DomError>;

    /// `value` for plain fields, `textContent` for rich ones
    async fn read_text(&self, element: &ElementRef, shape: FieldShape)
        -> Result<String, DomError>;

    /// Set a plain field through the native value setter, dispatch a bubbling
    /// `input` event and focus the field.
    async fn write_value(&self, element: &ElementRef, value: &str) -> Result<(), DomError>;

    /// Focus the rich field, position the selection per `mode`, insert `text`
    /// as a text node, move the caret after it and dispatch an `insertText`
    /// input event.
    async fn edit_rich(
        &self,
        element: &ElementRef,
        mode: RichEditMode,
        text: &str,
    ) -> Result<(), DomError>;

    /// `setRangeText(replacement, start, end, "end")` on a plain field,
    /// followed by an `input` event and focus. Offsets are UTF-16 units.
    async fn set_range_text(
        &self,
        element: &ElementRef,
        replacement: &str,
        start: usize,
        end: usize,
    ) -> Result<(), DomError>;

    /// Cursor context, or `None` when the selection is not inside the field
    async fn cursor_snapshot(
        &self,
        element: &ElementRef,
        shape: FieldShape,
    ) -> Result<Option<CursorSnapshot>, DomError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_from_url_extracts_host() {
        let loc = HostLocation::from_url("https://chat.openai.com/c/123?x=1");
        assert_eq!(loc.hostname, "chat.openai.com");

        let loc = HostLocation::from_url("http://user@Claude.AI:8443/new");
        assert_eq!(loc.hostname, "claude.ai");
    }
}
