//! Element references and observed element state

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Opaque, non-owning reference to a host element.
///
/// The host may unmount the node at any time; holders must re-check it with
/// `HostPage::describe` after any suspension point.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ElementRef(pub String);

impl ElementRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The two text-entry shapes hosts use.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldShape {
    /// A value-backed control (`<textarea>`)
    PlainValue,
    /// A free-form editable container (`contenteditable="true"`)
    RichEditable,
}

/// Handle to the host's current text-entry control.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct InputHandle {
    pub element: ElementRef,
    pub shape: FieldShape,
}

impl InputHandle {
    pub fn new(element: ElementRef, shape: FieldShape) -> Self {
        Self { element, shape }
    }
}

/// Snapshot of an element as observed at one instant.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementState {
    /// Upper-case tag name (`BUTTON`, `TEXTAREA`, `DIV`, ...)
    pub tag: String,
    /// Rendered: has an offset parent or at least one client rect
    pub visible: bool,
    /// The element's `disabled` property
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl ElementState {
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    fn attr_is_true(&self, name: &str) -> bool {
        self.attr(name)
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    }

    pub fn aria_disabled(&self) -> bool {
        self.attr_is_true("aria-disabled")
    }

    pub fn aria_busy(&self) -> bool {
        self.attr_is_true("aria-busy")
    }

    pub fn is_button(&self) -> bool {
        self.tag.eq_ignore_ascii_case("BUTTON")
    }

    /// `disabled` property or `aria-disabled="true"`
    pub fn is_disabled_like(&self) -> bool {
        self.disabled || self.aria_disabled()
    }

    /// A real button that can take a click right now.
    pub fn is_button_enabled_and_visible(&self) -> bool {
        self.is_button() && !self.is_disabled_like() && self.visible
    }

    pub fn field_shape(&self) -> Option<FieldShape> {
        if self.tag.eq_ignore_ascii_case("TEXTAREA") {
            return Some(FieldShape::PlainValue);
        }
        if self.attr("contenteditable") == Some("true") {
            return Some(FieldShape::RichEditable);
        }
        None
    }

    /// Visible, editable and not flagged busy.
    pub fn is_ready_input(&self) -> bool {
        match self.field_shape() {
            Some(FieldShape::PlainValue) => self.visible && !self.disabled,
            Some(FieldShape::RichEditable) => {
                self.visible
                    && !self.aria_disabled()
                    && self.attr("contenteditable") != Some("false")
                    && !self.aria_busy()
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(tag: &str, attrs: &[(&str, &str)]) -> ElementState {
        ElementState {
            tag: tag.to_string(),
            visible: true,
            disabled: false,
            attributes: attrs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[test]
    fn aria_disabled_is_case_insensitive() {
        let button = state("BUTTON", &[("aria-disabled", "TRUE")]);
        assert!(button.aria_disabled());
        assert!(!button.is_button_enabled_and_visible());
    }

    #[test]
    fn non_button_is_never_clickable_send() {
        let div = state("DIV", &[("role", "button")]);
        assert!(!div.is_button_enabled_and_visible());
    }

    #[test]
    fn field_shape_detection() {
        assert_eq!(
            state("TEXTAREA", &[]).field_shape(),
            Some(FieldShape::PlainValue)
        );
        assert_eq!(
            state("DIV", &[("contenteditable", "true")]).field_shape(),
            Some(FieldShape::RichEditable)
        );
        assert_eq!(state("DIV", &[("contenteditable", "false")]).field_shape(), None);
    }

    #[test]
    fn busy_rich_field_is_not_ready() {
        let busy = state("DIV", &[("contenteditable", "true"), ("aria-busy", "true")]);
        assert!(!busy.is_ready_input());

        let mut area = state("TEXTAREA", &[]);
        assert!(area.is_ready_input());
        area.disabled = true;
        assert!(!area.is_ready_input());
    }
}
