//! In-process host page.
//!
//! `MemoryPage` keeps a flat node table instead of a real document. Selector
//! matching is explicit: each node lists the selectors it should answer to,
//! so probe order and fallback behaviour can be exercised without a browser.
//! Visibility windows are measured with `tokio::time::Instant`, which lets
//! paused-clock tests simulate a host that shows a stop button for a while
//! after every send.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::{Duration, Instant};
use tracing::trace;

use crate::element::{ElementRef, ElementState, FieldShape};
use crate::errors::DomError;
use crate::page::{CursorSnapshot, HostLocation, HostPage, RichEditMode};
use crate::text::{utf16_len, utf16_to_byte};

/// Callback run after a click or form submission, with the document locked.
pub type ClickHook = Arc<dyn Fn(&mut MemoryDom, &ElementRef) + Send + Sync>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DomEventKind {
    Focus,
    Input { data: Option<String> },
    Click,
    Submit,
}

/// Event recorded by the page, in dispatch order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DomEvent {
    pub target: ElementRef,
    pub kind: DomEventKind,
}

/// Description of a node to insert.
#[derive(Clone, Debug)]
pub struct NodeSpec {
    tag: String,
    attributes: BTreeMap<String, String>,
    text: String,
    visible: bool,
    disabled: bool,
    selectors: Vec<String>,
    parent: Option<ElementRef>,
    dom_id: Option<String>,
    submit_supported: bool,
}

impl NodeSpec {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_uppercase(),
            attributes: BTreeMap::new(),
            text: String::new(),
            visible: true,
            disabled: false,
            selectors: Vec::new(),
            parent: None,
            dom_id: None,
            submit_supported: true,
        }
    }

    pub fn textarea() -> Self {
        Self::new("textarea")
    }

    pub fn rich_editable() -> Self {
        Self::new("div").attr("contenteditable", "true")
    }

    pub fn button() -> Self {
        Self::new("button")
    }

    pub fn form() -> Self {
        Self::new("form")
    }

    /// Selectors this node answers to
    pub fn matching(mut self, selectors: &[&str]) -> Self {
        self.selectors
            .extend(selectors.iter().map(|s| s.to_string()));
        self
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    pub fn child_of(mut self, parent: &ElementRef) -> Self {
        self.parent = Some(parent.clone());
        self
    }

    pub fn dom_id(mut self, id: &str) -> Self {
        self.dom_id = Some(id.to_string());
        self
    }

    /// Forms only: pretend `requestSubmit` is missing
    pub fn without_request_submit(mut self) -> Self {
        self.submit_supported = false;
        self
    }
}

#[derive(Clone, Debug)]
struct MemoryNode {
    id: ElementRef,
    spec: NodeSpec,
    visible_until: Option<Instant>,
    connected: bool,
    caret: Option<usize>,
    selection_collapsed: bool,
}

impl MemoryNode {
    fn effective_visible(&self) -> bool {
        self.spec.visible
            && self
                .visible_until
                .map(|until| Instant::now() < until)
                .unwrap_or(true)
    }

    fn state(&self) -> ElementState {
        ElementState {
            tag: self.spec.tag.clone(),
            visible: self.effective_visible(),
            disabled: self.spec.disabled,
            attributes: self.spec.attributes.clone(),
        }
    }

    fn caret(&self) -> usize {
        self.caret.unwrap_or_else(|| utf16_len(&self.spec.text))
    }
}

/// The mutable document behind a `MemoryPage`.
#[derive(Debug)]
pub struct MemoryDom {
    location: HostLocation,
    nodes: Vec<MemoryNode>,
    events: Vec<DomEvent>,
    focused: Option<ElementRef>,
    next_id: u64,
}

impl MemoryDom {
    fn new(location: HostLocation) -> Self {
        Self {
            location,
            nodes: Vec::new(),
            events: Vec::new(),
            focused: None,
            next_id: 1,
        }
    }

    pub fn insert(&mut self, spec: NodeSpec) -> ElementRef {
        let id = ElementRef::new(format!("mem-{}", self.next_id));
        self.next_id += 1;
        self.nodes.push(MemoryNode {
            id: id.clone(),
            spec,
            visible_until: None,
            connected: true,
            caret: None,
            selection_collapsed: true,
        });
        id
    }

    fn node(&self, el: &ElementRef) -> Option<&MemoryNode> {
        self.nodes.iter().find(|n| n.connected && &n.id == el)
    }

    fn node_mut(&mut self, el: &ElementRef) -> Option<&mut MemoryNode> {
        self.nodes.iter_mut().find(|n| n.connected && &n.id == el)
    }

    fn live_node_mut(&mut self, el: &ElementRef) -> Result<&mut MemoryNode, DomError> {
        self.node_mut(el)
            .ok_or_else(|| DomError::Detached(el.to_string()))
    }

    fn is_descendant(&self, node: &MemoryNode, root: &ElementRef) -> bool {
        let mut parent = node.spec.parent.clone();
        while let Some(current) = parent {
            if &current == root {
                return true;
            }
            parent = self
                .nodes
                .iter()
                .find(|n| n.id == current)
                .and_then(|n| n.spec.parent.clone());
        }
        false
    }

    fn record(&mut self, target: &ElementRef, kind: DomEventKind) {
        trace!(element = %target, ?kind, "memory page event");
        self.events.push(DomEvent {
            target: target.clone(),
            kind,
        });
    }

    fn focus_node(&mut self, el: &ElementRef) {
        self.focused = Some(el.clone());
        self.record(el, DomEventKind::Focus);
    }

    pub fn text(&self, el: &ElementRef) -> Option<String> {
        self.node(el).map(|n| n.spec.text.clone())
    }

    /// Replace content directly, as the host itself would, without events
    pub fn set_text(&mut self, el: &ElementRef, text: &str) {
        if let Some(node) = self.node_mut(el) {
            node.spec.text = text.to_string();
            node.caret = None;
        }
    }

    pub fn set_visible(&mut self, el: &ElementRef, visible: bool) {
        if let Some(node) = self.node_mut(el) {
            node.spec.visible = visible;
            node.visible_until = None;
        }
    }

    /// Make the node visible until `duration` from now
    pub fn show_for(&mut self, el: &ElementRef, duration: Duration) {
        if let Some(node) = self.node_mut(el) {
            node.spec.visible = true;
            node.visible_until = Some(Instant::now() + duration);
        }
    }

    pub fn set_disabled(&mut self, el: &ElementRef, disabled: bool) {
        if let Some(node) = self.node_mut(el) {
            node.spec.disabled = disabled;
        }
    }

    pub fn set_attr(&mut self, el: &ElementRef, name: &str, value: &str) {
        if let Some(node) = self.node_mut(el) {
            node.spec
                .attributes
                .insert(name.to_string(), value.to_string());
        }
    }

    pub fn remove_attr(&mut self, el: &ElementRef, name: &str) {
        if let Some(node) = self.node_mut(el) {
            node.spec.attributes.remove(name);
        }
    }

    /// Disconnect the node and everything below it
    pub fn remove(&mut self, el: &ElementRef) {
        let doomed: Vec<ElementRef> = self
            .nodes
            .iter()
            .filter(|n| &n.id == el || self.is_descendant(n, el))
            .map(|n| n.id.clone())
            .collect();
        for node in self.nodes.iter_mut() {
            if doomed.contains(&node.id) {
                node.connected = false;
            }
        }
        if self.focused.as_ref().is_some_and(|f| doomed.contains(f)) {
            self.focused = None;
        }
    }

    pub fn focus(&mut self, el: &ElementRef) {
        if self.node(el).is_some() {
            self.focus_node(el);
        }
    }

    /// Move the caret (UTF-16 offset) and collapse the selection
    pub fn place_caret(&mut self, el: &ElementRef, offset: usize) {
        if let Some(node) = self.node_mut(el) {
            node.caret = Some(offset.min(utf16_len(&node.spec.text)));
            node.selection_collapsed = true;
        }
    }

    pub fn set_selection_collapsed(&mut self, el: &ElementRef, collapsed: bool) {
        if let Some(node) = self.node_mut(el) {
            node.selection_collapsed = collapsed;
        }
    }

    pub fn events(&self) -> &[DomEvent] {
        &self.events
    }
}

/// `HostPage` over an in-process document.
pub struct MemoryPage {
    dom: Mutex<MemoryDom>,
    click_hook: Mutex<Option<ClickHook>>,
}

impl MemoryPage {
    pub fn new(url: &str) -> Self {
        Self {
            dom: Mutex::new(MemoryDom::new(HostLocation::from_url(url))),
            click_hook: Mutex::new(None),
        }
    }

    pub fn with_dom<R>(&self, f: impl FnOnce(&mut MemoryDom) -> R) -> R {
        f(&mut self.dom.lock())
    }

    pub fn insert(&self, spec: NodeSpec) -> ElementRef {
        self.dom.lock().insert(spec)
    }

    /// Install a hook run after every click and form submission
    pub fn on_click<F>(&self, hook: F)
    where
        F: Fn(&mut MemoryDom, &ElementRef) + Send + Sync + 'static,
    {
        *self.click_hook.lock() = Some(Arc::new(hook));
    }

    pub fn text(&self, el: &ElementRef) -> Option<String> {
        self.dom.lock().text(el)
    }

    pub fn events(&self) -> Vec<DomEvent> {
        self.dom.lock().events().to_vec()
    }

    pub fn clicks_on(&self, el: &ElementRef) -> usize {
        self.dom
            .lock()
            .events()
            .iter()
            .filter(|e| &e.target == el && e.kind == DomEventKind::Click)
            .count()
    }

    pub fn input_events_on(&self, el: &ElementRef) -> usize {
        self.dom
            .lock()
            .events()
            .iter()
            .filter(|e| &e.target == el && matches!(e.kind, DomEventKind::Input { .. }))
            .count()
    }

    fn run_hook(&self, target: &ElementRef) {
        let hook = self.click_hook.lock().clone();
        if let Some(hook) = hook {
            let mut dom = self.dom.lock();
            hook(&mut dom, target);
        }
    }
}

#[async_trait]
impl HostPage for MemoryPage {
    async fn location(&self) -> Result<HostLocation, DomError> {
        Ok(self.dom.lock().location.clone())
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<ElementRef>, DomError> {
        let dom = self.dom.lock();
        Ok(dom
            .nodes
            .iter()
            .filter(|n| n.connected && n.spec.selectors.iter().any(|s| s == selector))
            .map(|n| n.id.clone())
            .collect())
    }

    async fn query_within(
        &self,
        root: &ElementRef,
        selector: &str,
    ) -> Result<Vec<ElementRef>, DomError> {
        let dom = self.dom.lock();
        if dom.node(root).is_none() {
            return Err(DomError::Detached(root.to_string()));
        }
        Ok(dom
            .nodes
            .iter()
            .filter(|n| {
                n.connected
                    && n.spec.selectors.iter().any(|s| s == selector)
                    && dom.is_descendant(n, root)
            })
            .map(|n| n.id.clone())
            .collect())
    }

    async fn element_by_id(&self, id: &str) -> Result<Option<ElementRef>, DomError> {
        let dom = self.dom.lock();
        Ok(dom
            .nodes
            .iter()
            .find(|n| n.connected && n.spec.dom_id.as_deref() == Some(id))
            .map(|n| n.id.clone()))
    }

    async fn describe(&self, element: &ElementRef) -> Result<Option<ElementState>, DomError> {
        Ok(self.dom.lock().node(element).map(MemoryNode::state))
    }

    async fn closest_form(&self, element: &ElementRef) -> Result<Option<ElementRef>, DomError> {
        let dom = self.dom.lock();
        let mut current = dom.node(element).map(|n| n.id.clone());
        while let Some(id) = current {
            let Some(node) = dom.nodes.iter().find(|n| n.id == id) else {
                break;
            };
            if node.spec.tag == "FORM" {
                return Ok(Some(node.id.clone()));
            }
            current = node.spec.parent.clone();
        }
        Ok(None)
    }

    async fn click(&self, element: &ElementRef) -> Result<(), DomError> {
        {
            let mut dom = self.dom.lock();
            dom.live_node_mut(element)?;
            dom.record(element, DomEventKind::Click);
        }
        self.run_hook(element);
        Ok(())
    }

    async fn request_submit(&self, form: &ElementRef) -> Result<bool, DomError> {
        {
            let mut dom = self.dom.lock();
            let node = dom.live_node_mut(form)?;
            if node.spec.tag != "FORM" {
                return Err(DomError::Unsupported {
                    element: form.to_string(),
                    operation: "requestSubmit",
                });
            }
            if !node.spec.submit_supported {
                return Ok(false);
            }
            dom.record(form, DomEventKind::Submit);
        }
        self.run_hook(form);
        Ok(true)
    }

    async fn read_text(
        &self,
        element: &ElementRef,
        _shape: FieldShape,
    ) -> Result<String, DomError> {
        self.dom
            .lock()
            .text(element)
            .ok_or_else(|| DomError::Detached(element.to_string()))
    }

    async fn write_value(&self, element: &ElementRef, value: &str) -> Result<(), DomError> {
        let mut dom = self.dom.lock();
        let node = dom.live_node_mut(element)?;
        if node.state().field_shape() != Some(FieldShape::PlainValue) {
            return Err(DomError::Unsupported {
                element: element.to_string(),
                operation: "value setter",
            });
        }
        node.spec.text = value.to_string();
        node.caret = None;
        dom.record(element, DomEventKind::Input { data: None });
        dom.focus_node(element);
        Ok(())
    }

    async fn edit_rich(
        &self,
        element: &ElementRef,
        mode: RichEditMode,
        text: &str,
    ) -> Result<(), DomError> {
        let mut dom = self.dom.lock();
        let node = dom.live_node_mut(element)?;
        if node.state().field_shape() != Some(FieldShape::RichEditable) {
            return Err(DomError::Unsupported {
                element: element.to_string(),
                operation: "rich edit",
            });
        }
        match mode {
            RichEditMode::ReplaceAll => node.spec.text = text.to_string(),
            RichEditMode::AppendAtEnd => node.spec.text.push_str(text),
        }
        node.caret = None;
        node.selection_collapsed = true;
        dom.focus_node(element);
        dom.record(
            element,
            DomEventKind::Input {
                data: Some(text.to_string()),
            },
        );
        Ok(())
    }

    async fn set_range_text(
        &self,
        element: &ElementRef,
        replacement: &str,
        start: usize,
        end: usize,
    ) -> Result<(), DomError> {
        let mut dom = self.dom.lock();
        let node = dom.live_node_mut(element)?;
        if node.state().field_shape() != Some(FieldShape::PlainValue) {
            return Err(DomError::Unsupported {
                element: element.to_string(),
                operation: "setRangeText",
            });
        }
        let len = utf16_len(&node.spec.text);
        let range = utf16_to_byte(&node.spec.text, start)
            .zip(utf16_to_byte(&node.spec.text, end))
            .filter(|(s, e)| s <= e);
        let Some((start_byte, end_byte)) = range else {
            return Err(DomError::InvalidRange { start, end, len });
        };
        node.spec
            .text
            .replace_range(start_byte..end_byte, replacement);
        node.caret = Some(start + utf16_len(replacement));
        dom.record(element, DomEventKind::Input { data: None });
        dom.focus_node(element);
        Ok(())
    }

    async fn cursor_snapshot(
        &self,
        element: &ElementRef,
        shape: FieldShape,
    ) -> Result<Option<CursorSnapshot>, DomError> {
        let dom = self.dom.lock();
        let Some(node) = dom.node(element) else {
            return Err(DomError::Detached(element.to_string()));
        };
        let caret = node.caret();
        let split = utf16_to_byte(&node.spec.text, caret).unwrap_or(node.spec.text.len());
        let (before, after) = node.spec.text.split_at(split);
        match shape {
            FieldShape::PlainValue => Ok(Some(CursorSnapshot::Plain {
                before: before.to_string(),
                caret,
            })),
            FieldShape::RichEditable => {
                if dom.focused.as_ref() != Some(element) {
                    return Ok(None);
                }
                Ok(Some(CursorSnapshot::Rich {
                    before: before.to_string(),
                    after: after.to_string(),
                    collapsed: node.selection_collapsed,
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn query_respects_registration_order_and_detachment() {
        let page = MemoryPage::new("https://chatgpt.com/");
        let a = page.insert(NodeSpec::textarea().matching(&["textarea"]));
        let b = page.insert(NodeSpec::textarea().matching(&["textarea"]));
        assert_eq!(page.query_all("textarea").await.unwrap(), vec![a.clone(), b.clone()]);

        page.with_dom(|dom| dom.remove(&a));
        assert_eq!(page.query_all("textarea").await.unwrap(), vec![b]);
        assert_eq!(page.describe(&a).await.unwrap(), None);
        assert!(matches!(
            page.write_value(&a, "x").await,
            Err(DomError::Detached(_))
        ));
    }

    #[tokio::test]
    async fn removing_a_form_detaches_its_children() {
        let page = MemoryPage::new("https://claude.ai/");
        let form = page.insert(NodeSpec::form());
        let button = page.insert(NodeSpec::button().matching(&["button"]).child_of(&form));
        assert_eq!(
            page.query_within(&form, "button").await.unwrap(),
            vec![button.clone()]
        );
        assert_eq!(page.closest_form(&button).await.unwrap(), Some(form.clone()));

        page.with_dom(|dom| dom.remove(&form));
        assert!(page.describe(&button).await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn show_for_expires_with_the_clock() {
        let page = MemoryPage::new("https://chatgpt.com/");
        let stop = page.insert(NodeSpec::button().hidden());
        page.with_dom(|dom| dom.show_for(&stop, Duration::from_millis(500)));
        assert!(page.describe(&stop).await.unwrap().unwrap().visible);

        tokio::time::advance(Duration::from_millis(600)).await;
        assert!(!page.describe(&stop).await.unwrap().unwrap().visible);
    }

    #[tokio::test]
    async fn set_range_text_uses_utf16_offsets() {
        let page = MemoryPage::new("https://chatgpt.com/");
        let area = page.insert(NodeSpec::textarea().text("é //fo tail"));
        page.set_range_text(&area, "PROMPT", 2, 6).await.unwrap();
        assert_eq!(page.text(&area).unwrap(), "é PROMPT tail");

        let err = page.set_range_text(&area, "x", 4, 99).await.unwrap_err();
        assert!(matches!(err, DomError::InvalidRange { .. }));
    }

    #[tokio::test]
    async fn click_hook_sees_the_clicked_element() {
        let page = MemoryPage::new("https://chatgpt.com/");
        let send = page.insert(NodeSpec::button());
        let stop = page.insert(NodeSpec::button().hidden());
        let send_id = send.clone();
        let stop_id = stop.clone();
        page.on_click(move |dom, clicked| {
            if clicked == &send_id {
                dom.set_visible(&stop_id, true);
            }
        });

        page.click(&send).await.unwrap();
        assert_eq!(page.clicks_on(&send), 1);
        assert!(page.describe(&stop).await.unwrap().unwrap().visible);
    }

    #[tokio::test]
    async fn rich_snapshot_requires_focus() {
        let page = MemoryPage::new("https://gemini.google.com/");
        let field = page.insert(NodeSpec::rich_editable().text("hi //x"));
        assert_eq!(
            page.cursor_snapshot(&field, FieldShape::RichEditable)
                .await
                .unwrap(),
            None
        );

        page.with_dom(|dom| {
            dom.focus(&field);
            dom.place_caret(&field, 3);
        });
        assert_eq!(
            page.cursor_snapshot(&field, FieldShape::RichEditable)
                .await
                .unwrap(),
            Some(CursorSnapshot::Rich {
                before: "hi ".into(),
                after: "//x".into(),
                collapsed: true,
            })
        );
    }
}
