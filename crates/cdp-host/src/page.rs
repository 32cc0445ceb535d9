use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use host_dom::{
    CursorSnapshot, DomError, ElementRef, ElementState, FieldShape, HostLocation, HostPage,
    RichEditMode,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::time::timeout;
use tracing::trace;

use crate::config::CdpHostConfig;
use crate::errors::CdpHostError;
use crate::scripts;
use crate::transport::{ChromiumTransport, ScriptTransport};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
enum Reply<T> {
    Ok(T),
    Detached,
    Unsupported,
    InvalidRange { start: usize, end: usize, len: usize },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
enum WireSnapshot {
    Plain {
        before: String,
        caret: usize,
    },
    Rich {
        before: String,
        after: String,
        collapsed: bool,
    },
}

impl From<WireSnapshot> for CursorSnapshot {
    fn from(wire: WireSnapshot) -> Self {
        match wire {
            WireSnapshot::Plain { before, caret } => CursorSnapshot::Plain { before, caret },
            WireSnapshot::Rich {
                before,
                after,
                collapsed,
            } => CursorSnapshot::Rich {
                before,
                after,
                collapsed,
            },
        }
    }
}

/// [`HostPage`] over a DevTools connection. Each call is one script
/// evaluation in the page.
pub struct CdpHostPage {
    transport: Arc<dyn ScriptTransport>,
    request_timeout: Duration,
}

impl CdpHostPage {
    pub fn new(transport: Arc<dyn ScriptTransport>, request_timeout: Duration) -> Self {
        Self {
            transport,
            request_timeout,
        }
    }

    /// Attach to the configured browser page.
    pub async fn connect(config: &CdpHostConfig) -> Result<Self, CdpHostError> {
        let transport = ChromiumTransport::connect(config).await?;
        Ok(Self::new(Arc::new(transport), config.request_timeout()))
    }

    async fn call<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        element: Option<&ElementRef>,
        body: &str,
        args: Value,
    ) -> Result<T, DomError> {
        let expression = scripts::build(body, &args);
        let raw = timeout(self.request_timeout, self.transport.evaluate(expression))
            .await
            .map_err(|_| DomError::Transport(format!("{operation} timed out")))??;
        trace!(target: "cdp-host", operation, reply = %raw, "script reply");

        let reply: Reply<T> = serde_json::from_value(raw)
            .map_err(|err| DomError::Script(format!("{operation}: {err}")))?;
        let element = || element.map(ToString::to_string).unwrap_or_default();
        match reply {
            Reply::Ok(value) => Ok(value),
            Reply::Detached => Err(DomError::Detached(element())),
            Reply::Unsupported => Err(DomError::Unsupported {
                element: element(),
                operation,
            }),
            Reply::InvalidRange { start, end, len } => {
                Err(DomError::InvalidRange { start, end, len })
            }
        }
    }

    async fn on_element<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        element: &ElementRef,
        body: &str,
        mut args: Value,
    ) -> Result<T, DomError> {
        args["ref"] = json!(element.as_str());
        self.call(operation, Some(element), body, args).await
    }
}

#[async_trait]
impl HostPage for CdpHostPage {
    async fn location(&self) -> Result<HostLocation, DomError> {
        self.call("location", None, scripts::LOCATION, json!({}))
            .await
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<ElementRef>, DomError> {
        self.call(
            "querySelectorAll",
            None,
            scripts::QUERY_ALL,
            json!({ "selector": selector }),
        )
        .await
    }

    async fn query_within(
        &self,
        root: &ElementRef,
        selector: &str,
    ) -> Result<Vec<ElementRef>, DomError> {
        self.on_element(
            "querySelectorAll",
            root,
            scripts::QUERY_WITHIN,
            json!({ "selector": selector }),
        )
        .await
    }

    async fn element_by_id(&self, id: &str) -> Result<Option<ElementRef>, DomError> {
        self.call("getElementById", None, scripts::ELEMENT_BY_ID, json!({ "id": id }))
            .await
    }

    async fn describe(&self, element: &ElementRef) -> Result<Option<ElementState>, DomError> {
        self.on_element("describe", element, scripts::DESCRIBE, json!({}))
            .await
    }

    async fn closest_form(&self, element: &ElementRef) -> Result<Option<ElementRef>, DomError> {
        self.on_element("closest", element, scripts::CLOSEST_FORM, json!({}))
            .await
    }

    async fn click(&self, element: &ElementRef) -> Result<(), DomError> {
        self.on_element("click", element, scripts::CLICK, json!({}))
            .await
    }

    async fn request_submit(&self, form: &ElementRef) -> Result<bool, DomError> {
        self.on_element("requestSubmit", form, scripts::REQUEST_SUBMIT, json!({}))
            .await
    }

    async fn read_text(
        &self,
        element: &ElementRef,
        shape: FieldShape,
    ) -> Result<String, DomError> {
        let plain = shape == FieldShape::PlainValue;
        self.on_element("readText", element, scripts::READ_TEXT, json!({ "plain": plain }))
            .await
    }

    async fn write_value(&self, element: &ElementRef, value: &str) -> Result<(), DomError> {
        self.on_element(
            "setValue",
            element,
            scripts::WRITE_VALUE,
            json!({ "value": value }),
        )
        .await
    }

    async fn edit_rich(
        &self,
        element: &ElementRef,
        mode: RichEditMode,
        text: &str,
    ) -> Result<(), DomError> {
        let append = mode == RichEditMode::AppendAtEnd;
        self.on_element(
            "insertText",
            element,
            scripts::EDIT_RICH,
            json!({ "append": append, "text": text }),
        )
        .await
    }

    async fn set_range_text(
        &self,
        element: &ElementRef,
        replacement: &str,
        start: usize,
        end: usize,
    ) -> Result<(), DomError> {
        self.on_element(
            "setRangeText",
            element,
            scripts::SET_RANGE_TEXT,
            json!({ "replacement": replacement, "start": start, "end": end }),
        )
        .await
    }

    async fn cursor_snapshot(
        &self,
        element: &ElementRef,
        shape: FieldShape,
    ) -> Result<Option<CursorSnapshot>, DomError> {
        let plain = shape == FieldShape::PlainValue;
        let wire: Option<WireSnapshot> = self
            .on_element(
                "cursorSnapshot",
                element,
                scripts::CURSOR_SNAPSHOT,
                json!({ "plain": plain }),
            )
            .await?;
        Ok(wire.map(CursorSnapshot::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    /// Replays canned replies and keeps every evaluated expression.
    #[derive(Default)]
    struct ScriptedTransport {
        replies: Mutex<VecDeque<Result<Value, DomError>>>,
        seen: Mutex<Vec<String>>,
        stall: bool,
    }

    impl ScriptedTransport {
        fn replying(replies: Vec<Value>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into_iter().map(Ok).collect()),
                ..Default::default()
            })
        }
    }

    #[async_trait]
    impl ScriptTransport for ScriptedTransport {
        async fn evaluate(&self, expression: String) -> Result<Value, DomError> {
            self.seen.lock().push(expression);
            if self.stall {
                std::future::pending::<()>().await;
            }
            self.replies
                .lock()
                .pop_front()
                .unwrap_or(Ok(Value::Null))
        }
    }

    fn page(transport: &Arc<ScriptedTransport>) -> CdpHostPage {
        CdpHostPage::new(transport.clone(), Duration::from_secs(1))
    }

    #[tokio::test]
    async fn describe_parses_element_state() {
        let transport = ScriptedTransport::replying(vec![
            json!({"ok": {
                "tag": "BUTTON",
                "visible": true,
                "disabled": false,
                "attributes": {"aria-label": "Send message", "data-lq-ref": "lq-3"}
            }}),
            json!({"ok": null}),
        ]);
        let page = page(&transport);
        let send = ElementRef::new("lq-3");

        let state = page.describe(&send).await.unwrap().unwrap();
        assert!(state.is_button_enabled_and_visible());
        assert_eq!(state.attr("aria-label"), Some("Send message"));

        assert_eq!(page.describe(&send).await.unwrap(), None);
        assert!(transport.seen.lock()[0].contains(r#""ref":"lq-3""#));
    }

    #[tokio::test]
    async fn reply_codes_map_to_dom_errors() {
        let transport = ScriptedTransport::replying(vec![
            json!("detached"),
            json!("unsupported"),
            json!({"invalidRange": {"start": 4, "end": 9, "len": 5}}),
        ]);
        let page = page(&transport);
        let area = ElementRef::new("lq-1");

        let err = page.click(&area).await.unwrap_err();
        assert_eq!(err, DomError::Detached("lq-1".into()));

        let err = page.write_value(&area, "x").await.unwrap_err();
        assert!(matches!(err, DomError::Unsupported { operation: "setValue", .. }));

        let err = page.set_range_text(&area, "x", 4, 9).await.unwrap_err();
        assert_eq!(err, DomError::InvalidRange { start: 4, end: 9, len: 5 });
    }

    #[tokio::test]
    async fn cursor_snapshot_shapes() {
        let transport = ScriptedTransport::replying(vec![
            json!({"ok": {"plain": {"before": "hi //x", "caret": 6}}}),
            json!({"ok": {"rich": {"before": "a //q", "after": " b", "collapsed": true}}}),
            json!({"ok": null}),
        ]);
        let page = page(&transport);
        let el = ElementRef::new("lq-1");

        assert_eq!(
            page.cursor_snapshot(&el, FieldShape::PlainValue).await.unwrap(),
            Some(CursorSnapshot::Plain {
                before: "hi //x".into(),
                caret: 6
            })
        );
        assert_eq!(
            page.cursor_snapshot(&el, FieldShape::RichEditable).await.unwrap(),
            Some(CursorSnapshot::Rich {
                before: "a //q".into(),
                after: " b".into(),
                collapsed: true
            })
        );
        assert_eq!(
            page.cursor_snapshot(&el, FieldShape::RichEditable).await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn unexpected_shape_is_a_script_error() {
        let transport = ScriptedTransport::replying(vec![json!({"ok": 42})]);
        let err = page(&transport).query_all("textarea").await.unwrap_err();
        assert!(matches!(err, DomError::Script(msg) if msg.starts_with("querySelectorAll")));
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_page_times_out() {
        let transport = Arc::new(ScriptedTransport {
            stall: true,
            ..Default::default()
        });
        let err = page(&transport).location().await.unwrap_err();
        assert!(err.is_retryable());
        assert!(matches!(err, DomError::Transport(msg) if msg.contains("timed out")));
    }
}
