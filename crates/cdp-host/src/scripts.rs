//! Page-side snippets, one per `HostPage` operation
//!
//! Every snippet runs inside an arrow function that receives `args` and the
//! `lq` helpers, and returns one of:
//! - `{ ok: <value> }`
//! - `"detached"` when the referenced element is gone
//! - `"unsupported"` when the element lacks the needed API
//! - `{ invalidRange: { start, end, len } }`

use serde_json::Value;

/// Element references are stable `data-lq-ref` attributes assigned on first
/// sight.
const PRELUDE: &str = r#"
const lq = {
  find(ref) {
    const el = document.querySelector(`[data-lq-ref="${CSS.escape(ref)}"]`);
    return el && el.isConnected ? el : null;
  },
  ref(el) {
    if (!el.dataset.lqRef) {
      window.__lqNext = (window.__lqNext || 0) + 1;
      el.dataset.lqRef = 'lq-' + window.__lqNext;
    }
    return el.dataset.lqRef;
  },
  visible(el) {
    return !!(el.offsetParent || el.getClientRects().length);
  },
};
"#;

/// Wrap `body` into a self-invoking expression bound to `args`.
pub(crate) fn build(body: &str, args: &Value) -> String {
    format!("(() => {{ {PRELUDE} const args = {args};\n{body}\n}})()")
}

pub(crate) const LOCATION: &str = r#"
return { ok: { hostname: location.hostname, url: location.href } };
"#;

pub(crate) const QUERY_ALL: &str = r#"
return { ok: Array.from(document.querySelectorAll(args.selector), lq.ref) };
"#;

pub(crate) const QUERY_WITHIN: &str = r#"
const root = lq.find(args.ref);
if (!root) return 'detached';
return { ok: Array.from(root.querySelectorAll(args.selector), lq.ref) };
"#;

pub(crate) const ELEMENT_BY_ID: &str = r#"
const el = document.getElementById(args.id);
return { ok: el ? lq.ref(el) : null };
"#;

pub(crate) const DESCRIBE: &str = r#"
const el = lq.find(args.ref);
if (!el) return { ok: null };
const attributes = {};
for (const attr of el.attributes) attributes[attr.name] = attr.value;
return { ok: { tag: el.tagName, visible: lq.visible(el), disabled: !!el.disabled, attributes } };
"#;

pub(crate) const CLOSEST_FORM: &str = r#"
const el = lq.find(args.ref);
if (!el) return 'detached';
const form = el.closest('form');
return { ok: form ? lq.ref(form) : null };
"#;

pub(crate) const CLICK: &str = r#"
const el = lq.find(args.ref);
if (!el) return 'detached';
el.click();
return { ok: null };
"#;

pub(crate) const REQUEST_SUBMIT: &str = r#"
const el = lq.find(args.ref);
if (!el) return 'detached';
if (typeof el.requestSubmit !== 'function') return { ok: false };
el.requestSubmit();
return { ok: true };
"#;

pub(crate) const READ_TEXT: &str = r#"
const el = lq.find(args.ref);
if (!el) return 'detached';
return { ok: args.plain ? (el.value ?? '') : (el.textContent ?? '') };
"#;

pub(crate) const WRITE_VALUE: &str = r#"
const el = lq.find(args.ref);
if (!el) return 'detached';
const proto = el instanceof HTMLTextAreaElement
  ? HTMLTextAreaElement.prototype
  : el instanceof HTMLInputElement ? HTMLInputElement.prototype : null;
const setter = proto && Object.getOwnPropertyDescriptor(proto, 'value')?.set;
if (!setter) return 'unsupported';
setter.call(el, args.value);
el.dispatchEvent(new Event('input', { bubbles: true }));
el.focus();
return { ok: null };
"#;

pub(crate) const EDIT_RICH: &str = r#"
const el = lq.find(args.ref);
if (!el) return 'detached';
if (!el.isContentEditable) return 'unsupported';
el.focus();
const range = document.createRange();
range.selectNodeContents(el);
if (args.append) {
  range.collapse(false);
} else {
  range.deleteContents();
}
const node = document.createTextNode(args.text);
range.insertNode(node);
range.setStartAfter(node);
range.collapse(true);
const sel = window.getSelection();
sel.removeAllRanges();
sel.addRange(range);
el.dispatchEvent(new InputEvent('input', { bubbles: true, inputType: 'insertText', data: args.text }));
return { ok: null };
"#;

pub(crate) const SET_RANGE_TEXT: &str = r#"
const el = lq.find(args.ref);
if (!el) return 'detached';
if (typeof el.setRangeText !== 'function') return 'unsupported';
const len = el.value.length;
if (args.start > args.end || args.end > len) {
  return { invalidRange: { start: args.start, end: args.end, len } };
}
el.setRangeText(args.replacement, args.start, args.end, 'end');
el.dispatchEvent(new Event('input', { bubbles: true }));
el.focus();
return { ok: null };
"#;

pub(crate) const CURSOR_SNAPSHOT: &str = r#"
const el = lq.find(args.ref);
if (!el) return 'detached';
if (args.plain) {
  if (typeof el.selectionStart !== 'number') return { ok: null };
  const caret = el.selectionStart;
  return { ok: { plain: { before: el.value.slice(0, caret), caret } } };
}
const sel = window.getSelection();
if (!sel || sel.rangeCount === 0) return { ok: null };
const range = sel.getRangeAt(0);
if (!el.contains(range.startContainer)) return { ok: null };
const pre = document.createRange();
pre.selectNodeContents(el);
pre.setEnd(range.startContainer, range.startOffset);
const post = document.createRange();
post.selectNodeContents(el);
post.setStart(range.endContainer, range.endOffset);
return { ok: { rich: { before: pre.toString(), after: post.toString(), collapsed: range.collapsed } } };
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn build_inlines_args_as_json() {
        let script = build(QUERY_ALL, &json!({"selector": "div[role=\"textbox\"]"}));
        assert!(script.starts_with("(() => {"));
        assert!(script.ends_with("})()"));
        assert!(script.contains(r#"const args = {"selector":"div[role=\"textbox\"]"};"#));
    }
}
