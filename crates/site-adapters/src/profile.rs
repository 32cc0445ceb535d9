//! Static selector data for each supported host

use host_dom::HostLocation;
use langqueue_core_types::AdapterId;

/// One step of the input probe.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputProbe {
    /// First visible match of the selector that is a text field
    Visible(&'static str),
    /// `getElementById`, accepted only when it is a visible `<textarea>`
    TextareaById(&'static str),
}

/// Selectors describing one chat host.
#[derive(Clone, Copy, Debug)]
pub struct SiteProfile {
    pub id: AdapterId,
    /// Exact hostnames; subdomains of these also match
    pub hosts: &'static [&'static str],
    pub input_probes: &'static [InputProbe],
    /// Tried in order; the first enabled and visible button is clicked
    pub send_selectors: &'static [&'static str],
    pub stop_selectors: &'static [&'static str],
    pub busy_selectors: &'static [&'static str],
    /// Send control whose disabled state signals generation while text is pending
    pub send_state_selector: &'static str,
}

impl SiteProfile {
    pub fn matches(&self, location: &HostLocation) -> bool {
        let hostname = location.hostname.as_str();
        self.hosts.iter().any(|host| {
            hostname == *host
                || hostname
                    .strip_suffix(host)
                    .is_some_and(|prefix| prefix.ends_with('.'))
        })
    }
}

/// Buttons and submit controls inside the input's form.
pub const FORM_SUBMIT_SELECTOR: &str = r#"button, [type="submit"]"#;

const SPINNERS: [&str; 4] = [
    r#"[class*="spinner" i]"#,
    r#"[class*="loading" i]"#,
    r#"[class*="generating" i]"#,
    r#"[role="progressbar"]"#,
];

pub const CHATGPT: SiteProfile = SiteProfile {
    id: AdapterId::Chatgpt,
    hosts: &["chatgpt.com", "chat.openai.com"],
    input_probes: &[
        InputProbe::Visible(r#"div[contenteditable="true"][role="textbox"]"#),
        InputProbe::Visible(r#"div[contenteditable="true"][data-testid*="prompt" i]"#),
        InputProbe::Visible(r#"div[contenteditable="true"]"#),
        InputProbe::TextareaById("prompt-textarea"),
        InputProbe::Visible(
            r#"form textarea:not([readonly]):not([disabled]):not([class*="fallbackTextarea"])"#,
        ),
        InputProbe::Visible("textarea"),
    ],
    send_selectors: &[
        "#composer-submit-button",
        "button#composer-submit-button",
        "button.composer-submit-btn",
        r#"button[data-testid="send-button"]"#,
        r#"button[aria-label="Send message"]"#,
        r#"button[aria-label*="Send" i]"#,
        r#"button[aria-label*="submit" i]"#,
        r#"div[role="button"][aria-label*="Send" i]"#,
        r#"div[role="button"][data-testid*="send" i]"#,
        r#"button[type="submit"]"#,
        r#"form button[type="submit"]"#,
        r#"form [type="submit"]"#,
    ],
    stop_selectors: &[
        r#"button[aria-label="Stop generating"]"#,
        r#"button[aria-label*="Stop" i]"#,
        r#"button[data-testid="stop-button"]"#,
    ],
    busy_selectors: &SPINNERS,
    send_state_selector: r#"button[data-testid="send-button"], button[aria-label*="Send" i]"#,
};

pub const CLAUDE: SiteProfile = SiteProfile {
    id: AdapterId::Claude,
    hosts: &["claude.ai"],
    input_probes: &[
        InputProbe::Visible(r#"div[contenteditable="true"][role="textbox"]"#),
        InputProbe::Visible(r#"div[aria-label*="Message" i][contenteditable="true"]"#),
        InputProbe::Visible(r#"div[data-placeholder*="Message" i][contenteditable="true"]"#),
        InputProbe::Visible("textarea"),
    ],
    send_selectors: &[
        r#"button[aria-label="Send message"]"#,
        r#"button[aria-label="Send"]"#,
        r#"button[aria-label*="Send" i]"#,
        r#"button[data-testid="send-button"]"#,
        r#"button[data-testid*="send" i]"#,
        r#"div[role="button"][aria-label*="Send" i]"#,
        r#"div[role="button"][data-testid*="send" i]"#,
        r#"button[type="submit"]"#,
        r#"form button[type="submit"]"#,
        r#"form [type="submit"]"#,
    ],
    stop_selectors: &[
        r#"button[aria-label="Stop generating"]"#,
        r#"button[aria-label*="Stop" i]"#,
        r#"button[aria-label*="Cancel" i]"#,
    ],
    busy_selectors: &[
        r#"[class*="spinner" i]"#,
        r#"[class*="loading" i]"#,
        r#"[class*="generating" i]"#,
        r#"[role="progressbar"]"#,
        r#"[aria-busy="true"]"#,
    ],
    send_state_selector: r#"button[aria-label*="Send" i], button[type="submit"]"#,
};

pub const GEMINI: SiteProfile = SiteProfile {
    id: AdapterId::Gemini,
    hosts: &["gemini.google.com"],
    input_probes: &[InputProbe::Visible(
        r#"div[contenteditable="true"][role="textbox"], textarea"#,
    )],
    send_selectors: &[
        r#"button[aria-label="Send message"]"#,
        r#"button[aria-label*="Send" i]"#,
        "button.send-button",
        r#"button[type="submit"]"#,
        r#"form button[type="submit"]"#,
        r#"form [type="submit"]"#,
    ],
    stop_selectors: &[
        r#"button[aria-label="Stop"]"#,
        r#"button[aria-label*="Stop" i]"#,
        r#"button[aria-label*="Cancel" i]"#,
    ],
    busy_selectors: &SPINNERS,
    send_state_selector: r#"button[aria-label*="Send" i], button[type="submit"]"#,
};

/// Profiles in selection order.
pub const PROFILES: [SiteProfile; 3] = [CHATGPT, CLAUDE, GEMINI];
