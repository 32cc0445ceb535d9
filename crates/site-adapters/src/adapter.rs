//! The adapter contract and its selector-driven implementation

use std::sync::Arc;

use async_trait::async_trait;
use host_dom::{DomError, ElementRef, ElementState, HostLocation, HostPage, InputHandle};
use langqueue_core_types::AdapterId;
use tokio::time::{sleep, Instant};
use tracing::{debug, trace};

use crate::idle::IdleWait;
use crate::profile::{InputProbe, SiteProfile, FORM_SUBMIT_SELECTOR};

/// Capabilities every supported host provides.
///
/// Host failures never escape: lookups degrade to `None` and actions to
/// `false`.
#[async_trait]
pub trait SiteAdapter: Send + Sync {
    fn id(&self) -> AdapterId;

    /// Pure check against the page location
    fn matches(&self, location: &HostLocation) -> bool;

    /// Current input control, probed fresh on every call
    async fn find_input(&self) -> Option<InputHandle>;

    /// Whether a previously found handle is still connected and visible
    async fn revalidate(&self, handle: &InputHandle) -> bool;

    async fn is_generating(&self) -> bool;

    /// Visible, enabled and not busy
    async fn is_input_ready(&self, handle: &InputHandle) -> bool;

    /// Submit the current input. `false` when the field is empty or no send
    /// strategy worked.
    async fn click_send(&self, input: Option<&InputHandle>) -> bool;

    /// Reuse `previous` when it is still valid, otherwise probe again.
    async fn resolve_input(&self, previous: Option<&InputHandle>) -> Option<InputHandle> {
        if let Some(handle) = previous {
            if self.revalidate(handle).await {
                return Some(handle.clone());
            }
            debug!(element = %handle.element, "input handle went stale");
        }
        self.find_input().await
    }

    /// Poll until nothing is generating and the input is ready.
    async fn wait_until_ready(&self, wait: IdleWait) -> bool {
        let deadline = wait.deadline_from(Instant::now());
        while Instant::now() < deadline {
            if !self.is_generating().await {
                if let Some(input) = self.find_input().await {
                    if self.is_input_ready(&input).await {
                        return true;
                    }
                }
            }
            sleep(wait.poll).await;
        }
        false
    }

    /// Two-phase bounded poll: wait for generation to start, then for it to
    /// stop with the input ready again. `false` means the deadline passed.
    async fn wait_for_idle(&self, wait: IdleWait) -> bool {
        let deadline = wait.deadline_from(Instant::now());

        let mut started = false;
        while Instant::now() < deadline {
            if self.is_generating().await {
                started = true;
                break;
            }
            sleep(wait.poll).await;
        }
        trace!(adapter = %self.id(), started, "idle wait phase one done");

        let remaining = deadline.saturating_duration_since(Instant::now());
        let phase_two = IdleWait {
            timeout: remaining,
            ..wait
        };
        if !remaining.is_zero() && self.wait_until_ready(phase_two).await {
            return true;
        }
        debug!(adapter = %self.id(), started, "idle wait timed out");
        false
    }
}

/// `SiteAdapter` driven by a `SiteProfile`.
pub struct ProfileAdapter {
    profile: SiteProfile,
    page: Arc<dyn HostPage>,
}

impl ProfileAdapter {
    pub fn new(profile: SiteProfile, page: Arc<dyn HostPage>) -> Self {
        Self { profile, page }
    }

    pub fn profile(&self) -> &SiteProfile {
        &self.profile
    }

    async fn state_of(&self, element: &ElementRef) -> Option<ElementState> {
        match self.page.describe(element).await {
            Ok(state) => state,
            Err(err) => {
                trace!(%element, error = %err, "describe failed");
                None
            }
        }
    }

    async fn first_match(&self, selector: &str) -> Option<ElementRef> {
        self.page
            .query_all(selector)
            .await
            .map_err(|err| trace!(selector, error = %err, "query failed"))
            .ok()?
            .into_iter()
            .next()
    }

    async fn probe(&self, probe: &InputProbe) -> Result<Option<InputHandle>, DomError> {
        match probe {
            InputProbe::Visible(selector) => {
                for element in self.page.query_all(selector).await? {
                    let Some(state) = self.page.describe(&element).await? else {
                        continue;
                    };
                    if !state.is_visible() {
                        continue;
                    }
                    if let Some(shape) = state.field_shape() {
                        return Ok(Some(InputHandle::new(element, shape)));
                    }
                }
                Ok(None)
            }
            InputProbe::TextareaById(id) => {
                let Some(element) = self.page.element_by_id(id).await? else {
                    return Ok(None);
                };
                let handle = self.page.describe(&element).await?.and_then(|state| {
                    let is_textarea = state.tag.eq_ignore_ascii_case("TEXTAREA");
                    (is_textarea && state.is_visible())
                        .then(|| state.field_shape())
                        .flatten()
                });
                Ok(handle.map(|shape| InputHandle::new(element, shape)))
            }
        }
    }

    async fn any_visible(&self, selectors: &[&str]) -> bool {
        for selector in selectors {
            if let Some(element) = self.first_match(selector).await {
                if self.state_of(&element).await.is_some_and(|s| s.is_visible()) {
                    trace!(selector, "generation signal visible");
                    return true;
                }
            }
        }
        false
    }

    async fn input_text(&self, handle: &InputHandle) -> String {
        self.page
            .read_text(&handle.element, handle.shape)
            .await
            .unwrap_or_default()
    }

    async fn click_if_enabled(&self, element: &ElementRef) -> bool {
        let clickable = self
            .state_of(element)
            .await
            .is_some_and(|s| s.is_button_enabled_and_visible());
        if !clickable {
            return false;
        }
        match self.page.click(element).await {
            Ok(()) => true,
            Err(err) => {
                debug!(%element, error = %err, "send click failed");
                false
            }
        }
    }

    async fn submit_via_form(&self, target: &InputHandle) -> bool {
        let form = match self.page.closest_form(&target.element).await {
            Ok(Some(form)) => form,
            _ => return false,
        };
        let controls = self
            .page
            .query_within(&form, FORM_SUBMIT_SELECTOR)
            .await
            .unwrap_or_default();
        for control in &controls {
            if self.click_if_enabled(control).await {
                debug!(adapter = %self.profile.id, %control, "sent via form button");
                return true;
            }
        }
        match self.page.request_submit(&form).await {
            Ok(submitted) => {
                if submitted {
                    debug!(adapter = %self.profile.id, %form, "sent via requestSubmit");
                }
                submitted
            }
            Err(err) => {
                debug!(%form, error = %err, "requestSubmit failed");
                false
            }
        }
    }
}

#[async_trait]
impl SiteAdapter for ProfileAdapter {
    fn id(&self) -> AdapterId {
        self.profile.id
    }

    fn matches(&self, location: &HostLocation) -> bool {
        self.profile.matches(location)
    }

    async fn find_input(&self) -> Option<InputHandle> {
        for probe in self.profile.input_probes {
            match self.probe(probe).await {
                Ok(Some(handle)) => {
                    trace!(adapter = %self.profile.id, ?probe, element = %handle.element, "input found");
                    return Some(handle);
                }
                Ok(None) => {}
                Err(err) => trace!(?probe, error = %err, "input probe failed"),
            }
        }
        None
    }

    async fn revalidate(&self, handle: &InputHandle) -> bool {
        self.state_of(&handle.element)
            .await
            .is_some_and(|s| s.is_visible() && s.field_shape() == Some(handle.shape))
    }

    async fn is_generating(&self) -> bool {
        if self.any_visible(self.profile.stop_selectors).await {
            return true;
        }
        if self.any_visible(self.profile.busy_selectors).await {
            return true;
        }

        let Some(send) = self.first_match(self.profile.send_state_selector).await else {
            return false;
        };
        let Some(state) = self.state_of(&send).await else {
            return false;
        };
        if !state.is_visible() || !state.is_disabled_like() {
            return false;
        }
        match self.find_input().await {
            Some(input) => !self.input_text(&input).await.trim().is_empty(),
            None => false,
        }
    }

    async fn is_input_ready(&self, handle: &InputHandle) -> bool {
        self.state_of(&handle.element)
            .await
            .is_some_and(|s| s.is_ready_input())
    }

    async fn click_send(&self, input: Option<&InputHandle>) -> bool {
        let Some(target) = self.resolve_input(input).await else {
            debug!(adapter = %self.profile.id, "no input to send from");
            return false;
        };
        if self.input_text(&target).await.trim().is_empty() {
            debug!(adapter = %self.profile.id, "refusing to send an empty field");
            return false;
        }

        for selector in self.profile.send_selectors {
            let Some(candidate) = self.first_match(selector).await else {
                continue;
            };
            if self.click_if_enabled(&candidate).await {
                debug!(adapter = %self.profile.id, selector, "sent via button");
                return true;
            }
        }

        self.submit_via_form(&target).await
    }
}
