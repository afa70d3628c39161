//! The consent widget
//!
//! Owns the in-memory consent state. Every change is written through to the
//! preference store and, while the widget is started, re-rendered into the
//! shared document. Construction has no side effects; [`CookieGuardian::start`]
//! renders, replays granted callbacks and schedules the periodic sweep.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use guardian_dom::{Document, NodeId, STABLE_ID_ATTR};
use guardian_privacy::{
    ConsentCategory, ConsentState, SweepReport, Sweeper, TrackerDenylist, STORAGE_NAMESPACE,
};
use guardian_storage::PreferenceStore;

use crate::banner::{self, ACCEPT_BUTTON_ID, ACTIVE_CLASS, BANNER_ID, BUTTON_ID, CLOSE_CLASS};
use crate::config::Config;
use crate::error::CoreError;
use crate::state::BannerState;
use crate::Result;

/// Time between two tracker sweeps.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(30);

pub type SharedDocument = Arc<Mutex<Document>>;

/// What a click on a bound control does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ToggleBanner,
    Close,
    Deny,
    AcceptAll,
    Toggle(ConsentCategory),
}

/// Periodic cleanup while marketing consent is not granted.
#[derive(Clone)]
struct SweepTask {
    store: Arc<dyn PreferenceStore>,
    document: SharedDocument,
    denylist: Arc<TrackerDenylist>,
    stop_all_cookies: bool,
}

impl SweepTask {
    /// Re-reads marketing consent from the store on every tick, so a choice
    /// made in another page of the same origin is honoured.
    fn tick(&self) -> Option<SweepReport> {
        let marketing = ConsentCategory::Marketing
            .storage_key()
            .and_then(|key| self.store.get_bool(key))
            .unwrap_or(false);

        if marketing || !self.stop_all_cookies {
            return None;
        }

        let mut doc = self.document.lock();
        let report = Sweeper::new(&mut doc).sweep(&self.denylist);
        Some(report)
    }

    async fn run(self) {
        let start = tokio::time::Instant::now() + SWEEP_INTERVAL;
        let mut ticker = tokio::time::interval_at(start, SWEEP_INTERVAL);
        loop {
            ticker.tick().await;
            self.tick();
        }
    }
}

pub struct CookieGuardian {
    config: Arc<Config>,
    store: Arc<dyn PreferenceStore>,
    document: SharedDocument,
    mount: NodeId,
    consent: ConsentState,
    banner: BannerState,
    /// Live control node -> action, rebuilt on every render
    bindings: HashMap<NodeId, Action>,
    sweep: SweepTask,
    sweep_handle: Option<JoinHandle<()>>,
    started: bool,
}

impl CookieGuardian {
    /// Hydrate state from `store`. Nothing is rendered or scheduled yet.
    ///
    /// `mount` defaults to the document body.
    pub fn create(
        config: Config,
        store: Arc<dyn PreferenceStore>,
        document: SharedDocument,
        mount: Option<NodeId>,
    ) -> Result<Self> {
        let mount = {
            let doc = document.lock();
            let mount = mount.unwrap_or_else(|| doc.body());
            if !doc.is_connected(mount) || doc.tag_name(mount).is_none() {
                return Err(CoreError::MountPointDetached(mount));
            }
            mount
        };

        let banner = BannerState::from_persisted(store.get_bool(STORAGE_NAMESPACE));
        let mut consent = ConsentState::default();
        for category in ConsentCategory::OPTIONAL {
            let stored = category.storage_key().and_then(|key| store.get_bool(key));
            consent.set(category, stored.unwrap_or(category.default_granted()));
        }

        tracing::info!(
            banner = %banner,
            granted = ?consent.granted(),
            "Hydrated consent state"
        );

        let sweep = SweepTask {
            store: Arc::clone(&store),
            document: Arc::clone(&document),
            denylist: Arc::new(TrackerDenylist::with_extra_domains(
                &config.extra_tracker_domains,
            )),
            stop_all_cookies: config.stop_all_cookies,
        };

        Ok(Self {
            config: Arc::new(config),
            store,
            document,
            mount,
            consent,
            banner,
            bindings: HashMap::new(),
            sweep,
            sweep_handle: None,
            started: false,
        })
    }

    /// Render, fire callbacks for categories already granted, and schedule
    /// the periodic sweep on the current tokio runtime.
    ///
    /// Without a runtime the sweep is skipped; [`sweep_now`](Self::sweep_now)
    /// still works.
    pub fn start(&mut self) {
        if self.started {
            tracing::warn!("Cookie guardian already started");
            return;
        }
        self.started = true;

        if let Err(e) = self.render_button() {
            tracing::error!(error = %e, "Failed to render cookie button");
        }
        self.rerender();
        self.run_callbacks();

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let task = self.sweep.clone();
                self.sweep_handle = Some(runtime.spawn(task.run()));
                tracing::debug!(interval_secs = SWEEP_INTERVAL.as_secs(), "Scheduled tracker sweep");
            }
            Err(_) => {
                tracing::warn!("No async runtime, periodic tracker sweep disabled");
            }
        }
    }

    // === State ===

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn consent(&self) -> ConsentState {
        self.consent
    }

    pub fn banner_state(&self) -> BannerState {
        self.banner
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn document(&self) -> &SharedDocument {
        &self.document
    }

    /// Current banner element, if open and rendered.
    pub fn banner_node(&self) -> Option<NodeId> {
        self.document
            .lock()
            .find_by_attr(self.mount, STABLE_ID_ATTR, BANNER_ID)
    }

    /// Current toggle button element, once started.
    pub fn button_node(&self) -> Option<NodeId> {
        self.document
            .lock()
            .find_by_attr(self.mount, STABLE_ID_ATTR, BUTTON_ID)
    }

    // === Actions ===

    /// Floating button: show or hide the banner. Not persisted.
    pub fn toggle_banner(&mut self) {
        self.banner = self.banner.toggled();
        tracing::debug!(banner = %self.banner, "Toggled banner");
        self.rerender();
    }

    /// Close the banner, keeping whatever the user toggled.
    pub fn close(&mut self) {
        self.banner = BannerState::Closed;
        self.persist();
        tracing::info!(granted = ?self.consent.granted(), "Banner closed");
        self.rerender();
    }

    /// Withdraw every optional category. No callbacks run.
    pub fn deny(&mut self) {
        self.consent.deny_all();
        self.banner = BannerState::Closed;
        self.persist();
        tracing::info!("Denied all optional cookies");
        self.rerender();
    }

    /// Grant every optional category and run each registered callback once.
    pub fn accept_all(&mut self) {
        self.consent.grant_all();
        self.banner = BannerState::Closed;
        self.persist();
        tracing::info!("Accepted all cookies");
        self.run_callbacks();
        self.rerender();
    }

    /// Checkbox change while the banner is open. Persisted immediately, no
    /// re-render. Returns false if nothing changed hands: Required, or the
    /// banner is closed.
    pub fn set_category(&mut self, category: ConsentCategory, granted: bool) -> bool {
        if !self.banner.is_open() {
            tracing::debug!(category = %category, "Ignoring toggle while banner is closed");
            return false;
        }
        if !self.consent.set(category, granted) {
            return false;
        }
        if let Some(key) = category.storage_key() {
            self.store.set_bool(key, granted);
        }
        tracing::debug!(category = %category, granted, "Toggled category");
        true
    }

    /// Forget every stored choice and show the banner again.
    pub fn reset(&mut self) {
        self.store.clear_namespace(STORAGE_NAMESPACE);
        self.consent = ConsentState::default();
        self.banner = BannerState::Open;
        tracing::info!("Reset stored consent");
        self.rerender();
    }

    /// Deliver a click on `target`, bubbling up to the nearest bound control.
    ///
    /// A checkbox target is flipped first, as the host would before handlers
    /// run. Returns the action taken, if any.
    pub fn click(&mut self, target: NodeId) -> Option<Action> {
        let (action, checked) = {
            let document = Arc::clone(&self.document);
            let mut doc = document.lock();

            if !doc.is_connected(target) || doc.has_attr(target, "disabled") {
                return None;
            }

            let is_checkbox = doc.tag_name(target) == Some("input")
                && doc.attr(target, "type") == Some("checkbox");
            if is_checkbox && !doc.remove_attr(target, "checked") {
                doc.set_attr(target, "checked", "checked").ok()?;
            }

            let (node, action) = std::iter::successors(Some(target), |n| doc.parent(*n))
                .find_map(|n| self.bindings.get(&n).map(|a| (n, *a)))?;
            (action, doc.has_attr(node, "checked"))
        };

        match action {
            Action::ToggleBanner => self.toggle_banner(),
            Action::Close => self.close(),
            Action::Deny => self.deny(),
            Action::AcceptAll => self.accept_all(),
            Action::Toggle(category) => {
                self.set_category(category, checked);
            }
        }

        Some(action)
    }

    /// Run one sweep tick immediately.
    pub fn sweep_now(&self) -> Option<SweepReport> {
        self.sweep.tick()
    }

    // === Internals ===

    fn persist(&self) {
        self.store.set_bool(STORAGE_NAMESPACE, self.banner.is_open());
        for category in ConsentCategory::OPTIONAL {
            if let Some(key) = category.storage_key() {
                self.store.set_bool(key, self.consent.get(category));
            }
        }
    }

    fn run_callbacks(&self) {
        for category in self.consent.granted() {
            let Some(callback) = self.config.callbacks.get(category) else {
                continue;
            };
            tracing::debug!(category = %category, "Running consent callback");
            if catch_unwind(AssertUnwindSafe(|| callback())).is_err() {
                tracing::error!(category = %category, "Consent callback panicked");
            }
        }
    }

    fn rerender(&mut self) {
        if !self.started {
            return;
        }
        if let Err(e) = self.render() {
            tracing::error!(error = %e, "Failed to render cookie banner");
        }
    }

    fn render_button(&mut self) -> Result<()> {
        let document = Arc::clone(&self.document);
        let mut doc = document.lock();

        let button = guardian_dom::render(&mut doc, &banner::button_html(), BUTTON_ID, self.mount)?;
        self.bindings.retain(|_, action| *action != Action::ToggleBanner);
        self.bindings.insert(button, Action::ToggleBanner);
        Ok(())
    }

    /// Closed: drop the banner. Open: rebuild it from config and state and
    /// rebind every control.
    fn render(&mut self) -> Result<()> {
        let document = Arc::clone(&self.document);
        let mut doc = document.lock();

        self.bindings.retain(|_, action| *action == Action::ToggleBanner);

        if !self.banner.is_open() {
            if let Some(previous) = doc.find_by_attr(self.mount, STABLE_ID_ATTR, BANNER_ID) {
                doc.remove(previous);
            }
            return Ok(());
        }

        let node = guardian_dom::render(
            &mut doc,
            &banner::banner_html(&self.config),
            BANNER_ID,
            self.mount,
        )?;
        doc.add_class(node, ACTIVE_CLASS)?;

        let close = doc
            .find_by_class(node, CLOSE_CLASS)
            .ok_or(CoreError::MissingControl("close"))?;
        let deny = doc
            .find_by_id(node, banner::DENY_BUTTON_ID)
            .ok_or(CoreError::MissingControl("deny"))?;
        let accept = doc
            .find_by_id(node, ACCEPT_BUTTON_ID)
            .ok_or(CoreError::MissingControl("accept"))?;
        self.bindings.insert(close, Action::Close);
        self.bindings.insert(deny, Action::Deny);
        self.bindings.insert(accept, Action::AcceptAll);

        for category in ConsentCategory::OPTIONAL {
            let checkbox = doc
                .find_by_class(node, &banner::checkbox_class(category))
                .ok_or(CoreError::MissingControl(category.as_str()))?;
            if self.consent.get(category) {
                doc.set_attr(checkbox, "checked", "checked")?;
            } else {
                doc.remove_attr(checkbox, "checked");
            }
            self.bindings.insert(checkbox, Action::Toggle(category));
        }

        Ok(())
    }
}

impl Drop for CookieGuardian {
    fn drop(&mut self) {
        if let Some(handle) = self.sweep_handle.take() {
            handle.abort();
        }
    }
}
