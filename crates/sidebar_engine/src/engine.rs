use std::time::Instant;

use ego_tree::NodeId;
use sidebar_core::{recompute_active, NotifierState};

use crate::adapter::{resolve_adapter, SiteAdapter};
use crate::dom::{PageDocument, ScrollTarget};
use crate::identity::resolve_canonical;
use crate::insert::InsertionEngine;
use crate::notify::{InboundMessage, OutboundMessage};
use crate::settings::EngineSettings;
use crate::store::BookmarkStore;
use crate::timeline::{ScanOutcome, TimelineIndex};

/// A page-side occurrence fed into the engine by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEvent {
    /// The page finished its initial load; adapter resolution happens here.
    Loaded,
    DomMutated,
    TitleMutated,
    HistoryPushed,
    HistoryReplaced,
    PopState,
    LocationChanged,
    Scrolled,
    FocusIn(NodeId),
    Input(NodeId),
    KeyUp { node: NodeId, key: String },
    Bridge(InboundMessage),
    /// The user toggled a bookmark in the host UI.
    BookmarkToggled(String),
}

/// What the host must do after an engine call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Forward a serialized outbound payload over the bridge.
    Send(String),
    ActiveTurnChanged(Option<usize>),
    TimelineRebuilt { entries: usize },
}

/// The per-page engine instance: owns the notifier, timeline, and insertion
/// state and turns page events into effects.
///
/// Single-threaded by construction; reentrancy cannot occur because every
/// entry point takes `&mut self` and runs to completion.
pub struct SidebarEngine {
    settings: EngineSettings,
    adapter: Option<&'static dyn SiteAdapter>,
    notifier: NotifierState,
    scan_deadline: Option<Instant>,
    timeline: Option<TimelineIndex>,
    store: Option<Box<dyn BookmarkStore>>,
    insertion: InsertionEngine,
    active: Option<usize>,
    scroll_pending: bool,
    slash_signaled: bool,
    seq: u64,
}

impl SidebarEngine {
    pub fn new(settings: EngineSettings, store: Box<dyn BookmarkStore>) -> Self {
        let notifier = NotifierState::new(settings.notify_debounce);
        Self {
            settings,
            adapter: None,
            notifier,
            scan_deadline: None,
            timeline: None,
            store: Some(store),
            insertion: InsertionEngine::new(),
            active: None,
            scroll_pending: false,
            slash_signaled: false,
            seq: 0,
        }
    }

    pub fn adapter(&self) -> Option<&'static dyn SiteAdapter> {
        self.adapter
    }

    pub fn timeline(&self) -> Option<&TimelineIndex> {
        self.timeline.as_ref()
    }

    pub fn active_turn(&self) -> Option<usize> {
        self.active
    }

    /// Handles one page event. Effects must be applied by the host in order.
    pub fn handle(
        &mut self,
        doc: &mut PageDocument,
        event: PageEvent,
        now: Instant,
    ) -> Vec<Effect> {
        self.advance_seq();
        let mut effects = Vec::new();
        match event {
            PageEvent::Loaded => {
                self.adapter = resolve_adapter(doc);
                if self.adapter.is_some() {
                    if let Some(store) = self.store.take() {
                        let host = doc.location().host_str().unwrap_or_default().to_string();
                        self.timeline = Some(TimelineIndex::new(
                            store,
                            &host,
                            self.settings.preview_max_chars,
                            self.settings.id_fingerprint_chars,
                        ));
                    }
                }
                self.notify(doc, true, now, &mut effects);
                self.run_scan(doc, &mut effects);
            }
            PageEvent::DomMutated => {
                self.notify(doc, false, now, &mut effects);
                // Each mutation burst restarts the scan window.
                self.scan_deadline = Some(now + self.settings.scan_debounce);
            }
            PageEvent::TitleMutated
            | PageEvent::HistoryPushed
            | PageEvent::HistoryReplaced
            | PageEvent::PopState
            | PageEvent::LocationChanged => {
                self.notify(doc, false, now, &mut effects);
            }
            PageEvent::Scrolled => {
                self.scroll_pending = true;
            }
            PageEvent::FocusIn(node) => {
                self.insertion.focus_in(doc, node);
            }
            PageEvent::Input(node) | PageEvent::KeyUp { node, .. } => {
                self.check_slash_trigger(doc, node, &mut effects);
            }
            PageEvent::Bridge(InboundMessage::InsertText { text }) => {
                self.insertion.insert_text(doc, &text, self.adapter);
                self.slash_signaled = false;
            }
            PageEvent::Bridge(InboundMessage::ShowSlashPicker) => {
                // The picker replaces the trigger, so drop it from the
                // composer before the insertion arrives.
                self.insertion.clear_slash_trigger(doc, self.adapter);
                self.slash_signaled = false;
            }
            PageEvent::BookmarkToggled(stable_id) => {
                let toggled = self
                    .timeline
                    .as_mut()
                    .and_then(|timeline| timeline.toggle_bookmark(&stable_id));
                if toggled.is_none() {
                    engine_logging::engine_warn!("bookmark toggle for unknown id {stable_id}");
                }
            }
        }
        effects
    }

    /// Fires any elapsed deadlines. Hosts call this when the deadline from
    /// [`Self::next_deadline`] passes.
    pub fn poll(&mut self, doc: &PageDocument, now: Instant) -> Vec<Effect> {
        let mut effects = Vec::new();
        if let Some(payload) = self.notifier.poll(now) {
            effects.push(Effect::Send(payload));
        }
        if self.scan_deadline.is_some_and(|deadline| deadline <= now) {
            self.scan_deadline = None;
            self.advance_seq();
            self.run_scan(doc, &mut effects);
        }
        effects
    }

    /// Consumes a pending scroll and recomputes the active turn, at most
    /// once per host frame.
    pub fn animation_frame(&mut self, doc: &PageDocument) -> Vec<Effect> {
        if !self.scroll_pending {
            return Vec::new();
        }
        self.scroll_pending = false;
        let mut effects = Vec::new();
        self.recompute_active(doc, &mut effects);
        effects
    }

    /// Earliest pending deadline across the notifier and the scan window.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.notifier.next_deadline(), self.scan_deadline) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (Some(a), None) => Some(a),
            (None, b) => b,
        }
    }

    fn advance_seq(&mut self) {
        self.seq += 1;
        engine_logging::set_event_seq(self.seq);
    }

    fn notify(
        &mut self,
        doc: &PageDocument,
        immediate: bool,
        now: Instant,
        effects: &mut Vec<Effect>,
    ) {
        let descriptor = resolve_canonical(doc, &self.settings.search_budget);
        let payload = OutboundMessage::url_changed(&descriptor).to_json();
        if let Some(emit) = self.notifier.trigger(payload, immediate, now) {
            effects.push(Effect::Send(emit));
        }
    }

    fn run_scan(&mut self, doc: &PageDocument, effects: &mut Vec<Effect>) {
        let Some(adapter) = self.adapter else {
            return;
        };
        let Some(timeline) = &mut self.timeline else {
            return;
        };
        if timeline.scan(doc, adapter) == ScanOutcome::Rebuilt {
            effects.push(Effect::TimelineRebuilt {
                entries: timeline.len(),
            });
            self.recompute_active(doc, effects);
        }
    }

    fn recompute_active(&mut self, doc: &PageDocument, effects: &mut Vec<Effect>) {
        let Some(adapter) = self.adapter else {
            return;
        };
        let Some(timeline) = &self.timeline else {
            return;
        };
        // With no entries the previous active state is left untouched.
        if timeline.is_empty() {
            return;
        }
        let center = match adapter.scroll_container(doc) {
            ScrollTarget::Window => doc.viewport_height() / 2.0,
            ScrollTarget::Node(node) => doc
                .element(node)
                .and_then(|el| el.rect)
                .map(|rect| rect.top + rect.height / 2.0)
                .unwrap_or_else(|| doc.viewport_height() / 2.0),
        };
        let next = recompute_active(&timeline.geometries(doc), center);
        if next != self.active {
            self.active = next;
            effects.push(Effect::ActiveTurnChanged(next));
        }
    }

    fn check_slash_trigger(
        &mut self,
        doc: &PageDocument,
        node: NodeId,
        effects: &mut Vec<Effect>,
    ) {
        let detected = self
            .insertion
            .detect_slash_trigger(doc, node, self.adapter);
        if detected && !self.slash_signaled {
            self.slash_signaled = true;
            effects.push(Effect::Send(
                OutboundMessage::TriggerPromptManager.to_json(),
            ));
        } else if !detected {
            self.slash_signaled = false;
        }
    }
}
