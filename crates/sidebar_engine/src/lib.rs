//! Sidebar engine: provider adaptation and timeline synchronization for
//! AI-chat pages.
//!
//! The engine observes a [`dom::PageDocument`] (a live model of the page the
//! host keeps in sync), resolves a provider adapter for it, and maintains
//! conversation identity, a timeline of user turns with bookmarks, and a
//! text-insertion path into the page's composer. All timing is host-driven:
//! entry points take `now` and report deadlines rather than owning timers.

pub mod adapter;
pub mod adapters;
pub mod dom;
pub mod engine;
pub mod identity;
pub mod insert;
pub mod notify;
pub mod search;
pub mod selector;
pub mod settings;
pub mod store;
pub mod timeline;

pub use ego_tree::NodeId;

pub use adapter::{resolve_adapter, SiteAdapter};
pub use dom::{
    DomError, ElementData, NodeHandle, PageDocument, PageNode, Rect, ScrollMetrics, ScrollTarget,
    SyntheticEvent,
};
pub use engine::{Effect, PageEvent, SidebarEngine};
pub use identity::{gemini_canonical_href, gemini_conversation_id, resolve_canonical};
pub use insert::InsertionEngine;
pub use notify::{Bridge, BridgeError, BridgeRouter, InboundMessage, MemoryBridge, OutboundMessage};
pub use search::{search, SearchBudget};
pub use selector::{SelectorError, SelectorList};
pub use settings::EngineSettings;
pub use store::{BookmarkStore, JsonFileStore, MemoryBookmarkStore, StoreError};
pub use timeline::{ScanOutcome, TimelineEntry, TimelineIndex};
