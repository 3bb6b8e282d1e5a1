//! Sidebar core: pure state machines behind the provider adaptation engine.
mod active;
mod bookmarks;
mod descriptor;
mod notifier;
mod slash;
mod stable_id;
mod triviality;

pub use active::{recompute_active, EntryGeometry};
pub use bookmarks::BookmarkSet;
pub use descriptor::{absolutize_href, origin_of, CanonicalDescriptor};
pub use notifier::NotifierState;
pub use slash::{ends_with_slash_trigger, strip_slash_trigger};
pub use stable_id::derive_stable_id;
pub use triviality::{is_trivial_title, non_trivial};
