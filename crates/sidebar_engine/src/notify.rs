use std::cell::{Cell, RefCell};

use serde::{Deserialize, Serialize};
use sidebar_core::CanonicalDescriptor;
use thiserror::Error;

/// Messages the engine sends to the host process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum OutboundMessage {
    #[serde(rename = "ai-url-changed")]
    UrlChanged {
        href: String,
        title: String,
        origin: String,
    },
    #[serde(rename = "trigger-prompt-manager")]
    TriggerPromptManager,
}

/// Messages the host process sends to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type")]
pub enum InboundMessage {
    #[serde(rename = "INSERT_TEXT")]
    InsertText { text: String },
    #[serde(rename = "SHOW_SLASH_PICKER")]
    ShowSlashPicker,
}

impl OutboundMessage {
    pub fn url_changed(descriptor: &CanonicalDescriptor) -> Self {
        Self::UrlChanged {
            href: descriptor.href.clone(),
            title: descriptor.title.clone(),
            origin: descriptor.origin.clone(),
        }
    }

    /// Serialized wire form; field order is fixed by the struct, so equal
    /// descriptors serialize identically and the notifier can dedup on it.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|err| {
            engine_logging::engine_error!("payload serialization failed: {err}");
            String::new()
        })
    }
}

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("bridge channel unavailable")]
    Unavailable,
    #[error("bridge send failed: {0}")]
    Send(String),
}

/// A transport to the host process.
pub trait Bridge {
    fn send(&self, payload: &str) -> Result<(), BridgeError>;
}

/// Prefers the named channel transport; when that errors the same payload
/// is posted to the top-level window instead. Transport failure is logged
/// and never propagates to the caller.
pub struct BridgeRouter {
    channel: Option<Box<dyn Bridge>>,
    window: Box<dyn Bridge>,
}

impl BridgeRouter {
    pub fn new(channel: Option<Box<dyn Bridge>>, window: Box<dyn Bridge>) -> Self {
        Self { channel, window }
    }

    pub fn send(&self, payload: &str) {
        if let Some(channel) = &self.channel {
            match channel.send(payload) {
                Ok(()) => return,
                Err(err) => {
                    engine_logging::engine_warn!(
                        "bridge channel failed, falling back to window post: {err}"
                    );
                }
            }
        }
        if let Err(err) = self.window.send(payload) {
            engine_logging::engine_error!("window post failed: {err}");
        }
    }
}

/// In-memory transport for tests and headless hosts.
#[derive(Default)]
pub struct MemoryBridge {
    sent: RefCell<Vec<String>>,
    failing: Cell<bool>,
}

impl MemoryBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.set(failing);
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.borrow().clone()
    }
}

impl Bridge for MemoryBridge {
    fn send(&self, payload: &str) -> Result<(), BridgeError> {
        if self.failing.get() {
            return Err(BridgeError::Unavailable);
        }
        self.sent.borrow_mut().push(payload.to_string());
        Ok(())
    }
}
