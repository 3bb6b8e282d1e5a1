use std::time::{Duration, Instant};

/// Debounced, dedup-by-content outbound pipeline state.
///
/// Turns a burst of trigger events into a minimal stream of emissions: the
/// same serialized payload is never emitted twice in succession, immediate
/// triggers bypass the debounce window, and coalesced triggers always emit
/// the latest payload seen before the window elapsed.
///
/// The notifier owns no timer. Hosts arm the deadline reported by
/// [`NotifierState::next_deadline`] and call [`NotifierState::poll`] when it
/// passes.
#[derive(Debug, Clone)]
pub struct NotifierState {
    debounce: Duration,
    last_emitted: Option<String>,
    pending: Option<Pending>,
}

#[derive(Debug, Clone)]
struct Pending {
    deadline: Instant,
    payload: String,
}

impl NotifierState {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            last_emitted: None,
            pending: None,
        }
    }

    /// Feeds the current serialized payload into the pipeline.
    ///
    /// With `immediate` the payload is returned for emission unconditionally
    /// and any pending debounce is cancelled. Otherwise a payload equal to
    /// the last emission is a no-op, and a differing payload (re)starts the
    /// single debounce timer; the payload recorded for the timer is always
    /// the latest one seen, so the eventual emission is never stale.
    pub fn trigger(&mut self, payload: String, immediate: bool, now: Instant) -> Option<String> {
        if immediate {
            self.pending = None;
            self.last_emitted = Some(payload.clone());
            return Some(payload);
        }
        if let Some(pending) = &mut self.pending {
            // Last writer wins: replace both payload and deadline.
            pending.payload = payload;
            pending.deadline = now + self.debounce;
            return None;
        }
        if self.last_emitted.as_deref() == Some(payload.as_str()) {
            return None;
        }
        self.pending = Some(Pending {
            deadline: now + self.debounce,
            payload,
        });
        None
    }

    /// Fires the debounce timer if its deadline has passed, returning the
    /// payload to emit. A pending payload that meanwhile became equal to the
    /// last emission is dropped rather than repeated.
    pub fn poll(&mut self, now: Instant) -> Option<String> {
        match &self.pending {
            Some(pending) if pending.deadline <= now => {}
            _ => return None,
        }
        let pending = self.pending.take()?;
        if self.last_emitted.as_deref() == Some(pending.payload.as_str()) {
            return None;
        }
        self.last_emitted = Some(pending.payload.clone());
        Some(pending.payload)
    }

    /// The deadline of the pending debounce window, if one is armed.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|pending| pending.deadline)
    }

    /// The most recently emitted payload.
    pub fn last_emitted(&self) -> Option<&str> {
        self.last_emitted.as_deref()
    }
}
