//! Load-once lifecycle for external engine resources
//!
//! External engines (highlighter, typesetter, parser bundles) load
//! asynchronously on the host side. The loader keys each resource by
//! identity and guarantees that a second request for a loading or loaded
//! resource attaches to the existing completion instead of starting a
//! second load.

use rustc_hash::FxHashMap;

/// Outcome of a load request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadTicket {
    /// Caller must begin the actual load and report completion
    Started,
    /// A load is already in flight; the waiter is attached to it
    Attached,
    /// The resource completed loading earlier
    Ready,
}

#[derive(Debug)]
enum LoadState {
    Loading { waiters: Vec<u64> },
    Ready,
    Failed,
}

/// Idempotent resource loader keyed by resource identity
#[derive(Debug, Default)]
pub struct ServiceLoader {
    states: FxHashMap<String, LoadState>,
}

impl ServiceLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a resource on behalf of `waiter`.
    ///
    /// `Started` means the caller owns starting the load; `Attached` means
    /// an earlier request already owns it and this waiter will be returned
    /// from [`ServiceLoader::complete`]. A failed resource may be retried,
    /// which starts a fresh load.
    pub fn request(&mut self, id: &str, waiter: u64) -> LoadTicket {
        match self.states.get_mut(id) {
            Some(LoadState::Ready) => LoadTicket::Ready,
            Some(LoadState::Loading { waiters }) => {
                waiters.push(waiter);
                LoadTicket::Attached
            }
            Some(LoadState::Failed) | None => {
                self.states.insert(
                    id.to_string(),
                    LoadState::Loading {
                        waiters: vec![waiter],
                    },
                );
                LoadTicket::Started
            }
        }
    }

    /// Report load completion; returns every waiter attached since the
    /// load started so the caller can notify them.
    pub fn complete(&mut self, id: &str, ok: bool) -> Vec<u64> {
        let next = if ok { LoadState::Ready } else { LoadState::Failed };
        match self.states.insert(id.to_string(), next) {
            Some(LoadState::Loading { waiters }) => waiters,
            _ => Vec::new(),
        }
    }

    pub fn is_ready(&self, id: &str) -> bool {
        matches!(self.states.get(id), Some(LoadState::Ready))
    }

    pub fn is_loading(&self, id: &str) -> bool {
        matches!(self.states.get(id), Some(LoadState::Loading { .. }))
    }
}
