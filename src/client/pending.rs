use crate::core::models::RequestId;
use parking_lot::Mutex;
use std::collections::HashSet;

/// Requests that have emitted `init` but not yet `end`.
#[derive(Debug, Default)]
pub struct PendingTracker {
    requests: Mutex<HashSet<RequestId>>,
}

impl PendingTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a started request and returns the new pending count.
    pub fn track(&self, request_id: RequestId) -> usize {
        let mut requests = self.requests.lock();
        requests.insert(request_id);
        requests.len()
    }

    /// Records a finished request and returns the new pending count.
    pub fn release(&self, request_id: RequestId) -> usize {
        let mut requests = self.requests.lock();
        if !requests.remove(&request_id) {
            tracing::warn!(request_id, "End received for a request that was not pending");
        }
        requests.len()
    }

    pub fn count(&self) -> usize {
        self.requests.lock().len()
    }

    #[cfg(test)]
    pub fn contains(&self, request_id: RequestId) -> bool {
        self.requests.lock().contains(&request_id)
    }
}
