//! In-memory inventory used by client tests.

use crate::core::error::TransportError;
use crate::core::models::{DescribeInstancesResponse, FilterParams, Instance, Reservation};
use crate::transport::InstanceInventory;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use tokio::sync::oneshot;

pub(crate) enum Reply {
    Respond(DescribeInstancesResponse),
    Fail(TransportError),
    /// Resolves when the test sends the outcome.
    Wait(oneshot::Receiver<Result<DescribeInstancesResponse, TransportError>>),
    /// Never resolves.
    Hang,
}

/// Answers calls from a queue of scripted replies, falling back to an empty
/// response once the queue runs dry.
#[derive(Default)]
pub(crate) struct ScriptedInventory {
    replies: Mutex<VecDeque<Reply>>,
    calls: Mutex<Vec<FilterParams>>,
}

impl ScriptedInventory {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_replies(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn push(&self, reply: Reply) {
        self.replies.lock().push_back(reply);
    }

    pub(crate) fn calls(&self) -> Vec<FilterParams> {
        self.calls.lock().clone()
    }
}

pub(crate) fn instances(ids: &[&str]) -> DescribeInstancesResponse {
    DescribeInstancesResponse {
        reservations: vec![Reservation {
            reservation_id: None,
            instances: ids.iter().map(|id| Instance::new(*id)).collect(),
        }],
    }
}

pub(crate) fn unavailable() -> TransportError {
    TransportError::Status {
        status_code: 503,
        body: "Service Unavailable".to_string(),
    }
}

#[async_trait]
impl InstanceInventory for ScriptedInventory {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn describe_instances(
        &self,
        params: &FilterParams,
    ) -> Result<DescribeInstancesResponse, TransportError> {
        self.calls.lock().push(params.clone());
        let reply = self.replies.lock().pop_front();

        match reply {
            None => Ok(DescribeInstancesResponse::default()),
            Some(Reply::Respond(response)) => Ok(response),
            Some(Reply::Fail(err)) => Err(err),
            Some(Reply::Wait(rx)) => match rx.await {
                Ok(outcome) => outcome,
                Err(_) => std::future::pending().await,
            },
            Some(Reply::Hang) => std::future::pending().await,
        }
    }
}
