//! A single query cycle: `init`, transport call, `data` or `error`, `end`.

pub mod filter;
pub mod params;
pub mod response;

use crate::client::ClientInner;
use crate::core::models::{Event, RequestId, RequestRef};
use response::ResponseHandler;
use std::sync::Arc;

/// Starts one query cycle and returns its request id.
///
/// `init` is emitted before this returns; the transport call runs on the
/// client's runtime and emits `data` or `error`, then `end`, when it
/// completes. Cycles are not serialized against each other.
pub(crate) fn run_once(client: &Arc<ClientInner>) -> RequestId {
    let request_id = client.next_request_id();
    client.emit(Event::Init(RequestRef { request_id }));

    let handler = ResponseHandler::new(request_id);
    let params = params::build(&client.tags);
    tracing::debug!(request_id, filters = params.filters.len(), "Query started");

    let client = Arc::clone(client);
    let runtime = client.runtime.clone();
    runtime.spawn(async move {
        let outcome = client.transport.describe_instances(&params).await;

        match handler.complete(outcome) {
            Ok(data) => {
                tracing::debug!(
                    request_id,
                    instances = data.instance_ids.len(),
                    "Query returned"
                );
                client.emit(Event::Data(data));
            }
            Err(error) => {
                tracing::warn!(request_id, error = %error.cause, "Query failed");
                client.emit(Event::Error(error));
            }
        }

        client.emit(Event::End(RequestRef { request_id }));
    });

    request_id
}
