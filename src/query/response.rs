use crate::core::error::TransportError;
use crate::core::models::{DataEvent, DescribeInstancesResponse, ErrorEvent, RequestId};
use crate::query::filter;
use chrono::Utc;
use std::sync::Arc;

pub const REQUEST_ERROR_STATUS: u16 = 500;
pub const REQUEST_ERROR_MESSAGE: &str =
    "Request error. Error encountered while attempting to query the endpoint.";

/// One-shot handler turning a transport outcome into an event payload.
#[derive(Debug)]
pub struct ResponseHandler {
    request_id: RequestId,
}

impl ResponseHandler {
    pub fn new(request_id: RequestId) -> Self {
        Self { request_id }
    }

    /// Stamps the outcome with the request id and the current time.
    pub fn complete(
        self,
        outcome: Result<DescribeInstancesResponse, TransportError>,
    ) -> Result<DataEvent, ErrorEvent> {
        let timestamp = Utc::now();
        match outcome {
            Ok(response) => Ok(DataEvent {
                request_id: self.request_id,
                timestamp,
                instance_ids: filter::instance_ids(&response),
            }),
            Err(err) => Err(ErrorEvent {
                request_id: Some(self.request_id),
                timestamp,
                status_code: Some(REQUEST_ERROR_STATUS),
                message: REQUEST_ERROR_MESSAGE.to_string(),
                cause: Arc::new(err),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::{Instance, Reservation};

    #[test]
    fn test_success_produces_data_event() {
        let response = DescribeInstancesResponse {
            reservations: vec![Reservation {
                reservation_id: Some("r-1".to_string()),
                instances: vec![Instance::new("i-1"), Instance::new("i-2")],
            }],
        };

        let before = Utc::now();
        let data = ResponseHandler::new(4).complete(Ok(response)).unwrap();

        assert_eq!(data.request_id, 4);
        assert_eq!(data.instance_ids, vec!["i-1", "i-2"]);
        assert!(data.timestamp >= before);
    }

    #[test]
    fn test_transport_error_produces_error_event() {
        let err = TransportError::Status {
            status_code: 503,
            body: "unavailable".to_string(),
        };

        let event = ResponseHandler::new(3).complete(Err(err)).unwrap_err();

        assert_eq!(event.request_id, Some(3));
        assert_eq!(event.status_code, Some(500));
        assert_eq!(event.message, REQUEST_ERROR_MESSAGE);
        assert!(event.cause.to_string().contains("503"));
    }
}
