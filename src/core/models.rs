use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Identifier assigned to a query cycle when it begins. Starts at 1.
pub type RequestId = u64;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Client construction options.
///
/// `key` and `secret` are handed to the transport when the client is built
/// and are not kept by the client afterwards.
#[derive(Clone, PartialEq)]
pub struct Options {
    pub key: String,
    pub secret: String,
    pub region: Option<String>,
    pub tags: Vec<Tag>,
    pub interval: Option<Duration>,
}

impl Options {
    pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            secret: secret.into(),
            region: None,
            tags: Vec::new(),
            interval: None,
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.push(Tag::new(key, value));
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("key", &self.key)
            .field("secret", &"<redacted>")
            .field("region", &self.region)
            .field("tags", &self.tags)
            .field("interval", &self.interval)
            .finish()
    }
}

/// Names of the event channels a client publishes on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Start,
    Stop,
    Init,
    Data,
    Error,
    End,
    Pending,
}

impl EventKind {
    pub const ALL: [EventKind; 7] = [
        EventKind::Start,
        EventKind::Stop,
        EventKind::Init,
        EventKind::Data,
        EventKind::Error,
        EventKind::End,
        EventKind::Pending,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Start => "start",
            EventKind::Stop => "stop",
            EventKind::Init => "init",
            EventKind::Data => "data",
            EventKind::Error => "error",
            EventKind::End => "end",
            EventKind::Pending => "pending",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown event kind: {s}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RequestRef {
    pub request_id: RequestId,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataEvent {
    pub request_id: RequestId,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    pub instance_ids: Vec<String>,
}

/// Payload of the `error` channel.
///
/// Request failures carry the request id and a 500 status code; rejected
/// interval writes carry neither.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorEvent {
    pub request_id: Option<RequestId>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    pub status_code: Option<u16>,
    pub message: String,
    #[serde(serialize_with = "serialize_cause")]
    pub cause: Arc<dyn std::error::Error + Send + Sync>,
}

fn serialize_cause<S: Serializer>(
    cause: &Arc<dyn std::error::Error + Send + Sync>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&cause.to_string())
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum Event {
    Start,
    Stop,
    Init(RequestRef),
    Data(DataEvent),
    Error(ErrorEvent),
    End(RequestRef),
    Pending { count: usize },
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Start => EventKind::Start,
            Event::Stop => EventKind::Stop,
            Event::Init(_) => EventKind::Init,
            Event::Data(_) => EventKind::Data,
            Event::Error(_) => EventKind::Error,
            Event::End(_) => EventKind::End,
            Event::Pending { .. } => EventKind::Pending,
        }
    }

    /// Request the event belongs to, if any.
    pub fn request_id(&self) -> Option<RequestId> {
        match self {
            Event::Init(r) | Event::End(r) => Some(r.request_id),
            Event::Data(d) => Some(d.request_id),
            Event::Error(e) => e.request_id,
            Event::Start | Event::Stop | Event::Pending { .. } => None,
        }
    }
}

/// Query parameters sent to the inventory endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterParams {
    #[serde(rename = "Filters")]
    pub filters: Vec<Filter>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Values")]
    pub values: Vec<String>,
}

impl Filter {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: vec![value.into()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DescribeInstancesResponse {
    #[serde(rename = "Reservations")]
    pub reservations: Vec<Reservation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    #[serde(rename = "ReservationId", default, skip_serializing_if = "Option::is_none")]
    pub reservation_id: Option<String>,
    #[serde(rename = "Instances")]
    pub instances: Vec<Instance>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    #[serde(rename = "InstanceId")]
    pub instance_id: String,
    #[serde(rename = "InstanceType", default, skip_serializing_if = "Option::is_none")]
    pub instance_type: Option<String>,
    #[serde(rename = "State", default, skip_serializing_if = "Option::is_none")]
    pub state: Option<InstanceState>,
    #[serde(rename = "Tags", default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<InstanceTag>,
}

impl Instance {
    pub fn new(instance_id: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            instance_type: None,
            state: None,
            tags: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceState {
    #[serde(rename = "Code", default)]
    pub code: Option<i32>,
    #[serde(rename = "Name")]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceTag {
    #[serde(rename = "Key")]
    pub key: String,
    #[serde(rename = "Value")]
    pub value: String,
}
