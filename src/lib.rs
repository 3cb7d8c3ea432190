//! Polling client for running EC2 instances.
//!
//! A [`Client`] queries an inventory endpoint for running instances matching
//! optional tag filters, on demand or at a fixed interval, and reports every
//! query cycle through typed [`Event`]s.

pub mod client;
pub mod core;
pub mod query;
pub mod transport;

pub use crate::client::{Client, ClientConfig};
pub use crate::core::error::{ClientError, TransportError, ValidationError};
pub use crate::core::events::{EventBus, ListenerId};
pub use crate::core::models::{
    DataEvent, ErrorEvent, Event, EventKind, Options, RequestId, RequestRef, Tag,
};
pub use crate::core::settings::Settings;
pub use crate::transport::{HttpInventory, InstanceInventory};
