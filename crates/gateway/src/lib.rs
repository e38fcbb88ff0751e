//! Service wiring for the broker consumer: the shared context, status
//! aggregation, and the read-only HTTP status surface.

pub mod context;
pub mod routes;
pub mod status;

pub use context::BrokerContext;
pub use routes::broker_routes;
pub use status::{BrokerStatus, QueueState, broker_status};
