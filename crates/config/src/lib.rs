//! Configuration for the broker consumer service.

pub mod loader;
pub mod schema;

pub use loader::{discover_and_load, load_config};
pub use schema::{BrokerConfig, QueueDescriptor};
