//! Append-only event store boundary.
//!
//! Streams are keyed by `(tenant_id, aggregate_id)`. Appends carry an
//! [`ExpectedVersion`](storefront_core::ExpectedVersion) so that a writer who
//! decided on stale state cannot commit.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::InMemoryEventStore;
pub use r#trait::{EventStore, EventStoreError, StoredEvent, UncommittedEvent};
