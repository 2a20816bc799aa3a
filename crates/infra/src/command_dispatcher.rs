//! Command execution pipeline for event-sourced aggregates.
//!
//! ```text
//! Command
//!   ↓
//! 1. Load the stream (tenant-scoped) and remember its version
//!   ↓
//! 2. Rehydrate the aggregate
//!   ↓
//! 3. Handle the command (pure; this is where the status guard runs)
//!   ↓
//! 4. Append with ExpectedVersion::Exact(loaded version)
//!   ↓
//! 5. Publish committed events
//! ```
//!
//! Step 4 makes "decide on the current state, then commit" atomic per stream: a
//! writer whose decision was based on a version that has since moved gets
//! [`DispatchError::Concurrency`] and nothing is written. [`CommandDispatcher::dispatch_with_retry`]
//! re-runs steps 1-4, so the command is re-decided against the fresh state.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use storefront_core::{Aggregate, AggregateId, DomainError, ExpectedVersion, TenantId};
use storefront_events::{EventBus, EventEnvelope};

use crate::config::WriteConfig;
use crate::event_store::{EventStore, EventStoreError, StoredEvent, UncommittedEvent};

#[derive(Debug)]
pub enum DispatchError {
    /// Optimistic concurrency failure (stale aggregate version). Retryable.
    Concurrency(String),
    /// Tenant isolation violation (cross-tenant or cross-aggregate stream mixing).
    TenantIsolation(String),
    /// Malformed input, e.g. an unknown status token.
    Validation(String),
    /// Domain invariant failure (deterministic).
    InvariantViolation(String),
    /// A business rule refused the command. Surfaced to the user, never retried.
    Rejected { code: &'static str, message: String },
    /// The command conflicts with existing state, e.g. a duplicate create. Not retried.
    Conflict(String),
    /// Domain-level not found.
    NotFound,
    /// Failed to deserialize historical event payloads into the aggregate event type.
    Deserialize(String),
    /// Persisting to the event store failed.
    Store(EventStoreError),
    /// Publication failed after a successful append.
    Publish(String),
}

impl DispatchError {
    /// Only lost concurrency races are worth re-running.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DispatchError::Concurrency(_))
    }
}

impl From<EventStoreError> for DispatchError {
    fn from(value: EventStoreError) -> Self {
        match &value {
            EventStoreError::Concurrency(msg) => DispatchError::Concurrency(msg.clone()),
            EventStoreError::TenantIsolation(msg) => DispatchError::TenantIsolation(msg.clone()),
            _ => DispatchError::Store(value),
        }
    }
}

impl From<DomainError> for DispatchError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) => DispatchError::Validation(msg),
            DomainError::InvariantViolation(msg) => DispatchError::InvariantViolation(msg),
            DomainError::Rejected { code, message } => DispatchError::Rejected { code, message },
            DomainError::Conflict(msg) => DispatchError::Conflict(msg),
            DomainError::NotFound => DispatchError::NotFound,
            DomainError::InvalidId(msg) => DispatchError::Validation(msg),
        }
    }
}

/// Reusable command execution engine for event-sourced aggregates.
///
/// Generic over the store and bus so tests run against the in-memory
/// implementations.
#[derive(Debug)]
pub struct CommandDispatcher<S, B> {
    store: S,
    bus: B,
}

impl<S, B> CommandDispatcher<S, B> {
    pub fn new(store: S, bus: B) -> Self {
        Self { store, bus }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

}

impl<S, B> CommandDispatcher<S, B>
where
    S: EventStore,
    B: EventBus<EventEnvelope<JsonValue>>,
{
    /// Load and rehydrate an aggregate, returning it with its stream version.
    pub fn load<A>(
        &self,
        tenant_id: TenantId,
        aggregate_id: AggregateId,
        make_aggregate: impl FnOnce(TenantId, AggregateId) -> A,
    ) -> Result<(A, u64), DispatchError>
    where
        A: Aggregate,
        A::Event: DeserializeOwned,
    {
        let history = self.store.load_stream(tenant_id, aggregate_id)?;
        validate_loaded_stream(tenant_id, aggregate_id, &history)?;

        let mut aggregate = make_aggregate(tenant_id, aggregate_id);
        apply_history::<A>(&mut aggregate, &history)?;

        Ok((aggregate, stream_version(&history)))
    }

    /// Run one command through the pipeline once.
    ///
    /// Returns the committed events; empty if the command was accepted as a no-op.
    pub fn dispatch<A>(
        &self,
        tenant_id: TenantId,
        aggregate_id: AggregateId,
        aggregate_type: &str,
        command: &A::Command,
        make_aggregate: impl FnOnce(TenantId, AggregateId) -> A,
    ) -> Result<Vec<StoredEvent>, DispatchError>
    where
        A: Aggregate<Error = DomainError>,
        A::Event: storefront_events::Event + Serialize + DeserializeOwned,
    {
        let (aggregate, version) = self.load(tenant_id, aggregate_id, make_aggregate)?;

        let decided = match aggregate.handle(command) {
            Ok(events) => events,
            Err(err) => {
                if err.is_rejection() {
                    tracing::debug!(%tenant_id, %aggregate_id, aggregate_type, error = %err, "command rejected");
                }
                return Err(err.into());
            }
        };
        if decided.is_empty() {
            tracing::debug!(%tenant_id, %aggregate_id, aggregate_type, "command accepted without changes");
            return Ok(vec![]);
        }

        let uncommitted = decided
            .iter()
            .map(|ev| {
                UncommittedEvent::from_typed(tenant_id, aggregate_id, aggregate_type, Uuid::now_v7(), ev)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let committed = self.store.append(uncommitted, ExpectedVersion::Exact(version))?;

        for stored in &committed {
            tracing::info!(
                %tenant_id,
                %aggregate_id,
                event_type = %stored.event_type,
                sequence_number = stored.sequence_number,
                "event committed"
            );
            self.bus
                .publish(stored.to_envelope())
                .map_err(|e| DispatchError::Publish(format!("{e:?}")))?;
        }

        Ok(committed)
    }

    /// Like [`dispatch`](Self::dispatch), re-running the whole pipeline when the
    /// append loses a concurrency race, up to `config.max_attempts` attempts.
    ///
    /// Every attempt reloads the stream, so the command is decided against the
    /// status that actually won the race. Rejections and validation errors are
    /// returned immediately.
    pub fn dispatch_with_retry<A>(
        &self,
        config: WriteConfig,
        tenant_id: TenantId,
        aggregate_id: AggregateId,
        aggregate_type: &str,
        command: &A::Command,
        make_aggregate: impl Fn(TenantId, AggregateId) -> A,
    ) -> Result<Vec<StoredEvent>, DispatchError>
    where
        A: Aggregate<Error = DomainError>,
        A::Event: storefront_events::Event + Serialize + DeserializeOwned,
    {
        let max_attempts = config.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.dispatch(tenant_id, aggregate_id, aggregate_type, command, &make_aggregate) {
                Err(err) if err.is_retryable() && attempt < max_attempts => {
                    tracing::warn!(
                        %tenant_id,
                        %aggregate_id,
                        attempt,
                        max_attempts,
                        error = ?err,
                        "write lost a concurrency race, retrying against fresh state"
                    );
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}

fn stream_version(stream: &[StoredEvent]) -> u64 {
    stream.last().map(|e| e.sequence_number).unwrap_or(0)
}

fn validate_loaded_stream(
    tenant_id: TenantId,
    aggregate_id: AggregateId,
    stream: &[StoredEvent],
) -> Result<(), DispatchError> {
    // Re-checked here even though the store is tenant-scoped.
    let mut last = 0u64;
    for (idx, e) in stream.iter().enumerate() {
        if e.tenant_id != tenant_id {
            return Err(DispatchError::TenantIsolation(format!(
                "loaded stream contains wrong tenant_id at index {idx}"
            )));
        }
        if e.aggregate_id != aggregate_id {
            return Err(DispatchError::TenantIsolation(format!(
                "loaded stream contains wrong aggregate_id at index {idx}"
            )));
        }
        if e.sequence_number <= last {
            return Err(DispatchError::Store(EventStoreError::InvalidAppend(format!(
                "non-monotonic sequence_number in loaded stream (last={last}, found={})",
                e.sequence_number
            ))));
        }
        last = e.sequence_number;
    }
    Ok(())
}

fn apply_history<A>(aggregate: &mut A, history: &[StoredEvent]) -> Result<(), DispatchError>
where
    A: Aggregate,
    A::Event: DeserializeOwned,
{
    for stored in history {
        let ev: A::Event = serde_json::from_value(stored.payload.clone())
            .map_err(|e| DispatchError::Deserialize(e.to_string()))?;
        aggregate.apply(&ev);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejections_keep_their_code() {
        let err: DispatchError = DomainError::rejected("some_rule", "nope").into();
        match err {
            DispatchError::Rejected { code, message } => {
                assert_eq!(code, "some_rule");
                assert_eq!(message, "nope");
            }
            other => panic!("expected Rejected, got {other:?}"),
        }
    }

    #[test]
    fn only_concurrency_is_retryable() {
        assert!(DispatchError::Concurrency("stale".into()).is_retryable());
        assert!(!DispatchError::Validation("bad".into()).is_retryable());
        assert!(!DispatchError::Conflict("already exists".into()).is_retryable());
        assert!(
            !DispatchError::Rejected {
                code: "some_rule",
                message: "nope".into()
            }
            .is_retryable()
        );
    }

    #[test]
    fn domain_conflicts_are_not_concurrency() {
        let err: DispatchError = DomainError::conflict("product already exists").into();
        assert!(matches!(err, DispatchError::Conflict(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn store_conflicts_map_to_concurrency() {
        let err: DispatchError = EventStoreError::Concurrency("expected 1, found 2".into()).into();
        assert!(err.is_retryable());
    }

    #[test]
    fn sequence_zero_is_not_a_valid_position() {
        let stored = StoredEvent {
            event_id: Uuid::now_v7(),
            tenant_id: TenantId::new(),
            aggregate_id: AggregateId::new(),
            aggregate_type: "products.product".into(),
            sequence_number: 0,
            event_type: "products.product.created".into(),
            event_version: 1,
            occurred_at: chrono::Utc::now(),
            payload: JsonValue::Null,
        };
        let err = validate_loaded_stream(stored.tenant_id, stored.aggregate_id, &[stored]).unwrap_err();
        assert!(matches!(err, DispatchError::Store(_)));
    }
}
