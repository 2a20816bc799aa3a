//! Product write path: the calls an HTTP handler or admin screen makes.
//!
//! Raw status tokens are parsed here, before any lifecycle rule runs; the parsed
//! command then goes through [`CommandDispatcher::dispatch_with_retry`] so that the
//! transition guard is always evaluated against the status actually committed.

use chrono::Utc;
use serde_json::Value as JsonValue;

use storefront_core::{AggregateId, CompanyId, DomainError, TenantId};
use storefront_events::{EventBus, EventEnvelope};
use storefront_products::{
    ChangeProductStatus, CreateProduct, Product, ProductCommand, ProductId, ProductStatus,
};

use crate::command_dispatcher::{CommandDispatcher, DispatchError};
use crate::config::WriteConfig;
use crate::event_store::EventStore;

/// Aggregate type recorded on every product stream.
pub const PRODUCT_AGGREGATE_TYPE: &str = "products.product";

/// Fields supplied when listing a new product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub company_id: CompanyId,
    pub name: String,
    pub category: Option<String>,
    pub description: Option<String>,
}

/// Result of a status write that was not refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusWrite {
    /// A new status was committed at `version`.
    Committed { status: ProductStatus, version: u64 },
    /// The product already had the requested status; nothing was written.
    Unchanged { status: ProductStatus },
}

pub struct ProductWrites<S, B> {
    dispatcher: CommandDispatcher<S, B>,
    config: WriteConfig,
}

impl<S, B> ProductWrites<S, B>
where
    S: EventStore,
    B: EventBus<EventEnvelope<JsonValue>>,
{
    pub fn new(dispatcher: CommandDispatcher<S, B>, config: WriteConfig) -> Self {
        Self { dispatcher, config }
    }

    pub fn dispatcher(&self) -> &CommandDispatcher<S, B> {
        &self.dispatcher
    }

    /// Create a product in `draft`. A fresh id is minted per call.
    pub fn create(&self, tenant_id: TenantId, new: NewProduct) -> Result<ProductId, DispatchError> {
        let aggregate_id = AggregateId::new();
        let product_id = ProductId::new(aggregate_id);

        let command = ProductCommand::CreateProduct(CreateProduct {
            tenant_id,
            product_id,
            company_id: new.company_id,
            name: new.name,
            category: new.category,
            description: new.description,
            occurred_at: Utc::now(),
        });

        self.dispatcher.dispatch_with_retry(
            self.config,
            tenant_id,
            aggregate_id,
            PRODUCT_AGGREGATE_TYPE,
            &command,
            product_factory,
        )?;

        Ok(product_id)
    }

    /// Request a status change from a raw token (`"draft"`, `"active"`, `"disabled"`).
    ///
    /// Errors:
    /// - [`DispatchError::Validation`] for an unknown token (nothing is loaded)
    /// - [`DispatchError::Rejected`] when the lifecycle refuses the transition
    /// - [`DispatchError::Concurrency`] if every attempt lost a race
    pub fn change_status(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
        raw_status: &str,
    ) -> Result<StatusWrite, DispatchError> {
        let command = ChangeProductStatus::parse(tenant_id, product_id, raw_status, Utc::now())
            .map_err(DomainError::from)?;
        self.set_status(command)
    }

    /// Request a status change from an already-typed status.
    pub fn set_status(&self, command: ChangeProductStatus) -> Result<StatusWrite, DispatchError> {
        let tenant_id = command.tenant_id;
        let aggregate_id = command.product_id.aggregate_id();
        let status = command.status;

        let committed = self.dispatcher.dispatch_with_retry(
            self.config,
            tenant_id,
            aggregate_id,
            PRODUCT_AGGREGATE_TYPE,
            &ProductCommand::ChangeProductStatus(command),
            product_factory,
        )?;

        Ok(match committed.last() {
            Some(stored) => StatusWrite::Committed {
                status,
                version: stored.sequence_number,
            },
            None => StatusWrite::Unchanged { status },
        })
    }

    /// Current state of a product; `NotFound` if it was never created.
    pub fn load(&self, tenant_id: TenantId, product_id: ProductId) -> Result<Product, DispatchError> {
        let (product, _) =
            self.dispatcher
                .load(tenant_id, product_id.aggregate_id(), product_factory)?;
        if !product.is_created() {
            return Err(DispatchError::NotFound);
        }
        Ok(product)
    }
}

fn product_factory(_tenant_id: TenantId, aggregate_id: AggregateId) -> Product {
    Product::empty(ProductId::new(aggregate_id))
}
