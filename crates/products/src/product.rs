use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storefront_core::{Aggregate, AggregateId, AggregateRoot, CompanyId, DomainError, TenantId};
use storefront_events::Event;

use crate::status::{InvalidStatusValue, ProductStatus};
use crate::transition::{self, Transition, TransitionDecision};

/// Product identifier (tenant-scoped via `tenant_id` fields in events/commands).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub AggregateId);

impl ProductId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }

    pub fn aggregate_id(self) -> AggregateId {
        self.0
    }
}

impl core::fmt::Display for ProductId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Aggregate root: Product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    id: ProductId,
    tenant_id: Option<TenantId>,
    company_id: Option<CompanyId>,
    name: String,
    category: Option<String>,
    description: Option<String>,
    status: ProductStatus,
    status_history: Vec<ProductStatus>,
    version: u64,
    created: bool,
}

impl Product {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: ProductId) -> Self {
        Self {
            id,
            tenant_id: None,
            company_id: None,
            name: String::new(),
            category: None,
            description: None,
            status: ProductStatus::Draft,
            status_history: Vec::new(),
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> ProductId {
        self.id
    }

    pub fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }

    pub fn company_id(&self) -> Option<CompanyId> {
        self.company_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn status(&self) -> ProductStatus {
        self.status
    }

    pub fn is_created(&self) -> bool {
        self.created
    }

    /// Committed statuses, oldest first (starts with `Draft` once created).
    pub fn status_history(&self) -> &[ProductStatus] {
        &self.status_history
    }

    /// Only active products are shown in the public catalog.
    pub fn is_listed(&self) -> bool {
        self.created && self.status == ProductStatus::Active
    }

    /// Evaluate a status change against the current status without committing it.
    pub fn preview_status_change(&self, proposed: ProductStatus) -> TransitionDecision {
        transition::evaluate(self.status, proposed)
    }

    /// Statuses a single write could move this product to.
    pub fn allowed_next_statuses(&self) -> Vec<ProductStatus> {
        transition::allowed_targets(self.status)
    }
}

impl AggregateRoot for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreateProduct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateProduct {
    pub tenant_id: TenantId,
    pub product_id: ProductId,
    pub company_id: CompanyId,
    pub name: String,
    pub category: Option<String>,
    pub description: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UpdateProductDetails (everything except status).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateProductDetails {
    pub tenant_id: TenantId,
    pub product_id: ProductId,
    pub name: String,
    pub category: Option<String>,
    pub description: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ChangeProductStatus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeProductStatus {
    pub tenant_id: TenantId,
    pub product_id: ProductId,
    pub status: ProductStatus,
    pub occurred_at: DateTime<Utc>,
}

impl ChangeProductStatus {
    /// Build the command from a raw status token as received from a client.
    pub fn parse(
        tenant_id: TenantId,
        product_id: ProductId,
        raw_status: &str,
        occurred_at: DateTime<Utc>,
    ) -> Result<Self, InvalidStatusValue> {
        Ok(Self {
            tenant_id,
            product_id,
            status: ProductStatus::parse(raw_status)?,
            occurred_at,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductCommand {
    CreateProduct(CreateProduct),
    UpdateProductDetails(UpdateProductDetails),
    ChangeProductStatus(ChangeProductStatus),
}

/// Event: ProductCreated. Products are always created as draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductCreated {
    pub tenant_id: TenantId,
    pub product_id: ProductId,
    pub company_id: CompanyId,
    pub name: String,
    pub category: Option<String>,
    pub description: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ProductDetailsUpdated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDetailsUpdated {
    pub tenant_id: TenantId,
    pub product_id: ProductId,
    pub name: String,
    pub category: Option<String>,
    pub description: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ProductStatusChanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductStatusChanged {
    pub tenant_id: TenantId,
    pub product_id: ProductId,
    pub from: ProductStatus,
    pub to: ProductStatus,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductEvent {
    ProductCreated(ProductCreated),
    ProductDetailsUpdated(ProductDetailsUpdated),
    ProductStatusChanged(ProductStatusChanged),
}

impl Event for ProductEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ProductEvent::ProductCreated(_) => "products.product.created",
            ProductEvent::ProductDetailsUpdated(_) => "products.product.details_updated",
            ProductEvent::ProductStatusChanged(_) => "products.product.status_changed",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            ProductEvent::ProductCreated(e) => e.occurred_at,
            ProductEvent::ProductDetailsUpdated(e) => e.occurred_at,
            ProductEvent::ProductStatusChanged(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Product {
    type Command = ProductCommand;
    type Event = ProductEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            ProductEvent::ProductCreated(e) => {
                self.id = e.product_id;
                self.tenant_id = Some(e.tenant_id);
                self.company_id = Some(e.company_id);
                self.name = e.name.clone();
                self.category = e.category.clone();
                self.description = e.description.clone();
                self.status = ProductStatus::Draft;
                self.status_history = vec![ProductStatus::Draft];
                self.created = true;
            }
            ProductEvent::ProductDetailsUpdated(e) => {
                self.name = e.name.clone();
                self.category = e.category.clone();
                self.description = e.description.clone();
            }
            ProductEvent::ProductStatusChanged(e) => {
                self.status = e.to;
                self.status_history.push(e.to);
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            ProductCommand::CreateProduct(cmd) => self.handle_create(cmd),
            ProductCommand::UpdateProductDetails(cmd) => self.handle_update_details(cmd),
            ProductCommand::ChangeProductStatus(cmd) => self.handle_change_status(cmd),
        }
    }
}

impl Product {
    fn ensure_exists(&self, tenant_id: TenantId, product_id: ProductId) -> Result<(), DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        if self.tenant_id != Some(tenant_id) {
            return Err(DomainError::invariant("tenant mismatch"));
        }
        if self.id != product_id {
            return Err(DomainError::invariant("product_id mismatch"));
        }
        Ok(())
    }

    fn handle_create(&self, cmd: &CreateProduct) -> Result<Vec<ProductEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("product already exists"));
        }
        if cmd.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }

        Ok(vec![ProductEvent::ProductCreated(ProductCreated {
            tenant_id: cmd.tenant_id,
            product_id: cmd.product_id,
            company_id: cmd.company_id,
            name: cmd.name.clone(),
            category: cmd.category.clone(),
            description: cmd.description.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_update_details(
        &self,
        cmd: &UpdateProductDetails,
    ) -> Result<Vec<ProductEvent>, DomainError> {
        self.ensure_exists(cmd.tenant_id, cmd.product_id)?;
        if cmd.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }

        Ok(vec![ProductEvent::ProductDetailsUpdated(ProductDetailsUpdated {
            tenant_id: cmd.tenant_id,
            product_id: cmd.product_id,
            name: cmd.name.clone(),
            category: cmd.category.clone(),
            description: cmd.description.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_change_status(
        &self,
        cmd: &ChangeProductStatus,
    ) -> Result<Vec<ProductEvent>, DomainError> {
        self.ensure_exists(cmd.tenant_id, cmd.product_id)?;

        let transition = Transition::new(self.status, cmd.status);
        transition.evaluate().into_result()?;

        // Same status: accepted, but nothing to record.
        if !transition.is_state_change() {
            return Ok(vec![]);
        }

        Ok(vec![ProductEvent::ProductStatusChanged(ProductStatusChanged {
            tenant_id: cmd.tenant_id,
            product_id: cmd.product_id,
            from: transition.from,
            to: transition.to,
            occurred_at: cmd.occurred_at,
        })])
    }
}
