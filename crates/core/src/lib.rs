//! `storefront-core` — domain foundation building blocks.
//!
//! Pure domain primitives shared by the storefront crates (no infrastructure concerns).

pub mod aggregate;
pub mod error;
pub mod id;

pub use aggregate::{Aggregate, AggregateRoot, ExpectedVersion};
pub use error::DomainError;
pub use id::{AggregateId, CompanyId, TenantId};
