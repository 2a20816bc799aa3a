//! Products domain module (event-sourced).
//!
//! Business rules for marketplace products, implemented as deterministic domain
//! logic (no IO, no HTTP, no storage). The publication lifecycle lives in
//! [`transition`]: a product may move freely between `draft`, `active` and
//! `disabled`, except that a disabled product must be put back into draft before
//! it can be activated again.

pub mod history;
pub mod product;
pub mod status;
pub mod transition;

pub use history::{HistoryViolation, check_history};
pub use product::{
    ChangeProductStatus, CreateProduct, Product, ProductCommand, ProductCreated,
    ProductDetailsUpdated, ProductEvent, ProductId, ProductStatusChanged, UpdateProductDetails,
};
pub use status::{InvalidStatusValue, ProductStatus};
pub use transition::{
    RejectionReason, Transition, TransitionDecision, TransitionRejected, allowed_targets,
    evaluate, evaluate_tokens,
};
