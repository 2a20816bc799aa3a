//! Infrastructure layer: event storage, the command write path, configuration.

pub mod command_dispatcher;
pub mod config;
pub mod event_store;
pub mod product_writes;
