//! `wayfarer-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod amount;
pub mod entity;
pub mod error;
pub mod id;
pub mod value_object;

pub use amount::Amount;
pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::DocumentId;
pub use value_object::ValueObject;
