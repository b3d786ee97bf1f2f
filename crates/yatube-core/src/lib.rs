//! # Yatube Core
//!
//! The domain layer of Yatube: blog entities, form validation, pagination
//! and the ports that storage, caching and authentication must implement.
//! This crate has zero infrastructure dependencies.

pub mod domain;
pub mod error;
pub mod forms;
pub mod pagination;
pub mod ports;

pub use error::DomainError;
