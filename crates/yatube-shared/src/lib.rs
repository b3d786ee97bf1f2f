//! # Yatube Shared
//!
//! Request and view-context types shared between the server and whatever
//! renders its views.

pub mod dto;
pub mod response;

pub use response::ErrorResponse;
