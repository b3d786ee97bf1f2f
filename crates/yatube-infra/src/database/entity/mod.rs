//! SeaORM entities. Each converts to and from its domain type.

pub mod comment;
pub mod follow;
pub mod group;
pub mod post;
pub mod user;
