//! # CrystalTides Core
//!
//! Foundational types shared by every CrystalTides crate:
//!
//! - [`errors`]: [`AppError`] and its failure envelope
//! - [`response`]: the `{ success, data, error, meta, message }` envelope
//! - [`pagination`]: page/limit/search parameters and `meta`
//! - [`roles`]: the role registry, priorities and allow-lists
//! - [`slug`]: URL slugs
//! - [`serde`]: query-string deserialization helpers

pub mod errors;
pub mod pagination;
pub mod response;
pub mod roles;
pub mod serde;
pub mod slug;

pub use errors::{AppError, FieldError};
pub use pagination::{Page, PaginationMeta, PaginationParams};
pub use response::{ApiResponse, ErrorBody};
pub use roles::{RoleSet, role_priority};
