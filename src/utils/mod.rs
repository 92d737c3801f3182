//! Outbound integrations.
//!
//! - [`discord`]: fire-and-forget webhook announcements
//! - [`translate`]: machine translation with fallback to the original text

pub mod discord;
pub mod translate;
