//! # CrystalTides API
//!
//! The website backend of the CrystalTides game server: forum, wiki, polls,
//! suggestions, support tickets, donations, audit logs and the staff tooling
//! around them, served as a JSON REST API with Axum.
//!
//! ## Architecture
//!
//! ```text
//! src/
//! ├── cli/              # crystaltides-cli commands (roles, set-role, seeding)
//! ├── middleware/       # authenticate, role gates, two-factor step-up, rate limits
//! ├── modules/          # Feature modules
//! │   ├── forum/        # Threads and posts
//! │   ├── polls/        # Polls, options and votes
//! │   ├── tickets/      # Support tickets and their messages
//! │   ├── donations/    # Ko-fi and manual donations
//! │   ├── users/        # Profiles and role management
//! │   ├── two_factor/   # TOTP enrolment and admin tokens
//! │   └── ...           # rules, policies, wiki, suggestions, logs, webhooks
//! └── utils/            # Discord notifier, translator
//! ```
//!
//! Each feature module has the same shape:
//!
//! - `controller.rs`: HTTP handlers, documented with `utoipa`
//! - `service.rs`: data access through [`crystaltides_db::Database`]
//! - `router.rs`: the module's routes and their access levels
//!
//! ## Responses
//!
//! Every handler answers with the envelope
//! `{ success, data?, error?: { code, message, details? }, meta?, message? }`.
//! Validation failures list each field by its full path (`body.title`).
//!
//! ## Roles
//!
//! Roles come from the identity token and the `profiles` row. Priorities and
//! the admin and staff sets live in [`crystaltides_core::roles`]; run
//! `crystaltides-cli roles` to print them.
//!
//! ## API Documentation
//!
//! - Scalar: `http://localhost:3001/api/docs`
//! - OpenAPI JSON: `http://localhost:3001/api/docs/openapi.json`

pub mod cli;
pub mod docs;
pub mod logging;
pub mod metrics;
pub mod middleware;
pub mod modules;
pub mod router;
pub mod state;
pub mod utils;
pub mod validator;

pub use crystaltides_auth;
pub use crystaltides_config;
pub use crystaltides_core;
pub use crystaltides_db;
pub use crystaltides_models;
