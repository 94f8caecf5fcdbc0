//! Outbound adapters implementing the domain's driven ports.
//!
//! - `persistence`: Diesel/PostgreSQL repositories and embedded migrations.
//! - `memory`: in-memory repositories for development and tests.
//! - `facebook`: Graph API adapter for the OAuth provider port.
//! - `queue`: Tokio channel job queue and its worker.

pub mod facebook;
pub mod memory;
pub mod persistence;
pub mod queue;
