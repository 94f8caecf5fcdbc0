//! Icare ride-sharing backend.
//!
//! Hexagonal layout: `domain` holds the model, services and ports;
//! `inbound::http` adapts Actix requests onto the driving ports; `outbound`
//! implements the driven ports (PostgreSQL, in-memory, Facebook, job queue).

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod settings;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use middleware::Trace;
