//! Actix middleware shared by every route: request tracing and trace-id
//! propagation.

pub mod trace;

pub use trace::Trace;
