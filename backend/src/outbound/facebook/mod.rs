//! Facebook Graph API adapter for the `OAuthProvider` port.

mod dto;
mod graph_client;

pub use graph_client::FacebookGraphProvider;
