// melodex-api: Async Rust client for the catalog relationship endpoints

pub mod client;
mod compat;
pub mod error;
pub mod models;
pub mod relationship;
pub mod transport;

pub use client::RelationshipClient;
pub use error::Error;
pub use relationship::{Direction, RelationshipKind};
pub use transport::{TlsMode, TransportConfig};
