//! # domains
//!
//! Domain models, rules and port definitions for the materials repository.
//! No I/O lives here; adapters implement the ports in `ports`.

pub mod error;
pub mod lifecycle;
pub mod models;
pub mod ports;
pub mod role;
pub mod search;
pub mod validation;
pub mod visibility;

// Re-exporting for easier access in other crates
pub use error::*;
pub use lifecycle::{parse_flag, FileKind, ReviewState};
pub use models::*;
pub use ports::*;
pub use role::Role;
pub use search::MaterialFilter;
