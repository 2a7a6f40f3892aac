//! stackcheck target service library.
//!
//! The fixture service compliance checks probe: `/ping` (optionally
//! forwarding to another address), `/volumefile`, `/udp` and
//! `/scalechecker`, plus a UDP receiver feeding `/udp`.
//! The binaries in this crate are thin wrappers around [`server::TargetServer`].

pub mod config;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod metrics_server;
pub mod router;
pub mod server;
pub mod state;
pub mod udp;

pub use config::TargetConfig;
pub use error::{ApiError, TargetError};
pub use router::create_router;
pub use server::TargetServer;
pub use state::{SharedState, TargetState};
