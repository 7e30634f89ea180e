// secsmart-api: Async Rust client for the SEC Smart ventilation cloud API

pub mod client;
pub mod error;
pub mod transport;
pub mod types;

pub use client::SecSmartClient;
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};
pub use types::{AreaModeUpdate, AreasPayload};
