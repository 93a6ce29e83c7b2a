//! Gateway synchronization for the Casa hub
//!
//! One remote gateway process owns the physical devices. It holds a single
//! long-lived socket to the hub, pushes telemetry and discovery results over
//! it, and receives `callAction` / `discoverDevices` commands back.
//!
//! [`GatewaySession`] is the per-process owner of everything tied to that
//! link: the outbound sender, the merged plugin catalog, the gateway's
//! announced address, the telemetry cache handle and the pending discovery
//! request. The transport (the websocket upgrade) lives in `casa-api` and
//! talks to the session through [`GatewaySession::attach`],
//! [`GatewaySession::handle_inbound`] and [`GatewaySession::detach`].

mod client;
mod discovery;
mod dispatch;
mod error;
mod ingest;
pub mod protocol;
mod session;

pub use client::GatewayClient;
pub use dispatch::action_message;
pub use error::{DiscoveryError, DiscoveryResult, GatewayError, GatewayResult};
pub use ingest::IngestOutcome;
pub use protocol::{ActionMessage, Envelope, Inbound};
pub use session::{GatewaySession, GatewayStatus, LINK_BUFFER};
