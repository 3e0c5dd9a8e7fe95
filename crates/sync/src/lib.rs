//! Session registry and dual-transport synchronization core.
//!
//! Each monitored task gets a Feed and a per-feed transport manager that
//! owns at most one live delivery mechanism at a time: a WebSocket push
//! subscription when available, an HTTP poll loop otherwise. Everything a
//! transport delivers funnels through one event channel into the registry,
//! which is the only place feeds are mutated.

pub mod error;
pub mod event;
pub mod registry;
pub mod transport;

pub use error::SyncError;
pub use event::FeedEvent;
pub use registry::SessionRegistry;
pub use transport::{NetTransportProvider, TransportHandle, TransportManager, TransportProvider};
