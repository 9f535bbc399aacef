// cartsync/src/gateway/mod.rs

//! Talks to the cart service and reconciles its answers into the store.

pub mod http;
pub mod service;
pub mod state;
pub mod sync;

pub use http::HttpCartService;
pub use service::CartService;
pub use state::{InFlight, RoundTripKind, SyncState, SyncTracker};
pub use sync::{SyncGateway, SyncOutcome};
