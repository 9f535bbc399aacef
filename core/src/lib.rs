// cartsync/src/lib.rs

//! cartsync: the state-synchronization core of a storefront cart widget.
//!
//! A session keeps a client-held list of line items in step with a
//! server-of-record:
//!  - Local mutations (add, change quantity, remove) go through a `CartStore`
//!    that enforces unique product ids and positive quantities and persists
//!    every change to session storage.
//!  - A `SyncGateway` runs add and refetch round trips against a
//!    `CartService`, in one of two reconciliation modes (see `SyncMode`).
//!    Every round trip carries a request token; a response that arrives after
//!    a newer request or local change is discarded rather than applied.
//!  - An `InvalidationListener` turns `{action: "add_to_cart", status:
//!    "success"}` notifications on the owner's channel into refetches.
//!  - A `Dispatcher` takes `UiAction`s from the renderer and turns every error
//!    into a `Notice`; no error ends the session.
//!
//! `CartSession` wires all of the above for one owner. A renderer reads
//! `snapshot()` and redraws whenever the `watch` receiver returned by
//! `CartSession::subscribe` reports a change.
//!
//! ```text
//! UiAction -> Dispatcher -> SyncGateway (flow) -> CartService
//!                   |              |
//!                   v              v
//!               CartStore <- reconcile (token still current?)
//!                   ^
//! notification -> InvalidationListener -> SyncGateway::fetch_cart
//! ```

pub mod config;
pub mod dispatch;
pub mod error;
pub mod flow;
pub mod gateway;
pub mod listener;
pub mod model;
pub mod notice;
pub mod session;
pub mod store;

// --- Re-exports for the public API ---

pub use crate::config::{SessionConfig, SyncMode};
pub use crate::dispatch::{DispatchReport, Dispatcher, UiAction};
pub use crate::error::{CartError, CartResult};

pub use crate::flow::{Flow, FlowControl, FlowData, FlowOutcome, SkipCondition};

pub use crate::gateway::{CartService, HttpCartService, SyncGateway, SyncOutcome, SyncState};
pub use crate::listener::{BroadcastHub, InvalidationListener, ListenerHandle, NotificationChannel, Subscription};

pub use crate::model::{decode_cart_body, decode_mutation_body, parse_quantity, Cart, CartSnapshot, LineItem, MutationReceipt, PayloadStyle, ProductRef};
pub use crate::notice::{Notice, NoticeBoard, NoticeKind};
pub use crate::session::CartSession;
pub use crate::store::storage::{FileSessionStorage, MemorySessionStorage, SessionStorage};
pub use crate::store::{Adjustment, CartStore, RequestToken};
