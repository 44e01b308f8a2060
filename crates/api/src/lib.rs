//! Whatsy HTTP gateway.
//!
//! Routes:
//! - `POST /webhook` - inbound message intake: validate, answer `/list`
//!   inline, otherwise enqueue (or fall back to synchronous processing when
//!   the queue is down) and reply with a TwiML envelope
//! - `POST /memories` / `GET /memories` / `POST /memories/list` - memory
//!   creation, search, and listing shims
//! - `GET /interactions/recent` - recent interactions with signed media URLs
//! - `GET /analytics/summary` - aggregate counts
//! - `GET /health` - liveness
//!
//! The state holds the queue and the pipeline behind trait objects; entry
//! points construct the concrete clients and inject them here.

pub mod bootstrap;
mod routes;
pub mod worker;

pub use routes::{router, AppState};
