//! Client core for the car inventory service.
//!
//! # Overview
//! Builds `HttpRequest` values and parses `HttpResponse` values without
//! touching the network (host-does-IO pattern), and keeps the view state a
//! presentation layer renders: the car list, the "older than five years"
//! list, a loading flag, error messages and form drafts.
//!
//! # Design
//! - `InventoryClient` is stateless; it holds only `base_url`.
//! - `InventoryStore` issues `PendingRequest`s and applies their outcomes, so
//!   requests can be in flight concurrently and settle in any order. Request
//!   tokens drop superseded list responses.
//! - `InventorySession` pairs a store with a `Transport` for hosts that are
//!   happy to block on each call.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod session;
pub mod store;
pub mod transport;
pub mod types;

pub use client::InventoryClient;
pub use config::InventoryConfig;
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use session::InventorySession;
pub use store::{Completion, InventoryStore, Operation, PendingRequest, RequestToken, Ticket, NO_CARS_FOUND};
#[cfg(feature = "blocking")]
pub use transport::UreqTransport;
pub use transport::Transport;
pub use types::{BulkOwnerUpdate, Car, CarDraft, CarField, UpdateDraft};
