//! JSON-RPC API for the sequencer.
//!
//! One HTTP endpoint (POST `/`) serving the `eth_*` client surface and the
//! `debug_*` witness surface. Requests fan out through a namespace router to
//! per-method [`RpcHandler`] implementations.

mod context;
mod debug;
mod eth;
mod router;
mod rpc_types;
mod server;

pub mod clients;
pub mod types;

pub use context::RpcApiContext;
pub use router::{RpcHandler, map_http_requests};
pub use rpc_types::{RpcErr, RpcErrorMetadata, RpcRequest, RpcRequestId};
pub use server::start_api;
