#![warn(missing_docs)]
//! statrpc Server
//!
//! The remote half of statrpc: a stateless `StatService` that turns a
//! `StatRequest` into a `StatResult` or a classified `RpcStatus`, and a TCP
//! server that exposes it over the framed wire protocol.

mod server;
mod service;

pub use server::{ServerError, StatServer, normalize_listen_addr};
pub use service::StatService;

/// Default listen address: all interfaces on the standard port
pub fn default_listen_addr() -> String {
    format!(":{}", statrpc_ipc::DEFAULT_PORT)
}
