#![warn(missing_docs)]
//! statrpc Wire Protocol
//!
//! Request/response messages for the Stat RPC and the framing that carries
//! them over a byte stream (TCP in practice). Messages are serialized with
//! rkyv and validated on read, so a corrupt or hostile peer produces an error
//! instead of undefined behaviour.

mod framing;
mod messages;

pub use framing::{FrameError, FrameReader, FrameWriter, MAX_FRAME_SIZE, read_frame, write_frame};
pub use messages::{
    ClientMessage, FileTypeCode, RpcStatus, ServerInfo, ServerMessage, StatReply, StatRequest,
    StatResponse, StatusCode,
};

/// Protocol version for compatibility checking
pub const PROTOCOL_VERSION: u32 = 1;

/// Default server port
pub const DEFAULT_PORT: u16 = 50051;
