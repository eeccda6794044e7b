//! RPC Message Types
//!
//! All messages are serialized with rkyv and validated on receipt.

use rkyv::{Archive, Deserialize as RkyvDeserialize, Serialize as RkyvSerialize};
use statrpc_core::{FailureKind, FileType, StatResult};
use std::fmt;

/// Stat request payload
#[derive(Debug, Clone, PartialEq, Eq, Archive, RkyvSerialize, RkyvDeserialize)]
#[archive(check_bytes)]
pub struct StatRequest {
    /// Path to query; must be non-empty
    pub path: String,
    /// `true` for stat semantics, `false` for lstat semantics
    pub follow_symlink: bool,
}

/// Entry type on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Archive, RkyvSerialize, RkyvDeserialize)]
#[archive(check_bytes)]
pub enum FileTypeCode {
    /// Regular file
    File,
    /// Directory
    Dir,
    /// Symbolic link
    Symlink,
    /// Anything else
    Other,
}

impl From<FileType> for FileTypeCode {
    fn from(file_type: FileType) -> Self {
        match file_type {
            FileType::File => FileTypeCode::File,
            FileType::Directory => FileTypeCode::Dir,
            FileType::Symlink => FileTypeCode::Symlink,
            FileType::Other => FileTypeCode::Other,
        }
    }
}

impl From<FileTypeCode> for FileType {
    fn from(code: FileTypeCode) -> Self {
        match code {
            FileTypeCode::File => FileType::File,
            FileTypeCode::Dir => FileType::Directory,
            FileTypeCode::Symlink => FileType::Symlink,
            FileTypeCode::Other => FileType::Other,
        }
    }
}

/// Successful Stat response; fields are copied verbatim from the query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Archive, RkyvSerialize, RkyvDeserialize)]
#[archive(check_bytes)]
pub struct StatResponse {
    /// Size in bytes
    pub size: i64,
    /// Raw mode bits
    pub mode: u32,
    /// Owner user id
    pub uid: u32,
    /// Owner group id
    pub gid: u32,
    /// Modification time, seconds
    pub mtime_sec: i64,
    /// Modification time, nanoseconds
    pub mtime_nsec: i64,
    /// Entry type
    pub file_type: FileTypeCode,
}

impl From<StatResult> for StatResponse {
    fn from(result: StatResult) -> Self {
        Self {
            size: result.size,
            mode: result.mode,
            uid: result.uid,
            gid: result.gid,
            mtime_sec: result.mtime_sec,
            mtime_nsec: result.mtime_nsec,
            file_type: result.file_type.into(),
        }
    }
}

impl From<StatResponse> for StatResult {
    fn from(response: StatResponse) -> Self {
        Self {
            size: response.size,
            mode: response.mode,
            uid: response.uid,
            gid: response.gid,
            mtime_sec: response.mtime_sec,
            mtime_nsec: response.mtime_nsec,
            file_type: response.file_type.into(),
        }
    }
}

/// Error categories carried on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Archive, RkyvSerialize, RkyvDeserialize)]
#[archive(check_bytes)]
pub enum StatusCode {
    /// Missing request or empty path
    InvalidArgument,
    /// Path does not exist
    NotFound,
    /// Access denied
    PermissionDenied,
    /// Any other server-side failure
    Internal,
}

impl StatusCode {
    /// Upper snake-case name
    pub fn as_str(self) -> &'static str {
        match self {
            StatusCode::InvalidArgument => "INVALID_ARGUMENT",
            StatusCode::NotFound => "NOT_FOUND",
            StatusCode::PermissionDenied => "PERMISSION_DENIED",
            StatusCode::Internal => "INTERNAL",
        }
    }
}

impl From<FailureKind> for StatusCode {
    fn from(kind: FailureKind) -> Self {
        match kind {
            FailureKind::NotFound => StatusCode::NotFound,
            FailureKind::PermissionDenied => StatusCode::PermissionDenied,
            FailureKind::Internal => StatusCode::Internal,
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error status returned in place of a `StatResponse`
#[derive(Debug, Clone, PartialEq, Eq, Archive, RkyvSerialize, RkyvDeserialize)]
#[archive(check_bytes)]
pub struct RpcStatus {
    /// Error category
    pub code: StatusCode,
    /// Human-readable detail
    pub message: String,
}

impl RpcStatus {
    /// Create a status with the given code and message
    pub fn new(code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for RpcStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for RpcStatus {}

/// Outcome of one Stat call
#[derive(Debug, Clone, PartialEq, Eq, Archive, RkyvSerialize, RkyvDeserialize)]
#[archive(check_bytes)]
pub enum StatReply {
    /// Query succeeded
    Success(StatResponse),
    /// Query failed
    Failure(RpcStatus),
}

impl StatReply {
    /// Convert into a standard `Result`
    pub fn into_result(self) -> Result<StatResponse, RpcStatus> {
        match self {
            StatReply::Success(response) => Ok(response),
            StatReply::Failure(status) => Err(status),
        }
    }
}

impl From<Result<StatResponse, RpcStatus>> for StatReply {
    fn from(result: Result<StatResponse, RpcStatus>) -> Self {
        match result {
            Ok(response) => StatReply::Success(response),
            Err(status) => StatReply::Failure(status),
        }
    }
}

/// Server identity advertised during handshake
#[derive(Debug, Clone, PartialEq, Eq, Archive, RkyvSerialize, RkyvDeserialize)]
#[archive(check_bytes)]
pub struct ServerInfo {
    /// Protocol version for compatibility
    pub protocol_version: u32,
    /// Host name of the server (for reports)
    pub hostname: String,
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self {
            protocol_version: crate::PROTOCOL_VERSION,
            hostname: hostname(),
        }
    }
}

/// Messages sent from client to server
#[derive(Debug, Clone, PartialEq, Eq, Archive, RkyvSerialize, RkyvDeserialize)]
#[archive(check_bytes)]
pub enum ClientMessage {
    /// Stat a path
    Stat {
        /// Echoed back in the reply so stale replies can be told apart
        call_id: u64,
        /// The query
        request: StatRequest,
    },

    /// Close the connection gracefully
    Shutdown,
}

/// Messages sent from server to client
#[derive(Debug, Clone, PartialEq, Eq, Archive, RkyvSerialize, RkyvDeserialize)]
#[archive(check_bytes)]
pub enum ServerMessage {
    /// Sent once, immediately after accept
    Hello(ServerInfo),

    /// Reply to a `ClientMessage::Stat`
    Reply {
        /// `call_id` of the request being answered
        call_id: u64,
        /// Result or error status
        reply: StatReply,
    },
}

fn hostname() -> String {
    #[cfg(target_os = "linux")]
    {
        std::fs::read_to_string("/proc/sys/kernel/hostname")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "unknown".to_string())
    }

    #[cfg(not(target_os = "linux"))]
    {
        std::env::var("HOSTNAME").unwrap_or_else(|_| "unknown".to_string())
    }
}
