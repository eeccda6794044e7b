//! Stat Service
//!
//! Validates the request, runs the local query, and maps failures onto the
//! wire error categories. Holds no state, so one instance can serve every
//! connection concurrently.

use statrpc_core::{QueryError, StatResult, query};
use statrpc_ipc::{RpcStatus, StatRequest, StatusCode};

/// Stateless Stat RPC handler
#[derive(Debug, Clone, Copy, Default)]
pub struct StatService;

impl StatService {
    /// Create a new service
    pub fn new() -> Self {
        Self
    }

    /// Handle one Stat call.
    ///
    /// A missing request or an empty path is rejected with
    /// `INVALID_ARGUMENT` before any syscall is made.
    pub fn stat(&self, request: Option<&StatRequest>) -> Result<StatResult, RpcStatus> {
        let request = match request {
            Some(req) if !req.path.is_empty() => req,
            _ => {
                return Err(RpcStatus::new(
                    StatusCode::InvalidArgument,
                    "path is required",
                ));
            }
        };

        query(&request.path, request.follow_symlink).map_err(status_from_query_error)
    }
}

fn status_from_query_error(err: QueryError) -> RpcStatus {
    let code = StatusCode::from(err.kind());
    match err {
        QueryError::NotFound { .. } => RpcStatus::new(code, "not found"),
        QueryError::PermissionDenied { .. } => RpcStatus::new(code, "permission denied"),
        QueryError::Internal { source, .. } => {
            RpcStatus::new(code, format!("stat error: {}", source))
        }
    }
}
