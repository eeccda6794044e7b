//! TCP Server
//!
//! Accepts connections on the calling thread and hands each one to a rayon
//! worker pool. A connection is served sequentially: read one request, write
//! one reply, repeat until the client says goodbye or hangs up.

use crate::service::StatService;
use rayon::{ThreadPool, ThreadPoolBuilder};
use statrpc_ipc::{
    ClientMessage, FrameError, FrameReader, FrameWriter, ServerInfo, ServerMessage, StatReply,
    StatResponse,
};
use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors from the TCP server
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listen address could not be bound
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        /// Address after `:port` expansion
        addr: String,
        /// Underlying socket error
        #[source]
        source: io::Error,
    },

    /// Socket failure on an accepted connection
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Framing or decoding failure on a connection
    #[error("IPC error: {0}")]
    Ipc(#[from] FrameError),

    /// The connection worker pool could not be created
    #[error("Failed to build worker pool: {0}")]
    Pool(String),
}

/// Expand a bare `:port` listen address to all interfaces.
pub fn normalize_listen_addr(addr: &str) -> String {
    if addr.starts_with(':') {
        format!("0.0.0.0{}", addr)
    } else {
        addr.to_string()
    }
}

/// Stat RPC server bound to a TCP listener
pub struct StatServer {
    listener: TcpListener,
    pool: ThreadPool,
    service: StatService,
    info: Arc<ServerInfo>,
}

impl StatServer {
    /// Bind to `addr`, serving at most `workers` connections concurrently.
    pub fn bind(addr: &str, workers: usize) -> Result<Self, ServerError> {
        let resolved = normalize_listen_addr(addr);
        let listener = TcpListener::bind(&resolved).map_err(|source| ServerError::Bind {
            addr: resolved.clone(),
            source,
        })?;

        let pool = ThreadPoolBuilder::new()
            .num_threads(workers.max(1))
            .thread_name(|i| format!("statrpc-conn-{}", i))
            .build()
            .map_err(|e| ServerError::Pool(e.to_string()))?;

        Ok(Self {
            listener,
            pool,
            service: StatService::new(),
            info: Arc::new(ServerInfo::default()),
        })
    }

    /// Address the listener is bound to (useful with port 0)
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until the listener fails.
    pub fn serve(self) -> Result<(), ServerError> {
        info!(
            addr = %self.local_addr()?,
            workers = self.pool.current_num_threads(),
            "statrpc server listening"
        );

        for stream in self.listener.incoming() {
            let stream = match stream {
                Ok(stream) => stream,
                Err(e) => {
                    warn!(error = %e, "accept failed");
                    continue;
                }
            };

            let service = self.service;
            let info = Arc::clone(&self.info);
            self.pool.spawn(move || {
                let peer = stream
                    .peer_addr()
                    .map(|a| a.to_string())
                    .unwrap_or_else(|_| "unknown".to_string());
                debug!(%peer, "connection accepted");

                match handle_connection(stream, service, &info) {
                    Ok(calls) => debug!(%peer, calls, "connection closed"),
                    Err(e) => warn!(%peer, error = %e, "connection error"),
                }
            });
        }

        Ok(())
    }

    /// Serve on a background thread and return the bound address.
    pub fn spawn(self) -> Result<SocketAddr, ServerError> {
        let addr = self.local_addr()?;
        std::thread::Builder::new()
            .name("statrpc-accept".to_string())
            .spawn(move || {
                if let Err(e) = self.serve() {
                    warn!(error = %e, "server stopped");
                }
            })?;
        Ok(addr)
    }
}

/// Serve a single connection. Returns the number of Stat calls answered.
fn handle_connection(
    stream: TcpStream,
    service: StatService,
    info: &ServerInfo,
) -> Result<u64, ServerError> {
    stream.set_nodelay(true)?;
    let mut reader = FrameReader::new(stream.try_clone()?);
    let mut writer = FrameWriter::new(stream);

    writer.write(&ServerMessage::Hello(info.clone()))?;

    let mut calls = 0;
    loop {
        let message: ClientMessage = match reader.read() {
            Ok(message) => message,
            Err(FrameError::EndOfStream) => break,
            Err(e) => return Err(e.into()),
        };

        match message {
            ClientMessage::Stat { call_id, request } => {
                let result = service.stat(Some(&request));
                if let Err(status) = &result {
                    debug!(call_id, path = %request.path, %status, "stat failed");
                }
                let reply = StatReply::from(result.map(StatResponse::from));
                writer.write(&ServerMessage::Reply { call_id, reply })?;
                calls += 1;
            }
            ClientMessage::Shutdown => break,
        }
    }

    Ok(calls)
}
