//! Stat RPC Client
//!
//! One owned TCP connection to a statrpc server. Calls are strictly
//! sequential; each carries its own deadline. A timed-out call may leave a
//! partial frame on the socket, so the connection is dropped and re-dialled
//! on the next call instead of being reused.

use statrpc_core::StatResult;
use statrpc_ipc::{
    ClientMessage, FrameError, FrameReader, FrameWriter, PROTOCOL_VERSION, RpcStatus, ServerInfo,
    ServerMessage, StatRequest, StatusCode,
};
use std::io;
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors returned by [`StatClient`]
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server answered with an error status
    #[error("{0}")]
    Status(RpcStatus),

    /// The call did not complete within its deadline
    #[error("Call timed out after {0:?}")]
    Timeout(Duration),

    /// Framing or decoding failure on the connection
    #[error("IPC error: {0}")]
    Frame(#[from] FrameError),

    /// The server could not be reached
    #[error("Failed to connect: {0}")]
    Connect(#[source] io::Error),

    /// The server sent something other than what the protocol allows
    #[error("Protocol error: expected {expected}, got {got}")]
    Protocol {
        /// What the client was waiting for
        expected: String,
        /// What arrived instead
        got: String,
    },
}

impl ClientError {
    /// RPC status code, if the server produced one
    pub fn code(&self) -> Option<StatusCode> {
        match self {
            ClientError::Status(status) => Some(status.code),
            ClientError::Timeout(_)
            | ClientError::Frame(_)
            | ClientError::Connect(_)
            | ClientError::Protocol { .. } => None,
        }
    }

    /// Whether the call ran out of time
    pub fn is_timeout(&self) -> bool {
        matches!(self, ClientError::Timeout(_))
    }
}

struct Connection {
    reader: FrameReader<TcpStream>,
    writer: FrameWriter<TcpStream>,
}

impl Connection {
    fn stream(&self) -> &TcpStream {
        self.writer.get_ref()
    }
}

/// Connection to a Stat RPC server
pub struct StatClient {
    target: String,
    conn: Option<Connection>,
    server: ServerInfo,
    next_call_id: u64,
}

impl StatClient {
    /// Dial `target` (`host:port`) and complete the handshake within `timeout`.
    pub fn connect(target: &str, timeout: Duration) -> Result<Self, ClientError> {
        let deadline = Instant::now() + timeout;
        let (conn, server) = dial(target, deadline, timeout)?;
        debug!(addr = %target, host = %server.hostname, "connected");

        Ok(Self {
            target: target.to_string(),
            conn: Some(conn),
            server,
            next_call_id: 1,
        })
    }

    /// Address this client dials
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Identity the server sent during the most recent handshake
    pub fn server_info(&self) -> &ServerInfo {
        &self.server
    }

    /// Whether a live connection is currently held
    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    /// Issue one Stat call. The whole exchange, including a reconnect if the
    /// previous call left the connection unusable, must finish within `timeout`.
    pub fn stat(
        &mut self,
        request: &StatRequest,
        timeout: Duration,
    ) -> Result<StatResult, ClientError> {
        let deadline = Instant::now() + timeout;
        let call_id = self.next_call_id;
        self.next_call_id += 1;

        let result = self.exchange(call_id, request, deadline, timeout);
        if let Err(e) = &result {
            if e.code().is_none() && self.conn.take().is_some() {
                warn!(call_id, error = %e, "dropping connection after failed call");
            }
        }
        result
    }

    fn exchange(
        &mut self,
        call_id: u64,
        request: &StatRequest,
        deadline: Instant,
        timeout: Duration,
    ) -> Result<StatResult, ClientError> {
        let conn = match self.conn.take() {
            Some(conn) => conn,
            None => {
                debug!(addr = %self.target, "reconnecting");
                let (conn, server) = dial(&self.target, deadline, timeout)?;
                self.server = server;
                conn
            }
        };
        let conn = self.conn.insert(conn);

        let left = remaining(deadline, timeout)?;
        conn.stream()
            .set_write_timeout(Some(left))
            .map_err(FrameError::Io)?;
        conn.writer
            .write(&ClientMessage::Stat {
                call_id,
                request: request.clone(),
            })
            .map_err(|e| frame_error(e, timeout))?;

        loop {
            let left = remaining(deadline, timeout)?;
            conn.stream()
                .set_read_timeout(Some(left))
                .map_err(FrameError::Io)?;

            let message: ServerMessage = conn.reader.read().map_err(|e| frame_error(e, timeout))?;
            match message {
                ServerMessage::Reply {
                    call_id: reply_id,
                    reply,
                } if reply_id == call_id => {
                    return reply
                        .into_result()
                        .map(StatResult::from)
                        .map_err(ClientError::Status);
                }
                ServerMessage::Reply {
                    call_id: stale, ..
                } => {
                    debug!(call_id, stale, "skipping stale reply");
                }
                ServerMessage::Hello(_) => {
                    return Err(ClientError::Protocol {
                        expected: format!("Reply for call {}", call_id),
                        got: "Hello".to_string(),
                    });
                }
            }
        }
    }
}

impl Drop for StatClient {
    fn drop(&mut self) {
        if let Some(mut conn) = self.conn.take() {
            let _ = conn.stream().set_write_timeout(Some(Duration::from_millis(100)));
            let _ = conn.writer.write(&ClientMessage::Shutdown);
            let _ = conn.stream().shutdown(Shutdown::Both);
        }
    }
}

fn remaining(deadline: Instant, timeout: Duration) -> Result<Duration, ClientError> {
    let left = deadline.saturating_duration_since(Instant::now());
    if left.is_zero() {
        Err(ClientError::Timeout(timeout))
    } else {
        Ok(left)
    }
}

fn frame_error(e: FrameError, timeout: Duration) -> ClientError {
    if e.is_timeout() {
        ClientError::Timeout(timeout)
    } else {
        ClientError::Frame(e)
    }
}

/// Open a TCP connection and read the server's Hello before `deadline`.
fn dial(
    target: &str,
    deadline: Instant,
    timeout: Duration,
) -> Result<(Connection, ServerInfo), ClientError> {
    let addrs: Vec<SocketAddr> = target
        .to_socket_addrs()
        .map_err(ClientError::Connect)?
        .collect();

    let mut last_err = io::Error::new(
        io::ErrorKind::AddrNotAvailable,
        format!("no addresses resolved for {}", target),
    );
    let mut stream = None;
    for addr in addrs {
        let left = remaining(deadline, timeout)?;
        match TcpStream::connect_timeout(&addr, left) {
            Ok(s) => {
                stream = Some(s);
                break;
            }
            Err(e) if e.kind() == io::ErrorKind::TimedOut => {
                return Err(ClientError::Timeout(timeout));
            }
            Err(e) => {
                debug!(%addr, error = %e, "connect attempt failed");
                last_err = e;
            }
        }
    }
    let stream = stream.ok_or(ClientError::Connect(last_err))?;

    stream.set_nodelay(true).map_err(ClientError::Connect)?;
    stream
        .set_read_timeout(Some(remaining(deadline, timeout)?))
        .map_err(ClientError::Connect)?;

    let reader = FrameReader::new(stream.try_clone().map_err(ClientError::Connect)?);
    let mut conn = Connection {
        reader,
        writer: FrameWriter::new(stream),
    };

    let hello: ServerMessage = conn.reader.read().map_err(|e| frame_error(e, timeout))?;
    let server = match hello {
        ServerMessage::Hello(info) => info,
        other => {
            return Err(ClientError::Protocol {
                expected: "Hello".to_string(),
                got: format!("{:?}", other),
            });
        }
    };
    if server.protocol_version != PROTOCOL_VERSION {
        return Err(ClientError::Protocol {
            expected: format!("protocol version {}", PROTOCOL_VERSION),
            got: format!("protocol version {}", server.protocol_version),
        });
    }

    Ok((conn, server))
}
