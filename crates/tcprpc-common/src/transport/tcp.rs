use std::future::Future;
use std::io::{ErrorKind, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::protocol::{Request, Response};
use crate::protocol::error::{Result, RpcError};
use crate::transport::codec::{decode_length, encode_frame, JsonCodec, DEFAULT_MAX_FRAME_SIZE, LENGTH_PREFIX_SIZE};

/// Default timeout for TCP operations (2 seconds)
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// Blocking TCP transport for tcprpc.
///
/// Connect, the request write and the response read are each bounded as a
/// whole by the configured timeout. The frame helpers are generic over
/// `Read`/`Write` so they work on any byte stream, not only sockets.
///
/// # Wire Protocol
///
/// ```text
/// [4-byte length, u32 big-endian] [UTF-8 JSON payload]
/// ```
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use tcprpc_common::transport::TcpTransport;
/// use tcprpc_common::protocol::Request;
/// use serde_json::json;
///
/// let transport = TcpTransport::new(Duration::from_secs(2));
/// let mut stream = transport.connect("127.0.0.1:5000").unwrap();
///
/// let request = Request::from_value("add", json!({"a": 2, "b": 3}));
/// let response = transport.send_request(&mut stream, &request).unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct TcpTransport {
    timeout: Duration,
    max_frame_size: usize,
}

impl TcpTransport {
    /// Creates a transport whose operations time out after `timeout`.
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }

    pub fn with_max_frame_size(mut self, max_frame_size: usize) -> Self {
        self.max_frame_size = max_frame_size;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Connects to a remote endpoint.
    ///
    /// Resolves the address and tries each resolved address until one
    /// succeeds. The returned stream has read and write timeouts set.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The address cannot be resolved
    /// - Connection fails to all resolved addresses
    /// - Timeouts cannot be set on the stream
    pub fn connect(&self, addr: &str) -> Result<TcpStream> {
        let socket_addrs = addr
            .to_socket_addrs()
            .map_err(|e| RpcError::Connection(format!("Invalid address '{}': {}", addr, e)))?;

        let mut last_err = None;
        for socket_addr in socket_addrs {
            match TcpStream::connect_timeout(&socket_addr, self.timeout) {
                Ok(stream) => {
                    stream
                        .set_read_timeout(Some(self.timeout))
                        .map_err(|e| RpcError::Connection(format!("Failed to set read timeout: {}", e)))?;
                    stream
                        .set_write_timeout(Some(self.timeout))
                        .map_err(|e| RpcError::Connection(format!("Failed to set write timeout: {}", e)))?;
                    return Ok(stream);
                }
                Err(e) => last_err = Some(e),
            }
        }

        match last_err {
            Some(e) => Err(self.map_io_error(e, &format!("connecting to {}", addr))),
            None => Err(RpcError::Connection(format!("No addresses resolved for {}", addr))),
        }
    }

    /// Sends a request frame and waits for exactly one response frame.
    ///
    /// The send and the receive are each bounded by the timeout as a whole,
    /// so a peer trickling bytes cannot stretch either past it.
    pub fn send_request(&self, stream: &mut TcpStream, request: &Request) -> Result<Response> {
        let encoded = JsonCodec::encode_request(request)?;
        self.send_message(&mut DeadlineStream::new(stream, self.timeout), &encoded)?;

        let response_data = self.receive_message(&mut DeadlineStream::new(stream, self.timeout))?;
        JsonCodec::decode_response(&response_data)
    }

    /// Sends a payload with its length prefix and flushes.
    pub fn send_message<W: Write>(&self, stream: &mut W, data: &[u8]) -> Result<()> {
        let frame = encode_frame(data)?;

        stream
            .write_all(&frame)
            .map_err(|e| self.map_io_error(e, "writing frame"))?;
        stream
            .flush()
            .map_err(|e| self.map_io_error(e, "flushing stream"))?;

        Ok(())
    }

    /// Receives one payload, failing with `ConnectionClosed` if the stream ends.
    pub fn receive_message<R: Read>(&self, stream: &mut R) -> Result<Vec<u8>> {
        self.try_receive_message(stream)?
            .ok_or_else(|| RpcError::ConnectionClosed("peer closed connection".to_string()))
    }

    /// Receives one payload, or `None` if the stream ended cleanly before a new frame.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The stream ends partway through a frame (`ConnectionClosed`)
    /// - The length prefix exceeds the maximum frame size (`FrameTooLarge`)
    /// - A read times out or fails
    pub fn try_receive_message<R: Read>(&self, stream: &mut R) -> Result<Option<Vec<u8>>> {
        let mut len_buf = [0u8; LENGTH_PREFIX_SIZE];
        match self.read_full(stream, &mut len_buf, "reading length prefix")? {
            0 => return Ok(None),
            n if n < LENGTH_PREFIX_SIZE => return Err(closed_mid_frame()),
            _ => {}
        }

        let len = decode_length(len_buf, self.max_frame_size)?;

        let mut buf = vec![0u8; len];
        if self.read_full(stream, &mut buf, "reading payload")? < len {
            return Err(closed_mid_frame());
        }

        Ok(Some(buf))
    }

    /// Fills `buf` until it is full or the stream ends; returns the bytes read.
    fn read_full<R: Read>(&self, stream: &mut R, buf: &mut [u8], context: &str) -> Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match stream.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(self.map_io_error(e, context)),
            }
        }
        Ok(filled)
    }

    fn map_io_error(&self, err: std::io::Error, context: &str) -> RpcError {
        map_io_error(err, context, Some(self.timeout))
    }
}

impl Default for TcpTransport {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

/// Socket view whose reads and writes share one deadline.
///
/// Each call shrinks the socket timeout to the time left, and fails with
/// `TimedOut` once none is left.
struct DeadlineStream<'a> {
    stream: &'a TcpStream,
    deadline: Instant,
}

impl<'a> DeadlineStream<'a> {
    fn new(stream: &'a TcpStream, timeout: Duration) -> Self {
        Self {
            stream,
            deadline: Instant::now() + timeout,
        }
    }

    fn remaining(&self) -> std::io::Result<Duration> {
        let remaining = self.deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(std::io::Error::new(ErrorKind::TimedOut, "deadline elapsed"));
        }
        Ok(remaining)
    }
}

impl Read for DeadlineStream<'_> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.stream.set_read_timeout(Some(self.remaining()?))?;
        let mut stream = self.stream;
        stream.read(buf)
    }
}

impl Write for DeadlineStream<'_> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.stream.set_write_timeout(Some(self.remaining()?))?;
        let mut stream = self.stream;
        stream.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        let mut stream = self.stream;
        stream.flush()
    }
}

/// Async TCP transport for tcprpc.
///
/// Used by the server (without a deadline, since it reacts to a connected
/// peer) and by the async client (with a per-operation deadline).
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use tcprpc_common::transport::TcpTransportAsync;
/// use tcprpc_common::protocol::Request;
/// use serde_json::json;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let transport = TcpTransportAsync::new().with_timeout(Duration::from_secs(2));
/// let mut stream = transport.connect("127.0.0.1:5000").await?;
///
/// let request = Request::from_value("reverse_string", json!({"s": "abc"}));
/// let response = transport.send_request(&mut stream, &request).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct TcpTransportAsync {
    timeout: Option<Duration>,
    max_frame_size: usize,
}

impl TcpTransportAsync {
    /// Creates a transport with no deadline on its operations.
    pub fn new() -> Self {
        Self {
            timeout: None,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_max_frame_size(mut self, max_frame_size: usize) -> Self {
        self.max_frame_size = max_frame_size;
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Connects to a remote endpoint, trying each resolved address in turn.
    pub async fn connect(&self, addr: &str) -> Result<tokio::net::TcpStream> {
        let socket_addrs = tokio::net::lookup_host(addr)
            .await
            .map_err(|e| RpcError::Connection(format!("Invalid address '{}': {}", addr, e)))?;

        let mut last_err = None;
        for socket_addr in socket_addrs {
            let connect = async {
                tokio::net::TcpStream::connect(socket_addr)
                    .await
                    .map_err(|e| self.map_io_error(e, &format!("connecting to {}", addr)))
            };
            match self.with_deadline(connect).await {
                Ok(stream) => return Ok(stream),
                Err(e) => last_err = Some(e),
            }
        }

        Err(last_err
            .unwrap_or_else(|| RpcError::Connection(format!("No addresses resolved for {}", addr))))
    }

    /// Sends a request frame and waits for exactly one response frame.
    ///
    /// The send and the receive are each bounded by the deadline.
    pub async fn send_request(
        &self,
        stream: &mut tokio::net::TcpStream,
        request: &Request,
    ) -> Result<Response> {
        let encoded = JsonCodec::encode_request(request)?;
        self.send_message(stream, &encoded).await?;

        let response_data = self.receive_message(stream).await?;
        JsonCodec::decode_response(&response_data)
    }

    /// Sends a payload with its length prefix and flushes.
    pub async fn send_message<W>(&self, stream: &mut W, data: &[u8]) -> Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        let frame = encode_frame(data)?;

        self.with_deadline(async {
            stream
                .write_all(&frame)
                .await
                .map_err(|e| self.map_io_error(e, "writing frame"))?;
            stream
                .flush()
                .await
                .map_err(|e| self.map_io_error(e, "flushing stream"))
        })
        .await
    }

    /// Receives one payload, failing with `ConnectionClosed` if the stream ends.
    pub async fn receive_message<R>(&self, stream: &mut R) -> Result<Vec<u8>>
    where
        R: AsyncRead + Unpin,
    {
        self.try_receive_message(stream)
            .await?
            .ok_or_else(|| RpcError::ConnectionClosed("peer closed connection".to_string()))
    }

    /// Receives one payload, or `None` if the stream ended cleanly before a new frame.
    pub async fn try_receive_message<R>(&self, stream: &mut R) -> Result<Option<Vec<u8>>>
    where
        R: AsyncRead + Unpin,
    {
        self.with_deadline(async {
            let mut len_buf = [0u8; LENGTH_PREFIX_SIZE];
            match self.read_full(stream, &mut len_buf, "reading length prefix").await? {
                0 => return Ok(None),
                n if n < LENGTH_PREFIX_SIZE => return Err(closed_mid_frame()),
                _ => {}
            }

            let len = decode_length(len_buf, self.max_frame_size)?;

            let mut buf = vec![0u8; len];
            if self.read_full(stream, &mut buf, "reading payload").await? < len {
                return Err(closed_mid_frame());
            }

            Ok(Some(buf))
        })
        .await
    }

    async fn read_full<R>(&self, stream: &mut R, buf: &mut [u8], context: &str) -> Result<usize>
    where
        R: AsyncRead + Unpin,
    {
        let mut filled = 0;
        while filled < buf.len() {
            match stream.read(&mut buf[filled..]).await {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(self.map_io_error(e, context)),
            }
        }
        Ok(filled)
    }

    /// Runs `fut` under the configured deadline, if any.
    async fn with_deadline<F, T>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, fut)
                .await
                .map_err(|_| RpcError::Timeout(timeout.as_millis() as u64))?,
            None => fut.await,
        }
    }

    fn map_io_error(&self, err: std::io::Error, context: &str) -> RpcError {
        map_io_error(err, context, self.timeout)
    }
}

impl Default for TcpTransportAsync {
    fn default() -> Self {
        Self::new()
    }
}

fn closed_mid_frame() -> RpcError {
    RpcError::ConnectionClosed("peer closed connection mid-frame".to_string())
}

/// Map IO errors to the matching `RpcError` variants
///
/// - Timeouts/would block -> `Timeout`
/// - Refused/reset/aborted/broken pipe -> `Connection`
/// - Unexpected end of stream -> `ConnectionClosed`
/// - Other IO errors -> `Io`
fn map_io_error(err: std::io::Error, context: &str, timeout: Option<Duration>) -> RpcError {
    match err.kind() {
        ErrorKind::TimedOut | ErrorKind::WouldBlock => {
            RpcError::Timeout(timeout.map(|t| t.as_millis() as u64).unwrap_or(0))
        }
        ErrorKind::ConnectionRefused
        | ErrorKind::ConnectionReset
        | ErrorKind::ConnectionAborted
        | ErrorKind::NotConnected
        | ErrorKind::BrokenPipe => RpcError::Connection(format!("{}: {}", context, err)),
        ErrorKind::UnexpectedEof => RpcError::ConnectionClosed(format!("{}: {}", context, err)),
        _ => RpcError::Io(err),
    }
}
