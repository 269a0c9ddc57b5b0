//! Client connection handler
//!
//! Drives one connection through its lifecycle: naming handshake, active
//! messaging, teardown. Inbound lines are read and processed strictly in
//! order by the session task; outbound lines go through a dedicated writer
//! task fed by the connection's [`ClientSink`].

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::client::ClientSink;
use crate::error::AppError;
use crate::message::{Message, ServerLine};
use crate::registry::ClientRegistry;
use crate::router::MessageRouter;
use crate::types::{ClientName, SessionId};

/// Lifecycle of a client session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    /// Stream set up, nothing exchanged yet
    Connecting,
    /// Prompting for a screen name
    Naming,
    /// Registered, relaying messages
    Active,
    /// Torn down
    Closed,
}

/// Handle a new TCP connection
///
/// Returns once the peer disconnects or the connection fails. Registry
/// cleanup has already happened by then.
pub async fn handle_connection(stream: TcpStream, registry: ClientRegistry) -> Result<(), AppError> {
    let peer_addr = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    serve_stream(stream, registry, &peer_addr).await
}

/// Run a session over any byte stream
pub async fn serve_stream<S>(stream: S, registry: ClientRegistry, peer: &str) -> Result<(), AppError>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let session_id = SessionId::new();
    debug!("Session {} started for {}", session_id, peer);

    let (reader, writer) = tokio::io::split(stream);
    let mut lines = LineReader::new(BufReader::new(reader));

    // Create channel for server -> client lines
    let (sink, line_rx) = ClientSink::channel();

    // Spawn write task (ServerLine -> socket)
    let mut write_task = tokio::spawn(write_lines(writer, line_rx, session_id));

    let session = ClientSession::new(session_id, registry, sink);

    // Wait for either side to finish
    let result = tokio::select! {
        result = session.run(&mut lines) => result,
        _ = &mut write_task => {
            debug!("Write task completed first for {}", session_id);
            Ok(())
        }
    };

    // Release the connection even if other sessions still hold a sink clone.
    write_task.abort();

    info!("Session {} ({}) closed", session_id, peer);
    result
}

/// Drain queued lines onto the socket, one newline-terminated frame each
async fn write_lines<W>(
    mut writer: W,
    mut line_rx: mpsc::Receiver<ServerLine>,
    session_id: SessionId,
) where
    W: AsyncWrite + Unpin,
{
    while let Some(line) = line_rx.recv().await {
        let frame = format!("{}\n", line);
        if let Err(e) = writer.write_all(frame.as_bytes()).await {
            warn!("Write failed for {}: {}", session_id, e);
            break;
        }
    }
    debug!("Write task ended for {}", session_id);

    let _ = writer.shutdown().await;
}

/// Newline-delimited reader
///
/// Strips `\n` or `\r\n` and decodes lossily: invalid UTF-8 inside a line
/// becomes U+FFFD instead of ending the session.
struct LineReader<R> {
    inner: R,
    buf: Vec<u8>,
}

impl<R> LineReader<R>
where
    R: AsyncBufRead + Unpin,
{
    fn new(inner: R) -> Self {
        Self {
            inner,
            buf: Vec::new(),
        }
    }

    /// Read the next line, `None` at end of stream
    async fn next_line(&mut self) -> std::io::Result<Option<String>> {
        self.buf.clear();
        if self.inner.read_until(b'\n', &mut self.buf).await? == 0 {
            return Ok(None);
        }

        if self.buf.last() == Some(&b'\n') {
            self.buf.pop();
            if self.buf.last() == Some(&b'\r') {
                self.buf.pop();
            }
        }
        Ok(Some(String::from_utf8_lossy(&self.buf).into_owned()))
    }
}

/// Per-connection state machine
///
/// Owned by its session task and never shared.
struct ClientSession {
    id: SessionId,
    state: SessionState,
    registry: ClientRegistry,
    router: MessageRouter,
    sink: ClientSink,
}

impl ClientSession {
    fn new(id: SessionId, registry: ClientRegistry, sink: ClientSink) -> Self {
        Self {
            id,
            state: SessionState::Connecting,
            router: MessageRouter::new(registry.clone()),
            registry,
            sink,
        }
    }

    fn transition(&mut self, next: SessionState) {
        debug!("Session {}: {:?} -> {:?}", self.id, self.state, next);
        self.state = next;
    }

    /// Run handshake and message loop to completion
    async fn run<R>(mut self, lines: &mut LineReader<R>) -> Result<(), AppError>
    where
        R: AsyncBufRead + Unpin,
    {
        self.transition(SessionState::Naming);
        let result = self.drive(lines).await;
        self.transition(SessionState::Closed);
        result
    }

    async fn drive<R>(&mut self, lines: &mut LineReader<R>) -> Result<(), AppError>
    where
        R: AsyncBufRead + Unpin,
    {
        let Some(registration) = self.negotiate_name(lines).await? else {
            debug!("Session {} closed before naming", self.id);
            return Ok(());
        };

        self.transition(SessionState::Active);
        info!("Session {} registered as {}", self.id, registration.name);
        self.registry.broadcast_roster();

        // `registration` removes the name and pushes a new roster when dropped,
        // whichever way the loop below is left.
        self.relay(lines, &registration.name).await
    }

    /// Prompt until a free, non-empty name is submitted
    ///
    /// Returns `None` if the peer closed the stream first.
    async fn negotiate_name<R>(
        &mut self,
        lines: &mut LineReader<R>,
    ) -> Result<Option<Registration>, AppError>
    where
        R: AsyncBufRead + Unpin,
    {
        loop {
            self.sink.send(ServerLine::SubmitName)?;

            let Some(line) = lines.next_line().await? else {
                return Ok(None);
            };

            let registered = ClientName::parse(line).and_then(|name| {
                self.registry
                    .try_register(name.clone(), self.sink.clone())
                    .map(|()| name)
            });

            match registered {
                Ok(name) => {
                    return Ok(Some(Registration {
                        registry: self.registry.clone(),
                        name,
                    }))
                }
                Err(e) => debug!("Session {} name rejected: {}", self.id, e),
            }
        }
    }

    /// Relay inbound lines until the stream ends
    async fn relay<R>(&mut self, lines: &mut LineReader<R>, name: &ClientName) -> Result<(), AppError>
    where
        R: AsyncBufRead + Unpin,
    {
        while let Some(line) = lines.next_line().await? {
            match Message::parse(&line) {
                Some(message) => {
                    self.router.route(name, message);
                }
                None => debug!("Dropping malformed directed line from {}", name),
            }
        }
        debug!("Client {} closed the stream", name);
        Ok(())
    }
}

/// Registry entry owned by an active session
///
/// Dropping it removes the name and pushes the updated roster, so teardown
/// runs on every exit path: clean close, I/O error, panic or task abort.
struct Registration {
    registry: ClientRegistry,
    name: ClientName,
}

impl Drop for Registration {
    fn drop(&mut self) {
        if self.registry.remove(&self.name) {
            info!("Client {} left", self.name);
            self.registry.broadcast_roster();
        }
    }
}
