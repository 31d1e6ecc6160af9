//! Manager session handling

use std::collections::VecDeque;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, info, trace, warn};

use super::{
    action::{Action, AmiResponse},
    event::AmiEvent,
    protocol::{AmiMessage, AmiParser, MessageType},
};
use crate::{
    config::AmiSettings,
    constants::*,
    error::{DialplanError, DialplanResult},
};

/// Authenticated manager session over any byte stream.
///
/// Actions are sent one at a time. Events arriving while a response is
/// awaited are queued and handed out by [`recv_event`](Self::recv_event).
pub struct AmiConnection<S = TcpStream> {
    stream: S,
    parser: AmiParser,
    banner: String,
    connected: bool,
    authenticated: bool,
    next_action_id: u64,
    event_queue: VecDeque<AmiEvent>,
    read_buffer: [u8; SOCKET_BUF_SIZE],
    timeout_ms: u64,
}

impl AmiConnection<TcpStream> {
    /// Connect, read the banner and log in.
    pub async fn connect(settings: &AmiSettings) -> DialplanResult<Self> {
        info!(
            "Connecting to Asterisk manager at {}:{}",
            settings.host, settings.port
        );

        let tcp_result = timeout(
            Duration::from_millis(settings.timeout_ms),
            TcpStream::connect((settings.host.as_str(), settings.port)),
        )
        .await;
        let stream = match tcp_result {
            Ok(Ok(s)) => {
                debug!("[CONNECT] TCP connection established");
                s
            }
            Ok(Err(e)) => {
                warn!("[CONNECT] TCP connect failed: {}", e);
                return Err(DialplanError::Io(e));
            }
            Err(_) => {
                warn!(
                    "[CONNECT] TCP connect timed out after {}ms",
                    settings.timeout_ms
                );
                return Err(DialplanError::Timeout {
                    timeout_ms: settings.timeout_ms,
                });
            }
        };

        let mut connection = Self::handshake(stream, settings.timeout_ms).await?;
        connection
            .login(&settings.username, &settings.secret)
            .await?;
        info!("Logged in to {} as {}", connection.banner(), settings.username);
        Ok(connection)
    }
}

impl<S> AmiConnection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wrap an open stream and wait for the `Asterisk Call Manager` banner.
    pub async fn handshake(stream: S, timeout_ms: u64) -> DialplanResult<Self> {
        let mut connection = Self {
            stream,
            parser: AmiParser::new(),
            banner: String::new(),
            connected: true,
            authenticated: false,
            next_action_id: 1,
            event_queue: VecDeque::new(),
            read_buffer: [0u8; SOCKET_BUF_SIZE],
            timeout_ms,
        };

        loop {
            if let Some(banner) = connection
                .parser
                .parse_banner()?
            {
                debug!("[CONNECT] Banner: {}", banner);
                connection.banner = banner;
                return Ok(connection);
            }
            connection
                .fill()
                .await?;
        }
    }

    pub fn banner(&self) -> &str {
        &self.banner
    }

    pub fn is_connected(&self) -> bool {
        self.connected && self.authenticated
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Events received but not yet handed out
    pub fn pending_events(&self) -> usize {
        self.event_queue
            .len()
    }

    pub async fn login(&mut self, username: &str, secret: &str) -> DialplanResult<()> {
        debug!("[AUTH] Logging in as {}", username);
        let response = self
            .send_action(Action::login(username, secret))
            .await?;
        if !response.is_success() {
            return Err(DialplanError::auth_failed(
                response
                    .message()
                    .unwrap_or("Authentication failed"),
            ));
        }
        self.authenticated = true;
        debug!("[AUTH] Login accepted");
        Ok(())
    }

    /// Send an action and wait for the response carrying its `ActionID`.
    pub async fn send_action(&mut self, action: Action) -> DialplanResult<AmiResponse> {
        if !self.connected {
            return Err(DialplanError::NotConnected);
        }

        let id = self
            .next_action_id
            .to_string();
        self.next_action_id += 1;
        let action = action.with_action_id(&id);
        let wire = action.to_string();
        debug!("Sending action {} (ActionID {})", action.name(), id);

        self.stream
            .write_all(wire.as_bytes())
            .await?;
        self.stream
            .flush()
            .await?;

        loop {
            let message = self
                .recv_message()
                .await?;
            match message.message_type {
                MessageType::Response(_) => {
                    let matches = message
                        .action_id()
                        .map_or(true, |got| got == id);
                    if !matches {
                        debug!(
                            "Ignoring response for ActionID {:?} while waiting for {}",
                            message.action_id(),
                            id
                        );
                        continue;
                    }
                    if let Some(response) = AmiResponse::from_message(message) {
                        debug!(
                            "Action {} answered: {}",
                            action.name(),
                            response.status()
                        );
                        return Ok(response);
                    }
                }
                MessageType::Event(_) => self.queue_event(message),
                MessageType::Unknown => {
                    debug!("Ignoring message without Response or Event header");
                }
            }
        }
    }

    pub async fn ping(&mut self) -> DialplanResult<()> {
        self.send_action(Action::ping())
            .await?
            .into_result("Ping")?;
        Ok(())
    }

    /// Run a CLI command and return its output lines.
    pub async fn command(&mut self, command: &str) -> DialplanResult<Vec<String>> {
        let response = self
            .send_action(Action::command(command))
            .await?
            .into_result("Command")?;
        Ok(response
            .output()
            .to_vec())
    }

    /// `dialplan reload`
    pub async fn reload_dialplan(&mut self) -> DialplanResult<Vec<String>> {
        let output = self
            .command("dialplan reload")
            .await?;
        info!("Dialplan reloaded: {}", output.join(" ").trim());
        Ok(output)
    }

    /// Next event, or `None` once the server closed the session.
    ///
    /// Waits indefinitely; use [`recv_event_timeout`](Self::recv_event_timeout)
    /// to bound the wait.
    pub async fn recv_event(&mut self) -> DialplanResult<Option<AmiEvent>> {
        if let Some(event) = self
            .event_queue
            .pop_front()
        {
            return Ok(Some(event));
        }

        loop {
            let message = match self
                .recv_message()
                .await
            {
                Ok(message) => message,
                Err(DialplanError::ConnectionClosed) => {
                    warn!("Manager connection closed");
                    self.connected = false;
                    return Ok(None);
                }
                // idle sessions are normal while waiting for events
                Err(DialplanError::Timeout { .. }) => {
                    trace!("No event within {}ms, still waiting", self.timeout_ms);
                    continue;
                }
                Err(e) => return Err(e),
            };
            if let Some(event) = AmiEvent::from_message(message) {
                return Ok(Some(event));
            }
            debug!("Ignoring non-event message");
        }
    }

    pub async fn recv_event_timeout(&mut self, timeout_ms: u64) -> DialplanResult<Option<AmiEvent>> {
        timeout(Duration::from_millis(timeout_ms), self.recv_event())
            .await
            .map_err(|_| DialplanError::Timeout { timeout_ms })?
    }

    /// Log off. A server that hangs up before answering is fine.
    pub async fn logoff(&mut self) -> DialplanResult<()> {
        if !self.connected {
            return Ok(());
        }
        let result = self
            .send_action(Action::logoff())
            .await;
        self.connected = false;
        self.authenticated = false;
        match result {
            Ok(_) | Err(DialplanError::ConnectionClosed) => {
                info!("Logged off from Asterisk manager");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn queue_event(&mut self, message: AmiMessage) {
        let Some(event) = AmiEvent::from_message(message) else {
            return;
        };
        if self
            .event_queue
            .len()
            >= MAX_EVENT_QUEUE_SIZE
        {
            warn!(
                "Event queue full ({} events), dropping oldest",
                MAX_EVENT_QUEUE_SIZE
            );
            self.event_queue
                .pop_front();
        }
        trace!("Queued event {}", event.event_type());
        self.event_queue
            .push_back(event);
    }

    async fn recv_message(&mut self) -> DialplanResult<AmiMessage> {
        loop {
            if let Some(message) = self
                .parser
                .parse_message()?
            {
                trace!("[RECV] Parsed {:?}", message.message_type);
                return Ok(message);
            }
            self.fill()
                .await?;
        }
    }

    /// Read once from the socket into the parser
    async fn fill(&mut self) -> DialplanResult<()> {
        let read_result = timeout(
            Duration::from_millis(self.timeout_ms),
            self.stream
                .read(&mut self.read_buffer),
        )
        .await;

        let bytes_read = match read_result {
            Ok(Ok(n)) => n,
            Ok(Err(e)) => return Err(DialplanError::Io(e)),
            Err(_) => {
                return Err(DialplanError::Timeout {
                    timeout_ms: self.timeout_ms,
                })
            }
        };
        trace!("[RECV] Read {} bytes from socket", bytes_read);
        if bytes_read == 0 {
            self.connected = false;
            return Err(DialplanError::ConnectionClosed);
        }
        self.parser
            .add_data(&self.read_buffer[..bytes_read])
    }
}

impl<S> Drop for AmiConnection<S> {
    fn drop(&mut self) {
        if self.connected {
            debug!("AmiConnection dropped - connection will be closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::io::Builder;

    const BANNER: &[u8] = b"Asterisk Call Manager/7.0.3\r\n";
    const LOGIN: &[u8] =
        b"Action: Login\r\nActionID: 1\r\nUsername: admin\r\nSecret: pw\r\nEvents: on\r\n\r\n";

    #[tokio::test]
    async fn test_login_success() {
        let mock = Builder::new()
            .read(BANNER)
            .write(LOGIN)
            .read(b"Response: Success\r\nActionID: 1\r\nMessage: Authentication accepted\r\n\r\n")
            .build();

        let mut conn = AmiConnection::handshake(mock, 1000)
            .await
            .unwrap();
        assert_eq!(conn.banner(), "Asterisk Call Manager/7.0.3");
        conn.login("admin", "pw")
            .await
            .unwrap();
        assert!(conn.is_connected());
    }

    #[tokio::test]
    async fn test_login_rejected() {
        let mock = Builder::new()
            .read(BANNER)
            .write(LOGIN)
            .read(b"Response: Error\r\nActionID: 1\r\nMessage: Authentication failed\r\n\r\n")
            .build();

        let mut conn = AmiConnection::handshake(mock, 1000)
            .await
            .unwrap();
        let err = conn
            .login("admin", "pw")
            .await
            .unwrap_err();
        assert!(matches!(err, DialplanError::AuthenticationFailed { ref reason } if reason == "Authentication failed"));
        assert!(!conn.is_authenticated());
    }

    #[tokio::test]
    async fn test_events_during_action_are_queued() {
        let mock = Builder::new()
            .read(BANNER)
            .write(b"Action: Ping\r\nActionID: 1\r\n\r\n")
            .read(b"Event: FullyBooted\r\nStatus: Fully Booted\r\n\r\n")
            .read(b"Response: Success\r\nActionID: 1\r\nPing: Pong\r\n\r\n")
            .build();

        let mut conn = AmiConnection::handshake(mock, 1000)
            .await
            .unwrap();
        conn.ping()
            .await
            .unwrap();
        assert_eq!(conn.pending_events(), 1);
        let event = conn
            .recv_event()
            .await
            .unwrap()
            .unwrap();
        assert_eq!(event.header("Status"), Some("Fully Booted"));
    }

    #[tokio::test]
    async fn test_reload_collects_output() {
        let mock = Builder::new()
            .read(BANNER)
            .write(b"Action: Command\r\nActionID: 1\r\nCommand: dialplan reload\r\n\r\n")
            .read(b"Response: Success\r\nActionID: 1\r\nMessage: Command output follows\r\nOutput: Dialplan reloaded.\r\n\r\n")
            .build();

        let mut conn = AmiConnection::handshake(mock, 1000)
            .await
            .unwrap();
        let output = conn
            .reload_dialplan()
            .await
            .unwrap();
        assert_eq!(output, vec!["Dialplan reloaded.".to_string()]);
    }

    #[tokio::test]
    async fn test_closed_during_action() {
        let mock = Builder::new()
            .read(BANNER)
            .write(b"Action: Ping\r\nActionID: 1\r\n\r\n")
            .build();

        let mut conn = AmiConnection::handshake(mock, 1000)
            .await
            .unwrap();
        let err = conn
            .ping()
            .await
            .unwrap_err();
        assert!(err.is_connection_error());
        assert!(matches!(
            conn.send_action(Action::ping())
                .await,
            Err(DialplanError::NotConnected)
        ));
    }
}
