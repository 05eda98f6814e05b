//! # Sessions
//!
//! A [`Session`] performs one request at a time against the backend.  Submitting a job runs
//! the full exchange:
//!
//! ```text
//! client                     backend
//!   STARTUP           ------>
//!   BEGINDATA         ------>
//!   <job records>     ------>
//!   ENDDATA           ------>
//!   STARTJOB          ------>
//!                     <------  <job name>\n
//!   SHUTDOWN          ------>
//! ```
//!
//! A second request issued while the first is still in flight fails with
//! [`SessionError::InFlight`] before any socket is opened.  There are no retries and no
//! timeouts; a socket error is reported once and leaves the session [`SessionState::Failed`].

use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

use super::config::ServerConfig;
use super::lookup::{LookupRequest, Reply};
use crate::codec::WireMessage;
use crate::codec::session::{BEGINDATA, ENDDATA, SHUTDOWN, STARTJOB, STARTUP};
use crate::errors::SessionError;
use crate::handle::JobHandle;
use crate::job::Job;
use crate::validation::ValidationContext;

/// Where a session is in its request cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No request has been made yet.
    #[default]
    Idle,
    /// A request is running.
    InFlight,
    /// The last request completed.
    Succeeded,
    /// The last request failed.
    Failed,
}

impl SessionState {
    /// Whether a new request may start.
    pub fn is_ready(self) -> bool {
        self != SessionState::InFlight
    }
}

/// A single-flight connection to the backend.
#[derive(Debug, Default)]
pub struct Session {
    config: ServerConfig,
    state: Mutex<SessionState>,
}

impl Session {
    /// A session that dials `config`.
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            state: Mutex::new(SessionState::Idle),
        }
    }

    /// The server this session talks to.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// The current state.
    pub fn state(&self) -> SessionState {
        *self.lock()
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin(&self) -> Result<InFlightGuard<'_>, SessionError> {
        let mut state = self.lock();
        if !state.is_ready() {
            warn!(server = %self.config, "request rejected: another request is in flight");
            return Err(SessionError::InFlight);
        }
        *state = SessionState::InFlight;
        Ok(InFlightGuard {
            session: self,
            finished: false,
        })
    }

    async fn connect(&self) -> Result<TcpStream, SessionError> {
        let address = self.config.socket_address();
        debug!(address = %address, "connecting");
        TcpStream::connect(&address)
            .await
            .map_err(|source| SessionError::Connect { address, source })
    }

    /// Validates and encodes `job`, then submits it.
    ///
    /// An invalid job fails with [`SessionError::Job`] and never reaches the network.
    pub async fn submit_job(
        &self,
        job: &Job,
        ctx: &ValidationContext,
    ) -> Result<JobHandle, SessionError> {
        let message = job.begin_job(ctx)?;
        self.submit(&message).await
    }

    /// Streams an encoded job and returns the name the backend assigns to it.
    pub async fn submit(&self, message: &WireMessage) -> Result<JobHandle, SessionError> {
        let guard = self.begin()?;
        let result = self.run_submit(message).await;
        guard.finish(result)
    }

    async fn run_submit(&self, message: &WireMessage) -> Result<JobHandle, SessionError> {
        let stream = self.connect().await?;
        let (reader, mut writer) = stream.into_split();

        write_line(&mut writer, STARTUP).await?;
        write_line(&mut writer, BEGINDATA).await?;
        let body = message.to_bytes();
        writer.write_all(&body).await?;
        write_line(&mut writer, ENDDATA).await?;
        write_line(&mut writer, STARTJOB).await?;
        writer.flush().await?;
        debug!(records = message.len(), bytes = body.len(), "job streamed");

        let mut reader = BufReader::new(reader);
        let mut response = String::new();
        if reader.read_line(&mut response).await? == 0 {
            return Err(SessionError::ConnectionClosed);
        }
        let handle = JobHandle::new(&response);
        if handle.is_empty() {
            return Err(SessionError::ConnectionClosed);
        }

        // The job is queued once the name arrives; a failed goodbye does not undo that.
        if let Err(err) = write_line(&mut writer, SHUTDOWN).await {
            debug!(error = %err, "backend closed before SHUTDOWN");
        }
        if let Err(err) = writer.shutdown().await {
            debug!(error = %err, "socket shutdown failed");
        }
        info!(job = %handle, server = %self.config, "job submitted");
        Ok(handle)
    }

    /// Sends a lookup and returns the reply lines before the `COMPLETE` sentinel.
    pub async fn request(&self, request: &LookupRequest) -> Result<Vec<String>, SessionError> {
        let guard = self.begin()?;
        let result = self.run_request(request).await;
        guard.finish(result)
    }

    async fn run_request(&self, request: &LookupRequest) -> Result<Vec<String>, SessionError> {
        let stream = self.connect().await?;
        let (reader, mut writer) = stream.into_split();
        let line = request.request_line();
        write_line(&mut writer, &line).await?;
        writer.flush().await?;
        debug!(request = %line, "lookup sent");

        let mut lines = BufReader::new(reader).lines();
        let mut reply = Reply::default();
        while let Some(line) = lines.next_line().await? {
            if reply.push(&line) {
                break;
            }
        }
        if let Err(err) = writer.shutdown().await {
            debug!(error = %err, "socket shutdown failed");
        }
        let complete = reply.is_complete();
        let lines = reply.into_lines();
        info!(request = %line, lines = lines.len(), complete, "lookup answered");
        Ok(lines)
    }
}

/// Holds a session in flight; dropping it unfinished marks the session failed.
struct InFlightGuard<'a> {
    session: &'a Session,
    finished: bool,
}

impl InFlightGuard<'_> {
    fn finish<T>(mut self, result: Result<T, SessionError>) -> Result<T, SessionError> {
        self.finished = true;
        let mut state = self.session.lock();
        *state = match &result {
            Ok(_) => SessionState::Succeeded,
            Err(err) => {
                warn!(server = %self.session.config, error = %err, "request failed");
                SessionState::Failed
            }
        };
        result
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            warn!(server = %self.session.config, "request abandoned before completion");
            *self.session.lock() = SessionState::Failed;
        }
    }
}

async fn write_line<W>(writer: &mut W, line: &str) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(line.as_bytes()).await?;
    writer.write_all(b"\n").await
}

#[cfg(test)]
mod tests {
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    use super::*;
    use crate::codec::{Fields, RecordWriter};

    fn message() -> WireMessage {
        let mut out = RecordWriter::new();
        out.record("job_options", Fields::new().int(0).flag(false).flag(false));
        out.finish()
    }

    async fn listener() -> (TcpListener, ServerConfig) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        (listener, ServerConfig::new("127.0.0.1", port))
    }

    #[tokio::test]
    async fn submit_runs_the_handshake() {
        let (listener, config) = listener().await;
        let backend = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            let (reader, mut writer) = socket.into_split();
            let mut reader = BufReader::new(reader);
            let mut received = Vec::new();
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).await.unwrap();
                let line = line.trim_end().to_string();
                let done = line == STARTJOB;
                received.push(line);
                if done {
                    break;
                }
            }
            writer.write_all(b"job_20240701\n").await.unwrap();
            let mut rest = String::new();
            reader.read_to_string(&mut rest).await.unwrap();
            received.push(rest.trim_end().to_string());
            received
        });

        let session = Session::new(config);
        let handle = session.submit(&message()).await.unwrap();
        assert_eq!(handle.as_str(), "job_20240701");
        assert_eq!(session.state(), SessionState::Succeeded);

        let received = backend.await.unwrap();
        assert_eq!(
            received,
            vec![
                "STARTUP",
                "BEGINDATA",
                "job_options",
                "0|0|0",
                "ENDDATA",
                "STARTJOB",
                "SHUTDOWN"
            ]
        );
    }

    #[tokio::test]
    async fn connect_failure_marks_the_session_failed() {
        let (listener, config) = listener().await;
        drop(listener);
        let session = Session::new(config);
        let err = session.submit(&message()).await.unwrap_err();
        assert!(matches!(err, SessionError::Connect { .. }));
        assert_eq!(session.state(), SessionState::Failed);
    }

    #[tokio::test]
    async fn closed_connection_without_a_name() {
        let (listener, config) = listener().await;
        let backend = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 16];
            let read = socket.read(&mut buf).await.unwrap();
            assert!(read > 0);
        });
        let session = Session::new(config);
        let err = session.submit(&message()).await.unwrap_err();
        assert!(matches!(err, SessionError::ConnectionClosed | SessionError::Io(_)));
        assert_eq!(session.state(), SessionState::Failed);
        backend.await.unwrap();
    }

    #[test]
    fn second_request_while_in_flight_is_rejected() {
        let session = Session::default();
        let guard = session.begin().unwrap();
        assert!(matches!(session.begin(), Err(SessionError::InFlight)));
        assert_eq!(session.state(), SessionState::InFlight);
        guard.finish::<()>(Ok(())).unwrap();
        assert_eq!(session.state(), SessionState::Succeeded);
        assert!(session.begin().is_ok());
    }

    #[tokio::test]
    async fn abandoned_request_releases_the_session() {
        let (listener, config) = listener().await;
        let backend = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut received = Vec::new();
            socket.read_to_end(&mut received).await.ok();
        });

        let session = Session::new(config);
        let pending = tokio::time::timeout(
            std::time::Duration::from_millis(100),
            session.submit(&message()),
        )
        .await;
        assert!(pending.is_err());
        assert_eq!(session.state(), SessionState::Failed);
        assert!(session.begin().is_ok());
        backend.await.unwrap();
    }

    #[tokio::test]
    async fn lookup_reads_until_complete() {
        let (listener, config) = listener().await;
        let backend = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            let (reader, mut writer) = socket.into_split();
            let mut reader = BufReader::new(reader);
            let mut line = String::new();
            reader.read_line(&mut line).await.unwrap();
            writer
                .write_all(b"America/Edmonton\nAmerica/Regina\nCOMPLETE\n")
                .await
                .unwrap();
            line
        });
        let session = Session::new(config);
        let lines = session.request(&LookupRequest::ListTimezones).await.unwrap();
        assert_eq!(lines, vec!["America/Edmonton", "America/Regina"]);
        assert_eq!(backend.await.unwrap(), "LIST_TIMEZONES\n");
    }
}
