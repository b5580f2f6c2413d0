//! One TN5250 session running on its own tokio task
//!
//! The task owns the transport. It feeds inbound bytes through the telnet
//! negotiator and the data stream decoder, writes negotiation replies and
//! host-requested responses, and drains a bounded queue of records
//! submitted by callers. Display state sits behind a `tokio::sync::Mutex`
//! shared with the [`Session`] handle; listeners are notified while that
//! lock is held so every listener sees changes in the order they happened.

use std::fmt;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, trace, warn};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadHalf, WriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep_until, Instant, Interval, MissedTickBehavior};
use uuid::Uuid;

use super::display::Display;
use super::encoder::{DataStreamEncoder, DeviceIdentity};
use super::field::Field;
use super::keys::{apply_key, parse_keys, Key, KeyEffect, Modifiers};
use super::oia::{InhibitReason, Oia};
use super::protocol::{DataStreamDecoder, DecodeOutcome};
use super::screen::{Cell, DirtyRegion};
use super::telnet::{frame_record, DeviceSettings, Negotiator};
use crate::codec::{CodecRegistry, Diagnostics};
use crate::config::SessionConfig;
use crate::error::{ErrorKind, SessionError, SessionResult, TransportError, ValidationError};

const READ_BUFFER_SIZE: usize = 4096;

/// How long `send_keys` waits for the host between attention keys
const SEND_KEYS_UNLOCK_TIMEOUT: Duration = Duration::from_secs(30);

/// Lifecycle of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Connecting,
    Ready,
    Closed,
    Failed,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Closed | SessionState::Failed)
    }
}

/// Notification sent to listeners
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Cells changed; `dirty` covers this change only
    ScreenChanged {
        dirty: Option<DirtyRegion>,
        fields_changed: bool,
    },
    OiaChanged(Oia),
    StateChanged(SessionState),
    /// Last event of a session
    Ended {
        kind: ErrorKind,
        message: Option<String>,
    },
}

/// Receives session notifications on the thread that produced them
pub trait SessionListener: Send + Sync {
    fn on_event(&self, session_id: Uuid, event: &SessionEvent);
}

impl<F> SessionListener for F
where
    F: Fn(Uuid, &SessionEvent) + Send + Sync,
{
    fn on_event(&self, session_id: Uuid, event: &SessionEvent) {
        self(session_id, event)
    }
}

/// Listener that forwards events into a channel
#[derive(Debug, Clone)]
pub struct ChannelListener {
    tx: mpsc::UnboundedSender<(Uuid, SessionEvent)>,
}

impl ChannelListener {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(Uuid, SessionEvent)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl SessionListener for ChannelListener {
    fn on_event(&self, session_id: Uuid, event: &SessionEvent) {
        // A dropped receiver only means nobody listens any more
        let _ = self.tx.send((session_id, event.clone()));
    }
}

/// State and keyboard lock as observed from outside the task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionStatus {
    pub state: SessionState,
    pub keyboard_locked: bool,
}

struct Outbound {
    record: Vec<u8>,
    done: oneshot::Sender<SessionResult<()>>,
}

/// Everything guarded by the session mutex
struct Shared {
    id: Uuid,
    state: SessionState,
    display: Display,
    negotiator: Negotiator,
    listeners: Vec<Arc<dyn SessionListener>>,
    status: watch::Sender<SessionStatus>,
}

impl Shared {
    fn notify(&self, event: SessionEvent) {
        trace!("session {} event {:?}", self.id, event);
        for listener in &self.listeners {
            listener.on_event(self.id, &event);
        }
    }

    fn publish(&self) {
        self.status.send_replace(SessionStatus {
            state: self.state,
            keyboard_locked: self.display.oia().is_keyboard_locked(),
        });
    }

    fn set_state(&mut self, state: SessionState) {
        if self.state == state {
            return;
        }
        debug!("session {} {:?} -> {:?}", self.id, self.state, state);
        self.state = state;
        self.publish();
        self.notify(SessionEvent::StateChanged(state));
    }

    fn ensure_ready(&self) -> SessionResult<()> {
        match self.state {
            SessionState::Ready => Ok(()),
            SessionState::Connecting => Err(SessionError::NotReady),
            SessionState::Closed | SessionState::Failed => Err(SessionError::Closed),
        }
    }

    fn notify_outcome(&self, outcome: &DecodeOutcome) {
        if outcome.dirty.is_some() || outcome.fields_changed {
            self.notify(SessionEvent::ScreenChanged {
                dirty: outcome.dirty,
                fields_changed: outcome.fields_changed,
            });
        }
        if outcome.oia_changed {
            self.notify(SessionEvent::OiaChanged(self.display.oia().clone()));
        }
    }

    fn finish(&mut self, error: Option<&SessionError>) {
        let (state, kind) = match error {
            Some(err) => (SessionState::Failed, err.kind()),
            None => (SessionState::Closed, ErrorKind::Closed),
        };
        self.negotiator.close();
        if let Some(err) = error {
            if let Some((reason, code)) = check_for(err) {
                self.display.oia_mut().set_inhibited(reason, code, Some(err.to_string()));
                self.notify(SessionEvent::OiaChanged(self.display.oia().clone()));
            }
        }
        self.set_state(state);
        self.notify(SessionEvent::Ended {
            kind,
            message: error.map(ToString::to_string),
        });
    }
}

/// OIA check raised when a session fails with `error`
fn check_for(error: &SessionError) -> Option<(InhibitReason, u16)> {
    match error {
        SessionError::Transport(err) => Some((InhibitReason::CommCheck, err.check_code())),
        SessionError::Negotiation(err) => Some((InhibitReason::CommCheck, err.check_code())),
        SessionError::Protocol(err) => Some((InhibitReason::ProgCheck, err.check_code())),
        _ => None,
    }
}

/// Run `f` and return the cells it touched, keeping the accumulated region
fn tracked<T>(display: &mut Display, f: impl FnOnce(&mut Display) -> T) -> (T, Option<DirtyRegion>) {
    let prior = display.screen_mut().take_dirty();
    let result = f(display);
    let dirty = display.screen_mut().take_dirty();
    let screen = display.screen_mut();
    for region in prior.into_iter().chain(dirty) {
        screen.include_region(region);
    }
    (result, dirty)
}

/// Handle to a running session
pub struct Session {
    id: Uuid,
    shared: Arc<Mutex<Shared>>,
    encoder: DataStreamEncoder,
    outbound: mpsc::Sender<Outbound>,
    status: watch::Receiver<SessionStatus>,
    shutdown: watch::Sender<bool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("status", &*self.status.borrow())
            .finish()
    }
}

impl Session {
    /// Open a TCP connection and start a session on it
    pub async fn connect(host: &str, port: u16, config: SessionConfig, registry: &CodecRegistry) -> SessionResult<Session> {
        info!("connecting to {host}:{port}");
        let stream = TcpStream::connect((host, port))
            .await
            .map_err(|source| TransportError::Connect {
                host: host.to_string(),
                port,
                source,
            })?;
        stream.set_nodelay(true)?;
        Self::start(stream, config, registry)
    }

    /// Start a session on an established transport
    ///
    /// Must be called from within a tokio runtime.
    pub fn start<T>(transport: T, config: SessionConfig, registry: &CodecRegistry) -> SessionResult<Session>
    where
        T: AsyncRead + AsyncWrite + Send + Unpin + 'static,
    {
        Self::start_with_diagnostics(transport, config, registry, Diagnostics::disabled())
    }

    /// Like [`Session::start`], reporting encoding problems to `diagnostics`
    pub fn start_with_diagnostics<T>(
        transport: T,
        config: SessionConfig,
        registry: &CodecRegistry,
        diagnostics: Diagnostics,
    ) -> SessionResult<Session>
    where
        T: AsyncRead + AsyncWrite + Send + Unpin + 'static,
    {
        config.validate()?;
        let codec = registry.get(&config.codepage)?;
        let device = DeviceSettings::from_config(&config, codec.is_double_byte());
        let identity = DeviceIdentity::from_terminal_type(&device.terminal_type);
        let negotiator = Negotiator::new(device)?;
        let decoder = DataStreamDecoder::new(codec, diagnostics, identity);

        let id = Uuid::new_v4();
        let initial = SessionStatus {
            state: SessionState::Connecting,
            keyboard_locked: true,
        };
        let (status_tx, status_rx) = watch::channel(initial);
        let shared = Arc::new(Mutex::new(Shared {
            id,
            state: SessionState::Connecting,
            display: Display::with_geometry(config.geometry),
            negotiator,
            listeners: Vec::new(),
            status: status_tx,
        }));
        let (outbound_tx, outbound_rx) = mpsc::channel(config.outbound_queue_depth);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (reader, writer) = tokio::io::split(transport);

        let encoder = decoder.encoder().clone();
        let runner = Runner {
            id,
            shared: Arc::clone(&shared),
            decoder,
            reader,
            writer,
            outbound: outbound_rx,
            shutdown: shutdown_rx,
            keepalive_interval: config.keepalive_interval(),
            keepalive_timeout: config.keepalive_timeout(),
        };
        let task = tokio::spawn(runner.run());
        info!("session {id} started with codepage {}", config.codepage);

        Ok(Session {
            id,
            shared,
            encoder,
            outbound: outbound_tx,
            status: status_rx,
            shutdown: shutdown_tx,
            task: Mutex::new(Some(task)),
        })
    }

    pub fn session_id(&self) -> Uuid {
        self.id
    }

    pub fn status(&self) -> SessionStatus {
        *self.status.borrow()
    }

    pub fn state(&self) -> SessionState {
        self.status().state
    }

    pub async fn add_change_listener(&self, listener: Arc<dyn SessionListener>) {
        self.shared.lock().await.listeners.push(listener);
    }

    // ===== Snapshots =====

    pub async fn screen_text(&self) -> String {
        self.shared.lock().await.display.screen().screen_text()
    }

    /// Cell at a 0-based position
    pub async fn cell(&self, row: usize, col: usize) -> Option<Cell> {
        self.shared.lock().await.display.screen().cell(row, col).copied()
    }

    pub async fn oia(&self) -> Oia {
        self.shared.lock().await.display.oia().clone()
    }

    pub async fn fields(&self) -> Vec<Field> {
        self.shared.lock().await.display.fields().fields().to_vec()
    }

    /// 0-based cursor row and column
    pub async fn cursor(&self) -> (usize, usize) {
        self.shared.lock().await.display.screen().cursor_coords()
    }

    pub async fn display(&self) -> Display {
        self.shared.lock().await.display.clone()
    }

    // ===== Input =====

    /// Apply one key; attention keys are encoded and written before returning
    pub async fn submit_keystroke(&self, key: Key, modifiers: Modifiers) -> SessionResult<KeyEffect> {
        // Queue space is reserved before encoding so records leave in the
        // order their screens were read
        let permit = self.outbound.reserve().await.map_err(|_| SessionError::Closed)?;
        let (done_tx, done_rx) = oneshot::channel();

        let effect = {
            let mut shared = self.shared.lock().await;
            shared.ensure_ready()?;
            let oia_before = shared.display.oia().clone();
            let (effect, dirty) = tracked(&mut shared.display, |display| apply_key(display, key, modifiers));
            let effect = effect?;
            if dirty.is_some() {
                shared.notify(SessionEvent::ScreenChanged {
                    dirty,
                    fields_changed: false,
                });
            }

            if let KeyEffect::Aid(aid) = effect {
                let record = self.encoder.encode_aid(&shared.display, aid)?;
                // SysReq and Attention interrupt without waiting for the host
                if aid.code().is_some() {
                    shared.display.begin_host_wait();
                }
                debug!("session {} sending {:?}", self.id, aid);
                permit.send(Outbound {
                    record,
                    done: done_tx,
                });
            }

            if shared.display.oia() != &oia_before {
                shared.notify(SessionEvent::OiaChanged(shared.display.oia().clone()));
            }
            shared.publish();
            effect
        };

        if let KeyEffect::Aid(_) = effect {
            done_rx.await.map_err(|_| SessionError::Closed)??;
        }
        Ok(effect)
    }

    /// Type a key script such as `"QSECOFR[tab]PASSWORD[enter]"`
    ///
    /// After each attention key the keyboard must unlock before the rest of
    /// the script is typed.
    pub async fn send_keys(&self, script: &str) -> SessionResult<()> {
        let keys = parse_keys(script)?;
        let mut keys = keys.into_iter().peekable();
        while let Some(key) = keys.next() {
            let effect = self.submit_keystroke(key, Modifiers::NONE).await?;
            if matches!(effect, KeyEffect::Aid(_)) && keys.peek().is_some() {
                self.wait_for_unlock(SEND_KEYS_UNLOCK_TIMEOUT).await?;
            }
        }
        Ok(())
    }

    /// Replace the content of the input field covering a 0-based position
    pub async fn set_field_text(&self, row: usize, col: usize, text: &str) -> SessionResult<()> {
        let mut shared = self.shared.lock().await;
        shared.ensure_ready()?;
        if shared.display.oia().is_keyboard_locked() {
            return Err(ValidationError::KeyboardLocked.into());
        }
        let display = &shared.display;
        let id = display
            .screen()
            .position(row, col)
            .and_then(|pos| display.fields().field_at(pos))
            .ok_or(ValidationError::NoField { row, col })?;
        if !display.fields().get(id).is_some_and(Field::is_input) {
            return Err(ValidationError::Protected { row, col }.into());
        }

        let (result, dirty) = tracked(&mut shared.display, |display| {
            let (screen, fields) = display.screen_and_fields_mut();
            fields.set_text(screen, id, text)
        });
        result?;
        if dirty.is_some() {
            shared.notify(SessionEvent::ScreenChanged {
                dirty,
                fields_changed: false,
            });
        }
        Ok(())
    }

    /// Wait until the host unlocks the keyboard
    pub async fn wait_for_unlock(&self, timeout: Duration) -> SessionResult<()> {
        let mut status = self.status.clone();
        let wait = status.wait_for(|s| !s.keyboard_locked || s.state.is_terminal());
        let state = tokio::time::timeout(timeout, wait)
            .await
            .map_err(|_| SessionError::UnlockTimeout)?
            .map_err(|_| SessionError::Closed)?
            .state;
        if state.is_terminal() {
            return Err(SessionError::Closed);
        }
        Ok(())
    }

    /// Stop the session and wait for its task to end
    ///
    /// Records still queued fail with [`SessionError::Closed`].
    pub async fn disconnect(&self) {
        let _ = self.shutdown.send(true);
        let task = self.task.lock().await.take();
        if let Some(task) = task {
            if let Err(err) = task.await {
                warn!("session {} task ended abnormally: {err}", self.id);
            }
        }
    }
}

async fn write_flushed<W: AsyncWrite + Unpin>(writer: &mut W, bytes: &[u8]) -> io::Result<()> {
    writer.write_all(bytes).await?;
    writer.flush().await
}

/// Resolves once shutdown is requested or the handle is gone
async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    loop {
        let stop = *shutdown.borrow_and_update();
        if stop || shutdown.changed().await.is_err() {
            return;
        }
    }
}

async fn tick(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

async fn expire(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// The session task
struct Runner<T> {
    id: Uuid,
    shared: Arc<Mutex<Shared>>,
    decoder: DataStreamDecoder,
    reader: ReadHalf<T>,
    writer: WriteHalf<T>,
    outbound: mpsc::Receiver<Outbound>,
    shutdown: watch::Receiver<bool>,
    keepalive_interval: Option<Duration>,
    keepalive_timeout: Duration,
}

impl<T> Runner<T>
where
    T: AsyncRead + AsyncWrite + Send + Unpin + 'static,
{
    async fn run(mut self) {
        let result = self.serve().await;
        if let Err(err) = &result {
            error!("session {} failed: {err}", self.id);
        } else {
            info!("session {} closed", self.id);
        }
        self.shared.lock().await.finish(result.as_ref().err());

        self.outbound.close();
        while let Some(pending) = self.outbound.recv().await {
            let _ = pending.done.send(Err(SessionError::Closed));
        }
        let _ = self.writer.shutdown().await;
    }

    async fn serve(&mut self) -> SessionResult<()> {
        self.shared.lock().await.negotiator.start();

        let mut buf = vec![0u8; READ_BUFFER_SIZE];
        let mut keepalive = self.keepalive_interval.map(|period| {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });
        let mut mark_deadline: Option<Instant> = None;

        loop {
            tokio::select! {
                changed = self.shutdown.changed() => {
                    if changed.is_err() || *self.shutdown.borrow() {
                        debug!("session {} shutting down", self.id);
                        return Ok(());
                    }
                }
                read = self.reader.read(&mut buf) => {
                    let n = read.map_err(TransportError::Io)?;
                    if n == 0 {
                        return Err(TransportError::ConnectionReset.into());
                    }
                    match self.inbound(&buf[..n]).await? {
                        Some(true) => {}
                        Some(false) => mark_deadline = None,
                        None => return Ok(()),
                    }
                }
                Some(pending) = self.outbound.recv() => {
                    if !self.write_record(pending).await? {
                        return Ok(());
                    }
                }
                _ = tick(&mut keepalive) => {
                    if mark_deadline.is_none() {
                        let mark = self.shared.lock().await.negotiator.timing_mark();
                        trace!("session {} sending keepalive timing mark", self.id);
                        if !self.send(&mark).await? {
                            return Ok(());
                        }
                        mark_deadline = Some(Instant::now() + self.keepalive_timeout);
                    }
                }
                _ = expire(mark_deadline) => {
                    return Err(TransportError::KeepaliveTimeout(self.keepalive_timeout).into());
                }
            }
        }
    }

    /// Handle bytes from the host
    ///
    /// Returns whether a keepalive timing mark is still unanswered, or `None` when
    /// shutdown was requested while replies were being written. Replies are
    /// collected under the session lock and written after it is released.
    async fn inbound(&mut self, bytes: &[u8]) -> SessionResult<Option<bool>> {
        let (writes, mark_outstanding) = {
            let mut shared = self.shared.lock().await;
            let received = shared.negotiator.receive(bytes)?;
            let mut writes = Vec::new();
            if !received.reply.is_empty() {
                writes.push(received.reply);
            }
            if shared.state == SessionState::Connecting && shared.negotiator.is_ready() {
                shared.set_state(SessionState::Ready);
            }

            for record in received.records {
                let outcome = self.decoder.decode(&mut shared.display, &record)?;
                writes.extend(outcome.responses.iter().map(|response| frame_record(response)));
                shared.notify_outcome(&outcome);
            }
            shared.publish();
            (writes, shared.negotiator.mark_outstanding())
        };

        for bytes in &writes {
            if !self.send(bytes).await? {
                return Ok(None);
            }
        }
        Ok(Some(mark_outstanding))
    }

    /// Write and flush unless shutdown comes first; false means shutdown
    async fn send(&mut self, bytes: &[u8]) -> SessionResult<bool> {
        tokio::select! {
            written = write_flushed(&mut self.writer, bytes) => {
                written.map_err(TransportError::Io)?;
                Ok(true)
            }
            _ = shutdown_requested(&mut self.shutdown) => {
                debug!("session {} shutting down during a write", self.id);
                Ok(false)
            }
        }
    }

    async fn write_record(&mut self, pending: Outbound) -> SessionResult<bool> {
        match self.send(&frame_record(&pending.record)).await {
            Ok(true) => {
                let _ = pending.done.send(Ok(()));
                Ok(true)
            }
            Ok(false) => {
                let _ = pending.done.send(Err(SessionError::Closed));
                Ok(false)
            }
            Err(err) => {
                let _ = pending.done.send(Err(SessionError::Closed));
                Err(err)
            }
        }
    }
}
