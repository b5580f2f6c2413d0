//! Pool of reusable sessions
//!
//! A semaphore bounds how many sessions are borrowed at once: a borrower
//! holds one permit for as long as it holds the session. Returned sessions
//! wait in an idle queue, and a new one is opened only when that queue is
//! empty, so idle plus borrowed never exceeds `max_size`.
//!
//! Sessions go back to the pool when the [`PooledSession`] guard is dropped.
//! A session dropped by the pool stops its task because its handle goes
//! away; [`SessionPool::shutdown`] and the housekeeping task disconnect
//! explicitly.

use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::ops::Deref;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use log::{debug, error, info, warn};
use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use super::session::Session;
use crate::codec::CodecRegistry;
use crate::config::{AcquisitionMode, EvictionPolicy, SessionConfig, SessionPoolConfig, ValidationStrategy};
use crate::error::{PoolError, PoolResult, SessionResult};

/// Housekeeping never runs more often than this
const MIN_SWEEP_PERIOD: Duration = Duration::from_millis(100);

type SessionFuture = Pin<Box<dyn Future<Output = SessionResult<Session>> + Send>>;
type Factory = Box<dyn Fn(String) -> SessionFuture + Send + Sync>;

/// Counters since the pool started
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Sessions currently borrowed
    pub active: usize,
    /// Sessions waiting in the idle queue
    pub idle: usize,
    /// Sessions the pool owns, borrowed or idle
    pub size: usize,
    pub borrows: u64,
    pub returns: u64,
    pub evictions: u64,
}

struct IdleSession {
    session: Arc<Session>,
    created: Instant,
    idle_since: Instant,
}

#[derive(Default)]
struct PoolState {
    idle: VecDeque<IdleSession>,
    active: usize,
    /// Idle, borrowed and being opened
    size: usize,
}

struct PoolInner {
    config: SessionPoolConfig,
    factory: Factory,
    permits: Arc<Semaphore>,
    state: Mutex<PoolState>,
    shutdown: AtomicBool,
    next_name: AtomicU64,
    borrows: AtomicU64,
    returns: AtomicU64,
    evictions: AtomicU64,
}

/// Bounded set of sessions shared by many callers
pub struct SessionPool {
    inner: Arc<PoolInner>,
    housekeeping: Option<JoinHandle<()>>,
}

impl fmt::Debug for SessionPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionPool")
            .field("config", &self.inner.config)
            .field("stats", &self.stats())
            .finish()
    }
}

impl SessionPool {
    /// Start a pool whose sessions come from `factory`
    ///
    /// The factory receives a generated name ("pool-session-N"). `min_idle`
    /// sessions are opened up front; one that fails to open is logged and
    /// skipped. Must be called from within a tokio runtime.
    pub async fn start<F, Fut>(config: SessionPoolConfig, factory: F) -> PoolResult<SessionPool>
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = SessionResult<Session>> + Send + 'static,
    {
        config.validate()?;
        let permits = match config.max_size {
            0 => Semaphore::MAX_PERMITS,
            max => max,
        };
        let inner = Arc::new(PoolInner {
            factory: Box::new(move |name| Box::pin(factory(name)) as SessionFuture),
            permits: Arc::new(Semaphore::new(permits)),
            state: Mutex::new(PoolState::default()),
            shutdown: AtomicBool::new(false),
            next_name: AtomicU64::new(0),
            borrows: AtomicU64::new(0),
            returns: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            config,
        });

        let warm = match inner.config.max_size {
            0 => inner.config.min_idle,
            max => inner.config.min_idle.min(max),
        };
        for i in 0..warm {
            match inner.open().await {
                Ok(session) => {
                    let now = Instant::now();
                    inner.lock().idle.push_back(IdleSession {
                        session: Arc::new(session),
                        created: now,
                        idle_since: now,
                    });
                }
                Err(err) => error!("failed to open pooled session {} of {warm}: {err}", i + 1),
            }
        }

        let housekeeping = sweep_period(&inner.config).map(|period| {
            debug!("pool housekeeping every {period:?}");
            tokio::spawn(housekeep(Arc::downgrade(&inner), period))
        });
        info!("session pool started with {} idle sessions", inner.lock().idle.len());
        Ok(SessionPool { inner, housekeeping })
    }

    /// Pool of TCP sessions to one host
    pub async fn connect(
        host: impl Into<String>,
        port: u16,
        session_config: SessionConfig,
        registry: CodecRegistry,
        config: SessionPoolConfig,
    ) -> PoolResult<SessionPool> {
        let host = host.into();
        Self::start(config, move |name| {
            let host = host.clone();
            let session_config = session_config.clone();
            let registry = registry.clone();
            async move {
                debug!("opening {name} to {host}:{port}");
                Session::connect(&host, port, session_config, &registry).await
            }
        })
        .await
    }

    pub fn config(&self) -> &SessionPoolConfig {
        &self.inner.config
    }

    /// Borrow a session, waiting as the acquisition mode says
    pub async fn acquire(&self) -> PoolResult<PooledSession> {
        let permit = match self.inner.config.acquisition_mode {
            AcquisitionMode::Immediate => self.try_permit()?,
            AcquisitionMode::Queued => {
                self.inner.check_open()?;
                self.inner
                    .permits
                    .clone()
                    .acquire_owned()
                    .await
                    .map_err(|_| PoolError::Shutdown)?
            }
            AcquisitionMode::TimeoutOnFull => self.permit_within(self.inner.config.acquisition_timeout()).await?,
        };
        self.inner.checkout(permit).await
    }

    /// Borrow a session, waiting at most `timeout` whatever the mode
    pub async fn acquire_timeout(&self, timeout: Duration) -> PoolResult<PooledSession> {
        let permit = self.permit_within(timeout).await?;
        self.inner.checkout(permit).await
    }

    fn try_permit(&self) -> PoolResult<OwnedSemaphorePermit> {
        self.inner.check_open()?;
        self.inner.permits.clone().try_acquire_owned().map_err(|err| match err {
            TryAcquireError::Closed => PoolError::Shutdown,
            TryAcquireError::NoPermits => PoolError::Exhausted {
                active: self.inner.lock().active,
                max: self.inner.config.max_size,
            },
        })
    }

    async fn permit_within(&self, timeout: Duration) -> PoolResult<OwnedSemaphorePermit> {
        self.inner.check_open()?;
        match tokio::time::timeout(timeout, self.inner.permits.clone().acquire_owned()).await {
            Ok(Ok(permit)) => Ok(permit),
            Ok(Err(_)) => Err(PoolError::Shutdown),
            Err(_) => Err(PoolError::Timeout(timeout)),
        }
    }

    pub fn stats(&self) -> PoolStats {
        let state = self.inner.lock();
        PoolStats {
            active: state.active,
            idle: state.idle.len(),
            size: state.size,
            borrows: self.inner.borrows.load(Ordering::Relaxed),
            returns: self.inner.returns.load(Ordering::Relaxed),
            evictions: self.inner.evictions.load(Ordering::Relaxed),
        }
    }

    pub fn active_count(&self) -> usize {
        self.inner.lock().active
    }

    pub fn idle_count(&self) -> usize {
        self.inner.lock().idle.len()
    }

    /// Sessions the pool owns, borrowed or idle
    pub fn size(&self) -> usize {
        self.inner.lock().size
    }

    pub fn is_shutdown(&self) -> bool {
        self.inner.shutdown.load(Ordering::Acquire)
    }

    /// Refuse new borrows and disconnect every idle session
    ///
    /// Waiting borrowers fail with [`PoolError::Shutdown`]. Borrowed
    /// sessions are disconnected as their guards are dropped.
    pub async fn shutdown(&self) {
        if self.inner.shutdown.swap(true, Ordering::AcqRel) {
            return;
        }
        self.inner.permits.close();
        if let Some(task) = &self.housekeeping {
            task.abort();
        }
        let idle: Vec<IdleSession> = {
            let mut state = self.inner.lock();
            let drained: Vec<IdleSession> = state.idle.drain(..).collect();
            state.size -= drained.len();
            drained
        };
        info!("session pool shutting down, disconnecting {} idle sessions", idle.len());
        for entry in idle {
            entry.session.disconnect().await;
        }
    }
}

impl Drop for SessionPool {
    fn drop(&mut self) {
        if let Some(task) = self.housekeeping.take() {
            task.abort();
        }
    }
}

impl PoolInner {
    fn lock(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(|poisoned| {
            warn!("session pool state mutex poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn check_open(&self) -> PoolResult<()> {
        if self.shutdown.load(Ordering::Acquire) {
            return Err(PoolError::Shutdown);
        }
        Ok(())
    }

    fn validates(&self, strategy: ValidationStrategy) -> bool {
        self.config.validation == strategy
    }

    /// Open a session through the factory, counting it while it opens
    async fn open(&self) -> SessionResult<Session> {
        let name = format!("pool-session-{}", self.next_name.fetch_add(1, Ordering::Relaxed) + 1);
        let mut reservation = Reservation::new(self);
        match (self.factory)(name.clone()).await {
            Ok(session) => {
                debug!("opened {name} as session {}", session.session_id());
                reservation.keep();
                Ok(session)
            }
            Err(err) => {
                error!("session factory failed to open {name}: {err}");
                Err(err)
            }
        }
    }

    /// Hand out an idle session, or open one, for a borrower holding `permit`
    async fn checkout(self: &Arc<Self>, permit: OwnedSemaphorePermit) -> PoolResult<PooledSession> {
        let on_borrow = self.validates(ValidationStrategy::OnBorrow);
        let (session, created) = loop {
            let next = self.lock().idle.pop_front();
            match next {
                Some(entry) if on_borrow && !is_valid(&entry.session) => {
                    self.evict(1);
                    debug!("discarded dead idle session {}", entry.session.session_id());
                }
                Some(entry) => break (entry.session, entry.created),
                None => {
                    let session = self.open().await?;
                    if on_borrow && !is_valid(&session) {
                        self.evict(1);
                        return Err(PoolError::NoValidSession);
                    }
                    break (Arc::new(session), Instant::now());
                }
            }
        };
        if self.shutdown.load(Ordering::Acquire) {
            self.lock().size -= 1;
            session.disconnect().await;
            return Err(PoolError::Shutdown);
        }
        self.lock().active += 1;
        self.borrows.fetch_add(1, Ordering::Relaxed);
        Ok(PooledSession {
            session,
            created,
            discarded: false,
            pool: Arc::clone(self),
            _permit: permit,
        })
    }

    /// Take back a borrowed session; called from the guard's drop
    fn give_back(&self, session: Arc<Session>, created: Instant) {
        let mut state = self.lock();
        state.active -= 1;
        if self.shutdown.load(Ordering::Acquire) {
            state.size -= 1;
            debug!("pool is shut down, dropping session {}", session.session_id());
            return;
        }
        if self.validates(ValidationStrategy::OnReturn) && !is_valid(&session) {
            state.size -= 1;
            drop(state);
            self.evictions.fetch_add(1, Ordering::Relaxed);
            self.returns.fetch_add(1, Ordering::Relaxed);
            debug!("discarded dead session {} on return", session.session_id());
            return;
        }
        state.idle.push_back(IdleSession {
            session,
            created,
            idle_since: Instant::now(),
        });
        drop(state);
        self.returns.fetch_add(1, Ordering::Relaxed);
    }

    fn evict(&self, count: usize) {
        self.lock().size -= count;
        self.evictions.fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Remove idle sessions the eviction policy or periodic validation rejects
    fn sweep(&self, now: Instant) -> Vec<Arc<Session>> {
        let config = &self.config;
        let periodic = self.validates(ValidationStrategy::Periodic);
        let expired = |entry: &IdleSession| match config.eviction {
            EvictionPolicy::None => false,
            EvictionPolicy::IdleTime => now.duration_since(entry.idle_since) >= config.max_idle_time(),
            EvictionPolicy::MaxAge => now.duration_since(entry.created) >= config.max_age(),
        };

        let mut removed = Vec::new();
        {
            let mut state = self.lock();
            let mut kept = VecDeque::with_capacity(state.idle.len());
            for entry in state.idle.drain(..) {
                if expired(&entry) || (periodic && !is_valid(&entry.session)) {
                    removed.push(entry.session);
                } else {
                    kept.push_back(entry);
                }
            }
            state.idle = kept;
        }
        if !removed.is_empty() {
            self.evict(removed.len());
            debug!("evicted {} idle sessions", removed.len());
        }
        removed
    }
}

/// Live means the session task has not ended
fn is_valid(session: &Session) -> bool {
    !session.state().is_terminal()
}

/// Interval for the housekeeping task, `None` when nothing needs sweeping
fn sweep_period(config: &SessionPoolConfig) -> Option<Duration> {
    let eviction = match config.eviction {
        EvictionPolicy::None => None,
        EvictionPolicy::IdleTime => Some(config.max_idle_time() / 2),
        EvictionPolicy::MaxAge => Some(config.max_age() / 2),
    };
    let validation = (config.validation == ValidationStrategy::Periodic).then(|| config.validation_interval());
    let period = match (eviction, validation) {
        (Some(a), Some(b)) => a.min(b),
        (a, b) => a.or(b)?,
    };
    Some(period.max(MIN_SWEEP_PERIOD))
}

async fn housekeep(pool: Weak<PoolInner>, period: Duration) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        let removed = match pool.upgrade() {
            Some(pool) if !pool.shutdown.load(Ordering::Acquire) => pool.sweep(Instant::now()),
            _ => return,
        };
        for session in removed {
            session.disconnect().await;
        }
    }
}

/// Counts a session in `size` while it opens; undone unless kept
struct Reservation<'a> {
    pool: &'a PoolInner,
    kept: bool,
}

impl<'a> Reservation<'a> {
    fn new(pool: &'a PoolInner) -> Self {
        pool.lock().size += 1;
        Self { pool, kept: false }
    }

    fn keep(&mut self) {
        self.kept = true;
    }
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        if !self.kept {
            self.pool.lock().size -= 1;
        }
    }
}

/// A borrowed session; returns to the pool when dropped
pub struct PooledSession {
    session: Arc<Session>,
    created: Instant,
    discarded: bool,
    pool: Arc<PoolInner>,
    // Released after the session is back in the idle queue
    _permit: OwnedSemaphorePermit,
}

impl PooledSession {
    /// Disconnect the session and give its slot back instead of returning it
    pub async fn discard(mut self) {
        self.session.disconnect().await;
        self.discarded = true;
    }
}

impl Deref for PooledSession {
    type Target = Session;

    fn deref(&self) -> &Session {
        &self.session
    }
}

impl fmt::Debug for PooledSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledSession").field("session", &self.session).finish()
    }
}

impl Drop for PooledSession {
    fn drop(&mut self) {
        if self.discarded {
            let mut state = self.pool.lock();
            state.active -= 1;
            state.size -= 1;
        } else {
            self.pool.give_back(Arc::clone(&self.session), self.created);
        }
    }
}
