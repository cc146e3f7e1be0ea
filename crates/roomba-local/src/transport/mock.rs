//! Mock robot transport for testing
//!
//! Scriptable stand-in for a real robot: tests queue state documents,
//! toggle per-operation failures, inject push events, and assert on call
//! counters (opens, closes, commands issued).

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use roomba_core::RawState;
use tokio::sync::broadcast;

use super::{RobotEvent, RobotSession, RobotTransport, StateField, TransportError};
use crate::config::MockConfig;

/// Build a raw state document the way the robot reports it
pub fn mission_state(phase: &str, bat_pct: u8, bin_full: bool) -> RawState {
    serde_json::json!({
        "cleanMissionStatus": { "phase": phase },
        "batPct": bat_pct,
        "bin": { "full": bin_full }
    })
}

/// Operations whose outcome tests can force to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockOp {
    Open,
    Ready,
    Start,
    Pause,
    Dock,
    GetState,
}

#[derive(Debug, Default)]
struct Failures {
    open: bool,
    ready: bool,
    start: bool,
    pause: bool,
    dock: bool,
    get_state: bool,
}

#[derive(Debug, Default)]
struct Counters {
    opens: AtomicUsize,
    closes: AtomicUsize,
    starts: AtomicUsize,
    pauses: AtomicUsize,
    docks: AtomicUsize,
    state_queries: AtomicUsize,
}

struct Inner {
    config: MockConfig,
    reachable: AtomicBool,
    /// Scripted `get_state` responses, served front to back
    state_queue: Mutex<VecDeque<RawState>>,
    /// Served when the queue is empty
    default_state: Mutex<RawState>,
    failures: Mutex<Failures>,
    counters: Counters,
    event_tx: broadcast::Sender<RobotEvent>,
}

/// Mock robot implementing [`RobotTransport`]
#[derive(Clone)]
pub struct MockRobot {
    inner: Arc<Inner>,
}

impl MockRobot {
    pub fn new(config: &MockConfig) -> Self {
        let (event_tx, _) = broadcast::channel(64);
        Self {
            inner: Arc::new(Inner {
                config: config.clone(),
                reachable: AtomicBool::new(true),
                state_queue: Mutex::new(VecDeque::new()),
                default_state: Mutex::new(mission_state("charge", 100, false)),
                failures: Mutex::new(Failures::default()),
                counters: Counters::default(),
                event_tx,
            }),
        }
    }

    /// Queue a state document; `get_state` serves queued documents first
    pub fn push_state(&self, state: RawState) {
        self.inner.state_queue.lock().push_back(state);
    }

    /// Replace the document served when the queue is empty
    pub fn set_default_state(&self, state: RawState) {
        *self.inner.default_state.lock() = state;
    }

    /// Force the given operation to fail until reset
    pub fn fail_on(&self, op: MockOp, fail: bool) {
        let mut failures = self.inner.failures.lock();
        match op {
            MockOp::Open => failures.open = fail,
            MockOp::Ready => failures.ready = fail,
            MockOp::Start => failures.start = fail,
            MockOp::Pause => failures.pause = fail,
            MockOp::Dock => failures.dock = fail,
            MockOp::GetState => failures.get_state = fail,
        }
    }

    /// Simulate the robot dropping off the network
    pub fn set_reachable(&self, reachable: bool) {
        self.inner.reachable.store(reachable, Ordering::SeqCst);
    }

    /// Inject a push event (simulates the robot sending a state update)
    pub fn inject_state(&self, state: RawState) {
        let _ = self.inner.event_tx.send(RobotEvent::State(state));
    }

    pub fn open_count(&self) -> usize {
        self.inner.counters.opens.load(Ordering::SeqCst)
    }

    pub fn close_count(&self) -> usize {
        self.inner.counters.closes.load(Ordering::SeqCst)
    }

    pub fn start_count(&self) -> usize {
        self.inner.counters.starts.load(Ordering::SeqCst)
    }

    pub fn pause_count(&self) -> usize {
        self.inner.counters.pauses.load(Ordering::SeqCst)
    }

    pub fn dock_count(&self) -> usize {
        self.inner.counters.docks.load(Ordering::SeqCst)
    }

    pub fn state_query_count(&self) -> usize {
        self.inner.counters.state_queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RobotTransport for MockRobot {
    async fn open(&self) -> Result<Arc<dyn RobotSession>, TransportError> {
        self.inner.latency().await;

        if self.inner.failures.lock().open || !self.inner.reachable.load(Ordering::SeqCst) {
            return Err(TransportError::ConnectionFailed(
                "mock robot unreachable".to_string(),
            ));
        }

        self.inner.counters.opens.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(MockSession {
            inner: self.inner.clone(),
            connected: AtomicBool::new(false),
            closed: AtomicBool::new(false),
        }))
    }
}

impl Inner {
    async fn latency(&self) {
        if self.config.latency_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.latency_ms)).await;
        }
    }
}

/// One mock session; shares scripting and counters with its [`MockRobot`]
pub struct MockSession {
    inner: Arc<Inner>,
    connected: AtomicBool,
    closed: AtomicBool,
}

impl std::fmt::Debug for MockSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockSession")
            .field("connected", &self.connected.load(Ordering::SeqCst))
            .field("closed", &self.closed.load(Ordering::SeqCst))
            .finish()
    }
}

impl MockSession {
    fn check_open(&self) -> Result<(), TransportError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(TransportError::ConnectionClosed);
        }
        Ok(())
    }
}

#[async_trait]
impl RobotSession for MockSession {
    async fn await_ready(&self) -> Result<(), TransportError> {
        self.inner.latency().await;
        self.check_open()?;

        if self.inner.failures.lock().ready || !self.inner.reachable.load(Ordering::SeqCst) {
            return Err(TransportError::ConnectionFailed(
                "mock robot refused connection".to_string(),
            ));
        }

        self.connected.store(true, Ordering::SeqCst);
        let _ = self.inner.event_tx.send(RobotEvent::Connected);
        Ok(())
    }

    async fn start(&self) -> Result<(), TransportError> {
        self.inner.latency().await;
        self.check_open()?;

        if self.inner.failures.lock().start {
            return Err(TransportError::RequestFailed("mock start failure".to_string()));
        }

        self.inner.counters.starts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn pause(&self) -> Result<(), TransportError> {
        self.inner.latency().await;
        self.check_open()?;

        if self.inner.failures.lock().pause {
            return Err(TransportError::RequestFailed("mock pause failure".to_string()));
        }

        self.inner.counters.pauses.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn dock(&self) -> Result<(), TransportError> {
        self.inner.latency().await;
        self.check_open()?;

        if self.inner.failures.lock().dock {
            return Err(TransportError::RequestFailed("mock dock failure".to_string()));
        }

        self.inner.counters.docks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn get_state(&self, _fields: &[StateField]) -> Result<RawState, TransportError> {
        self.inner.latency().await;
        self.check_open()?;

        if self.inner.failures.lock().get_state {
            return Err(TransportError::RequestFailed(
                "mock state query failure".to_string(),
            ));
        }

        self.inner
            .counters
            .state_queries
            .fetch_add(1, Ordering::SeqCst);

        let queued = self.inner.state_queue.lock().pop_front();
        Ok(queued.unwrap_or_else(|| self.inner.default_state.lock().clone()))
    }

    async fn close(&self) {
        self.connected.store(false, Ordering::SeqCst);
        self.closed.store(true, Ordering::SeqCst);
        self.inner.counters.closes.fetch_add(1, Ordering::SeqCst);
    }

    fn subscribe(&self) -> broadcast::Receiver<RobotEvent> {
        self.inner.event_tx.subscribe()
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst) && !self.closed.load(Ordering::SeqCst)
    }
}
