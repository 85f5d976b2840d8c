//! Live connection state machine
//!
//! Transition table:
//!
//! | from                | event          | to                  | action          |
//! |---------------------|----------------|---------------------|-----------------|
//! | `Connecting`        | opened         | `Open`              | reset attempts  |
//! | `Connecting`/`Open` | closed, policy | `Closed(Terminal)`  | none, ever      |
//! | `Connecting`/`Open` | closed, other  | `Closed(Transient)` | retry or give up|
//! | `Closed(Transient)` | retry elapsed  | `Connecting`        | reconnect       |
//!
//! Everything else is ignored. The machine performs no I/O; the live task
//! feeds it events and carries out the returned [`Transition`].

use std::fmt;
use std::time::Duration;

/// WebSocket close code for a policy violation
pub const CLOSE_POLICY_VIOLATION: u16 = 1008;

/// Reason text marking a retired paste
const DELETED_REASON: &str = "deleted";

/// Linear reconnect backoff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    base_delay: Duration,
    max_attempts: u32,
}

impl ReconnectPolicy {
    pub fn new(base_delay: Duration, max_attempts: u32) -> Self {
        Self {
            base_delay,
            max_attempts,
        }
    }

    /// Delay before reconnect attempt `attempt` (1-based): `base * attempt`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(2), 5)
    }
}

/// Why a closed connection stays closed or comes back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseKind {
    /// Recoverable loss of the connection
    Transient,
    /// Paste retired; no further reconnects
    Terminal,
}

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Handshake in progress
    Connecting,
    /// Connected and receiving frames
    Open,
    /// Connection lost
    Closed(CloseKind),
}

impl ConnectionState {
    pub fn is_open(&self) -> bool {
        matches!(self, ConnectionState::Open)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ConnectionState::Closed(CloseKind::Terminal))
    }

    /// Text for the connectivity indicator
    pub fn label(&self) -> &'static str {
        match self {
            ConnectionState::Connecting => "Connecting",
            ConnectionState::Open => "Connected",
            ConnectionState::Closed(_) => "Disconnected",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Details of a transport closure
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CloseInfo {
    /// Close code, absent when the connection dropped without a close frame
    pub code: Option<u16>,
    pub reason: String,
}

impl CloseInfo {
    pub fn new(code: u16, reason: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            reason: reason.into(),
        }
    }

    /// Connection dropped or never established (browsers report 1006)
    pub fn abnormal() -> Self {
        Self::default()
    }

    /// Classify the closure
    ///
    /// Only a policy-violation code or a reason mentioning deletion is
    /// terminal. An abnormal drop is a network problem, not a retired paste.
    pub fn kind(&self) -> CloseKind {
        if self.code == Some(CLOSE_POLICY_VIOLATION) || self.reason.contains(DELETED_REASON) {
            CloseKind::Terminal
        } else {
            CloseKind::Transient
        }
    }
}

/// What the live task must do after an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Handshake completed
    Opened,
    /// Wait `delay`, then reconnect
    Retry { attempt: u32, delay: Duration },
    /// Retry delay elapsed; open a new transport
    Reconnect,
    /// Attempts exhausted; stay disconnected
    GaveUp,
    /// Paste retired; stay disconnected for good
    Terminal,
    /// Event doesn't apply in the current state
    Ignored,
}

/// Connection lifecycle for one paste
#[derive(Debug, Clone)]
pub struct ConnectionMachine {
    state: ConnectionState,
    attempts: u32,
    retry_pending: bool,
    policy: ReconnectPolicy,
}

impl ConnectionMachine {
    /// Start in `Connecting`
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self {
            state: ConnectionState::Connecting,
            attempts: 0,
            retry_pending: false,
            policy,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Reconnect attempts scheduled since the last successful handshake
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn policy(&self) -> &ReconnectPolicy {
        &self.policy
    }

    /// Handshake succeeded
    pub fn on_open(&mut self) -> Transition {
        match self.state {
            ConnectionState::Connecting => {
                self.state = ConnectionState::Open;
                self.attempts = 0;
                Transition::Opened
            }
            _ => Transition::Ignored,
        }
    }

    /// Transport closed, or the handshake failed
    pub fn on_close(&mut self, info: &CloseInfo) -> Transition {
        match self.state {
            ConnectionState::Connecting | ConnectionState::Open => {}
            ConnectionState::Closed(_) => return Transition::Ignored,
        }

        if info.kind() == CloseKind::Terminal {
            self.state = ConnectionState::Closed(CloseKind::Terminal);
            self.retry_pending = false;
            return Transition::Terminal;
        }

        self.state = ConnectionState::Closed(CloseKind::Transient);
        if self.attempts < self.policy.max_attempts() {
            self.attempts += 1;
            self.retry_pending = true;
            Transition::Retry {
                attempt: self.attempts,
                delay: self.policy.delay_for(self.attempts),
            }
        } else {
            self.retry_pending = false;
            Transition::GaveUp
        }
    }

    /// The scheduled retry delay has elapsed
    pub fn on_retry_elapsed(&mut self) -> Transition {
        if self.state == ConnectionState::Closed(CloseKind::Transient) && self.retry_pending {
            self.retry_pending = false;
            self.state = ConnectionState::Connecting;
            Transition::Reconnect
        } else {
            Transition::Ignored
        }
    }

    /// Whether the machine has stopped for good (terminal or gave up)
    pub fn is_finished(&self) -> bool {
        matches!(self.state, ConnectionState::Closed(_)) && !self.retry_pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine(max: u32) -> ConnectionMachine {
        ConnectionMachine::new(ReconnectPolicy::new(Duration::from_millis(2000), max))
    }

    #[test]
    fn test_linear_delays_up_to_max() {
        let mut m = machine(5);
        let mut delays = Vec::new();

        loop {
            match m.on_close(&CloseInfo::abnormal()) {
                Transition::Retry { attempt, delay } => {
                    assert_eq!(delay, Duration::from_millis(2000) * attempt);
                    delays.push(delay);
                    assert_eq!(m.on_retry_elapsed(), Transition::Reconnect);
                    assert_eq!(m.state(), ConnectionState::Connecting);
                }
                Transition::GaveUp => break,
                other => panic!("unexpected transition {:?}", other),
            }
        }

        assert_eq!(
            delays,
            (1..=5)
                .map(|n| Duration::from_millis(2000 * n))
                .collect::<Vec<_>>()
        );
        assert_eq!(m.state(), ConnectionState::Closed(CloseKind::Transient));
        assert!(m.is_finished());

        // Nothing brings it back
        assert_eq!(m.on_retry_elapsed(), Transition::Ignored);
        assert_eq!(m.on_close(&CloseInfo::abnormal()), Transition::Ignored);
    }

    #[test]
    fn test_open_resets_attempts() {
        let mut m = machine(2);
        assert!(matches!(
            m.on_close(&CloseInfo::abnormal()),
            Transition::Retry { attempt: 1, .. }
        ));
        m.on_retry_elapsed();
        assert!(matches!(
            m.on_close(&CloseInfo::abnormal()),
            Transition::Retry { attempt: 2, .. }
        ));
        m.on_retry_elapsed();

        assert_eq!(m.on_open(), Transition::Opened);
        assert_eq!(m.attempts(), 0);
        assert!(m.state().is_open());

        // A fresh budget after reconnecting
        assert_eq!(
            m.on_close(&CloseInfo::new(1001, "going away")),
            Transition::Retry {
                attempt: 1,
                delay: Duration::from_millis(2000)
            }
        );
    }

    #[test]
    fn test_policy_violation_is_terminal() {
        let mut m = machine(5);
        m.on_open();

        assert_eq!(m.on_close(&CloseInfo::new(1008, "")), Transition::Terminal);
        assert!(m.state().is_terminal());
        assert!(m.is_finished());

        // No retry is ever scheduled afterwards
        assert_eq!(m.on_retry_elapsed(), Transition::Ignored);
        assert_eq!(m.on_close(&CloseInfo::abnormal()), Transition::Ignored);
        assert_eq!(m.on_open(), Transition::Ignored);
        assert_eq!(m.attempts(), 0);
    }

    #[test]
    fn test_deleted_reason_is_terminal() {
        let info = CloseInfo::new(1000, "paste deleted");
        assert_eq!(info.kind(), CloseKind::Terminal);

        let mut m = machine(5);
        assert_eq!(m.on_close(&info), Transition::Terminal);
    }

    #[test]
    fn test_abnormal_close_is_transient() {
        assert_eq!(CloseInfo::new(1006, "").kind(), CloseKind::Transient);
        assert_eq!(CloseInfo::abnormal().kind(), CloseKind::Transient);
        assert_eq!(CloseInfo::new(1000, "bye").kind(), CloseKind::Transient);
    }

    #[test]
    fn test_zero_max_gives_up_immediately() {
        let mut m = machine(0);
        assert_eq!(m.on_close(&CloseInfo::abnormal()), Transition::GaveUp);
        assert_eq!(m.state().label(), "Disconnected");
    }

    #[test]
    fn test_open_only_from_connecting() {
        let mut m = machine(1);
        assert_eq!(m.on_open(), Transition::Opened);
        assert_eq!(m.on_open(), Transition::Ignored);
    }
}
