//! Live subscription task
//!
//! Maintains the WebSocket connection for one paste. Reconnects with linear
//! backoff on transient closures and stops for good when the paste is
//! retired. The task owns exactly one transport at a time and drops it
//! before scheduling a reconnect.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use super::connection::{
    CloseInfo, ConnectionMachine, ConnectionState, ReconnectPolicy, Transition,
};
use super::message::InboundFrame;

/// Commands sent to the live task
#[derive(Debug, Clone)]
pub enum LiveCommand {
    /// Send the full paste body to the server (best effort)
    Push(String),
    /// Close the connection and stop the task
    Shutdown,
}

/// Events emitted by the live task
#[derive(Debug, Clone, PartialEq)]
pub enum LiveEvent {
    /// Connection state changed
    StatusChanged(ConnectionState),
    /// Frame received from the server
    Frame(InboundFrame),
    /// Transport error; the closure that follows drives the state
    TransportError(String),
    /// Reconnect scheduled after `delay`
    RetryScheduled { attempt: u32, delay: Duration },
    /// Reconnect attempts exhausted
    GaveUp,
    /// Server closed the connection because the paste is retired
    Terminal(CloseInfo),
}

/// Handle to control and monitor the live task
pub struct LiveHandle {
    /// Send commands to the live task
    pub command_tx: mpsc::Sender<LiveCommand>,
    /// Receive events from the live task
    pub event_rx: mpsc::UnboundedReceiver<LiveEvent>,
    /// Watch connection state
    pub status_rx: watch::Receiver<ConnectionState>,
}

impl LiveHandle {
    /// Current connection state
    pub fn status(&self) -> ConnectionState {
        *self.status_rx.borrow()
    }

    pub fn is_open(&self) -> bool {
        self.status().is_open()
    }

    /// Queue the body for sending if the connection is open
    ///
    /// Returns whether the push was queued. There is no acknowledgement.
    pub fn push(&self, text: &str) -> bool {
        if !self.is_open() {
            debug!("Not pushing: connection is {}", self.status());
            return false;
        }
        self.command_tx
            .try_send(LiveCommand::Push(text.to_string()))
            .is_ok()
    }

    /// Wait for the next event; `None` once the task has stopped
    pub async fn next_event(&mut self) -> Option<LiveEvent> {
        self.event_rx.recv().await
    }

    /// Take an event if one is already queued
    pub fn try_next_event(&mut self) -> Option<LiveEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Ask the task to close the connection and stop
    pub async fn shutdown(&self) {
        let _ = self.command_tx.send(LiveCommand::Shutdown).await;
    }
}

/// Spawn the live task for a WebSocket URL
///
/// The task starts in `Connecting` immediately.
pub fn spawn_live_task(url: String, policy: ReconnectPolicy) -> LiveHandle {
    let (command_tx, command_rx) = mpsc::channel(16);
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let (status_tx, status_rx) = watch::channel(ConnectionState::Connecting);

    tokio::spawn(live_task_loop(url, policy, command_rx, event_tx, status_tx));

    LiveHandle {
        command_tx,
        event_rx,
        status_rx,
    }
}

/// How a single connection ended
enum LinkOutcome {
    Closed(CloseInfo),
    Shutdown,
}

struct Publisher {
    event_tx: mpsc::UnboundedSender<LiveEvent>,
    status_tx: watch::Sender<ConnectionState>,
}

impl Publisher {
    fn status(&self, state: ConnectionState) {
        let _ = self.status_tx.send(state);
        self.emit(LiveEvent::StatusChanged(state));
    }

    fn emit(&self, event: LiveEvent) {
        let _ = self.event_tx.send(event);
    }
}

/// Main loop with reconnection
async fn live_task_loop(
    url: String,
    policy: ReconnectPolicy,
    mut command_rx: mpsc::Receiver<LiveCommand>,
    event_tx: mpsc::UnboundedSender<LiveEvent>,
    status_tx: watch::Sender<ConnectionState>,
) {
    let client_tag = format!("pastesync-{}", &uuid::Uuid::new_v4().to_string()[..8]);
    let publisher = Publisher {
        event_tx,
        status_tx,
    };
    let mut machine = ConnectionMachine::new(policy);

    publisher.status(machine.state());

    loop {
        let outcome = connect_and_listen(
            &url,
            &client_tag,
            &mut machine,
            &mut command_rx,
            &publisher,
        )
        .await;
        let info = match outcome {
            LinkOutcome::Shutdown => {
                info!("[{}] Live connection shut down", client_tag);
                break;
            }
            LinkOutcome::Closed(info) => info,
        };

        info!(
            "[{}] Live connection closed: code={:?} reason={:?}",
            client_tag, info.code, info.reason
        );

        let transition = machine.on_close(&info);
        publisher.status(machine.state());

        match transition {
            Transition::Terminal => {
                info!("[{}] Paste retired, not reconnecting", client_tag);
                publisher.emit(LiveEvent::Terminal(info));
                break;
            }
            Transition::GaveUp => {
                warn!(
                    "[{}] Giving up after {} reconnect attempts",
                    client_tag,
                    machine.attempts()
                );
                publisher.emit(LiveEvent::GaveUp);
                break;
            }
            Transition::Retry { attempt, delay } => {
                info!(
                    "[{}] Reconnecting in {:?} (attempt {})",
                    client_tag, delay, attempt
                );
                publisher.emit(LiveEvent::RetryScheduled { attempt, delay });

                if !wait_for_retry(delay, &mut command_rx).await {
                    break;
                }

                if machine.on_retry_elapsed() == Transition::Reconnect {
                    publisher.status(machine.state());
                }
            }
            _ => {}
        }
    }
}

/// Sleep out the retry delay
///
/// Returns false if a shutdown arrived meanwhile. Pushes are dropped while
/// disconnected.
async fn wait_for_retry(delay: Duration, command_rx: &mut mpsc::Receiver<LiveCommand>) -> bool {
    let sleep = tokio::time::sleep(delay);
    tokio::pin!(sleep);

    loop {
        tokio::select! {
            _ = &mut sleep => return true,
            cmd = command_rx.recv() => match cmd {
                Some(LiveCommand::Push(_)) => debug!("Dropping push while disconnected"),
                Some(LiveCommand::Shutdown) | None => return false,
            }
        }
    }
}

/// Connect and relay frames until the connection ends or shutdown
async fn connect_and_listen(
    url: &str,
    client_tag: &str,
    machine: &mut ConnectionMachine,
    command_rx: &mut mpsc::Receiver<LiveCommand>,
    publisher: &Publisher,
) -> LinkOutcome {
    debug!("[{}] Connecting to {}", client_tag, url);

    let connect = connect_async(url);
    tokio::pin!(connect);

    let ws_stream = loop {
        tokio::select! {
            result = &mut connect => match result {
                Ok((stream, _response)) => break stream,
                Err(e) => {
                    warn!("[{}] Live connection failed: {}", client_tag, e);
                    publisher.emit(LiveEvent::TransportError(e.to_string()));
                    return LinkOutcome::Closed(CloseInfo::abnormal());
                }
            },
            cmd = command_rx.recv() => match cmd {
                Some(LiveCommand::Push(_)) => {
                    debug!("[{}] Dropping push while connecting", client_tag)
                }
                Some(LiveCommand::Shutdown) | None => return LinkOutcome::Shutdown,
            }
        }
    };

    if machine.on_open() == Transition::Opened {
        info!("[{}] Live connection open", client_tag);
        publisher.status(machine.state());
    }

    let (mut write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            cmd = command_rx.recv() => {
                match cmd {
                    Some(LiveCommand::Push(text)) => {
                        debug!("[{}] Pushing {} bytes", client_tag, text.len());
                        if let Err(e) = write.send(Message::Text(text)).await {
                            warn!("[{}] Push failed: {}", client_tag, e);
                            publisher.emit(LiveEvent::TransportError(e.to_string()));
                        }
                    }
                    Some(LiveCommand::Shutdown) | None => {
                        write.close().await.ok();
                        return LinkOutcome::Shutdown;
                    }
                }
            }

            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let frame = InboundFrame::decode(&text);
                        debug!("[{}] Frame: {:?}", client_tag, frame);
                        publisher.emit(LiveEvent::Frame(frame));
                    }
                    Some(Ok(Message::Binary(data))) => match String::from_utf8(data) {
                        Ok(text) => publisher.emit(LiveEvent::Frame(InboundFrame::decode(&text))),
                        Err(_) => debug!("[{}] Ignoring non-UTF-8 binary frame", client_tag),
                    },
                    Some(Ok(Message::Close(frame))) => {
                        let info = frame
                            .map(|f| CloseInfo::new(u16::from(f.code), f.reason.into_owned()))
                            .unwrap_or_else(CloseInfo::abnormal);
                        return LinkOutcome::Closed(info);
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!("[{}] Live connection error: {}", client_tag, e);
                        publisher.emit(LiveEvent::TransportError(e.to_string()));
                        return LinkOutcome::Closed(CloseInfo::abnormal());
                    }
                    None => return LinkOutcome::Closed(CloseInfo::abnormal()),
                }
            }
        }
    }
}
