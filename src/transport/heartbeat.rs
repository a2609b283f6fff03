//! Ping/pong liveness checks.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::time;
use tungstenite::protocol::Message as WsMessage;

/// Outcome of the heartbeat loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeartbeatResult {
    /// The peer sent nothing for the whole timeout window.
    TimedOut,
    /// The write loop is gone, so there is nobody left to ping.
    WriterClosed,
}

/// Set by the read loop whenever a frame arrives, cleared by the heartbeat.
#[derive(Debug, Clone)]
pub struct Liveness(Arc<AtomicBool>);

impl Liveness {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn mark_alive(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether the peer was heard from since the last call.
    fn take(&self) -> bool {
        self.0.swap(false, Ordering::Relaxed)
    }
}

impl Default for Liveness {
    fn default() -> Self {
        Self::new()
    }
}

/// Ping the peer every `interval` until it goes quiet.
///
/// Each tick checks whether anything arrived since the previous one. After
/// `timeout / interval` consecutive silent ticks (at least one) the peer is
/// considered dead. A zero `interval` disables the check and never returns.
pub async fn run_heartbeat(
    liveness: Liveness,
    pinger: UnboundedSender<WsMessage>,
    interval: Duration,
    timeout: Duration,
) -> HeartbeatResult {
    if interval.is_zero() {
        return std::future::pending().await;
    }

    let max_missed = (timeout.as_millis() / interval.as_millis().max(1)).max(1);
    let mut ticker = time::interval(interval);
    let mut missed = 0;

    loop {
        ticker.tick().await;
        if liveness.take() {
            missed = 0;
        } else {
            missed += 1;
            if missed >= max_missed {
                return HeartbeatResult::TimedOut;
            }
        }
        if pinger.send(WsMessage::Ping(Vec::<u8>::new().into())).is_err() {
            return HeartbeatResult::WriterClosed;
        }
    }
}
