//! Session loop driving the bridge
//!
//! Owns every resource of one run: the input source, the translator, the UDP
//! transport and the send throttle. Lifecycle is enforced with statum:
//!
//! ```text
//! AwaitingHandshake ──(status ok)──► Streaming ──► (process exit / Ctrl-C)
//! ```
//!
//! Each tick drains all pending input without blocking, then sends the full
//! controller state if the minimum send interval has passed.

use crate::controller::{InputSource, StateTranslator};
use crate::protocol::{encode, ChangeSet, ProtocolError};
use crate::transport::{HandshakeError, UdpTransport};
use chrono::{DateTime, Local};
use statum::{machine, state, transition};
use std::time::{Duration, Instant};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Minimum spacing between two state frames
pub const SEND_INTERVAL: Duration = Duration::from_millis(30);

/// How often pending input is drained
pub const POLL_INTERVAL: Duration = Duration::from_millis(2);

const STATS_INTERVAL_SECS: i64 = 10;

#[derive(Clone, Debug)]
pub struct SessionSettings {
    pub send_interval: Duration,
    pub poll_interval: Duration,

    /// Resend the full state every interval even when no input arrived
    pub resend_idle: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            send_interval: SEND_INTERVAL,
            poll_interval: POLL_INTERVAL,
            resend_idle: true,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Failed to encode state frame: {0}")]
    Encode(#[from] ProtocolError),
}

/// Rate limiter for outbound frames
#[derive(Debug, Clone)]
pub struct RateLimiter {
    min_interval: Duration,
    last_event_time: Instant,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        let now = Instant::now();
        Self {
            min_interval,
            // Lets the first check pass immediately
            last_event_time: now.checked_sub(min_interval).unwrap_or(now),
        }
    }

    /// Checks whether enough time has passed since the last accepted event;
    /// accepting one restarts the interval
    pub fn should_process_at(&mut self, now: Instant) -> bool {
        if now.saturating_duration_since(self.last_event_time) >= self.min_interval {
            self.last_event_time = now;
            true
        } else {
            false
        }
    }
}

/// Counters behind the periodic stats line
#[derive(Debug)]
pub struct SendStats {
    events_applied: u64,
    frames_sent: u64,
    frames_dropped: u64,
    window_start: DateTime<Local>,
}

impl SendStats {
    fn new() -> Self {
        Self {
            events_applied: 0,
            frames_sent: 0,
            frames_dropped: 0,
            window_start: Local::now(),
        }
    }

    fn log_if_due(&mut self) {
        let now = Local::now();
        let elapsed = now - self.window_start;
        if elapsed <= chrono::Duration::seconds(STATS_INTERVAL_SECS) {
            return;
        }
        info!("{}", self.summary(elapsed));
        *self = Self::new();
    }

    fn summary(&self, elapsed: chrono::Duration) -> String {
        let seconds = elapsed.num_milliseconds() as f64 / 1000.0;
        format!(
            "Session stats: {} events, {} frames sent, {} dropped in last {:.1} seconds (avg {:.2} frames/sec)",
            self.events_applied,
            self.frames_sent,
            self.frames_dropped,
            seconds,
            self.frames_sent as f64 / seconds
        )
    }
}

#[state]
#[derive(Debug, Clone)]
pub enum SessionState {
    AwaitingHandshake,
    Streaming,
}

#[machine]
pub struct Session<SessionState> {
    input: Box<dyn InputSource>,
    translator: StateTranslator,
    transport: UdpTransport,
    rate_limiter: RateLimiter,
    settings: SessionSettings,

    // Modeled input applied since the last frame
    pending_changes: bool,

    stats: SendStats,
}

impl Session<AwaitingHandshake> {
    pub fn create(
        input: Box<dyn InputSource>,
        transport: UdpTransport,
        settings: SessionSettings,
    ) -> Self {
        debug!("Creating session with settings: {:?}", settings);
        let rate_limiter = RateLimiter::new(settings.send_interval);
        Self::builder()
            .input(input)
            .translator(StateTranslator::new())
            .transport(transport)
            .rate_limiter(rate_limiter)
            .settings(settings)
            .pending_changes(false)
            .stats(SendStats::new())
            .build()
    }
}

#[transition]
impl Session<AwaitingHandshake> {
    /// Probes the remote; on success the session may start streaming
    pub async fn handshake(self) -> Result<Session<Streaming>, HandshakeError> {
        info!("Checking remote status at {}", self.transport.endpoint());
        self.transport.handshake().await?;
        info!("Handshake complete, streaming controller state");
        Ok(self.transition())
    }
}

impl Session<Streaming> {
    /// Drains input and sends the state if the send interval has elapsed
    ///
    /// Returns whether a frame went out. Send failures are logged and
    /// absorbed; the next frame carries the full state again.
    pub fn tick(&mut self, now: Instant) -> Result<bool, SessionError> {
        if self.drain_input() > 0 {
            self.pending_changes = true;
        }

        if !self.settings.resend_idle && !self.pending_changes {
            return Ok(false);
        }
        if !self.rate_limiter.should_process_at(now) {
            return Ok(false);
        }

        let snapshot = self.translator.snapshot();
        let frame = encode(&ChangeSet::from(&snapshot))?;
        self.pending_changes = false;

        match self.transport.send(&frame) {
            Ok(()) => {
                self.stats.frames_sent += 1;
                debug!(
                    "Sent {} byte frame, active controls: {:?}",
                    frame.len(),
                    snapshot.active().collect::<Vec<_>>()
                );
            }
            Err(e) => {
                self.stats.frames_dropped += 1;
                warn!("Dropping state frame: {}", e);
            }
        }
        Ok(true)
    }

    fn drain_input(&mut self) -> usize {
        let mut applied = 0;
        while let Some(event) = self.input.poll_event() {
            if self.translator.apply_event(&event) {
                applied += 1;
            }
        }
        self.stats.events_applied += applied as u64;
        applied
    }

    /// Streams until `cancel` fires; the socket closes when the session drops
    pub async fn run(mut self, cancel: CancellationToken) -> Result<(), SessionError> {
        info!(
            "Starting session loop towards {} (send interval {:?}, poll interval {:?})",
            self.transport.endpoint(),
            self.settings.send_interval,
            self.settings.poll_interval
        );

        let mut ticker = tokio::time::interval(self.settings.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Shutdown requested, closing session");
                    break;
                }
                instant = ticker.tick() => {
                    self.tick(instant.into_std())?;
                    self.stats.log_if_due();
                }
            }
        }

        Ok(())
    }
}
