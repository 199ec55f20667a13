//! Heartbeat scheduler.
//!
//! Drives the [`FallbackSelector`] on a fixed period and hands each value
//! to an [`IntegerSink`]. A beat is: acquire a value, emit it, then either
//! stop (single-shot) or wait one interval. Beats never overlap.
//!
//! Cancellation is cooperative and may land at any of the three suspension
//! points: before a beat, during the remote call, or during the inter-beat
//! delay. In every case the scheduler stops without emitting anything
//! further and [`Heartbeat::run`] returns `Ok`.

use std::any::type_name;
use std::fmt;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::config::{BeatMode, Configuration, Range};
use crate::error::HeartbeatError;
use crate::selector::{FallbackSelector, GeneratedValue, ValueOrigin};
use crate::sink::IntegerSink;
use crate::source::RemoteIntegerSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeartbeatState {
    Running,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Single-shot mode finished its only beat.
    Completed,
    /// The cancellation token fired.
    Cancelled,
}

/// Counters for a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub beats: u64,
    pub remote: u64,
    pub local: u64,
    pub fallbacks: u64,
    pub stop_reason: StopReason,
}

#[derive(Debug, Default, Clone, Copy)]
struct Tally {
    beats: u64,
    remote: u64,
    local: u64,
    fallbacks: u64,
}

impl Tally {
    fn record(&mut self, origin: ValueOrigin) {
        self.beats += 1;
        match origin {
            ValueOrigin::Remote => self.remote += 1,
            ValueOrigin::Local => self.local += 1,
            ValueOrigin::Fallback => self.fallbacks += 1,
        }
    }

    fn finish(self, stop_reason: StopReason) -> RunSummary {
        RunSummary {
            beats: self.beats,
            remote: self.remote,
            local: self.local,
            fallbacks: self.fallbacks,
            stop_reason,
        }
    }
}

pub struct Heartbeat<R, S> {
    selector: FallbackSelector<R>,
    sink: S,
    range: Range,
    mode: BeatMode,
    state: HeartbeatState,
    stop_reason: Option<StopReason>,
    cancel: CancellationToken,
    tally: Tally,
}

impl<R, S> fmt::Debug for Heartbeat<R, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Heartbeat")
            .field("selector", &self.selector)
            .field("sink_type", &type_name::<S>())
            .field("range", &self.range)
            .field("mode", &self.mode)
            .field("state", &self.state)
            .field("cancelled", &self.cancel.is_cancelled())
            .field("tally", &self.tally)
            .finish()
    }
}

impl<R, S> Heartbeat<R, S>
where
    R: RemoteIntegerSource,
    S: IntegerSink,
{
    /// Range and mode are taken from `config` and fixed for the lifetime of
    /// the scheduler.
    pub fn new(
        config: &Configuration,
        selector: FallbackSelector<R>,
        sink: S,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            selector,
            sink,
            range: config.range,
            mode: config.interval.mode(),
            state: HeartbeatState::Running,
            stop_reason: None,
            cancel,
            tally: Tally::default(),
        }
    }

    pub fn state(&self) -> HeartbeatState {
        self.state
    }

    pub fn mode(&self) -> BeatMode {
        self.mode
    }

    /// A handle that stops this heartbeat when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Runs beats until single-shot completion or cancellation.
    ///
    /// Only a sink failure is returned as an error; the scheduler is
    /// `Stopped` afterwards either way. `Stopped` is terminal: running again
    /// replays the earlier summary, or [`HeartbeatError::Halted`] after a
    /// sink failure, without touching the selector or sink.
    pub async fn run(&mut self) -> Result<RunSummary, HeartbeatError> {
        if self.state == HeartbeatState::Stopped {
            return match self.stop_reason {
                Some(reason) => Ok(self.tally.finish(reason)),
                None => Err(HeartbeatError::Halted),
            };
        }

        info!(range = %self.range, mode = ?self.mode, "heartbeat started");

        let reason = loop {
            match self.beat().await {
                Ok(None) => continue,
                Ok(Some(reason)) => break reason,
                Err(err) => {
                    self.state = HeartbeatState::Stopped;
                    error!(error = %err, beats = self.tally.beats, "output failed");
                    return Err(err);
                }
            }
        };

        self.state = HeartbeatState::Stopped;
        self.stop_reason = Some(reason);
        let summary = self.tally.finish(reason);
        info!(
            beats = summary.beats,
            remote = summary.remote,
            local = summary.local,
            fallbacks = summary.fallbacks,
            reason = ?reason,
            "heartbeat stopped"
        );
        Ok(summary)
    }

    /// One beat. `Ok(Some(_))` means the scheduler should stop.
    async fn beat(&mut self) -> Result<Option<StopReason>, HeartbeatError> {
        let generated: GeneratedValue = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                return Ok(Some(StopReason::Cancelled));
            }
            generated = self.selector.next_value(self.range) => generated,
        };

        // Blocking write; cancellation is only seen once it returns.
        self.sink.emit(generated.value)?;
        self.tally.record(generated.origin);
        debug!(
            beat = self.tally.beats,
            origin = ?generated.origin,
            "beat emitted"
        );

        match self.mode {
            BeatMode::OneShot => Ok(Some(StopReason::Completed)),
            BeatMode::Repeating(period) => tokio::select! {
                biased;
                _ = self.cancel.cancelled() => Ok(Some(StopReason::Cancelled)),
                _ = tokio::time::sleep(period) => Ok(None),
            },
        }
    }
}
