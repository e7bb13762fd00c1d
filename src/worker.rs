//! Acquisition workers, one thread per channel.
//!
//! ```text
//!         ┌──────── no data ───────┐
//!         ▼                        │
//!       Idle ──── has_data ───▶ Polling ──── frame ───▶ Publishing
//!         ▲                        │ read error               │
//!         └──── sleep(period) ◀────┴──────────────────────────┘
//! ```
//!
//! The sleep is a fixed delay, not deadline correction. Workers share nothing
//! but the [`PublishSink`]; each owns its channel outright.

use core::time::Duration;
use std::io;
use std::thread::{self, JoinHandle};

use crate::channel::{ChannelId, SensorChannel};
use crate::clock::Clock;
use crate::diag_debug;
use crate::error::LinkError;
use crate::link::ChannelLink;
use crate::logging::DiagStream;
use crate::sink::PublishSink;
use crate::telemetry::encode;
use crate::transport::Transport;

/// Worker position in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Polling,
    Publishing,
}

/// What one cycle did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Link had nothing buffered.
    NoData,
    /// Read failed; cycle skipped.
    ReadFailed(LinkError),
    /// Document handed to the sink. `delivered` is the sink's answer.
    Published { delivered: bool },
}

/// Per-worker settings.
#[derive(Debug, Clone, Copy)]
pub struct WorkerConfig {
    pub topic: &'static str,
    pub period: Duration,
}

pub struct AcquisitionWorker<L, T, C> {
    channel: SensorChannel<L>,
    sink: PublishSink<T>,
    clock: C,
    config: WorkerConfig,
    state: WorkerState,
    log: &'static DiagStream,
}

impl<L, T, C> AcquisitionWorker<L, T, C>
where
    L: ChannelLink,
    T: Transport,
    C: Clock,
{
    pub fn new(
        channel: SensorChannel<L>,
        sink: PublishSink<T>,
        clock: C,
        config: WorkerConfig,
        log: &'static DiagStream,
    ) -> Self {
        Self {
            channel,
            sink,
            clock,
            config,
            state: WorkerState::Idle,
            log,
        }
    }

    pub fn channel_id(&self) -> ChannelId {
        self.channel.id()
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    pub fn channel(&self) -> &SensorChannel<L> {
        &self.channel
    }

    /// Poll, encode and publish once, without sleeping.
    pub fn poll_once(&mut self) -> CycleOutcome {
        let id = self.channel.id();

        self.state = WorkerState::Idle;
        if !self.channel.link_mut().has_data() {
            return CycleOutcome::NoData;
        }

        self.state = WorkerState::Polling;
        let frame = match self.channel.link_mut().read_frame() {
            Ok(frame) => frame,
            Err(e) => {
                diag_debug!(self.log, self.clock.now_us(), "radar {} read skipped: {}", id, e);
                self.state = WorkerState::Idle;
                return CycleOutcome::ReadFailed(e);
            }
        };
        let document = encode(&frame, id, self.channel.is_ready(), self.channel.is_enhanced());

        self.state = WorkerState::Publishing;
        let delivered = self.sink.send(self.config.topic, &document);
        diag_debug!(
            self.log,
            self.clock.now_us(),
            "radar {} {} (delivered={})",
            id,
            document.status,
            delivered
        );

        self.state = WorkerState::Idle;
        CycleOutcome::Published { delivered }
    }

    /// One full cycle: poll, then sleep the fixed period.
    pub fn step(&mut self) -> CycleOutcome {
        let outcome = self.poll_once();
        self.clock.sleep(self.config.period);
        outcome
    }

    /// Run for the process lifetime.
    pub fn run(mut self) -> ! {
        loop {
            self.step();
        }
    }
}

impl<L, T, C> AcquisitionWorker<L, T, C>
where
    L: ChannelLink + 'static,
    T: Transport + 'static,
    C: Clock + 'static,
{
    /// Start the worker on its own named thread.
    pub fn spawn(self, stack_size: usize) -> io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name(format!("radar{}", self.channel.id()))
            .stack_size(stack_size)
            .spawn(move || {
                self.run();
            })
    }
}
