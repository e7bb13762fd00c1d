//! Channel bring-up.
//!
//! ```text
//!   settle ──▶ handshake (≤3, 2s apart) ──▶ enhanced mode (≤3, 1s apart)
//!                 │ exhausted                    │ exhausted
//!                 └─ ready = false, continue     └─ basic mode, continue
//! ```
//!
//! Bring-up never gates the worker: a degraded channel is still polled.
//! Channels are brought up one at a time, before any worker starts.

use crate::channel::SensorChannel;
use crate::clock::Clock;
use crate::config::BringupPolicy;
use crate::error::BringupError;
use crate::link::ChannelLink;
use crate::logging::DiagStream;
use crate::retry::retry_bounded;
use crate::{diag_info, diag_warn};

/// What bring-up achieved for one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BringupReport {
    pub handshake_attempts: u32,
    pub enhanced_attempts: u32,
    pub ready: bool,
    pub enhanced_mode: bool,
}

impl BringupReport {
    pub fn is_complete(&self) -> bool {
        self.ready && self.enhanced_mode
    }
}

/// Bring one channel online.
///
/// Both phases always run. Returns `Err(BringupError::Degraded)` when either
/// phase exhausted its ceiling; the channel flags reflect what succeeded.
pub fn bring_up<L, C, const N: usize>(
    channel: &mut SensorChannel<L>,
    policy: &BringupPolicy,
    clock: &C,
    log: &DiagStream<N>,
) -> Result<BringupReport, BringupError>
where
    L: ChannelLink,
    C: Clock + ?Sized,
{
    let id = channel.id();
    clock.sleep(policy.settle);
    diag_info!(log, clock.now_us(), "Initiating radar {}", id);

    // Phase 1: link verification
    let handshake = retry_bounded(clock, policy.handshake_attempts, policy.handshake_delay, |attempt| {
        let ok = channel.link_mut().handshake();
        if !ok {
            diag_info!(log, clock.now_us(), "radar {} handshake attempt {} failed", id, attempt);
        }
        ok
    });
    if handshake.is_success() {
        channel.mark_ready();
        diag_info!(log, clock.now_us(), "Success communication with radar {}", id);
    } else {
        diag_warn!(log, clock.now_us(), "radar {}: connection failure", id);
    }

    // Phase 2: enhanced mode, attempted even without a verified link
    let enhanced = retry_bounded(clock, policy.enhanced_attempts, policy.enhanced_delay, |attempt| {
        let ok = channel.link_mut().negotiate_enhanced_mode();
        if !ok {
            diag_info!(log, clock.now_us(), "radar {} enhanced mode attempt {} failed", id, attempt);
        }
        ok
    });
    if enhanced.is_success() {
        channel.mark_enhanced();
        diag_info!(log, clock.now_us(), "radar {} engineering: SUCCESS", id);
    } else {
        diag_warn!(log, clock.now_us(), "radar {} engineering: FAIL", id);
    }

    let report = BringupReport {
        handshake_attempts: handshake.attempts(),
        enhanced_attempts: enhanced.attempts(),
        ready: channel.is_ready(),
        enhanced_mode: channel.is_enhanced(),
    };

    if report.is_complete() {
        Ok(report)
    } else {
        Err(BringupError::Degraded(report))
    }
}

/// Bring up every channel sequentially, in slice order.
///
/// One channel's retries never overlap another's.
pub fn bring_up_all<L, C, const N: usize>(
    channels: &mut [SensorChannel<L>],
    policy: &BringupPolicy,
    clock: &C,
    log: &DiagStream<N>,
) -> Vec<Result<BringupReport, BringupError>>
where
    L: ChannelLink,
    C: Clock + ?Sized,
{
    channels
        .iter_mut()
        .map(|channel| bring_up(channel, policy, clock, log))
        .collect()
}

/// Change the channel reporting rate, bounded by `policy.baud_attempts`.
///
/// Returns the attempt that succeeded.
pub fn adapt_reporting_rate<L, C, const N: usize>(
    channel: &mut SensorChannel<L>,
    code: u16,
    policy: &BringupPolicy,
    clock: &C,
    log: &DiagStream<N>,
) -> Result<u32, BringupError>
where
    L: ChannelLink,
    C: Clock + ?Sized,
{
    let id = channel.id();
    let outcome = retry_bounded(clock, policy.baud_attempts, policy.baud_delay, |attempt| {
        diag_info!(log, clock.now_us(), "radar {} setting baud (attempt {})", id, attempt);
        channel.link_mut().set_reporting_rate(code)
    });

    if outcome.is_success() {
        diag_info!(log, clock.now_us(), "radar {} BAUD SUCCESS", id);
        Ok(outcome.attempts())
    } else {
        diag_warn!(log, clock.now_us(), "radar {} BAUD FAIL after {} attempts", id, outcome.attempts());
        Err(BringupError::BaudRejected {
            attempts: outcome.attempts(),
        })
    }
}
