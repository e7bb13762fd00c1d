//! Per-poll channel readings.
//!
//! A [`ChannelReading`] lives for one poll cycle: produced by the channel
//! link, owned by the acquisition worker, consumed by the encoder.

/// Target state reported by the radar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetStatus(pub u8);

impl TargetStatus {
    pub const NO_TARGET: TargetStatus = TargetStatus(0);
    pub const MOVING: TargetStatus = TargetStatus(1);
    pub const STATIONARY: TargetStatus = TargetStatus(2);
    pub const BOTH: TargetStatus = TargetStatus(3);

    pub fn moving(self) -> bool {
        self.0 & 0x01 != 0 && self.0 <= 3
    }

    pub fn stationary(self) -> bool {
        self.0 & 0x02 != 0 && self.0 <= 3
    }

    /// Human readable label published as `status`.
    pub fn label(self) -> &'static str {
        match self.0 {
            0 => "No target",
            1 => "Moving only",
            2 => "Stationary only",
            3 => "Both moving and stationary",
            _ => "Unknown",
        }
    }
}

/// Moving or stationary target detail.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TargetRecord {
    /// Target energy (0-100).
    pub signal: u8,
    /// Target distance in cm.
    pub distance: u16,
    /// Per-gate signal energies, gate 0 first. Empty in basic mode.
    pub signals: Vec<u8>,
    /// Per-gate thresholds, gate 0 first. Empty when unknown.
    pub thresholds: Vec<u8>,
}

/// One decoded data frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelReading {
    pub status: TargetStatus,
    pub presence_detected: bool,
    /// Detection distance in cm, only with presence.
    pub distance: Option<u16>,
    /// Only when motion is detected.
    pub moving: Option<TargetRecord>,
    /// Only when a stationary target is detected.
    pub stationary: Option<TargetRecord>,
    pub enhanced_mode: bool,
}

impl ChannelReading {
    /// Build a reading, dropping any record whose detection flag is clear.
    ///
    /// Presence is derived from the target state: any detected target means
    /// presence, and `distance` is kept only in that case.
    pub fn from_parts(
        status: TargetStatus,
        distance: u16,
        moving: TargetRecord,
        stationary: TargetRecord,
        enhanced_mode: bool,
    ) -> Self {
        let presence_detected = status.moving() || status.stationary();
        Self {
            status,
            presence_detected,
            distance: presence_detected.then_some(distance),
            moving: status.moving().then_some(moving),
            stationary: status.stationary().then_some(stationary),
            enhanced_mode,
        }
    }

    /// Reading with no detected target.
    pub fn empty(enhanced_mode: bool) -> Self {
        Self {
            status: TargetStatus::NO_TARGET,
            presence_detected: false,
            distance: None,
            moving: None,
            stationary: None,
            enhanced_mode,
        }
    }
}

/// Result of reading one frame from a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SensorFrame {
    /// Data-available frame.
    Data(ChannelReading),
    /// Any other frame kind (ACK, unknown type byte).
    Unrecognized { code: u8 },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(signal: u8, distance: u16) -> TargetRecord {
        TargetRecord {
            signal,
            distance,
            signals: vec![1, 2, 3],
            thresholds: vec![4, 5, 6],
        }
    }

    #[test]
    fn test_no_target_drops_everything() {
        let r = ChannelReading::from_parts(
            TargetStatus::NO_TARGET,
            120,
            record(50, 100),
            record(60, 110),
            true,
        );
        assert!(!r.presence_detected);
        assert!(r.distance.is_none());
        assert!(r.moving.is_none());
        assert!(r.stationary.is_none());
    }

    #[test]
    fn test_moving_only() {
        let r = ChannelReading::from_parts(TargetStatus::MOVING, 200, record(80, 200), record(1, 1), false);
        assert!(r.presence_detected);
        assert_eq!(r.distance, Some(200));
        assert_eq!(r.moving, Some(record(80, 200)));
        assert!(r.stationary.is_none());
    }

    #[test]
    fn test_both() {
        let r = ChannelReading::from_parts(TargetStatus::BOTH, 90, record(1, 2), record(3, 4), true);
        assert!(r.moving.is_some());
        assert!(r.stationary.is_some());
    }

    #[test]
    fn test_unknown_state_is_not_a_target() {
        let s = TargetStatus(7);
        assert!(!s.moving());
        assert!(!s.stationary());
        assert_eq!(s.label(), "Unknown");
    }
}
