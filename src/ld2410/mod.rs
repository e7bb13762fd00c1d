//! HLK-LD2410 24 GHz presence radar.
//!
//! Serial protocol codec ([`frame`]) and a [`ChannelLink`](crate::link::ChannelLink)
//! implementation over any [`SerialPort`].

pub mod frame;
pub mod link;

pub use frame::{Frame, FrameAssembler, FrameError, GateThresholds, Report};
pub use link::{Ld2410Link, LinkTiming, SerialPort};

/// Baud-rate index accepted by the SET_BAUD command.
pub const fn baud_index(baud: u32) -> Option<u16> {
    match baud {
        9_600 => Some(1),
        19_200 => Some(2),
        38_400 => Some(3),
        57_600 => Some(4),
        115_200 => Some(5),
        230_400 => Some(6),
        256_000 => Some(7),
        460_800 => Some(8),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_baud_index() {
        assert_eq!(baud_index(256_000), Some(7));
        assert_eq!(baud_index(9_600), Some(1));
        assert_eq!(baud_index(12_345), None);
    }
}
