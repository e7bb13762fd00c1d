//! Sensor channels.
//!
//! A [`SensorChannel`] owns its link. Bring-up borrows it mutably, then the
//! channel is moved into its acquisition worker; no second handle exists.

use core::fmt;
use core::num::NonZeroU8;

use crate::link::ChannelLink;

/// Channel identity, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChannelId(NonZeroU8);

impl ChannelId {
    /// `None` for id 0.
    pub const fn new(id: u8) -> Option<Self> {
        match NonZeroU8::new(id) {
            Some(id) => Some(Self(id)),
            None => None,
        }
    }

    pub const fn get(self) -> u8 {
        self.0.get()
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One radar channel and its bring-up state.
pub struct SensorChannel<L> {
    id: ChannelId,
    link: L,
    ready: bool,
    enhanced_mode: bool,
}

impl<L: ChannelLink> SensorChannel<L> {
    /// Fresh channel: not ready, basic mode.
    pub fn new(id: ChannelId, link: L) -> Self {
        Self {
            id,
            link,
            ready: false,
            enhanced_mode: false,
        }
    }

    pub fn id(&self) -> ChannelId {
        self.id
    }

    /// Link verified during bring-up.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Enhanced reporting negotiated during bring-up.
    pub fn is_enhanced(&self) -> bool {
        self.enhanced_mode
    }

    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    pub(crate) fn mark_ready(&mut self) {
        self.ready = true;
    }

    pub(crate) fn mark_enhanced(&mut self) {
        self.enhanced_mode = true;
    }
}

impl<L> fmt::Debug for SensorChannel<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SensorChannel")
            .field("id", &self.id)
            .field("ready", &self.ready)
            .field("enhanced_mode", &self.enhanced_mode)
            .finish()
    }
}
