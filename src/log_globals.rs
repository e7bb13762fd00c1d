//! Global diagnostic log stream.

use crate::logging::DiagStream;

/// Shared by bring-up, every acquisition worker and the cloud connection.
/// Multiple producers, single consumer (log drain thread).
pub static DIAG_LOG: DiagStream = DiagStream::new();
