//! Exclusive ownership of the audio input and speech output channels.
//!
//! Only one voice session (dialogue or continuous listening) may record or
//! speak at a time. Sessions take an [`AudioLease`] from a shared
//! [`AudioDeviceLock`]; dropping the lease releases the device.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared guard over the single microphone/speaker pair.
///
/// Cloning shares the same underlying flag.
#[derive(Debug, Clone, Default)]
pub struct AudioDeviceLock {
    in_use: Arc<AtomicBool>,
}

impl AudioDeviceLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the device, or `None` if another session holds it.
    pub fn try_acquire(&self) -> Option<AudioLease> {
        self.in_use
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| {
                tracing::debug!("Audio device acquired");
                AudioLease {
                    in_use: Arc::clone(&self.in_use),
                }
            })
    }

    pub fn is_in_use(&self) -> bool {
        self.in_use.load(Ordering::Acquire)
    }
}

/// Proof of exclusive device access. Releases the device on drop.
#[derive(Debug)]
pub struct AudioLease {
    in_use: Arc<AtomicBool>,
}

impl Drop for AudioLease {
    fn drop(&mut self) {
        self.in_use.store(false, Ordering::Release);
        tracing::debug!("Audio device released");
    }
}
