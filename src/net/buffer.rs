//! Outgoing frame buffer
//!
//! Protocol handlers queue finished frames here; every stack tick drains the
//! queue onto the device each frame belongs to.

use alloc::vec::Vec;
use core::fmt;
use crossbeam_queue::ArrayQueue;
use log::{trace, warn};

use crate::drivers::net::DeviceHandle;

/// Maximum frame size accepted for queueing (header + MTU + CRC)
pub const MAX_FRAME_SIZE: usize = 1518;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferError {
    Full,
    PacketTooLarge,
    /// A queue must hold at least one frame
    ZeroCapacity,
}

impl fmt::Display for BufferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BufferError::Full => write!(f, "Outgoing queue full"),
            BufferError::PacketTooLarge => write!(f, "Frame exceeds {} bytes", MAX_FRAME_SIZE),
            BufferError::ZeroCapacity => write!(f, "Outgoing queue capacity must be non-zero"),
        }
    }
}

/// Frame waiting for transmission
#[derive(Debug)]
pub struct OutgoingFrame {
    pub device: DeviceHandle,
    pub frame: Vec<u8>,
}

/// Result of draining the queue once
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    /// Frames the device accepted
    pub sent: usize,
    /// Frames the device refused; they are not requeued
    pub failed: usize,
}

/// Bounded FIFO of frames waiting for their device
pub struct OutgoingBuffer {
    queue: ArrayQueue<OutgoingFrame>,
}

impl OutgoingBuffer {
    pub fn new(capacity: usize) -> Result<Self, BufferError> {
        if capacity == 0 {
            return Err(BufferError::ZeroCapacity);
        }
        Ok(Self {
            queue: ArrayQueue::new(capacity),
        })
    }

    /// Queue a frame for transmission on `device`
    pub fn enqueue(&self, device: DeviceHandle, frame: Vec<u8>) -> Result<(), BufferError> {
        if frame.len() > MAX_FRAME_SIZE {
            return Err(BufferError::PacketTooLarge);
        }
        self.queue
            .push(OutgoingFrame { device, frame })
            .map_err(|_| BufferError::Full)?;
        trace!("TX: frame queued, queue size: {}", self.queue.len());
        Ok(())
    }

    /// Transmit everything queued so far.
    ///
    /// Frames enqueued while draining wait for the next call.
    pub fn send(&self) -> FlushReport {
        let mut report = FlushReport::default();
        let pending = self.queue.len();

        for _ in 0..pending {
            let Some(entry) = self.queue.pop() else {
                break;
            };
            match entry.device.device().transmit(&entry.frame) {
                Ok(()) => report.sent += 1,
                Err(e) => {
                    warn!(
                        "TX: {} refused {} byte frame: {}",
                        entry.device.name(),
                        entry.frame.len(),
                        e
                    );
                    report.failed += 1;
                }
            }
        }

        report
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.queue.capacity()
    }
}
