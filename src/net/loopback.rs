//! Loopback Network Interface
//!
//! Virtual device that echoes every transmitted frame back as a received
//! frame. Transmitted frames wait in a queue until `poll` hands them to the
//! bound receive handler, the same way a polled NIC driver delivers traffic.

use alloc::collections::VecDeque;
use alloc::vec::Vec;
use spin::Mutex;

use crate::drivers::net::{LinkStatus, NetworkDevice, ReceiveHandler, ReceiveSlot, TransmitError};

/// Default number of frames the loopback holds before refusing transmits
pub const DEFAULT_QUEUE_SIZE: usize = 64;

/// Loopback network device
pub struct LoopbackDevice {
    /// MAC address (all zeros for loopback)
    mac_addr: [u8; 6],
    /// Frames transmitted but not yet delivered
    rx_queue: Mutex<VecDeque<Vec<u8>>>,
    /// Maximum queue size to prevent unbounded memory growth
    max_queue_size: usize,
    receiver: ReceiveSlot,
}

impl LoopbackDevice {
    /// Create a new loopback device
    ///
    /// # Arguments
    /// * `max_queue_size` - Maximum number of frames to queue
    pub fn new(max_queue_size: usize) -> Self {
        Self {
            mac_addr: [0x00; 6],
            rx_queue: Mutex::new(VecDeque::with_capacity(max_queue_size)),
            max_queue_size,
            receiver: ReceiveSlot::new(),
        }
    }

    /// Deliver queued frames to the receive handler in FIFO order.
    ///
    /// Returns the number of frames delivered. Frames stay queued while no
    /// handler is bound.
    pub fn poll(&self) -> usize {
        if !self.receiver.is_bound() {
            return 0;
        }

        // Frames transmitted by the handler itself wait for the next poll
        let pending = self.pending();
        let mut delivered = 0;
        // Pop one at a time so the handler can transmit without deadlocking
        while delivered < pending {
            let Some(frame) = self.next_frame() else {
                break;
            };
            self.receiver.deliver(Some(frame.as_slice()));
            delivered += 1;
        }
        delivered
    }

    fn next_frame(&self) -> Option<Vec<u8>> {
        self.rx_queue.lock().pop_front()
    }

    /// Frames waiting for `poll`
    pub fn pending(&self) -> usize {
        self.rx_queue.lock().len()
    }

    pub fn has_receiver(&self) -> bool {
        self.receiver.is_bound()
    }
}

impl Default for LoopbackDevice {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_SIZE)
    }
}

impl NetworkDevice for LoopbackDevice {
    fn mac_address(&self) -> [u8; 6] {
        self.mac_addr
    }

    fn transmit(&self, frame: &[u8]) -> Result<(), TransmitError> {
        let mut queue = self.rx_queue.lock();

        if queue.len() >= self.max_queue_size {
            return Err(TransmitError::BufferFull);
        }

        queue.push_back(frame.to_vec());
        Ok(())
    }

    fn set_receive_handler(&self, handler: ReceiveHandler) {
        self.receiver.bind(handler);
    }

    fn link_status(&self) -> LinkStatus {
        // Loopback is always "up"
        LinkStatus::Up
    }

    fn device_name(&self) -> &str {
        "lo"
    }

    fn is_ready(&self) -> bool {
        true
    }
}
