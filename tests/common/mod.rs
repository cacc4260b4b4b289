#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use rustrial_netstack::drivers::net::{
    LinkStatus, NetworkDevice, ReceiveHandler, ReceiveSlot, TransmitError,
};
use rustrial_netstack::net::dispatch::ProtocolHandler;
use spin::Mutex;

/// Driver double that records transmits and receive-handler bindings
pub struct MockDevice {
    name: &'static str,
    mac: [u8; 6],
    ready: bool,
    pub sent: Mutex<Vec<Vec<u8>>>,
    pub binds: AtomicUsize,
    receiver: ReceiveSlot,
    backlog: Mutex<Vec<Vec<u8>>>,
}

impl MockDevice {
    pub fn new(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            mac: [0x52, 0x54, 0x00, 0x12, 0x34, 0x56],
            ready: true,
            sent: Mutex::new(Vec::new()),
            binds: AtomicUsize::new(0),
            receiver: ReceiveSlot::new(),
            backlog: Mutex::new(Vec::new()),
        })
    }

    pub fn not_ready(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            mac: [0; 6],
            ready: false,
            sent: Mutex::new(Vec::new()),
            binds: AtomicUsize::new(0),
            receiver: ReceiveSlot::new(),
            backlog: Mutex::new(Vec::new()),
        })
    }

    /// Simulate the hardware handing a frame to the driver
    pub fn receive(&self, frame: Option<&[u8]>) -> bool {
        self.receiver.deliver(frame)
    }

    /// Frame that arrived before any handler was bound; delivered on the next bind
    pub fn hold(&self, frame: Vec<u8>) {
        self.backlog.lock().push(frame);
    }

    pub fn bind_count(&self) -> usize {
        self.binds.load(Ordering::SeqCst)
    }

    pub fn has_receiver(&self) -> bool {
        self.receiver.is_bound()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().len()
    }
}

impl NetworkDevice for MockDevice {
    fn mac_address(&self) -> [u8; 6] {
        self.mac
    }

    fn transmit(&self, frame: &[u8]) -> Result<(), TransmitError> {
        self.sent.lock().push(frame.to_vec());
        Ok(())
    }

    fn set_receive_handler(&self, handler: ReceiveHandler) {
        self.binds.fetch_add(1, Ordering::SeqCst);
        self.receiver.bind(handler);

        let backlog = core::mem::take(&mut *self.backlog.lock());
        for frame in backlog {
            self.receiver.deliver(Some(frame.as_slice()));
        }
    }

    fn link_status(&self) -> LinkStatus {
        LinkStatus::Up
    }

    fn device_name(&self) -> &str {
        self.name
    }

    fn is_ready(&self) -> bool {
        self.ready
    }
}

/// Protocol handler double that keeps every frame it was given
pub struct RecordingHandler {
    pub frames: Mutex<Vec<Vec<u8>>>,
}

impl RecordingHandler {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            frames: Mutex::new(Vec::new()),
        })
    }

    pub fn count(&self) -> usize {
        self.frames.lock().len()
    }
}

impl ProtocolHandler for RecordingHandler {
    fn handle_frame(&self, frame: &[u8]) {
        self.frames.lock().push(frame.to_vec());
    }
}

/// Minimum-size Ethernet frame carrying `ethertype`
pub fn frame(ethertype: u16) -> Vec<u8> {
    let mut frame = vec![0u8; 60];
    frame[0..6].copy_from_slice(&[0xFF; 6]);
    frame[6..12].copy_from_slice(&[0xCA, 0xFE, 0xBA, 0xBE, 0x00, 0x02]);
    frame[12..14].copy_from_slice(&ethertype.to_be_bytes());
    for (i, byte) in frame[14..].iter_mut().enumerate() {
        *byte = i as u8;
    }
    frame
}
