//! Frame dispatcher
//!
//! Reads the EtherType of every received frame and hands the whole frame to
//! the matching protocol handler. Nothing past the type field is parsed here.

use alloc::sync::Arc;
use log::{debug, trace, warn};
use spin::RwLock;

use crate::net::ethernet::{self, EtherType, FrameError, MacDisplay};

/// Protocol handler trait for frame dispatching
pub trait ProtocolHandler: Send + Sync {
    /// Handle a received frame, Ethernet header included
    fn handle_frame(&self, frame: &[u8]);
}

impl<F> ProtocolHandler for F
where
    F: Fn(&[u8]) + Send + Sync,
{
    fn handle_frame(&self, frame: &[u8]) {
        self(frame)
    }
}

/// What the dispatcher did with a well-formed frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Delivered to the ARP handler
    Arp,
    /// Delivered to the IPv4 handler
    Ipv4,
    /// Supported protocol but no handler registered yet
    Unhandled(EtherType),
    /// Unsupported protocol, ignored
    Dropped(u16),
}

/// Frame dispatcher - routes frames to appropriate protocol handlers
pub struct FrameDispatcher {
    /// Handler for ARP packets (EtherType 0x0806)
    arp_handler: RwLock<Option<Arc<dyn ProtocolHandler>>>,
    /// Handler for IPv4 packets (EtherType 0x0800)
    ipv4_handler: RwLock<Option<Arc<dyn ProtocolHandler>>>,
}

impl FrameDispatcher {
    /// Create a new frame dispatcher
    pub const fn new() -> Self {
        Self {
            arp_handler: RwLock::new(None),
            ipv4_handler: RwLock::new(None),
        }
    }

    /// Register a handler for ARP packets
    pub fn register_arp_handler(&self, handler: Arc<dyn ProtocolHandler>) {
        *self.arp_handler.write() = Some(handler);
    }

    /// Register a handler for IPv4 packets
    pub fn register_ipv4_handler(&self, handler: Arc<dyn ProtocolHandler>) {
        *self.ipv4_handler.write() = Some(handler);
    }

    /// Dispatch a received frame to the appropriate handler
    ///
    /// # Arguments
    /// * `frame` - Raw frame, or `None` when the driver woke up without data
    pub fn dispatch(&self, frame: Option<&[u8]>) -> Result<DispatchOutcome, FrameError> {
        let Some(frame) = frame else {
            warn!("RX: packet data null");
            return Err(FrameError::NoData);
        };
        let ethertype = ethernet::ethertype(frame).inspect_err(|e| {
            warn!("RX: dropping malformed frame: {}", e);
        })?;
        let header = (ethernet::src_mac(frame), ethernet::is_broadcast(frame));
        if let (Ok(src), Ok(broadcast)) = header {
            debug!(
                "RX: {} bytes from {}, type 0x{:04X}{}",
                frame.len(),
                MacDisplay(src),
                ethertype.value(),
                if broadcast { " (broadcast)" } else { "" }
            );
        }

        let slot = match ethertype {
            EtherType::Arp => &self.arp_handler,
            EtherType::Ipv4 => &self.ipv4_handler,
            EtherType::Unknown(raw) => {
                trace!("RX: unknown EtherType 0x{:04X}, ignoring", raw);
                return Ok(DispatchOutcome::Dropped(raw));
            }
        };

        // Release the slot before calling out so handlers may re-register
        let handler = slot.read().as_ref().cloned();
        let Some(handler) = handler else {
            debug!("RX: no {} handler registered", ethertype);
            return Ok(DispatchOutcome::Unhandled(ethertype));
        };
        handler.handle_frame(frame);

        Ok(match ethertype {
            EtherType::Arp => DispatchOutcome::Arp,
            _ => DispatchOutcome::Ipv4,
        })
    }
}

impl Default for FrameDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;
    use spin::Mutex;

    struct Recorder {
        frames: Mutex<Vec<Vec<u8>>>,
    }

    impl Recorder {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                frames: Mutex::new(Vec::new()),
            })
        }
    }

    impl ProtocolHandler for Recorder {
        fn handle_frame(&self, frame: &[u8]) {
            self.frames.lock().push(frame.to_vec());
        }
    }

    fn frame(ethertype: u16) -> Vec<u8> {
        let mut frame = alloc::vec![0u8; 42];
        frame[12..14].copy_from_slice(&ethertype.to_be_bytes());
        frame
    }

    #[test]
    fn known_type_without_handler_is_unhandled() {
        let dispatcher = FrameDispatcher::new();
        assert_eq!(
            dispatcher.dispatch(Some(frame(0x0806).as_slice())),
            Ok(DispatchOutcome::Unhandled(EtherType::Arp))
        );
    }

    #[test]
    fn closures_are_handlers() {
        let dispatcher = FrameDispatcher::new();
        let seen = Arc::new(Mutex::new(0usize));
        let counter = seen.clone();
        dispatcher.register_ipv4_handler(Arc::new(move |f: &[u8]| {
            *counter.lock() += f.len();
        }));

        assert_eq!(dispatcher.dispatch(Some(frame(0x0800).as_slice())), Ok(DispatchOutcome::Ipv4));
        assert_eq!(*seen.lock(), 42);
    }

    #[test]
    fn reregistering_replaces_handler() {
        let dispatcher = FrameDispatcher::new();
        let first = Recorder::new();
        let second = Recorder::new();
        dispatcher.register_arp_handler(first.clone());
        dispatcher.register_arp_handler(second.clone());

        dispatcher.dispatch(Some(frame(0x0806).as_slice())).unwrap();

        assert!(first.frames.lock().is_empty());
        assert_eq!(second.frames.lock().len(), 1);
    }

    #[test]
    fn no_data_and_short_frames_are_errors() {
        let dispatcher = FrameDispatcher::new();
        let arp = Recorder::new();
        dispatcher.register_arp_handler(arp.clone());

        assert_eq!(dispatcher.dispatch(None), Err(FrameError::NoData));
        assert_eq!(
            dispatcher.dispatch(Some(&frame(0x0806)[..13])),
            Err(FrameError::TooShort { len: 13 })
        );
        assert!(arp.frames.lock().is_empty());
    }
}
