// Network Device Abstraction Layer
use alloc::sync::Arc;
use core::cmp::Ordering;
use core::fmt;
use spin::RwLock;

/// link status of a network interface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    Up,
    Down,
    Unknown,
}

/// Errors that can occur during packet transmission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransmitError {
    /// Packet too large for the device
    PacketTooLarge,
    /// TX buffer is full, try again later
    BufferFull,
    /// Device is not ready
    NotReady,
    /// Hardware error during transmission
    HardwareError,
}

impl fmt::Display for TransmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransmitError::PacketTooLarge => write!(f, "Packet too large"),
            TransmitError::BufferFull => write!(f, "TX buffer full"),
            TransmitError::NotReady => write!(f, "Device not ready"),
            TransmitError::HardwareError => write!(f, "Hardware error"),
        }
    }
}

/// Callback a driver invokes for every received frame.
///
/// `None` is the driver's "woke up without data" signal.
pub type ReceiveHandler = Arc<dyn Fn(Option<&[u8]>) + Send + Sync>;

/// Network device trait that all network drivers must implement
///
/// Devices are shared between the driver layer and the stack, so every
/// method takes `&self`; drivers keep their mutable state behind locks.
pub trait NetworkDevice: Send + Sync {
    /// Get the MAC address of this device
    fn mac_address(&self) -> [u8; 6];

    /// Transmit a packet
    ///
    /// # Arguments
    /// * `frame` - The raw Ethernet frame to transmit (including header)
    fn transmit(&self, frame: &[u8]) -> Result<(), TransmitError>;

    /// Bind the callback that receives inbound frames, replacing any previous one
    ///
    /// Drivers may deliver frames they already hold before returning; the
    /// stack never holds its own locks across this call.
    fn set_receive_handler(&self, handler: ReceiveHandler);

    /// Get the current link status
    fn link_status(&self) -> LinkStatus;

    /// Get device name/identifier
    fn device_name(&self) -> &str;

    /// Check if the device is initialized and ready
    fn is_ready(&self) -> bool;
}

/// Shared, non-owning view of a registered device.
///
/// Two handles are equal when they point at the same device instance,
/// regardless of the device's name.
#[derive(Clone)]
pub struct DeviceHandle(Arc<dyn NetworkDevice>);

impl DeviceHandle {
    pub fn new(device: Arc<dyn NetworkDevice>) -> Self {
        Self(device)
    }

    pub fn device(&self) -> &dyn NetworkDevice {
        &*self.0
    }

    pub fn name(&self) -> &str {
        self.0.device_name()
    }

    fn addr(&self) -> usize {
        Arc::as_ptr(&self.0).cast::<()>() as usize
    }
}

impl<D: NetworkDevice + 'static> From<Arc<D>> for DeviceHandle {
    fn from(device: Arc<D>) -> Self {
        Self(device)
    }
}

impl PartialEq for DeviceHandle {
    fn eq(&self, other: &Self) -> bool {
        self.addr() == other.addr()
    }
}

impl Eq for DeviceHandle {}

impl PartialOrd for DeviceHandle {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DeviceHandle {
    fn cmp(&self, other: &Self) -> Ordering {
        self.addr().cmp(&other.addr())
    }
}

impl fmt::Debug for DeviceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DeviceHandle({} @ {:#x})", self.name(), self.addr())
    }
}

/// Storage for a device's single receive callback.
///
/// Drivers embed one of these and forward `set_receive_handler` to `bind`.
pub struct ReceiveSlot {
    handler: RwLock<Option<ReceiveHandler>>,
}

impl ReceiveSlot {
    pub const fn new() -> Self {
        Self {
            handler: RwLock::new(None),
        }
    }

    /// Last writer wins
    pub fn bind(&self, handler: ReceiveHandler) {
        *self.handler.write() = Some(handler);
    }

    pub fn is_bound(&self) -> bool {
        self.handler.read().is_some()
    }

    /// Hand a received frame (or the no-data signal) to the bound handler.
    ///
    /// Returns `false` when nothing is bound and the frame was discarded.
    pub fn deliver(&self, frame: Option<&[u8]>) -> bool {
        // Clone out so the handler may rebind this slot while it runs
        let handler = self.handler.read().as_ref().cloned();
        match handler {
            Some(handler) => {
                handler(frame);
                true
            }
            None => false,
        }
    }
}

impl Default for ReceiveSlot {
    fn default() -> Self {
        Self::new()
    }
}
