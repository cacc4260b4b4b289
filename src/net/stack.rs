//! Network Stack Integration
//!
//! This module provides the core network stack that ties the device registry,
//! the frame dispatcher and the outgoing buffer together. A `NetworkStack` is
//! an ordinary owned value; the free functions at the bottom install one
//! process-wide instance for kernels that want a single global stack.

use alloc::sync::Arc;
use alloc::vec::Vec;
use conquer_once::spin::OnceCell;
use core::fmt;
use log::{debug, info, warn};
use spin::RwLock;

use crate::drivers::net::{DeviceHandle, ReceiveHandler};
use crate::net::address_map::Registry;
use crate::net::buffer::{FlushReport, OutgoingBuffer};
use crate::net::dispatch::{DispatchOutcome, FrameDispatcher, ProtocolHandler};
use crate::net::ethernet::{FrameError, MacDisplay};
use crate::net::ipv4::{ConfigError, IpConfig, Ipv4Addr, Ipv4ConfigTable};
use crate::net::loopback::{self, LoopbackDevice};

/// Default outgoing queue size
pub const DEFAULT_TX_QUEUE_SIZE: usize = 64;

/// Errors surfaced by stack construction and the process-wide entry points
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackError {
    /// `init` was already called
    AlreadyInitialized,
    /// `init` has not been called yet
    NotInitialized,
    /// A queue size of zero was requested
    InvalidSettings,
    Config(ConfigError),
    Frame(FrameError),
}

impl fmt::Display for StackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StackError::AlreadyInitialized => write!(f, "Network stack already initialized"),
            StackError::NotInitialized => write!(f, "Network stack not initialized"),
            StackError::InvalidSettings => write!(f, "Invalid network stack settings"),
            StackError::Config(e) => write!(f, "Configuration rejected: {}", e),
            StackError::Frame(e) => write!(f, "Frame rejected: {}", e),
        }
    }
}

impl From<ConfigError> for StackError {
    fn from(e: ConfigError) -> Self {
        StackError::Config(e)
    }
}

impl From<FrameError> for StackError {
    fn from(e: FrameError) -> Self {
        StackError::Frame(e)
    }
}

/// Tunables fixed at stack construction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackSettings {
    /// Frames the outgoing buffer holds between ticks
    pub tx_queue_capacity: usize,
    /// Frames the loopback device holds between polls
    pub loopback_queue_size: usize,
}

impl StackSettings {
    pub fn validate(&self) -> Result<(), StackError> {
        if self.tx_queue_capacity == 0 || self.loopback_queue_size == 0 {
            return Err(StackError::InvalidSettings);
        }
        Ok(())
    }
}

impl Default for StackSettings {
    fn default() -> Self {
        Self {
            tx_queue_capacity: DEFAULT_TX_QUEUE_SIZE,
            loopback_queue_size: loopback::DEFAULT_QUEUE_SIZE,
        }
    }
}

pub struct NetworkStack {
    registry: RwLock<Registry>,
    dispatcher: Arc<FrameDispatcher>,
    ipv4_configs: Arc<Ipv4ConfigTable>,
    outgoing: Arc<OutgoingBuffer>,
    settings: StackSettings,
}

impl NetworkStack {
    /// Create a stack with empty registries and no protocol handlers
    pub fn new(settings: StackSettings) -> Result<Self, StackError> {
        settings.validate()?;
        let outgoing = OutgoingBuffer::new(settings.tx_queue_capacity)
            .map_err(|_| StackError::InvalidSettings)?;
        Ok(Self {
            registry: RwLock::new(Registry::new()),
            dispatcher: Arc::new(FrameDispatcher::new()),
            ipv4_configs: Arc::new(Ipv4ConfigTable::new()),
            outgoing: Arc::new(outgoing),
            settings,
        })
    }

    pub fn settings(&self) -> StackSettings {
        self.settings
    }

    pub fn register_arp_handler(&self, handler: Arc<dyn ProtocolHandler>) {
        self.dispatcher.register_arp_handler(handler);
    }

    pub fn register_ipv4_handler(&self, handler: Arc<dyn ProtocolHandler>) {
        self.dispatcher.register_ipv4_handler(handler);
    }

    /// Configure an IP configuration on the given network device.
    ///
    /// Multiple configurations per device are allowed (multi-homing). On
    /// success the device's receive callback points at this stack's
    /// dispatcher; on failure nothing is recorded and the callback is left as is.
    pub fn config_ip(&self, device: DeviceHandle, config: IpConfig) -> Result<(), ConfigError> {
        if !device.device().is_ready() {
            warn!("NET: refusing to configure {}: device not ready", device.name());
            return Err(ConfigError::DeviceNotReady);
        }
        config.validate()?;

        {
            let mut registry = self.registry.write();
            registry.bind(&device, config)?;
            self.ipv4_configs.add(config);
        }
        // Drivers may deliver queued frames from inside `set_receive_handler`,
        // and those frames can reach handlers that query the registry
        device.device().set_receive_handler(self.receive_handler());

        info!("NET: {} configured {}", device.name(), config);
        Ok(())
    }

    /// Callback handed to devices; routes every received frame through the dispatcher
    pub fn receive_handler(&self) -> ReceiveHandler {
        let dispatcher = Arc::clone(&self.dispatcher);
        Arc::new(move |frame: Option<&[u8]>| {
            // Failures were already reported by the dispatcher
            let _ = dispatcher.dispatch(frame);
        })
    }

    /// Route one received frame to its protocol handler
    pub fn handle_packet(&self, frame: Option<&[u8]>) -> Result<DispatchOutcome, FrameError> {
        self.dispatcher.dispatch(frame)
    }

    /// Called continuously to keep the network stack going.
    ///
    /// Flushes every queued outgoing frame onto its device.
    pub fn update(&self) -> FlushReport {
        let report = self.outgoing.send();
        if report.sent + report.failed > 0 {
            debug!("TX: flushed {} frames, {} failed", report.sent, report.failed);
        }
        report
    }

    /// Create a loopback device and configure it as 127.0.0.1/8
    pub fn attach_loopback(&self) -> Result<Arc<LoopbackDevice>, ConfigError> {
        let lo = Arc::new(LoopbackDevice::new(self.settings.loopback_queue_size));
        let config = IpConfig::new(Ipv4Addr::LOCALHOST, Ipv4Addr::new(255, 0, 0, 0), None);
        self.config_ip(DeviceHandle::from(Arc::clone(&lo)), config)?;
        Ok(lo)
    }

    /// Device owning `ip`, if any
    pub fn device_for(&self, ip: Ipv4Addr) -> Option<DeviceHandle> {
        self.registry.read().addresses.lookup(ip).cloned()
    }

    /// Every configuration bound to `device`
    pub fn device_configs(&self, device: &DeviceHandle) -> Vec<IpConfig> {
        self.registry.read().devices.lookup(device).to_vec()
    }

    pub fn address_count(&self) -> usize {
        self.registry.read().addresses.len()
    }

    /// Configuration table shared with the IPv4 protocol handler
    pub fn ipv4_configs(&self) -> Arc<Ipv4ConfigTable> {
        Arc::clone(&self.ipv4_configs)
    }

    /// Queue protocol handlers push replies into
    pub fn outgoing(&self) -> Arc<OutgoingBuffer> {
        Arc::clone(&self.outgoing)
    }

    /// Display network configuration
    pub fn log_config(&self) {
        let registry = self.registry.read();

        if registry.devices.is_empty() {
            info!("Network: Not configured");
            return;
        }

        for (device, configs) in registry.devices.iter() {
            let dev = device.device();
            info!(
                "{}: MAC {} link {:?}",
                device.name(),
                MacDisplay(dev.mac_address()),
                dev.link_status()
            );
            for config in configs {
                info!("  inet {}", config);
            }
        }
    }
}

// Process-wide stack

static NETWORK_STACK: OnceCell<NetworkStack> = OnceCell::uninit();

/// Initialize the process-wide network stack.
///
/// Must be called once at boot; a second call fails with
/// `StackError::AlreadyInitialized` and leaves the running stack untouched.
pub fn init(settings: StackSettings) -> Result<&'static NetworkStack, StackError> {
    let stack = NetworkStack::new(settings)?;
    NETWORK_STACK
        .try_init_once(|| stack)
        .map_err(|_| StackError::AlreadyInitialized)?;
    info!("Network stack initialized");
    network_stack()
}

/// The stack installed by `init`
pub fn network_stack() -> Result<&'static NetworkStack, StackError> {
    NETWORK_STACK
        .try_get()
        .map_err(|_| StackError::NotInitialized)
}

pub fn config_ip(device: DeviceHandle, config: IpConfig) -> Result<(), StackError> {
    network_stack()?.config_ip(device, config)?;
    Ok(())
}

pub fn handle_packet(frame: Option<&[u8]>) -> Result<DispatchOutcome, StackError> {
    Ok(network_stack()?.handle_packet(frame)?)
}

pub fn update() -> Result<FlushReport, StackError> {
    Ok(network_stack()?.update())
}
