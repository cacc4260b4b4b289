//! IPv4 configuration
//!
//! Address/mask/gateway bindings and the table the IPv4 protocol handler
//! consults to decide whether a packet is addressed to this host and where
//! outbound packets should go next.

use alloc::vec::Vec;
use core::fmt;
use spin::RwLock;

/// IPv4 Address type (re-export for convenience)
pub use core::net::Ipv4Addr;

/// Errors that reject a configuration request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Device reported it is not ready for traffic
    DeviceNotReady,
    /// Address cannot be assigned to an interface
    InvalidAddress(Ipv4Addr),
    /// Mask bits are not contiguous
    InvalidSubnetMask(Ipv4Addr),
    /// Address is already bound to another device
    AddressInUse(Ipv4Addr),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::DeviceNotReady => write!(f, "Device not ready"),
            ConfigError::InvalidAddress(ip) => write!(f, "Invalid interface address: {}", ip),
            ConfigError::InvalidSubnetMask(mask) => write!(f, "Invalid subnet mask: {}", mask),
            ConfigError::AddressInUse(ip) => write!(f, "Address {} bound to another device", ip),
        }
    }
}

/// IP configuration bound to a device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IpConfig {
    /// Local IP address
    pub ip_address: Ipv4Addr,
    /// Subnet mask
    pub subnet_mask: Ipv4Addr,
    /// Default gateway
    pub gateway: Option<Ipv4Addr>,
}

impl IpConfig {
    pub fn new(ip_address: Ipv4Addr, subnet_mask: Ipv4Addr, gateway: Option<Ipv4Addr>) -> Self {
        Self {
            ip_address,
            subnet_mask,
            gateway,
        }
    }

    /// Reject addresses and masks that cannot describe an interface
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ip = self.ip_address;
        if ip.is_unspecified() || ip.is_broadcast() || ip.is_multicast() {
            return Err(ConfigError::InvalidAddress(ip));
        }

        let mask = u32::from(self.subnet_mask);
        // Contiguous masks are a run of ones followed by a run of zeros
        if mask.leading_ones() + mask.trailing_zeros() != 32 {
            return Err(ConfigError::InvalidSubnetMask(self.subnet_mask));
        }

        Ok(())
    }

    /// Number of leading one bits in the mask
    pub fn prefix_len(&self) -> u32 {
        u32::from(self.subnet_mask).leading_ones()
    }

    pub fn network_address(&self) -> Ipv4Addr {
        Ipv4Addr::from(u32::from(self.ip_address) & u32::from(self.subnet_mask))
    }

    /// Check if `ip` is on this configuration's subnet
    pub fn contains(&self, ip: Ipv4Addr) -> bool {
        let mask = u32::from(self.subnet_mask);
        (u32::from(self.ip_address) & mask) == (u32::from(ip) & mask)
    }
}

impl fmt::Display for IpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.ip_address, self.prefix_len())?;
        match self.gateway {
            Some(gw) => write!(f, " gw {}", gw),
            None => write!(f, " gw none"),
        }
    }
}

/// Every IPv4 configuration known to the host.
///
/// Shared with the IPv4 protocol handler so it can answer "is this for me"
/// without going through the device registry.
pub struct Ipv4ConfigTable {
    configs: RwLock<Vec<IpConfig>>,
}

impl Ipv4ConfigTable {
    pub const fn new() -> Self {
        Self {
            configs: RwLock::new(Vec::new()),
        }
    }

    /// Register a configuration; identical entries are stored once
    pub fn add(&self, config: IpConfig) {
        let mut configs = self.configs.write();
        if !configs.contains(&config) {
            configs.push(config);
        }
    }

    pub fn configs(&self) -> Vec<IpConfig> {
        self.configs.read().clone()
    }

    /// Check if an IP is one of our local addresses
    pub fn is_local_address(&self, ip: Ipv4Addr) -> bool {
        self.configs.read().iter().any(|c| c.ip_address == ip)
    }

    /// First configuration whose subnet contains `dest`
    pub fn find_network(&self, dest: Ipv4Addr) -> Option<IpConfig> {
        self.configs.read().iter().find(|c| c.contains(dest)).copied()
    }

    /// Determine the next hop for a destination IP
    ///
    /// # Returns
    /// - `Some(ip)` - the destination itself when on a local subnet, otherwise the first gateway
    /// - `None` - No route available
    pub fn next_hop(&self, dest: Ipv4Addr) -> Option<Ipv4Addr> {
        let configs = self.configs.read();
        if configs.iter().any(|c| c.contains(dest)) {
            return Some(dest);
        }
        configs.iter().find_map(|c| c.gateway)
    }

    pub fn len(&self) -> usize {
        self.configs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.read().is_empty()
    }
}

impl Default for Ipv4ConfigTable {
    fn default() -> Self {
        Self::new()
    }
}
