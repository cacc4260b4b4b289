//! Address and device registries
//!
//! `AddressMap` answers "which device owns this address", `DeviceConfigTable`
//! answers "which configurations are bound to this device". `Registry` keeps
//! the two in step: a configuration is recorded in both or in neither.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use crate::drivers::net::DeviceHandle;
use crate::net::ipv4::{ConfigError, IpConfig, Ipv4Addr};

/// Address -> owning device, keyed by the address value
#[derive(Debug, Default)]
pub struct AddressMap {
    entries: BTreeMap<Ipv4Addr, DeviceHandle>,
}

impl AddressMap {
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Fails if another device already owns the address
    pub fn check(&self, ip: Ipv4Addr, device: &DeviceHandle) -> Result<(), ConfigError> {
        match self.entries.get(&ip) {
            Some(owner) if owner != device => Err(ConfigError::AddressInUse(ip)),
            _ => Ok(()),
        }
    }

    pub fn add(&mut self, ip: Ipv4Addr, device: DeviceHandle) -> Result<(), ConfigError> {
        self.check(ip, &device)?;
        self.entries.insert(ip, device);
        Ok(())
    }

    pub fn lookup(&self, ip: Ipv4Addr) -> Option<&DeviceHandle> {
        self.entries.get(&ip)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Device -> bound configurations (several per device for multi-homed hosts)
#[derive(Debug, Default)]
pub struct DeviceConfigTable {
    entries: BTreeMap<DeviceHandle, Vec<IpConfig>>,
}

impl DeviceConfigTable {
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    pub fn add(&mut self, device: DeviceHandle, config: IpConfig) {
        let configs = self.entries.entry(device).or_default();
        if !configs.contains(&config) {
            configs.push(config);
        }
    }

    pub fn lookup(&self, device: &DeviceHandle) -> &[IpConfig] {
        self.entries.get(device).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DeviceHandle, &[IpConfig])> {
        self.entries
            .iter()
            .map(|(device, configs)| (device, configs.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct Registry {
    pub addresses: AddressMap,
    pub devices: DeviceConfigTable,
}

impl Registry {
    pub const fn new() -> Self {
        Self {
            addresses: AddressMap::new(),
            devices: DeviceConfigTable::new(),
        }
    }

    /// Record `config` for `device` in both tables.
    ///
    /// Entries are never removed; a device given a new address keeps its old one.
    pub fn bind(&mut self, device: &DeviceHandle, config: IpConfig) -> Result<(), ConfigError> {
        self.addresses.check(config.ip_address, device)?;
        self.devices.add(device.clone(), config);
        self.addresses.add(config.ip_address, device.clone())
    }
}
