//! Rustrial network stack core
//!
//! Routes raw frames from registered network devices to protocol handlers,
//! binds IPv4 configuration to devices and drains outbound traffic on each tick.

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod logger;

//Network drivers
pub mod drivers;

//Networking infrastructure
pub mod net;

pub use drivers::net::{DeviceHandle, NetworkDevice, ReceiveHandler};
pub use net::ipv4::IpConfig;
pub use net::stack::{NetworkStack, StackError, StackSettings};
