//! Network stack implementation

pub mod address_map;
pub mod buffer;
pub mod dispatch;
pub mod ethernet;
pub mod ipv4;
pub mod loopback;
pub mod stack;
