//Ethernet Frame Layer (OSI Layer 2)
//
//Bounds-checked views over raw frames. The dispatcher only ever needs the
//header, so nothing here copies or parses the payload.
//Frame structure: [Dest MAC (6)][Src MAC (6)][EtherType (2)][Payload (46-1500)][CRC (4)]

use core::fmt;

/// EtherType constants
pub const ETHERTYPE_IPV4: u16 = 0x0800;
pub const ETHERTYPE_ARP: u16 = 0x0806;
pub const ETHERTYPE_IPV6: u16 = 0x86DD;

/// Broadcast MAC address (FF:FF:FF:FF:FF:FF)
pub const BROADCAST_MAC: [u8; 6] = [0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF];

/// Ethernet frame header size (excluding CRC)
pub const HEADER_SIZE: usize = 14;

/// Offset of the EtherType field
const ETHERTYPE_OFFSET: usize = 12;

/// Errors raised while reading a received frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    /// Driver signalled a receive without handing over any data
    NoData,
    /// Frame is too short to contain an Ethernet header
    TooShort { len: usize },
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::NoData => write!(f, "Packet data null"),
            FrameError::TooShort { len } => {
                write!(f, "Frame too short: {} bytes, need {}", len, HEADER_SIZE)
            }
        }
    }
}

/// Link-layer protocol carried by a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EtherType {
    Arp,
    Ipv4,
    Unknown(u16),
}

impl EtherType {
    pub fn value(self) -> u16 {
        match self {
            EtherType::Arp => ETHERTYPE_ARP,
            EtherType::Ipv4 => ETHERTYPE_IPV4,
            EtherType::Unknown(raw) => raw,
        }
    }
}

impl From<u16> for EtherType {
    fn from(raw: u16) -> Self {
        match raw {
            ETHERTYPE_ARP => EtherType::Arp,
            ETHERTYPE_IPV4 => EtherType::Ipv4,
            other => EtherType::Unknown(other),
        }
    }
}

impl fmt::Display for EtherType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EtherType::Arp => write!(f, "ARP"),
            EtherType::Ipv4 => write!(f, "IPv4"),
            EtherType::Unknown(raw) => write!(f, "0x{:04X}", raw),
        }
    }
}

fn header(frame: &[u8]) -> Result<&[u8; HEADER_SIZE], FrameError> {
    frame
        .get(..HEADER_SIZE)
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or(FrameError::TooShort { len: frame.len() })
}

/// Read the EtherType field (bytes 12-13, big-endian)
pub fn ethertype(frame: &[u8]) -> Result<EtherType, FrameError> {
    let header = header(frame)?;
    let raw = u16::from_be_bytes([header[ETHERTYPE_OFFSET], header[ETHERTYPE_OFFSET + 1]]);
    Ok(EtherType::from(raw))
}

/// Destination MAC address (bytes 0-5)
pub fn dest_mac(frame: &[u8]) -> Result<[u8; 6], FrameError> {
    let header = header(frame)?;
    let mut mac = [0u8; 6];
    mac.copy_from_slice(&header[0..6]);
    Ok(mac)
}

/// Source MAC address (bytes 6-11)
pub fn src_mac(frame: &[u8]) -> Result<[u8; 6], FrameError> {
    let header = header(frame)?;
    let mut mac = [0u8; 6];
    mac.copy_from_slice(&header[6..12]);
    Ok(mac)
}

/// Check if the frame is addressed to every station
pub fn is_broadcast(frame: &[u8]) -> Result<bool, FrameError> {
    Ok(dest_mac(frame)? == BROADCAST_MAC)
}

/// Format a MAC address for display
pub struct MacDisplay(pub [u8; 6]);

impl fmt::Display for MacDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mac = self.0;
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            mac[0], mac[1], mac[2], mac[3], mac[4], mac[5]
        )
    }
}
