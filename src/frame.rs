use std::net::Ipv4Addr;

/// The header fields of one captured IPv4 frame that the analyses need.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedPacket {
    /// seconds since epoch, as supplied by the capture source.
    pub timestamp: f64,
    pub source: Ipv4Addr,
    pub destination: Ipv4Addr,
    pub transport: Transport,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Transport {
    Tcp { flags: u8, dest_port: u16 },
    Udp { dest_port: u16 },
    /// any other protocol, a non-first fragment or a truncated transport header.
    Other,
}

impl DecodedPacket {
    pub fn tcp_flags(&self) -> Option<u8> {
        match self.transport {
            Transport::Tcp { flags, .. } => Some(flags),
            Transport::Udp { .. } | Transport::Other => None,
        }
    }

    pub fn dest_port(&self) -> Option<u16> {
        match self.transport {
            Transport::Tcp { dest_port, .. } | Transport::Udp { dest_port } => Some(dest_port),
            Transport::Other => None,
        }
    }
}
