use crate::frame::{DecodedPacket, Transport};

/// TCP header flag bits.
pub mod flags {
    pub const FIN: u8 = 0b0000_0001;
    pub const SYN: u8 = 0b0000_0010;
    pub const RST: u8 = 0b0000_0100;
    pub const PSH: u8 = 0b0000_1000;
    pub const ACK: u8 = 0b0001_0000;
    pub const URG: u8 = 0b0010_0000;
    pub const ECE: u8 = 0b0100_0000;
    pub const CWR: u8 = 0b1000_0000;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScanCategory {
    /// no flag set
    Null,
    /// FIN, PSH and URG set
    Xmas,
    /// any UDP datagram
    Udp,
    /// bare SYN
    HalfOpen,
    /// SYN and ACK
    Connect,
}

impl ScanCategory {
    /// Report order.
    pub const ALL: [ScanCategory; 5] = [
        ScanCategory::Null,
        ScanCategory::Xmas,
        ScanCategory::Udp,
        ScanCategory::HalfOpen,
        ScanCategory::Connect,
    ];
}

const XMAS: u8 = flags::FIN | flags::PSH | flags::URG;
const SYN_ACK: u8 = flags::SYN | flags::ACK;

/// Classifies a TCP flag byte.
///
/// This is an exact match on the whole byte: any extra bit, e.g. `SYN|ACK|ECE`,
/// falls outside every category.
pub fn classify(flags: u8) -> Option<ScanCategory> {
    match flags {
        0 => Some(ScanCategory::Null),
        XMAS => Some(ScanCategory::Xmas),
        flags::SYN => Some(ScanCategory::HalfOpen),
        SYN_ACK => Some(ScanCategory::Connect),
        _ => None,
    }
}

/// Per-category packet counters for one capture.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScanTally {
    pub null: usize,
    pub xmas: usize,
    pub udp: usize,
    pub half_open: usize,
    pub connect: usize,
}

impl ScanTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one packet into the tally, returning the category it was counted in.
    pub fn observe(&mut self, packet: &DecodedPacket) -> Option<ScanCategory> {
        let category = match packet.transport {
            Transport::Tcp { flags, .. } => classify(flags),
            Transport::Udp { .. } => Some(ScanCategory::Udp),
            Transport::Other => None,
        };

        if let Some(category) = category {
            *self.counter_mut(category) += 1;
        }

        category
    }

    pub fn count(&self, category: ScanCategory) -> usize {
        match category {
            ScanCategory::Null => self.null,
            ScanCategory::Xmas => self.xmas,
            ScanCategory::Udp => self.udp,
            ScanCategory::HalfOpen => self.half_open,
            ScanCategory::Connect => self.connect,
        }
    }

    pub fn total(&self) -> usize {
        ScanCategory::ALL.iter().map(|&c| self.count(c)).sum()
    }

    fn counter_mut(&mut self, category: ScanCategory) -> &mut usize {
        match category {
            ScanCategory::Null => &mut self.null,
            ScanCategory::Xmas => &mut self.xmas,
            ScanCategory::Udp => &mut self.udp,
            ScanCategory::HalfOpen => &mut self.half_open,
            ScanCategory::Connect => &mut self.connect,
        }
    }
}
