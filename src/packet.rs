use failure::Error;

use pnet::packet::{
    ethernet::{EtherType, EtherTypes, EthernetPacket},
    ip::IpNextHeaderProtocols,
    ipv4::Ipv4Packet,
    tcp::TcpPacket,
    udp::UdpPacket,
    vlan::VlanPacket,
    Packet,
};

use crate::errors::DecodeError;
use crate::frame::{DecodedPacket, Transport};

const IPV4_MIN_HEADER_LEN: usize = 20;

impl DecodedPacket {
    /// Decodes an Ethernet frame.
    ///
    /// Returns `Ok(None)` for frames not carrying IPv4, and an error when a header is truncated.
    pub fn extract(timestamp: f64, frame: &[u8]) -> Result<Option<Self>, Error> {
        let packet = EthernetPacket::new(frame).ok_or(DecodeError::Truncated("ethernet"))?;

        visit_ethernet(timestamp, packet.get_ethertype(), packet.payload())
    }
}

/// Decodes an Ethernet frame, skipping anything that is not a well-formed IPv4 packet.
pub fn decode(timestamp: f64, frame: &[u8]) -> Option<DecodedPacket> {
    match DecodedPacket::extract(timestamp, frame) {
        Ok(packet) => packet,
        Err(err) => {
            trace!("skip frame at {}: {}", timestamp, err);

            None
        }
    }
}

fn visit_ethernet(
    timestamp: f64,
    ethertype: EtherType,
    payload: &[u8],
) -> Result<Option<DecodedPacket>, Error> {
    match ethertype {
        EtherTypes::Vlan | EtherTypes::PBridge | EtherTypes::QinQ => {
            let packet = VlanPacket::new(payload).ok_or(DecodeError::Truncated("vlan"))?;

            visit_ethernet(timestamp, packet.get_ethertype(), packet.payload())
        }

        EtherTypes::Ipv4 => {
            let packet = Ipv4Packet::new(payload).ok_or(DecodeError::Truncated("ipv4"))?;

            visit_ipv4(timestamp, packet).map(Some)
        }

        ty => {
            trace!("skip non-IPv4 frame at {}: {}", timestamp, ty);

            Ok(None)
        }
    }
}

fn visit_ipv4(timestamp: f64, packet: Ipv4Packet) -> Result<DecodedPacket, Error> {
    let header_len = usize::from(packet.get_header_length()) * 4;

    if header_len < IPV4_MIN_HEADER_LEN || header_len > packet.packet().len() {
        return Err(DecodeError::BadHeaderLength(header_len).into());
    }

    let protocol = packet.get_next_level_protocol();
    let payload = packet.payload();

    let transport = if packet.get_fragment_offset() > 0 {
        None
    } else if protocol == IpNextHeaderProtocols::Tcp {
        TcpPacket::new(payload).map(|tcp| Transport::Tcp {
            flags: tcp.get_flags(),
            dest_port: tcp.get_destination(),
        })
    } else if protocol == IpNextHeaderProtocols::Udp {
        UdpPacket::new(payload).map(|udp| Transport::Udp {
            dest_port: udp.get_destination(),
        })
    } else {
        Some(Transport::Other)
    };

    let transport = transport.unwrap_or_else(|| {
        trace!(
            "no {} header in packet at {}, {} bytes payload, fragment offset {}",
            protocol,
            timestamp,
            payload.len(),
            packet.get_fragment_offset()
        );

        Transport::Other
    });

    Ok(DecodedPacket {
        timestamp,
        source: packet.get_source(),
        destination: packet.get_destination(),
        transport,
    })
}
