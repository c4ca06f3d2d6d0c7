//! Frame and capture builders shared by the unit tests.

pub const CLIENT: [u8; 4] = [192, 168, 1, 10];
pub const SERVER: [u8; 4] = [192, 168, 1, 1];

pub const ETHERTYPE_IPV4: u16 = 0x0800;
pub const PROTO_TCP: u8 = 6;
pub const PROTO_UDP: u8 = 17;

pub fn ethernet(ethertype: u16, payload: &[u8]) -> Vec<u8> {
    let mut frame = vec![
        0x00, 0x11, 0x22, 0x33, 0x44, 0x55, // destination
        0x66, 0x77, 0x88, 0x99, 0xaa, 0xbb, // source
    ];
    frame.extend_from_slice(&ethertype.to_be_bytes());
    frame.extend_from_slice(payload);
    frame
}

pub fn ipv4(protocol: u8, source: [u8; 4], destination: [u8; 4], payload: &[u8]) -> Vec<u8> {
    let total_len = (20 + payload.len()) as u16;

    let mut packet = vec![0x45, 0x00];
    packet.extend_from_slice(&total_len.to_be_bytes());
    packet.extend_from_slice(&[0x00, 0x01, 0x40, 0x00, 64, protocol, 0x00, 0x00]);
    packet.extend_from_slice(&source);
    packet.extend_from_slice(&destination);
    packet.extend_from_slice(payload);
    packet
}

pub fn tcp(dest_port: u16, flags: u8) -> Vec<u8> {
    let mut segment = vec![0xc0, 0x01];
    segment.extend_from_slice(&dest_port.to_be_bytes());
    segment.extend_from_slice(&[0, 0, 0, 1, 0, 0, 0, 0, 0x50, flags, 0xff, 0xff, 0, 0, 0, 0]);
    segment
}

pub fn udp(dest_port: u16) -> Vec<u8> {
    let mut datagram = vec![0xc0, 0x02];
    datagram.extend_from_slice(&dest_port.to_be_bytes());
    datagram.extend_from_slice(&[0x00, 0x08, 0x00, 0x00]);
    datagram
}

pub fn tcp_frame(source: [u8; 4], destination: [u8; 4], dest_port: u16, flags: u8) -> Vec<u8> {
    ethernet(
        ETHERTYPE_IPV4,
        &ipv4(PROTO_TCP, source, destination, &tcp(dest_port, flags)),
    )
}

pub fn udp_frame(source: [u8; 4], destination: [u8; 4], dest_port: u16) -> Vec<u8> {
    ethernet(
        ETHERTYPE_IPV4,
        &ipv4(PROTO_UDP, source, destination, &udp(dest_port)),
    )
}

pub const SNAPLEN: u32 = 262_144;

const MICROSECOND_MAGIC: u32 = 0xa1b2_c3d4;
const NANOSECOND_MAGIC: u32 = 0xa1b2_3c4d;

#[derive(Clone, Copy, Debug)]
pub enum Endian {
    Little,
    Big,
}

impl Endian {
    fn u16(self, n: u16) -> [u8; 2] {
        match self {
            Endian::Little => n.to_le_bytes(),
            Endian::Big => n.to_be_bytes(),
        }
    }

    fn u32(self, n: u32) -> [u8; 4] {
        match self {
            Endian::Little => n.to_le_bytes(),
            Endian::Big => n.to_be_bytes(),
        }
    }
}

/// A little-endian classic pcap file with microsecond timestamps.
pub fn pcap(linktype: u32, records: &[(u32, u32, Vec<u8>)]) -> Vec<u8> {
    classic_pcap(Endian::Little, MICROSECOND_MAGIC, linktype, records)
}

/// A classic pcap file whose records carry nanoseconds in the fraction field.
pub fn pcap_ns(endian: Endian, linktype: u32, records: &[(u32, u32, Vec<u8>)]) -> Vec<u8> {
    classic_pcap(endian, NANOSECOND_MAGIC, linktype, records)
}

fn classic_pcap(
    endian: Endian,
    magic: u32,
    linktype: u32,
    records: &[(u32, u32, Vec<u8>)],
) -> Vec<u8> {
    let mut file = vec![];

    file.extend_from_slice(&endian.u32(magic));
    file.extend_from_slice(&endian.u16(2));
    file.extend_from_slice(&endian.u16(4));
    file.extend_from_slice(&endian.u32(0));
    file.extend_from_slice(&endian.u32(0));
    file.extend_from_slice(&endian.u32(SNAPLEN));
    file.extend_from_slice(&endian.u32(linktype));

    for (ts_sec, ts_frac, data) in records {
        let len = data.len() as u32;

        file.extend_from_slice(&endian.u32(*ts_sec));
        file.extend_from_slice(&endian.u32(*ts_frac));
        file.extend_from_slice(&endian.u32(len));
        file.extend_from_slice(&endian.u32(len));
        file.extend_from_slice(data);
    }

    file
}

/// A little-endian pcapng file with a single section.
///
/// `interfaces` are `(linktype, if_tsresol)`, the option omitted when `None`.
/// `packets` are `(if_id, timestamp in interface units, data)`.
pub fn pcapng(interfaces: &[(u16, Option<u8>)], packets: &[(u32, u64, Vec<u8>)]) -> Vec<u8> {
    let mut file = vec![];

    let mut shb = vec![];
    shb.extend_from_slice(&0x1a2b_3c4du32.to_le_bytes());
    shb.extend_from_slice(&1u16.to_le_bytes());
    shb.extend_from_slice(&0u16.to_le_bytes());
    shb.extend_from_slice(&(-1i64).to_le_bytes());
    pcapng_block(&mut file, 0x0a0d_0d0a, &shb);

    for &(linktype, tsresol) in interfaces {
        let mut idb = vec![];
        idb.extend_from_slice(&linktype.to_le_bytes());
        idb.extend_from_slice(&0u16.to_le_bytes());
        idb.extend_from_slice(&SNAPLEN.to_le_bytes());
        if let Some(tsresol) = tsresol {
            // if_tsresol, padded to 32 bits, then opt_endofopt
            idb.extend_from_slice(&9u16.to_le_bytes());
            idb.extend_from_slice(&1u16.to_le_bytes());
            idb.extend_from_slice(&[tsresol, 0, 0, 0]);
            idb.extend_from_slice(&[0, 0, 0, 0]);
        }
        pcapng_block(&mut file, 1, &idb);
    }

    for &(if_id, ts, ref data) in packets {
        let len = data.len() as u32;

        let mut epb = vec![];
        epb.extend_from_slice(&if_id.to_le_bytes());
        epb.extend_from_slice(&((ts >> 32) as u32).to_le_bytes());
        epb.extend_from_slice(&(ts as u32).to_le_bytes());
        epb.extend_from_slice(&len.to_le_bytes());
        epb.extend_from_slice(&len.to_le_bytes());
        epb.extend_from_slice(data);
        epb.resize((epb.len() + 3) & !3, 0);
        pcapng_block(&mut file, 6, &epb);
    }

    file
}

fn pcapng_block(file: &mut Vec<u8>, block_type: u32, body: &[u8]) {
    let len = (12 + body.len()) as u32;

    file.extend_from_slice(&block_type.to_le_bytes());
    file.extend_from_slice(&len.to_le_bytes());
    file.extend_from_slice(body);
    file.extend_from_slice(&len.to_le_bytes());
}
