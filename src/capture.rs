//! Sequential reader over classic pcap and pcapng capture files.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use failure::{format_err, Error, ResultExt};
use pcap_parser::{
    create_reader, traits::PcapReaderIterator, Block, Linktype, PcapBlockOwned, PcapError,
};

use crate::frame::DecodedPacket;

/// Holds a whole record at the 262144 byte snaplen of tcpdump and friends, with room to spare.
const BUFFER_SIZE: usize = 1 << 20;

const NANOSECOND_MAGIC: [u32; 2] = [0xa1b2_3c4d, 0x4d3c_b2a1];

/// One captured frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    /// seconds since epoch.
    pub timestamp: f64,
    pub linktype: Linktype,
    pub data: Vec<u8>,
}

impl Record {
    /// Decodes the frame if it is an Ethernet frame carrying IPv4.
    pub fn decode(&self) -> Option<DecodedPacket> {
        if self.linktype != Linktype::ETHERNET {
            trace!(
                "skip frame at {} with link type {:?}",
                self.timestamp,
                self.linktype
            );

            return None;
        }

        crate::packet::decode(self.timestamp, &self.data)
    }
}

#[derive(Clone, Copy, Debug)]
struct Interface {
    linktype: Linktype,
    /// timestamp units per second.
    units: f64,
}

#[derive(Debug, Default)]
struct Interfaces {
    legacy: Option<Interface>,
    ng: Vec<Interface>,
}

impl Interfaces {
    fn visit(&mut self, block: PcapBlockOwned) -> Result<Option<Record>, Error> {
        match block {
            PcapBlockOwned::LegacyHeader(header) => {
                let nanosecond = NANOSECOND_MAGIC.contains(&header.magic_number);

                debug!(
                    "pcap {}.{}, link type {:?}, {} timestamps",
                    header.version_major,
                    header.version_minor,
                    header.network,
                    if nanosecond { "nanosecond" } else { "microsecond" }
                );

                self.legacy = Some(Interface {
                    linktype: header.network,
                    units: if nanosecond { 1e9 } else { 1e6 },
                });

                Ok(None)
            }
            PcapBlockOwned::Legacy(packet) => {
                let interface = self
                    .legacy
                    .ok_or_else(|| format_err!("pcap record before file header"))?;

                let fraction = f64::from(packet.ts_usec) / interface.units;

                Ok(Some(Record {
                    timestamp: f64::from(packet.ts_sec) + fraction,
                    linktype: interface.linktype,
                    data: packet.data.to_vec(),
                }))
            }
            PcapBlockOwned::NG(Block::SectionHeader(_)) => {
                self.ng.clear();

                Ok(None)
            }
            PcapBlockOwned::NG(Block::InterfaceDescription(idb)) => {
                // pcap-parser reports microseconds when the option is absent
                debug!(
                    "pcapng interface #{}, link type {:?}, tsresol {:#x}",
                    self.ng.len(),
                    idb.linktype,
                    idb.if_tsresol
                );

                self.ng.push(Interface {
                    linktype: idb.linktype,
                    units: ts_units(idb.if_tsresol),
                });

                Ok(None)
            }
            PcapBlockOwned::NG(Block::EnhancedPacket(epb)) => {
                let interface = *self
                    .ng
                    .get(epb.if_id as usize)
                    .ok_or_else(|| format_err!("packet on unknown interface #{}", epb.if_id))?;
                let ts = (u64::from(epb.ts_high) << 32) | u64::from(epb.ts_low);
                let caplen = (epb.caplen as usize).min(epb.data.len());

                Ok(Some(Record {
                    timestamp: ts as f64 / interface.units,
                    linktype: interface.linktype,
                    data: epb.data[..caplen].to_vec(),
                }))
            }
            PcapBlockOwned::NG(_) => {
                trace!("skip pcapng block without timestamped packet");

                Ok(None)
            }
        }
    }
}

/// `if_tsresol`: the high bit selects a power of two, otherwise a power of ten.
fn ts_units(tsresol: u8) -> f64 {
    let exp = i32::from(tsresol & 0x7f);

    if tsresol & 0x80 == 0 {
        10f64.powi(exp)
    } else {
        2f64.powi(exp)
    }
}

/// Iterates the frames of a capture in file order.
///
/// Any container error ends the iteration after being yielded once.
pub struct Capture {
    reader: Box<dyn PcapReaderIterator>,
    interfaces: Interfaces,
    done: bool,
}

impl Capture {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        let file =
            File::open(path).with_context(|_| format!("fail to open `{}`", path.display()))?;

        debug!("reading capture `{}`", path.display());

        Capture::new(file)
            .with_context(|_| format!("fail to read `{}`", path.display()))
            .map_err(Error::from)
    }

    pub fn new<R: Read + 'static>(reader: R) -> Result<Self, Error> {
        let reader = create_reader(BUFFER_SIZE, reader)
            .map_err(|err| format_err!("unrecognized capture format: {:?}", err))?;

        Ok(Capture {
            reader,
            interfaces: Interfaces::default(),
            done: false,
        })
    }
}

impl Iterator for Capture {
    type Item = Result<Record, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut incomplete = false;

        while !self.done {
            let err = match self.reader.next() {
                Ok((offset, block)) => {
                    incomplete = false;

                    let record = self.interfaces.visit(block);

                    self.reader.consume(offset);

                    match record {
                        Ok(Some(record)) => return Some(Ok(record)),
                        Ok(None) => continue,
                        Err(err) => err,
                    }
                }
                Err(PcapError::Eof) => {
                    self.done = true;

                    continue;
                }
                Err(PcapError::Incomplete { .. }) if !incomplete => {
                    incomplete = true;

                    match self.reader.refill() {
                        Ok(()) => continue,
                        Err(err) => format_err!("fail to read capture: {:?}", err),
                    }
                }
                Err(PcapError::Incomplete { .. }) => format_err!("truncated capture"),
                Err(err) => format_err!("malformed capture: {:?}", err),
            };

            self.done = true;

            return Some(Err(err));
        }

        None
    }
}
