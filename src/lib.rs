#[macro_use]
extern crate log;

pub mod config;
pub mod errors;
pub mod frame;
pub mod knock;
pub mod scan;

#[cfg(feature = "capture")]
pub mod capture;
#[cfg(feature = "display")]
mod display;
#[cfg(feature = "packet")]
mod packet;
#[cfg(feature = "parse")]
mod parse;

#[cfg(test)]
mod testing;

#[cfg(feature = "display")]
pub use crate::display::ctime;
pub use crate::frame::{DecodedPacket, Transport};
pub use crate::knock::{detect, Catalog, DetectionEvent, HostPair, HostPairLog, KnockDefinition};
#[cfg(feature = "packet")]
pub use crate::packet::decode;
pub use crate::scan::{classify, ScanCategory, ScanTally};
