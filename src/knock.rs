//! Port-knock sequence catalog and the per host pair sliding-window detector.
//!
//! Detection is a batch operation: every TCP connection attempt of a capture is first
//! appended to the [`HostPairLog`] of its (source, destination) pair, and only then is each
//! pair's history matched against every [`KnockDefinition`] of the [`Catalog`].
//!
//! The packets must arrive in capture order with non-decreasing timestamps. The detector
//! does not sort them; a log with timestamps going backwards is reported with a warning and
//! its windows are evaluated as they stand.

use std::collections::HashMap;
use std::net::Ipv4Addr;

use failure::Error;

use crate::errors::ConfigError;
use crate::frame::{DecodedPacket, Transport};

/// A named knock sequence.
#[derive(Clone, Debug, PartialEq)]
pub struct KnockDefinition {
    pub name: String,
    /// destination ports in the required knock order, never empty.
    pub ports: Vec<u16>,
    /// maximum seconds between the first and the last knock, inclusive.
    pub timeout: f64,
}

impl KnockDefinition {
    pub fn new<S: Into<String>>(name: S, ports: Vec<u16>, timeout: f64) -> Self {
        KnockDefinition {
            name: name.into(),
            ports,
            timeout,
        }
    }

    /// Returns the first-knock timestamp of every window of `knocks` matching this sequence.
    ///
    /// Windows are contiguous and may overlap; each match is reported.
    pub fn matches(&self, knocks: &[Knock]) -> Vec<f64> {
        if self.ports.is_empty() {
            return vec![];
        }

        knocks
            .windows(self.ports.len())
            .filter(|window| {
                window
                    .iter()
                    .map(|knock| knock.port)
                    .eq(self.ports.iter().cloned())
            })
            .filter_map(|window| match (window.first(), window.last()) {
                (Some(first), Some(last)) if last.timestamp - first.timestamp <= self.timeout => {
                    Some(first.timestamp)
                }
                _ => None,
            })
            .collect()
    }
}

/// Knock definitions keyed by unique name, kept in configuration order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Catalog {
    definitions: Vec<KnockDefinition>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, definition: KnockDefinition) -> Result<(), Error> {
        if self.get(&definition.name).is_some() {
            return Err(ConfigError::DuplicateDefinition(definition.name).into());
        }

        self.definitions.push(definition);

        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&KnockDefinition> {
        self.definitions.iter().find(|d| d.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &KnockDefinition> {
        self.definitions.iter()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HostPair {
    pub source: Ipv4Addr,
    pub destination: Ipv4Addr,
}

/// One TCP connection attempt.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Knock {
    pub timestamp: f64,
    pub port: u16,
}

/// Chronological TCP connection attempts per host pair, pairs kept in first-seen order.
#[derive(Clone, Debug, Default)]
pub struct HostPairLog {
    index: HashMap<HostPair, usize>,
    pairs: Vec<(HostPair, Vec<Knock>)>,
    out_of_order: usize,
}

impl HostPairLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a TCP packet to its host pair, ignoring anything else.
    pub fn record(&mut self, packet: &DecodedPacket) -> bool {
        let port = match packet.transport {
            Transport::Tcp { dest_port, .. } => dest_port,
            Transport::Udp { .. } | Transport::Other => return false,
        };

        let pair = HostPair {
            source: packet.source,
            destination: packet.destination,
        };
        let pairs = &mut self.pairs;
        let idx = *self.index.entry(pair).or_insert_with(|| {
            pairs.push((pair, vec![]));
            pairs.len() - 1
        });
        let knocks = &mut self.pairs[idx].1;

        if knocks
            .last()
            .map_or(false, |last| packet.timestamp < last.timestamp)
        {
            trace!(
                "{} -> {} went back in time at {}",
                pair.source,
                pair.destination,
                packet.timestamp
            );

            self.out_of_order += 1;
        }

        knocks.push(Knock {
            timestamp: packet.timestamp,
            port,
        });

        true
    }

    pub fn iter(&self) -> impl Iterator<Item = (&HostPair, &[Knock])> {
        self.pairs
            .iter()
            .map(|(pair, knocks)| (pair, knocks.as_slice()))
    }

    pub fn get(&self, pair: &HostPair) -> Option<&[Knock]> {
        self.index
            .get(pair)
            .map(|&idx| self.pairs[idx].1.as_slice())
    }

    /// Number of host pairs seen.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Number of attempts recorded with a timestamp earlier than their predecessor's.
    pub fn out_of_order(&self) -> usize {
        self.out_of_order
    }

    /// Matches every host pair against every catalog entry.
    ///
    /// Events are ordered by host pair (first seen), then catalog entry, then window start.
    pub fn detect(&self, catalog: &Catalog) -> Vec<DetectionEvent> {
        if self.out_of_order > 0 {
            warn!(
                "{} connection attempts are out of chronological order, knock timeouts may be misjudged",
                self.out_of_order
            );
        }

        let mut events = vec![];

        for (pair, knocks) in self.iter() {
            debug!(
                "{} -> {}: {} connection attempts",
                pair.source,
                pair.destination,
                knocks.len()
            );

            for definition in catalog.iter() {
                for timestamp in definition.matches(knocks) {
                    events.push(DetectionEvent {
                        name: definition.name.clone(),
                        source: pair.source,
                        destination: pair.destination,
                        timestamp,
                    });
                }
            }
        }

        events
    }
}

/// A knock sequence observed between two hosts.
#[derive(Clone, Debug, PartialEq)]
pub struct DetectionEvent {
    pub name: String,
    pub source: Ipv4Addr,
    pub destination: Ipv4Addr,
    /// timestamp of the first knock of the sequence.
    pub timestamp: f64,
}

/// Runs knock detection over a time-ordered packet sequence.
pub fn detect<'a, I>(packets: I, catalog: &Catalog) -> Vec<DetectionEvent>
where
    I: IntoIterator<Item = &'a DecodedPacket>,
{
    let mut log = HostPairLog::new();

    for packet in packets {
        log.record(packet);
    }

    log.detect(catalog)
}
