use core::fmt;

use chrono::{Local, TimeZone};

const CTIME_FORMAT: &str = "%a %b %e %H:%M:%S %Y";

/// Formats a timestamp like C `ctime`, dropping fractional seconds.
pub fn ctime<Tz>(timestamp: f64, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    match tz.timestamp_opt(timestamp.floor() as i64, 0).single() {
        Some(datetime) => datetime.format(CTIME_FORMAT).to_string(),
        None => timestamp.to_string(),
    }
}

mod scan {
    use core::fmt;

    use crate::scan::{ScanCategory, ScanTally};

    impl fmt::Display for ScanCategory {
        fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
            use ScanCategory::*;

            f.write_str(match self {
                Null => "Null",
                Xmas => "XMAS",
                Udp => "UDP",
                HalfOpen => "Half-open",
                Connect => "Connect",
            })
        }
    }

    impl fmt::Display for ScanTally {
        fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
            for (i, &category) in ScanCategory::ALL.iter().enumerate() {
                if i > 0 {
                    f.write_str("\n")?;
                }

                write!(f, "{}: {}", category, self.count(category))?;
            }

            Ok(())
        }
    }
}

mod knock {
    use core::fmt;

    use chrono::TimeZone;

    use super::{ctime, Local};
    use crate::knock::{DetectionEvent, HostPair, KnockDefinition};

    impl DetectionEvent {
        /// Renders the event with its timestamp in the given time zone.
        pub fn render<Tz>(&self, tz: &Tz) -> String
        where
            Tz: TimeZone,
            Tz::Offset: fmt::Display,
        {
            format!(
                "Detected {} sequence from {} to {} at {}",
                self.name,
                self.source,
                self.destination,
                ctime(self.timestamp, tz)
            )
        }
    }

    impl fmt::Display for DetectionEvent {
        fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str(&self.render(&Local))
        }
    }

    impl fmt::Display for HostPair {
        fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
            write!(f, "{} -> {}", self.source, self.destination)
        }
    }

    impl fmt::Display for KnockDefinition {
        fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
            write!(f, "{} [", self.name)?;

            for (i, port) in self.ports.iter().enumerate() {
                if i > 0 {
                    f.write_str(",")?;
                }

                write!(f, "{}", port)?;
            }

            write!(f, "] within {}s", self.timeout)
        }
    }
}
