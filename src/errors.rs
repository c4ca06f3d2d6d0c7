use failure::Fail;

/// A single frame that could not be decoded.
///
/// Recovered locally: the frame is skipped and the run continues.
#[derive(Debug, Fail, PartialEq)]
pub enum DecodeError {
    #[fail(display = "{} packet too short", _0)]
    Truncated(&'static str),

    #[fail(display = "invalid IPv4 header length: {}", _0)]
    BadHeaderLength(usize),
}

/// A malformed knock configuration, fatal at startup.
#[derive(Debug, Fail, PartialEq)]
pub enum ConfigError {
    #[fail(display = "line {}: option outside of any section: {}", line, content)]
    MissingSectionHeader { line: usize, content: String },

    #[fail(display = "line {}: unexpected content: {}", line, content)]
    Syntax { line: usize, content: String },

    #[fail(display = "line {}: section `{}` already exists", line, section)]
    DuplicateSection { line: usize, section: String },

    #[fail(
        display = "line {}: option `{}` in section `{}` already exists",
        line, option, section
    )]
    DuplicateOption {
        line: usize,
        section: String,
        option: String,
    },

    #[fail(display = "section `{}`: invalid `sequence`: {}", section, value)]
    InvalidSequence { section: String, value: String },

    #[fail(display = "section `{}`: invalid `seq_timeout`: {}", section, value)]
    InvalidTimeout { section: String, value: String },

    #[fail(display = "knock sequence `{}` defined twice", _0)]
    DuplicateDefinition(String),
}
