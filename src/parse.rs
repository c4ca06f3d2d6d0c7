use std::fs;
use std::path::Path;
use std::str::FromStr;

use failure::{Error, ResultExt};
use nom::{
    bytes::complete::{take_till1, take_while},
    character::complete::{char, digit1, multispace0, one_of},
    combinator::{all_consuming, map_res, opt, recognize, rest},
    multi::separated_list1,
    sequence::{delimited, pair, separated_pair},
    IResult,
};

use crate::{
    config::{Config, Section, DEFAULT_SECTION},
    errors::ConfigError,
    knock::{Catalog, KnockDefinition},
};

const SEQUENCE: &str = "sequence";
const SEQ_TIMEOUT: &str = "seq_timeout";

enum Target {
    Defaults,
    Section(usize),
}

impl Target {
    fn options<'a>(&self, config: &'a mut Config) -> (&'a str, &'a mut Vec<(String, String)>) {
        match *self {
            Target::Defaults => (DEFAULT_SECTION, &mut config.defaults),
            Target::Section(pos) => {
                let section = &mut config.sections[pos];

                (section.name.as_str(), &mut section.options)
            }
        }
    }
}

impl FromStr for Config {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut config = Config::default();
        let mut seen = vec![];
        let mut cur: Option<Target> = None;
        // indentation of the line that opened the last option
        let mut value_indent = None;

        for (idx, raw) in s.lines().enumerate() {
            let lineno = idx + 1;
            let line = raw.trim();

            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            let indent = raw.len() - raw.trim_start().len();

            if let (Some(level), Some(target)) = (value_indent, cur.as_ref()) {
                if indent > level {
                    let (section, options) = target.options(&mut config);

                    if let Some((key, value)) = options.last_mut() {
                        if !value.is_empty() {
                            value.push('\n');
                        }
                        value.push_str(line);

                        trace!("[{}] {} += {}", section, key, line);

                        continue;
                    }
                }
            }

            if let Ok((_, name)) = all_consuming(parse_section)(line) {
                if seen.contains(&name) {
                    return Err(ConfigError::DuplicateSection {
                        line: lineno,
                        section: name.to_owned(),
                    }
                    .into());
                }
                seen.push(name);

                cur = Some(if name == DEFAULT_SECTION {
                    Target::Defaults
                } else {
                    config.sections.push(Section::new(name));
                    Target::Section(config.sections.len() - 1)
                });
                value_indent = None;

                continue;
            }

            let (key, value) = match parse_option(line) {
                Ok((_, (key, value))) if !key.trim().is_empty() => {
                    (key.trim().to_lowercase(), value.trim().to_owned())
                }
                _ => {
                    return Err(ConfigError::Syntax {
                        line: lineno,
                        content: line.to_owned(),
                    }
                    .into())
                }
            };

            let (section, options) = match cur.as_ref() {
                Some(target) => target.options(&mut config),
                None => {
                    return Err(ConfigError::MissingSectionHeader {
                        line: lineno,
                        content: line.to_owned(),
                    }
                    .into())
                }
            };

            if options.iter().any(|(k, _)| *k == key) {
                return Err(ConfigError::DuplicateOption {
                    line: lineno,
                    section: section.to_owned(),
                    option: key,
                }
                .into());
            }

            trace!("[{}] {} = {}", section, key, value);

            options.push((key, value));
            value_indent = Some(indent);
        }

        Ok(config)
    }
}

impl Catalog {
    /// Builds the catalog from every section carrying both `sequence` and `seq_timeout`.
    ///
    /// Sections missing either option are not knock definitions and are skipped.
    pub fn load(config: &Config) -> Result<Self, Error> {
        let mut catalog = Catalog::new();

        for section in &config.sections {
            let (sequence, timeout) = match (
                config.get(section, SEQUENCE),
                config.get(section, SEQ_TIMEOUT),
            ) {
                (Some(sequence), Some(timeout)) => (sequence, timeout),
                _ => {
                    debug!("skip section `{}` without knock sequence", section.name);

                    continue;
                }
            };

            let ports = parse_sequence(sequence).ok_or_else(|| ConfigError::InvalidSequence {
                section: section.name.clone(),
                value: sequence.to_owned(),
            })?;
            let timeout = parse_timeout(timeout).ok_or_else(|| ConfigError::InvalidTimeout {
                section: section.name.clone(),
                value: timeout.to_owned(),
            })?;

            let definition = KnockDefinition::new(section.name.as_str(), ports, timeout);

            debug!("knock sequence {}", definition);

            catalog.insert(definition)?;
        }

        Ok(catalog)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|_| format!("fail to read `{}`", path.display()))?;

        content
            .parse::<Catalog>()
            .with_context(|_| format!("fail to load `{}`", path.display()))
            .map_err(Error::from)
    }
}

impl FromStr for Catalog {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Catalog::load(&s.parse::<Config>()?)
    }
}

fn parse_sequence(s: &str) -> Option<Vec<u16>> {
    all_consuming(parse_ports)(s).ok().map(|(_, ports)| ports)
}

fn parse_timeout(s: &str) -> Option<f64> {
    s.parse::<f64>()
        .ok()
        .filter(|timeout| timeout.is_finite() && *timeout >= 0.0)
}

fn parse_section(input: &str) -> IResult<&str, &str> {
    delimited(char('['), take_till1(|c: char| c == ']'), char(']'))(input)
}

fn parse_option(input: &str) -> IResult<&str, (&str, &str)> {
    separated_pair(
        take_while(|c: char| c != '=' && c != ':'),
        one_of("=:"),
        rest,
    )(input)
}

fn parse_ports(input: &str) -> IResult<&str, Vec<u16>> {
    separated_list1(
        char(','),
        delimited(
            multispace0,
            map_res(recognize(pair(opt(char('+')), digit1)), |s: &str| {
                s.trim_start_matches('+').parse::<u16>()
            }),
            multispace0,
        ),
    )(input)
}
