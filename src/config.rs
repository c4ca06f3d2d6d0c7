/// Name of the section whose options every other section inherits.
pub const DEFAULT_SECTION: &str = "DEFAULT";

/// An INI style configuration file, sections and options kept in file order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Config {
    pub defaults: Vec<(String, String)>,
    pub sections: Vec<Section>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Section {
    pub name: String,
    /// options with lower-cased keys and trimmed values.
    pub options: Vec<(String, String)>,
}

impl Config {
    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    /// Looks up an option of a section, falling back to the `[DEFAULT]` section.
    pub fn get<'a>(&'a self, section: &'a Section, key: &str) -> Option<&'a str> {
        section.get(key).or_else(|| lookup(&self.defaults, key))
    }
}

impl Section {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Section {
            name: name.into(),
            options: vec![],
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        lookup(&self.options, key)
    }

    pub fn with_option<K: AsRef<str>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.options.push((key.as_ref().to_lowercase(), value.into()));
        self
    }
}

fn lookup<'a>(options: &'a [(String, String)], key: &str) -> Option<&'a str> {
    let key = key.to_lowercase();

    options
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v.as_str())
}
