use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// A mergeable mapping from property keys to ordered lists of string values.
///
/// One type serves the three configuration roles in the repository: named
/// shared groups, the static metadata context threaded through compilation,
/// and the configuration bound to each compiled task and condition.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Configuration {
    properties: AHashMap<String, Vec<String>>,
}

impl Configuration {
    pub fn new() -> Self {
        Self {
            properties: AHashMap::new(),
        }
    }

    /// Builds a configuration from `(key, value)` pairs, appending in order.
    pub fn from_properties<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut config = Self::new();
        for (key, value) in pairs {
            config.add(key, value);
        }
        config
    }

    /// Appends a value to the list stored under `key`.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.properties
            .entry(key.into())
            .or_default()
            .push(value.into());
    }

    /// Replaces the whole value list stored under `key`.
    pub fn replace(&mut self, key: impl Into<String>, values: Vec<String>) {
        self.properties.insert(key.into(), values);
    }

    /// Returns the first value stored under `key`, if any.
    pub fn first(&self, key: &str) -> Option<&str> {
        self.properties
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Returns every value stored under `key`.
    pub fn all(&self, key: &str) -> Option<&[String]> {
        self.properties.get(key).map(Vec::as_slice)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.properties.keys()
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Overlays `other` onto `self`. On key collision the incoming value
    /// list wins wholesale; value lists are never spliced together.
    pub fn merge(&mut self, other: &Configuration) {
        for (key, values) in &other.properties {
            self.properties.insert(key.clone(), values.clone());
        }
    }
}

/// Replaces `[VAR]` segments in `value` with the process environment value
/// of `VAR`. Segments naming an unset variable are left untouched.
pub(crate) fn replace_env_variables(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(open) = rest.find('[') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find(']') else {
            out.push('[');
            rest = after;
            continue;
        };
        let var = &after[..close];
        match std::env::var(var) {
            Ok(resolved) => out.push_str(&resolved),
            Err(_) => {
                out.push('[');
                out.push_str(var);
                out.push(']');
            }
        }
        rest = &after[close + 1..];
    }
    out.push_str(rest);
    out
}
