//! Ordered property sets.
//!
//! A [`Properties`] set maps dotted keys (`film.width`, `scene.object.kd`)
//! to lists of string values. Insertion order is preserved and setting an
//! existing key replaces its values in place, so merging several layers
//! yields a stable, reproducible configuration.
//!
//! The text format is one `key = value [value ...]` assignment per line.
//! Blank lines and lines starting with `#` are ignored, values are separated
//! by whitespace and double-quoted values may contain whitespace.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use crate::{Error, Result};

/// A named list of values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Property {
    name: String,
    values: Vec<String>,
}

impl Property {
    /// Create a property with no values.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: Vec::new(),
        }
    }

    /// Create a property holding a single value.
    pub fn with_value(name: impl Into<String>, value: impl ToString) -> Self {
        Self::new(name).push(value)
    }

    /// Create a property holding several values.
    pub fn with_values<I, V>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: ToString,
    {
        Self {
            name: name.into(),
            values: values.into_iter().map(|v| v.to_string()).collect(),
        }
    }

    /// Append a value.
    #[must_use]
    pub fn push(mut self, value: impl ToString) -> Self {
        self.values.push(value.to_string());
        self
    }

    /// The property key.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All values in order.
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// The value at `index`, if present.
    pub fn value(&self, index: usize) -> Option<&str> {
        self.values.get(index).map(String::as_str)
    }

    /// Number of values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the property has no values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Values joined with single spaces, quoting where needed.
    ///
    /// Quoted values escape `"` and `\` with a backslash.
    pub fn values_string(&self) -> String {
        self.values
            .iter()
            .map(|v| {
                if v.is_empty() || v.contains(|c: char| c.is_whitespace() || c == '"') {
                    let escaped = v.replace('\\', "\\\\").replace('"', "\\\"");
                    format!("\"{escaped}\"")
                } else {
                    v.clone()
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn invalid(&self, expected: &'static str) -> Error {
        Error::InvalidValue {
            key: self.name.clone(),
            value: self.values_string(),
            expected,
        }
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.name, self.values_string())
    }
}

/// An ordered set of properties.
#[derive(Clone, Debug, Default)]
pub struct Properties {
    entries: Vec<Property>,
    index: HashMap<String, usize>,
}

impl Properties {
    /// Create an empty property set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse property text.
    ///
    /// `source_name` is only used in error messages.
    pub fn parse_str(text: &str, source_name: &str) -> Result<Self> {
        let mut props = Self::new();
        for (line_index, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let parse_error = |message: &str| Error::Parse {
                source_name: source_name.to_string(),
                line: line_index + 1,
                message: message.to_string(),
            };

            let (key, value) = line
                .split_once('=')
                .ok_or_else(|| parse_error("expected `key = value`"))?;
            let key = key.trim();
            if key.is_empty() {
                return Err(parse_error("missing property name"));
            }
            if key.contains(char::is_whitespace) {
                return Err(parse_error("property name contains whitespace"));
            }

            let values = tokenize(value).map_err(parse_error)?;
            props.set(Property {
                name: key.to_string(),
                values,
            });
        }
        Ok(props)
    }

    /// Load a property file.
    pub fn load_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse_str(&text, &path.display().to_string())
    }

    /// Set a property, replacing the values of an existing key in place.
    pub fn set(&mut self, property: Property) -> &mut Self {
        if let Some(&slot) = self.index.get(&property.name) {
            self.entries[slot] = property;
        } else {
            self.index.insert(property.name.clone(), self.entries.len());
            self.entries.push(property);
        }
        self
    }

    /// Builder form of [`Properties::set`].
    #[must_use]
    pub fn with(mut self, property: Property) -> Self {
        self.set(property);
        self
    }

    /// Apply every property of `other` in its order. Keys in `other` win.
    pub fn merge(&mut self, other: &Self) -> &mut Self {
        for property in &other.entries {
            self.set(property.clone());
        }
        self
    }

    /// Look up a property.
    pub fn get(&self, name: &str) -> Option<&Property> {
        self.index.get(name).map(|&slot| &self.entries[slot])
    }

    /// Check if a key is present.
    pub fn is_defined(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Remove a property and return it.
    pub fn delete(&mut self, name: &str) -> Option<Property> {
        let slot = self.index.remove(name)?;
        let removed = self.entries.remove(slot);
        for position in self.index.values_mut() {
            if *position > slot {
                *position -= 1;
            }
        }
        Some(removed)
    }

    /// Number of properties.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(Property::name)
    }

    /// Properties in order.
    pub fn iter(&self) -> impl Iterator<Item = &Property> {
        self.entries.iter()
    }

    /// All properties whose key starts with `prefix`.
    pub fn with_prefix(&self, prefix: &str) -> Self {
        self.entries
            .iter()
            .filter(|p| p.name.starts_with(prefix))
            .cloned()
            .collect()
    }

    /// First value of `name` as a string, or `default`.
    pub fn get_string(&self, name: &str, default: &str) -> String {
        self.get(name)
            .and_then(|p| p.value(0))
            .unwrap_or(default)
            .to_string()
    }

    /// First value of `name` as an unsigned integer, or `default`.
    pub fn get_u32(&self, name: &str, default: u32) -> Result<u32> {
        self.parse_first(name, default, "an unsigned integer")
    }

    /// First value of `name` as a float, or `default`.
    pub fn get_f32(&self, name: &str, default: f32) -> Result<f32> {
        self.parse_first(name, default, "a number")
    }

    /// First value of `name` as a boolean (`true`/`false`/`1`/`0`), or `default`.
    pub fn get_bool(&self, name: &str, default: bool) -> Result<bool> {
        let Some(property) = self.get(name) else {
            return Ok(default);
        };
        match property.value(0) {
            Some("true" | "1") => Ok(true),
            Some("false" | "0") => Ok(false),
            _ => Err(property.invalid("a boolean")),
        }
    }

    /// All values of `name` as floats, or `default`.
    pub fn get_f32s(&self, name: &str, default: &[f32]) -> Result<Vec<f32>> {
        let Some(property) = self.get(name) else {
            return Ok(default.to_vec());
        };
        property
            .values
            .iter()
            .map(|v| v.parse::<f32>().map_err(|_| property.invalid("numbers")))
            .collect()
    }

    /// An RGB triple. A single value is expanded to grey.
    pub fn get_rgb(&self, name: &str, default: [f32; 3]) -> Result<[f32; 3]> {
        let Some(property) = self.get(name) else {
            return Ok(default);
        };
        match self.get_f32s(name, &default)?.as_slice() {
            &[v] => Ok([v, v, v]),
            &[r, g, b] => Ok([r, g, b]),
            _ => Err(property.invalid("one or three numbers")),
        }
    }

    fn parse_first<T: std::str::FromStr>(
        &self,
        name: &str,
        default: T,
        expected: &'static str,
    ) -> Result<T> {
        let Some(property) = self.get(name) else {
            return Ok(default);
        };
        property
            .value(0)
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| property.invalid(expected))
    }
}

impl PartialEq for Properties {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Eq for Properties {}

impl FromIterator<Property> for Properties {
    fn from_iter<I: IntoIterator<Item = Property>>(iter: I) -> Self {
        let mut props = Self::new();
        for property in iter {
            props.set(property);
        }
        props
    }
}

impl From<Property> for Properties {
    fn from(property: Property) -> Self {
        Self::new().with(property)
    }
}

impl fmt::Display for Properties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for property in &self.entries {
            writeln!(f, "{property}")?;
        }
        Ok(())
    }
}

/// Split the right-hand side of an assignment into values.
fn tokenize(text: &str) -> std::result::Result<Vec<String>, &'static str> {
    let mut values = Vec::new();
    let mut chars = text.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        let mut token = String::new();
        if c == '"' {
            chars.next();
            loop {
                match chars.next() {
                    Some('"') => break,
                    Some('\\') => match chars.peek() {
                        Some(&escaped @ ('"' | '\\')) => {
                            token.push(escaped);
                            chars.next();
                        }
                        _ => token.push('\\'),
                    },
                    Some(ch) => token.push(ch),
                    None => return Err("unterminated quoted value"),
                }
            }
        } else {
            while let Some(&ch) = chars.peek() {
                if ch.is_whitespace() {
                    break;
                }
                token.push(ch);
                chars.next();
            }
        }
        values.push(token);
    }

    Ok(values)
}
