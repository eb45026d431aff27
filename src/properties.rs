//! Resolved `.editorconfig` property sets.

use std::collections::BTreeMap;

pub const INDENT_STYLE: &str = "indent_style";
pub const INDENT_SIZE: &str = "indent_size";
pub const TAB_WIDTH: &str = "tab_width";
pub const END_OF_LINE: &str = "end_of_line";
pub const INSERT_FINAL_NEWLINE: &str = "insert_final_newline";
pub const TRIM_TRAILING_WHITESPACE: &str = "trim_trailing_whitespace";

/// Marker value allowed for `indent_size` meaning "use `tab_width`".
const TAB_MARKER: &str = "tab";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndentStyle {
    Tab,
    Space,
}

impl IndentStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndentStyle::Tab => "tab",
            IndentStyle::Space => "space",
        }
    }
}

/// Merged property set applicable to one file.
///
/// Keys are stored lowercase. Values are kept as written by the resolver;
/// the typed accessors interpret them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedConfig {
    properties: BTreeMap<String, String>,
}

impl ResolvedConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties
            .get(&key.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.properties
            .insert(key.into().to_ascii_lowercase(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.properties.remove(&key.to_ascii_lowercase())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// `indent_style`, if set. Any value other than `tab` reads as spaces.
    pub fn indent_style(&self) -> Option<IndentStyle> {
        self.get(INDENT_STYLE).map(|v| {
            if v.trim().eq_ignore_ascii_case(IndentStyle::Tab.as_str()) {
                IndentStyle::Tab
            } else {
                IndentStyle::Space
            }
        })
    }

    /// Numeric `indent_size`. The `tab` marker and garbage read as absent.
    pub fn indent_size(&self) -> Option<u32> {
        self.get(INDENT_SIZE).and_then(parse_size)
    }

    pub fn tab_width(&self) -> Option<u32> {
        self.get(TAB_WIDTH).and_then(parse_size)
    }

    pub fn end_of_line(&self) -> Option<&str> {
        self.get(END_OF_LINE)
    }

    pub fn insert_final_newline(&self) -> bool {
        self.flag(INSERT_FINAL_NEWLINE)
    }

    pub fn trim_trailing_whitespace(&self) -> bool {
        self.flag(TRIM_TRAILING_WHITESPACE)
    }

    /// Rewrite `indent_size = tab` to the value of `tab_width`.
    ///
    /// When `tab_width` is absent the marker is dropped, so the stored set
    /// never carries both `indent_size = tab` and a separate tab width.
    pub fn normalize(&mut self) {
        let is_marker = self
            .get(INDENT_SIZE)
            .is_some_and(|v| v.trim().eq_ignore_ascii_case(TAB_MARKER));
        if !is_marker {
            return;
        }

        match self.get(TAB_WIDTH).map(str::to_owned) {
            Some(width) => self.set(INDENT_SIZE, width),
            None => {
                self.remove(INDENT_SIZE);
            }
        }
    }

    pub fn normalized(mut self) -> Self {
        self.normalize();
        self
    }

    fn flag(&self, key: &str) -> bool {
        self.get(key)
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
    }
}

impl<K, V> FromIterator<(K, V)> for ResolvedConfig
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut config = ResolvedConfig::new();
        for (k, v) in iter {
            config.set(k, v);
        }
        config
    }
}

fn parse_size(value: &str) -> Option<u32> {
    value.trim().parse().ok()
}
