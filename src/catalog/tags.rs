use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A field that may be written as one string or as a list of strings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::One(s) => vec![s],
            OneOrMany::Many(v) => v,
        }
    }
}

/// Comparison key for a tag: trimmed and lower-cased. Blank tags yield `None`.
pub fn normalize_tag(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// Case-insensitive set of tags.
///
/// Keeps the first spelling seen for each key so responses echo the dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet {
    keys: BTreeSet<String>,
    display: Vec<String>,
}

impl TagSet {
    pub fn contains(&self, tag: &str) -> bool {
        normalize_tag(tag).is_some_and(|k| self.keys.contains(&k))
    }

    /// Normalized keys, sorted.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    fn insert(&mut self, raw: &str) {
        if let Some(key) = normalize_tag(raw) {
            if self.keys.insert(key) {
                self.display.push(raw.trim().to_string());
            }
        }
    }
}

impl<S: AsRef<str>> FromIterator<S> for TagSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = TagSet::default();
        for tag in iter {
            set.insert(tag.as_ref());
        }
        set
    }
}

impl Serialize for TagSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.display.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for TagSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(OneOrMany::deserialize(deserializer)?.into_vec().into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_case_and_whitespace() {
        assert_eq!(normalize_tag("  Landscape "), Some("landscape".to_string()));
        assert_eq!(normalize_tag("   "), None);
    }

    #[test]
    fn dedups_by_key_keeping_first_spelling() {
        let set: TagSet = ["Blue", "blue", " BLUE", "Red"].into_iter().collect();
        assert_eq!(set.len(), 2);
        assert_eq!(serde_json::to_value(&set).unwrap(), serde_json::json!(["Blue", "Red"]));
    }

    #[test]
    fn blank_tags_dropped() {
        let set: TagSet = ["", "  "].into_iter().collect();
        assert!(set.is_empty());
        assert!(!set.contains(""));
    }

    #[test]
    fn bare_string_is_singleton() {
        let set: TagSet = serde_json::from_str(r#""Portrait""#).unwrap();
        assert_eq!(set.keys().collect::<Vec<_>>(), vec!["portrait"]);
    }
}
