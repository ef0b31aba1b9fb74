use std::str::FromStr;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::CoreError;

/// Content languages the site publishes and tracks rankings for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    De,
    En,
    Es,
    Fr,
    Zh,
}

impl Language {
    /// Every language, in the order sections and maps are rendered.
    pub const ALL: [Language; 5] = [
        Language::De,
        Language::En,
        Language::Es,
        Language::Fr,
        Language::Zh,
    ];

    /// Two-letter code, as stored in the database and used on the wire.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Language::De => "de",
            Language::En => "en",
            Language::Es => "es",
            Language::Fr => "fr",
            Language::Zh => "zh",
        }
    }

    /// Human-readable name used in alert digests.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Language::De => "Deutsch",
            Language::En => "English",
            Language::Es => "Español",
            Language::Fr => "Français",
            Language::Zh => "中文",
        }
    }

    fn index(self) -> usize {
        match self {
            Language::De => 0,
            Language::En => 1,
            Language::Es => 2,
            Language::Fr => 3,
            Language::Zh => 4,
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "de" => Ok(Language::De),
            "en" => Ok(Language::En),
            "es" => Ok(Language::Es),
            "fr" => Ok(Language::Fr),
            "zh" => Ok(Language::Zh),
            _ => Err(CoreError::InvalidLanguage(s.to_string())),
        }
    }
}

/// Fixed-size map with exactly one slot per [`Language`].
///
/// Serializes as a JSON object keyed by language code, in [`Language::ALL`] order.
#[derive(Debug, Clone, PartialEq)]
pub struct LanguageMap<T> {
    slots: [T; 5],
}

impl<T> LanguageMap<T> {
    /// Build a map by evaluating `f` once per language.
    pub fn from_fn(mut f: impl FnMut(Language) -> T) -> Self {
        Self {
            slots: Language::ALL.map(&mut f),
        }
    }

    /// Build a map from values given in [`Language::ALL`] order.
    pub fn from_slots(slots: [T; 5]) -> Self {
        Self { slots }
    }

    #[must_use]
    pub fn get(&self, language: Language) -> &T {
        &self.slots[language.index()]
    }

    pub fn get_mut(&mut self, language: Language) -> &mut T {
        &mut self.slots[language.index()]
    }

    /// Iterate `(language, value)` pairs in [`Language::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = (Language, &T)> {
        Language::ALL.into_iter().zip(self.slots.iter())
    }

    pub fn into_entries(self) -> impl Iterator<Item = (Language, T)> {
        Language::ALL.into_iter().zip(self.slots)
    }
}

impl<T: Default> Default for LanguageMap<T> {
    fn default() -> Self {
        Self::from_fn(|_| T::default())
    }
}

impl<T: Serialize> Serialize for LanguageMap<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.slots.len()))?;
        for (language, value) in self.iter() {
            map.serialize_entry(language.code(), value)?;
        }
        map.end()
    }
}
