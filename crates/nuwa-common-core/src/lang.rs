//! Language codes and per-language text maps.

use crate::error::Error;
use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Supported languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Zh, // Chinese (default UI language)
    En, // English
    Ja,
    Ko,
    Fr,
    De,
    Es,
}

impl Language {
    /// Every supported language.
    pub const ALL: [Language; 7] = [
        Self::Zh,
        Self::En,
        Self::Ja,
        Self::Ko,
        Self::Fr,
        Self::De,
        Self::Es,
    ];

    /// Languages the UI ships static dictionaries for.
    pub const UI: [Language; 2] = [Self::Zh, Self::En];

    /// Parse from a language tag (e.g., "zh-CN", "en_US", "JA").
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase().replace('-', "_");
        let lang = s.split(['_', '.']).next()?;

        match lang {
            "zh" => Some(Self::Zh),
            "en" => Some(Self::En),
            "ja" => Some(Self::Ja),
            "ko" => Some(Self::Ko),
            "fr" => Some(Self::Fr),
            "de" => Some(Self::De),
            "es" => Some(Self::Es),
            _ => None,
        }
    }

    /// Two-letter language code used on the wire.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Zh => "zh",
            Self::En => "en",
            Self::Ja => "ja",
            Self::Ko => "ko",
            Self::Fr => "fr",
            Self::De => "de",
            Self::Es => "es",
        }
    }

    /// Display name in the language itself.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Zh => "中文",
            Self::En => "English",
            Self::Ja => "日本語",
            Self::Ko => "한국어",
            Self::Fr => "Français",
            Self::De => "Deutsch",
            Self::Es => "Español",
        }
    }

    /// Whether static UI dictionaries exist for this language.
    pub fn is_ui_language(&self) -> bool {
        Self::UI.contains(self)
    }
}

impl Default for Language {
    fn default() -> Self {
        Self::Zh
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| Error::UnknownLanguage(s.to_string()))
    }
}

/// Text keyed by language, e.g. `{"zh": "咖啡智能助手", "en": "Coffee Assistant"}`.
///
/// A bare JSON string deserializes as a single entry under the default
/// language, matching backends that only store the original submission.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct LocalizedText(BTreeMap<Language, String>);

impl LocalizedText {
    /// Empty text map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Single-language text.
    pub fn single(lang: Language, text: impl Into<String>) -> Self {
        let mut map = BTreeMap::new();
        map.insert(lang, text.into());
        Self(map)
    }

    /// Builder-style insert.
    pub fn with(mut self, lang: Language, text: impl Into<String>) -> Self {
        self.0.insert(lang, text.into());
        self
    }

    /// Text for a language.
    pub fn get(&self, lang: Language) -> Option<&str> {
        self.0.get(&lang).map(String::as_str)
    }

    /// Whether a non-blank entry exists for a language.
    pub fn has(&self, lang: Language) -> bool {
        self.get(lang).map(|s| !s.trim().is_empty()).unwrap_or(false)
    }

    /// Insert or replace the entry for a language, keeping the others.
    pub fn insert(&mut self, lang: Language, text: impl Into<String>) {
        self.0.insert(lang, text.into());
    }

    /// Preferred entry, falling back to the default language and then to any entry.
    pub fn best(&self, preferred: Language) -> Option<(Language, &str)> {
        [preferred, Language::default()]
            .into_iter()
            .find_map(|lang| self.get(lang).map(|s| (lang, s)))
            .or_else(|| self.0.iter().next().map(|(l, s)| (*l, s.as_str())))
    }

    /// Languages with an entry.
    pub fn languages(&self) -> impl Iterator<Item = Language> + '_ {
        self.0.keys().copied()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no language has an entry.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'de> Deserialize<'de> for LocalizedText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct LocalizedTextVisitor;

        impl<'de> Visitor<'de> for LocalizedTextVisitor {
            type Value = LocalizedText;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a string or a map of language code to string")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                Ok(LocalizedText::single(Language::default(), v))
            }

            fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(LocalizedText::new())
            }

            fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(LocalizedText::new())
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut map = BTreeMap::new();
                while let Some((key, value)) = access.next_entry::<String, Option<String>>()? {
                    // Unknown language codes are dropped rather than rejected.
                    if let (Some(lang), Some(value)) = (Language::parse(&key), value) {
                        map.insert(lang, value);
                    }
                }
                Ok(LocalizedText(map))
            }
        }

        deserializer.deserialize_any(LocalizedTextVisitor)
    }
}
