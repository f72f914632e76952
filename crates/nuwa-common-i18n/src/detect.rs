//! Language detection from the environment and from text.

use nuwa_common_config::vars;
use nuwa_common_core::Language;
use std::env;

/// Detect the preferred language with an optional user override.
pub fn detect_language_with_override(user_language: Option<&str>) -> Language {
    user_language
        .and_then(Language::parse)
        .unwrap_or_else(detect_language)
}

/// Detect the preferred language from the process environment.
pub fn detect_language() -> Language {
    detect_language_with(|var| env::var(var).ok())
}

/// Detect the preferred language.
///
/// Priority: `NUWA_LANG` > `LC_ALL` > `LANG` > default (zh). Unparseable
/// values are skipped.
pub fn detect_language_with<F>(lookup: F) -> Language
where
    F: Fn(&str) -> Option<String>,
{
    [vars::NUWA_LANG, "LC_ALL", "LANG"]
        .into_iter()
        .find_map(|var| lookup(var).as_deref().and_then(Language::parse))
        .unwrap_or_default()
}

/// Guess whether text is Chinese or English: zh when CJK ideographs
/// outnumber ASCII letters, en otherwise (including empty text).
pub fn detect_text_language(text: &str) -> Language {
    let (cjk, ascii) = text.chars().fold((0usize, 0usize), |(cjk, ascii), c| {
        if is_cjk(c) {
            (cjk + 1, ascii)
        } else if c.is_ascii_alphabetic() {
            (cjk, ascii + 1)
        } else {
            (cjk, ascii)
        }
    });

    if cjk > ascii {
        Language::Zh
    } else {
        Language::En
    }
}

fn is_cjk(c: char) -> bool {
    matches!(c,
        '\u{4E00}'..='\u{9FFF}'
        | '\u{3400}'..='\u{4DBF}'
        | '\u{F900}'..='\u{FAFF}'
        | '\u{20000}'..='\u{2A6DF}')
}

/// Closest language with UI dictionaries: zh stays zh, everything else is en.
pub fn ui_language(lang: Language) -> Language {
    if lang.is_ui_language() {
        lang
    } else {
        Language::En
    }
}

/// Lookup order for dictionary strings.
pub fn language_fallback_chain(lang: Language) -> Vec<Language> {
    let mut chain = vec![lang];
    for fallback in [Language::En, Language::Zh] {
        if !chain.contains(&fallback) {
            chain.push(fallback);
        }
    }
    chain
}
