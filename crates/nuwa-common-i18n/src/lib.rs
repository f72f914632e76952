//! Internationalization support for CyberNuwa.
//!
//! Static UI strings come from a [`Dictionary`]; user-generated content is
//! translated on demand by a [`Translator`] that never fails its caller.

pub mod detect;
pub mod dictionary;
pub mod translator;

use std::path::PathBuf;

pub use nuwa_common_core::{Language, LocalizedText};

pub use detect::{
    detect_language, detect_language_with, detect_language_with_override, detect_text_language,
    language_fallback_chain, ui_language,
};
pub use dictionary::{Dictionary, Lookup, MissingTranslation};
pub use translator::Translator;

/// i18n errors.
#[derive(Debug, thiserror::Error)]
pub enum I18nError {
    #[error("failed to read dictionary {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse dictionary {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("invalid language: {0}")]
    InvalidLanguage(String),

    #[error(transparent)]
    Missing(#[from] MissingTranslation),

    #[error("failed to build translation client: {0}")]
    Client(#[from] nuwa_common_http::ApiError),
}

/// Look up a dictionary string and substitute `{name}` placeholders.
///
/// ```
/// use nuwa_common_i18n::{t, Dictionary, Language};
///
/// let dict = Dictionary::builtin();
/// assert_eq!(t!(dict, Language::En, "common.loading"), "Loading...");
/// assert_eq!(
///     t!(dict, Language::En, "pagination.summary", page = 1, pages = 3, total = 25),
///     "Page 1 of 3, 25 total"
/// );
/// ```
#[macro_export]
macro_rules! t {
    ($dict:expr, $lang:expr, $path:expr) => {
        $dict.resolve($path, $lang)
    };
    ($dict:expr, $lang:expr, $path:expr, $($key:ident = $value:expr),+ $(,)?) => {{
        let mut msg = $dict.resolve($path, $lang);
        $(
            msg = msg.replace(concat!("{", stringify!($key), "}"), &$value.to_string());
        )+
        msg
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = I18nError::InvalidLanguage("xx".into());
        assert_eq!(err.to_string(), "invalid language: xx");

        let err: I18nError = MissingTranslation {
            path: "home.title".into(),
            language: Language::En,
        }
        .into();
        assert_eq!(err.to_string(), "Missing English translation for: home.title");
    }

    #[test]
    fn test_translation_macro() {
        let dict = Dictionary::builtin();
        assert_eq!(t!(dict, Language::Zh, "common.loading"), "加载中...");
        assert_eq!(t!(dict, Language::En, "no.such.key"), "no.such.key");
        assert_eq!(
            t!(dict, Language::Zh, "pagination.summary", page = 2, pages = 5, total = 48),
            "第 2/5 页，共 48 条"
        );
    }
}
