//! On-demand translation of user content through the backend.
//!
//! Every failure degrades to returning the input unchanged, so callers can
//! render whatever comes back without error handling.

use crate::I18nError;
use nuwa_common_async::{join_all, with_timeout};
use nuwa_common_config::{NuwaConfig, TranslationConfig};
use nuwa_common_core::{Language, LocalizedText, Wish};
use nuwa_common_http::{build_client, HttpConfig};
use nuwa_common_log::spans::translation_span;
use parking_lot::Mutex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;

const AUTO: &str = "auto";

#[derive(Serialize)]
struct TranslateRequest<'a> {
    text: &'a str,
    target_lang: &'a str,
    source_lang: &'a str,
}

#[derive(Deserialize)]
struct TranslateResponse {
    #[serde(default)]
    translated_text: Option<String>,
}

#[derive(Debug, thiserror::Error)]
enum TranslationFailure {
    #[error("translation request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("translation service returned status {0}")]
    Status(u16),

    #[error("translation timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("translation response has no translated_text")]
    Empty,
}

/// `(original text, source code or "auto")` -> target -> translation.
type TranslationCache = HashMap<(String, String), HashMap<Language, String>>;

struct Inner {
    http: Client,
    url: String,
    timeout: Duration,
    cache: Mutex<TranslationCache>,
    active: AtomicUsize,
}

struct ActiveGuard<'a>(&'a AtomicUsize);

impl<'a> ActiveGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Cached client for the translation endpoint. Clones share the cache.
#[derive(Clone)]
pub struct Translator {
    inner: Arc<Inner>,
}

impl Translator {
    /// Translator posting to `base_url` + `config.endpoint`.
    pub fn new(config: &TranslationConfig, base_url: &str) -> Result<Self, I18nError> {
        let http = build_client(&HttpConfig::default())?;
        Ok(Self {
            inner: Arc::new(Inner {
                http,
                url: format!("{}{}", base_url.trim_end_matches('/'), config.endpoint),
                timeout: config.timeout(),
                cache: Mutex::new(HashMap::new()),
                active: AtomicUsize::new(0),
            }),
        })
    }

    /// Translator for the configured translation (or API) base URL.
    pub fn from_config(config: &NuwaConfig) -> Result<Self, I18nError> {
        Self::new(&config.translation, config.translation_base_url())
    }

    /// Translation endpoint URL.
    pub fn url(&self) -> &str {
        &self.inner.url
    }

    /// Translate `text` into `target`.
    ///
    /// Blank input and `source == target` come back unchanged without a
    /// remote call. Any remote failure is logged and also returns `text`.
    pub async fn translate_text(&self, text: &str, target: Language, source: Option<Language>) -> String {
        if text.trim().is_empty() || source == Some(target) {
            return text.to_string();
        }
        self.attempt(text, target, source)
            .await
            .unwrap_or_else(|| text.to_string())
    }

    /// Cached or remote translation of non-blank `text`; `None` when the remote call fails.
    async fn attempt(&self, text: &str, target: Language, source: Option<Language>) -> Option<String> {
        let source_code = source.map_or(AUTO, |l| l.code());
        let key = (text.to_string(), source_code.to_string());

        if let Some(hit) = self
            .inner
            .cache
            .lock()
            .get(&key)
            .and_then(|targets| targets.get(&target))
            .cloned()
        {
            tracing::debug!(target_lang = %target, "translation cache hit");
            return Some(hit);
        }

        let _active = ActiveGuard::enter(&self.inner.active);
        let result = self
            .fetch(text.trim(), target, source_code)
            .instrument(translation_span(target.code()))
            .await;

        match result {
            Ok(translated) => {
                self.inner
                    .cache
                    .lock()
                    .entry(key)
                    .or_default()
                    .insert(target, translated.clone());
                Some(translated)
            }
            Err(e) => {
                tracing::error!(error = %e, target_lang = %target, "translation failed");
                None
            }
        }
    }

    /// Fill in `target` for the wish's title and description, keeping every
    /// existing language. A wish already in `target` is returned as is.
    ///
    /// A field whose translation fails is left without `target` text, and the
    /// wish keeps its previous `language` so a later call tries again.
    pub async fn translate_wish(&self, mut wish: Wish, target: Language) -> Wish {
        if wish.language == Some(target) {
            return wish;
        }

        let (title, description) = futures::join!(
            self.translate_missing(&wish.title, target),
            self.translate_missing(&wish.description, target)
        );

        let mut complete = true;
        for (field, fill) in [(&mut wish.title, title), (&mut wish.description, description)] {
            match fill {
                Fill::Present => {}
                Fill::Translated(text) => {
                    field.insert(target, text);
                }
                Fill::Failed => complete = false,
            }
        }
        if complete {
            wish.language = Some(target);
        } else {
            tracing::warn!(wish_id = wish.id, target_lang = %target, "wish left partly untranslated");
        }
        wish
    }

    /// [`translate_wish`](Self::translate_wish) over a list, concurrently.
    /// Order is preserved.
    pub async fn translate_wishes(&self, wishes: Vec<Wish>, target: Language) -> Vec<Wish> {
        join_all(wishes.into_iter().map(|wish| self.translate_wish(wish, target))).await
    }

    /// Translate every non-blank string value of a form. Other values are
    /// copied unchanged.
    pub async fn translate_fields(&self, fields: &Map<String, Value>, target: Language) -> Map<String, Value> {
        let pending = fields.iter().filter_map(|(key, value)| match value {
            Value::String(text) if !text.trim().is_empty() => Some(async move {
                (key.clone(), self.translate_text(text, target, None).await)
            }),
            _ => None,
        });

        let mut translated = fields.clone();
        for (key, text) in join_all(pending).await {
            translated.insert(key, Value::String(text));
        }
        translated
    }

    /// Whether a remote call is in progress.
    pub fn is_translating(&self) -> bool {
        self.inner.active.load(Ordering::SeqCst) > 0
    }

    /// Forget every cached translation.
    pub fn clear_cache(&self) {
        self.inner.cache.lock().clear();
    }

    /// Number of cached `(text, source)` keys.
    pub fn cache_len(&self) -> usize {
        self.inner.cache.lock().len()
    }

    async fn translate_missing(&self, text: &LocalizedText, target: Language) -> Fill {
        if text.has(target) {
            return Fill::Present;
        }
        let Some((source, original)) = text.best(Language::default()) else {
            return Fill::Present;
        };
        if original.trim().is_empty() {
            return Fill::Present;
        }
        match self.attempt(original, target, Some(source)).await {
            Some(translated) => Fill::Translated(translated),
            None => Fill::Failed,
        }
    }

    async fn fetch(&self, text: &str, target: Language, source: &str) -> Result<String, TranslationFailure> {
        let body = TranslateRequest {
            text,
            target_lang: target.code(),
            source_lang: source,
        };

        let response = with_timeout(self.inner.timeout, async {
            let response = self.inner.http.post(&self.inner.url).json(&body).send().await?;
            if !response.status().is_success() {
                return Err(TranslationFailure::Status(response.status().as_u16()));
            }
            Ok::<_, TranslationFailure>(response.json::<TranslateResponse>().await?)
        })
        .await
        .map_err(|e| TranslationFailure::Timeout(e.after))??;

        response
            .translated_text
            .filter(|t| !t.trim().is_empty())
            .ok_or(TranslationFailure::Empty)
    }
}

/// Outcome of filling one field in the target language.
enum Fill {
    /// Nothing to do: already present, or no source text.
    Present,
    Translated(String),
    Failed,
}

impl std::fmt::Debug for Translator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Translator")
            .field("url", &self.inner.url)
            .field("timeout", &self.inner.timeout)
            .field("cached", &self.cache_len())
            .finish()
    }
}
