//! Static UI dictionaries keyed by dotted path.

use crate::detect::language_fallback_chain;
use crate::I18nError;
use nuwa_common_core::Language;
use serde_json::{json, Value};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::Path;

/// A path with no string leaf in a language.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Missing {} translation for: {path}", english_name(.language))]
pub struct MissingTranslation {
    pub path: String,
    pub language: Language,
}

/// Result of a dictionary lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<'a> {
    Found(&'a str),
    Missing(MissingTranslation),
}

impl<'a> Lookup<'a> {
    /// The string, or the requested path itself when missing.
    pub fn or_path(self) -> String {
        match self {
            Self::Found(s) => s.to_string(),
            Self::Missing(m) => m.path,
        }
    }

    pub fn found(&self) -> Option<&'a str> {
        match self {
            Self::Found(s) => Some(*s),
            Self::Missing(_) => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    pub fn into_result(self) -> Result<&'a str, MissingTranslation> {
        match self {
            Self::Found(s) => Ok(s),
            Self::Missing(m) => Err(m),
        }
    }
}

/// Per-language trees of string leaves, stored flattened by dotted path.
#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    entries: HashMap<Language, BTreeMap<String, String>>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// The zh/en strings the CLI ships with.
    pub fn builtin() -> Self {
        let mut dict = Self::new();
        dict.insert_tree(Language::Zh, &builtin_zh());
        dict.insert_tree(Language::En, &builtin_en());
        dict
    }

    /// Read `<dir>/<code>.yaml` for every language that has a file.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self, I18nError> {
        let dir = dir.as_ref();
        let mut dict = Self::new();

        for lang in Language::ALL {
            let path = dir.join(format!("{}.yaml", lang.code()));
            if !path.exists() {
                continue;
            }
            let content = fs::read_to_string(&path).map_err(|source| I18nError::Load {
                path: path.clone(),
                source,
            })?;
            let tree: Value = serde_yaml::from_str(&content).map_err(|e| I18nError::Parse {
                path: path.clone(),
                message: e.to_string(),
            })?;
            if !tree.is_object() {
                return Err(I18nError::Parse {
                    path,
                    message: "top level must be a mapping".to_string(),
                });
            }
            dict.insert_tree(lang, &tree);
            tracing::debug!(language = %lang, entries = dict.len(lang), "loaded dictionary");
        }

        Ok(dict)
    }

    /// Add one string.
    pub fn insert(&mut self, lang: Language, path: impl Into<String>, text: impl Into<String>) {
        self.entries
            .entry(lang)
            .or_default()
            .insert(path.into(), text.into());
    }

    /// Merge a nested JSON object. Non-string leaves are ignored.
    pub fn insert_tree(&mut self, lang: Language, tree: &Value) {
        let table = self.entries.entry(lang).or_default();
        flatten(tree, String::new(), table);
    }

    /// Languages with at least one entry.
    pub fn languages(&self) -> Vec<Language> {
        let mut langs: Vec<_> = self.entries.keys().copied().collect();
        langs.sort();
        langs
    }

    /// Number of strings for a language.
    pub fn len(&self, lang: Language) -> usize {
        self.entries.get(&lang).map_or(0, BTreeMap::len)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.values().all(BTreeMap::is_empty)
    }

    /// Look up a dotted path. A path naming a subtree is missing.
    pub fn lookup(&self, path: &str, lang: Language) -> Lookup<'_> {
        match self.entries.get(&lang).and_then(|t| t.get(path)) {
            Some(s) => Lookup::Found(s),
            None => Lookup::Missing(MissingTranslation {
                path: path.to_string(),
                language: lang,
            }),
        }
    }

    /// String for `path` in `lang`, or the path itself.
    pub fn get(&self, path: &str, lang: Language) -> String {
        self.lookup(path, lang).or_path()
    }

    /// Like [`get`](Self::get), but tries the fallback chain before giving up.
    pub fn resolve(&self, path: &str, lang: Language) -> String {
        language_fallback_chain(lang)
            .into_iter()
            .find_map(|l| self.lookup(path, l).found())
            .map_or_else(|| path.to_string(), str::to_string)
    }

    /// String with `{name}` placeholders replaced from `params`.
    pub fn translate(&self, path: &str, lang: Language, params: &[(&str, &str)]) -> String {
        interpolate(&self.get(path, lang), params)
    }

    /// Paths present in one language and absent in another.
    pub fn missing(&self) -> Vec<MissingTranslation> {
        let langs = self.languages();
        let all: BTreeSet<&str> = self
            .entries
            .values()
            .flat_map(|t| t.keys().map(String::as_str))
            .collect();

        let mut missing = Vec::new();
        for lang in langs {
            for path in &all {
                if !self.lookup(path, lang).is_found() {
                    missing.push(MissingTranslation {
                        path: (*path).to_string(),
                        language: lang,
                    });
                }
            }
        }
        missing
    }

    /// Human-readable report of [`missing`](Self::missing).
    pub fn validate(&self) -> Vec<String> {
        self.missing().iter().map(ToString::to_string).collect()
    }
}

/// Replace every `{key}` with its value. Unknown placeholders are left as is.
pub fn interpolate(template: &str, params: &[(&str, &str)]) -> String {
    params.iter().fold(template.to_string(), |acc, (key, value)| {
        acc.replace(&format!("{{{key}}}"), value)
    })
}

fn flatten(node: &Value, prefix: String, out: &mut BTreeMap<String, String>) {
    match node {
        Value::Object(map) => {
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten(child, path, out);
            }
        }
        Value::String(s) if !prefix.is_empty() => {
            out.insert(prefix, s.clone());
        }
        _ => {}
    }
}

fn english_name(lang: &Language) -> &'static str {
    match lang {
        Language::Zh => "Chinese",
        Language::En => "English",
        Language::Ja => "Japanese",
        Language::Ko => "Korean",
        Language::Fr => "French",
        Language::De => "German",
        Language::Es => "Spanish",
    }
}

fn builtin_zh() -> Value {
    json!({
        "common": {
            "loading": "加载中...",
            "submit": "提交",
            "cancel": "取消",
            "error": "错误",
            "success": "成功",
            "empty": "暂无数据"
        },
        "pagination": {
            "summary": "第 {page}/{pages} 页，共 {total} 条"
        },
        "wishes": {"title": "愿望池", "submitted": "愿望已提交：#{id}"},
        "tasks": {"title": "任务列表", "synthesized": "任务已生成：#{id}"},
        "agents": {"title": "Agent 养成所", "built": "Agent 已构建：#{id}"},
        "modules": {"title": "模块列表", "submitted": "模块已提交：#{id}"},
        "signatures": {"title": "贡献签名", "logged": "签名已记录：#{id}"},
        "health": {"up": "后端服务正常", "down": "后端服务不可用"},
        "errors": {
            "network": {
                "connectionFailed": "连接失败",
                "timeout": "请求超时",
                "serverUnavailable": "服务器不可用"
            }
        },
        "mock": {"notice": "后端不可用，正在显示演示数据"}
    })
}

fn builtin_en() -> Value {
    json!({
        "common": {
            "loading": "Loading...",
            "submit": "Submit",
            "cancel": "Cancel",
            "error": "Error",
            "success": "Success",
            "empty": "No data"
        },
        "pagination": {
            "summary": "Page {page} of {pages}, {total} total"
        },
        "wishes": {"title": "Wish Pool", "submitted": "Wish submitted: #{id}"},
        "tasks": {"title": "Tasks", "synthesized": "Task synthesized: #{id}"},
        "agents": {"title": "Agent Lab", "built": "Agent built: #{id}"},
        "modules": {"title": "Modules", "submitted": "Module submitted: #{id}"},
        "signatures": {"title": "Signatures", "logged": "Signature logged: #{id}"},
        "health": {"up": "Backend is healthy", "down": "Backend is unreachable"},
        "errors": {
            "network": {
                "connectionFailed": "Connection failed",
                "timeout": "Request timeout",
                "serverUnavailable": "Server unavailable"
            }
        },
        "mock": {"notice": "Backend unavailable, showing demo data"}
    })
}
