//! Template source access: provider trait, path conventions, section
//! extraction, and the settings schema document.
//!
//! Template sources live behind [`TemplateSourceProvider`]; `None` means
//! "not found" and is always a renderable condition, never an error. Paths
//! follow theme conventions: one main layout, JSON page templates under
//! `templates/`, section sources under `sections/`.

use std::sync::LazyLock;

use dashmap::DashMap;
use regex::Regex;
use serde_json::Value;

use crate::core::PageType;

use anyhow::Result;
use std::future::Future;

pub const MAIN_LAYOUT_PATH: &str = "layout/theme.liquid";
pub const SETTINGS_SCHEMA_PATH: &str = "config/settings_schema.json";

static SECTION_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\{%-?\s*section\s+['"]([^'"]+)['"]"#).unwrap());

/// Store-scoped template source lookup.
pub trait TemplateSourceProvider: Send + Sync {
    /// Raw source for a template path, or `None` when the store has no such
    /// template.
    fn get_template(
        &self,
        store_id: &str,
        path: &str,
    ) -> impl Future<Output = Result<Option<String>>> + Send;
}

/// JSON page template path for a page type (`templates/product.json`).
#[must_use]
pub fn template_path(page_type: &PageType) -> String {
    format!("templates/{}.json", page_type.as_str())
}

/// Section names referenced by `{% section 'name' %}` tags in a layout.
#[must_use]
pub fn extract_section_names(layout: &str) -> Vec<String> {
    let mut names = Vec::new();
    for captures in SECTION_NAME.captures_iter(layout) {
        let name = captures[1].to_string();
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

/// Section source paths referenced by a JSON page template.
///
/// A JSON template holds `{"sections": {"<id>": {"type": "<type>"}}}`; each
/// type maps to `sections/<type>.liquid` unless it already carries a path
/// separator. Unparseable documents yield no paths.
#[must_use]
pub fn extract_page_section_paths(json_source: &str) -> Vec<String> {
    let Ok(document) = serde_json::from_str::<Value>(json_source) else {
        tracing::debug!("page template is not valid JSON, no sections extracted");
        return Vec::new();
    };

    let mut paths = Vec::new();
    if let Some(sections) = document.get("sections").and_then(Value::as_object) {
        for section in sections.values() {
            let Some(section_type) = section.get("type").and_then(Value::as_str) else {
                continue;
            };
            let path = if section_type.contains('/') {
                section_type.to_string()
            } else {
                format!("sections/{section_type}.liquid")
            };
            if !paths.contains(&path) {
                paths.push(path);
            }
        }
    }
    paths
}

/// Global numeric overrides read from `config/settings_schema.json`.
///
/// The schema is an array of `{settings: [{id, default}]}` groups; parsing
/// never errors, absence of the document or of an id yields the defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsSchema {
    pub search_products_limit: usize,
    pub search_collections_limit: Option<usize>,
    pub products_per_page: Option<usize>,
}

impl Default for SettingsSchema {
    fn default() -> Self {
        Self {
            search_products_limit: 8,
            search_collections_limit: None,
            products_per_page: None,
        }
    }
}

impl SettingsSchema {
    #[must_use]
    pub fn parse(source: Option<&str>) -> Self {
        let mut schema = Self::default();
        let Some(source) = source else {
            return schema;
        };
        let Ok(document) = serde_json::from_str::<Value>(source) else {
            tracing::debug!("settings schema is not valid JSON, using defaults");
            return schema;
        };
        let Some(groups) = document.as_array() else {
            return schema;
        };

        for group in groups {
            let Some(settings) = group.get("settings").and_then(Value::as_array) else {
                continue;
            };
            for setting in settings {
                let Some(id) = setting.get("id").and_then(Value::as_str) else {
                    continue;
                };
                let default = setting
                    .get("default")
                    .and_then(Value::as_u64)
                    .map(|n| n as usize);
                match id {
                    "search_products_limit" => {
                        if let Some(limit) = default {
                            schema.search_products_limit = limit;
                        }
                    }
                    "search_collections_limit" => schema.search_collections_limit = default,
                    "products_per_page" => schema.products_per_page = default,
                    _ => {}
                }
            }
        }
        schema
    }
}

/// Caching wrapper around a provider. Lookups are keyed by store and path;
/// "not found" results are cached too so repeated misses stay cheap.
#[derive(Debug)]
pub struct CachedTemplates<P> {
    provider: P,
    cache: DashMap<(String, String), Option<String>>,
}

impl<P: TemplateSourceProvider> CachedTemplates<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            cache: DashMap::new(),
        }
    }

    pub fn invalidate_store(&self, store_id: &str) {
        self.cache.retain(|(cached_store, _), _| cached_store != store_id);
    }
}

impl<P: TemplateSourceProvider> TemplateSourceProvider for CachedTemplates<P> {
    async fn get_template(&self, store_id: &str, path: &str) -> Result<Option<String>> {
        let key = (store_id.to_string(), path.to_string());
        if let Some(cached) = self.cache.get(&key) {
            return Ok(cached.clone());
        }
        let source = self.provider.get_template(store_id, path).await?;
        self.cache.insert(key, source.clone());
        Ok(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_paths_follow_page_type() {
        assert_eq!(template_path(&PageType::Product), "templates/product.json");
        assert_eq!(template_path(&PageType::NotFound), "templates/404.json");
    }

    #[test]
    fn extracts_section_names_from_layout() {
        let layout = "{% section 'header' %}\n<main></main>\n{% section \"footer\" %}{% section 'header' %}";
        assert_eq!(extract_section_names(layout), vec!["header", "footer"]);
    }

    #[test]
    fn extracts_section_paths_from_json_template() {
        let json = r#"{"sections": {"main": {"type": "hero"}, "extra": {"type": "sections/custom.liquid"}}}"#;
        let mut paths = extract_page_section_paths(json);
        paths.sort();
        assert_eq!(paths, vec!["sections/custom.liquid", "sections/hero.liquid"]);
    }

    #[test]
    fn invalid_json_template_yields_no_paths() {
        assert!(extract_page_section_paths("{% not json %}").is_empty());
    }

    #[test]
    fn settings_schema_defaults_and_overrides() {
        assert_eq!(SettingsSchema::parse(None), SettingsSchema::default());

        let schema = SettingsSchema::parse(Some(
            r#"[{"settings": [
                {"id": "search_products_limit", "default": 12},
                {"id": "products_per_page", "default": 24},
                {"id": "unrelated", "default": 99}
            ]}]"#,
        ));
        assert_eq!(schema.search_products_limit, 12);
        assert_eq!(schema.products_per_page, Some(24));
        assert_eq!(schema.search_collections_limit, None);
    }

    #[test]
    fn settings_schema_parse_never_errors() {
        assert_eq!(
            SettingsSchema::parse(Some("not json at all")),
            SettingsSchema::default()
        );
        assert_eq!(
            SettingsSchema::parse(Some("{\"an\": \"object\"}")),
            SettingsSchema::default()
        );
    }
}
