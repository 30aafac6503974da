//! Data requirement analysis.
//!
//! The analyzer walks template source (layout + page template + sections) and
//! produces a map of `(data kind, load options)` pairs describing what a full
//! render needs. The map is the contract consumed by the data loader: one
//! entry per distinct kind, each carrying an optional limit, an optional
//! pagination cursor, and the handles addressed by bracket lookups.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static PRODUCTS_OBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{-?\s*products\s*[|\}]").unwrap());
static COLLECTIONS_OBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{-?\s*collections\s*[|\}]").unwrap());
static PRODUCT_OBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{-?\s*product\.").unwrap());
static COLLECTION_OBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{-?\s*collection\.").unwrap());
static COLLECTION_PRODUCTS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bcollection\.products\b").unwrap());
static CART_OBJECT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{\{-?\s*cart\.").unwrap());
static LINKLISTS_OBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{-?\s*linklists\.").unwrap());
static SHOP_OBJECT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{\{-?\s*shop\.").unwrap());
static PAGE_OBJECT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{\{-?\s*page\.").unwrap());
static BLOG_OBJECT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{\{-?\s*blog\.").unwrap());
static PAGES_OBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{-?\s*pages\s*[|\}]").unwrap());
static POLICIES_OBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{-?\s*policies\b").unwrap());
static RELATED_PRODUCTS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\brelated_products\b").unwrap());

/// `collections.handle` and `collections.handle.products` dotted lookups.
static COLLECTION_HANDLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"collections\.([A-Za-z0-9_-]+)(\.products)?").unwrap());
/// `products['handle']` bracket lookups.
static PRODUCT_HANDLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"products\[['"]([^'"]+)['"]\]"#).unwrap());
/// `pages['handle']` bracket lookups.
static PAGE_HANDLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"pages\[['"]([^'"]+)['"]\]"#).unwrap());

static PAGINATE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{%-?\s*paginate\s+([^%]+?)\s*-?%\}").unwrap());
static PAGINATE_ARGS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\S+)\s+by\s+(\d+)").unwrap());
static SECTION_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\{%-?\s*section\s+['"]([^'"]+)['"]"#).unwrap());
static SNIPPET_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\{%-?\s*(?:render|include)\s+['"]([^'"]+)['"]"#).unwrap());

static PRODUCTS_LIMIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)products[^}]*limit:\s*(\d+)").unwrap());
static COLLECTIONS_LIMIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)collections[^}]*limit:\s*(\d+)").unwrap());

/// One category of store data a page render may need.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataKind {
    Products,
    Collections,
    Product,
    Collection,
    SpecificProduct,
    SpecificCollection,
    ProductsByCollection,
    RelatedProducts,
    Cart,
    Linklists,
    Shop,
    Page,
    SpecificPage,
    Pages,
    Policies,
    Pagination,
    CollectionProducts,
    Blog,
}

impl DataKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Products => "products",
            Self::Collections => "collections",
            Self::Product => "product",
            Self::Collection => "collection",
            Self::SpecificProduct => "specific_product",
            Self::SpecificCollection => "specific_collection",
            Self::ProductsByCollection => "products_by_collection",
            Self::RelatedProducts => "related_products",
            Self::Cart => "cart",
            Self::Linklists => "linklists",
            Self::Shop => "shop",
            Self::Page => "page",
            Self::SpecificPage => "specific_page",
            Self::Pages => "pages",
            Self::Policies => "policies",
            Self::Pagination => "pagination",
            Self::CollectionProducts => "collection_products",
            Self::Blog => "blog",
        }
    }

    /// Kinds whose effective limit may be overridden by the store's
    /// `products_per_page` schema setting.
    #[must_use]
    pub const fn is_paginable(self) -> bool {
        matches!(
            self,
            Self::Products | Self::Collections | Self::CollectionProducts
        )
    }
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Load options attached to one requirement kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadOptions {
    pub limit: Option<usize>,
    pub next_token: Option<String>,
    pub handles: Vec<String>,
}

impl LoadOptions {
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_handle(handle: impl Into<String>) -> Self {
        Self {
            handles: vec![handle.into()],
            ..Self::default()
        }
    }

    /// Merges another requirement's options into this one: highest limit
    /// wins, handles union without duplicates, first token wins.
    fn merge(&mut self, other: &Self) {
        self.limit = match (self.limit, other.limit) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
        if self.next_token.is_none() {
            self.next_token.clone_from(&other.next_token);
        }
        for handle in &other.handles {
            if !self.handles.contains(handle) {
                self.handles.push(handle.clone());
            }
        }
    }
}

/// Result of analyzing one template or a composed set of templates.
#[derive(Debug, Clone, Default)]
pub struct TemplateAnalysis {
    pub required_data: BTreeMap<DataKind, LoadOptions>,
    pub has_pagination: bool,
    pub used_sections: Vec<String>,
    pub liquid_objects: Vec<String>,
    pub dependencies: Vec<String>,
}

impl TemplateAnalysis {
    /// Records a requirement, merging with any existing entry of the same
    /// kind.
    pub fn require(&mut self, kind: DataKind, options: LoadOptions) {
        self.required_data
            .entry(kind)
            .and_modify(|existing| existing.merge(&options))
            .or_insert(options);
    }

    fn require_if_absent(&mut self, kind: DataKind, options: LoadOptions) {
        self.required_data.entry(kind).or_insert(options);
    }

    /// Folds another analysis into this one.
    pub fn merge(&mut self, other: &Self) {
        for (kind, options) in &other.required_data {
            self.require(*kind, options.clone());
        }
        self.has_pagination = self.has_pagination || other.has_pagination;
        for section in &other.used_sections {
            if !self.used_sections.contains(section) {
                self.used_sections.push(section.clone());
            }
        }
        for object in &other.liquid_objects {
            if !self.liquid_objects.contains(object) {
                self.liquid_objects.push(object.clone());
            }
        }
        for dependency in &other.dependencies {
            if !self.dependencies.contains(dependency) {
                self.dependencies.push(dependency.clone());
            }
        }
    }
}

/// Stateless analyzer. Cheap to construct; all patterns are process-wide
/// statics.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateAnalyzer;

impl TemplateAnalyzer {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Analyzes a single template's source.
    #[must_use]
    pub fn analyze_template(&self, content: &str, template_path: &str) -> TemplateAnalysis {
        let mut analysis = TemplateAnalysis::default();
        self.detect_objects(content, &mut analysis);
        self.detect_handle_lookups(content, &mut analysis);
        self.detect_pagination(content, &mut analysis);
        self.detect_dependencies(content, &mut analysis);
        self.infer_from_path(template_path, &mut analysis);

        tracing::debug!(
            template = template_path,
            kinds = ?analysis.required_data.keys().collect::<Vec<_>>(),
            "template analysis complete"
        );
        analysis
    }

    /// Analyzes a composed set (layout + page + sections), merging the
    /// per-template results.
    #[must_use]
    pub fn analyze_set(&self, templates: &BTreeMap<String, String>) -> TemplateAnalysis {
        let mut combined = TemplateAnalysis::default();
        for (path, content) in templates {
            combined.merge(&self.analyze_template(content, path));
        }
        combined
    }

    fn detect_objects(&self, content: &str, analysis: &mut TemplateAnalysis) {
        let object_patterns: [(&Regex, DataKind); 12] = [
            (&PRODUCTS_OBJECT, DataKind::Products),
            (&COLLECTIONS_OBJECT, DataKind::Collections),
            (&PRODUCT_OBJECT, DataKind::Product),
            (&COLLECTION_OBJECT, DataKind::Collection),
            (&COLLECTION_PRODUCTS, DataKind::CollectionProducts),
            (&CART_OBJECT, DataKind::Cart),
            (&LINKLISTS_OBJECT, DataKind::Linklists),
            (&SHOP_OBJECT, DataKind::Shop),
            (&PAGE_OBJECT, DataKind::Page),
            (&PAGES_OBJECT, DataKind::Pages),
            (&POLICIES_OBJECT, DataKind::Policies),
            (&BLOG_OBJECT, DataKind::Blog),
        ];

        for (pattern, kind) in object_patterns {
            if pattern.is_match(content) {
                analysis.liquid_objects.push(kind.as_str().to_string());
                analysis.require(kind, self.load_options_for(kind, content));
            }
        }

        if RELATED_PRODUCTS.is_match(content) {
            analysis.require(DataKind::RelatedProducts, LoadOptions::with_limit(4));
        }
    }

    /// Explicit filter limits in the source, with per-kind defaults.
    fn load_options_for(&self, kind: DataKind, content: &str) -> LoadOptions {
        match kind {
            DataKind::Products => LoadOptions::with_limit(extract_limit(
                &PRODUCTS_LIMIT,
                content,
                20,
            )),
            DataKind::Collections => LoadOptions::with_limit(extract_limit(
                &COLLECTIONS_LIMIT,
                content,
                10,
            )),
            DataKind::CollectionProducts => LoadOptions::with_limit(8),
            _ => LoadOptions::default(),
        }
    }

    /// Handle-addressed lookups: `collections.featured`,
    /// `collections.featured.products`, `products['slug']`, `pages['about']`.
    fn detect_handle_lookups(&self, content: &str, analysis: &mut TemplateAnalysis) {
        for captures in COLLECTION_HANDLE.captures_iter(content) {
            let handle = captures[1].to_string();
            if captures.get(2).is_some() {
                let mut options = LoadOptions::with_handle(handle);
                options.limit = Some(8);
                analysis.require(DataKind::ProductsByCollection, options);
            } else {
                analysis.require(DataKind::SpecificCollection, LoadOptions::with_handle(handle));
            }
        }

        for captures in PRODUCT_HANDLE.captures_iter(content) {
            analysis.require(
                DataKind::SpecificProduct,
                LoadOptions::with_handle(captures[1].to_string()),
            );
        }

        for captures in PAGE_HANDLE.captures_iter(content) {
            analysis.require(
                DataKind::SpecificPage,
                LoadOptions::with_handle(captures[1].to_string()),
            );
        }
    }

    fn detect_pagination(&self, content: &str, analysis: &mut TemplateAnalysis) {
        for tag in PAGINATE_TAG.captures_iter(content) {
            analysis.has_pagination = true;
            analysis.require_if_absent(DataKind::Pagination, LoadOptions::default());

            let Some(args) = PAGINATE_ARGS.captures(&tag[1]) else {
                continue;
            };
            let target = &args[1];
            let Ok(limit) = args[2].parse::<usize>() else {
                continue;
            };

            if target.contains("collection.products") {
                analysis.require(DataKind::CollectionProducts, LoadOptions::with_limit(limit));
            } else if target.contains("products") {
                analysis.require(DataKind::Products, LoadOptions::with_limit(limit));
            } else if target.contains("collections") {
                analysis.require(DataKind::Collections, LoadOptions::with_limit(limit));
            }
        }
    }

    fn detect_dependencies(&self, content: &str, analysis: &mut TemplateAnalysis) {
        for captures in SECTION_TAG.captures_iter(content) {
            let name = captures[1].to_string();
            let dependency = format!("sections/{name}.liquid");
            if !analysis.used_sections.contains(&name) {
                analysis.used_sections.push(name);
            }
            if !analysis.dependencies.contains(&dependency) {
                analysis.dependencies.push(dependency);
            }
        }

        for captures in SNIPPET_TAG.captures_iter(content) {
            let dependency = format!("snippets/{}.liquid", &captures[1]);
            if !analysis.dependencies.contains(&dependency) {
                analysis.dependencies.push(dependency);
            }
        }
    }

    /// Path-derived requirements plus the kinds every page needs (cart for
    /// the header badge, linklists for navigation, shop info everywhere).
    fn infer_from_path(&self, template_path: &str, analysis: &mut TemplateAnalysis) {
        if template_path.contains("index") {
            analysis.require_if_absent(DataKind::Collections, LoadOptions::with_limit(6));
        } else if template_path.contains("product") {
            analysis.require_if_absent(DataKind::Product, LoadOptions::default());
        } else if template_path.contains("collection") {
            analysis.require_if_absent(DataKind::Collection, LoadOptions::default());
        } else if template_path.contains("cart") {
            analysis.require_if_absent(DataKind::Cart, LoadOptions::default());
        } else if template_path.contains("policies") {
            analysis.require_if_absent(DataKind::Policies, LoadOptions::default());
        }

        analysis.require_if_absent(DataKind::Cart, LoadOptions::default());
        analysis.require_if_absent(DataKind::Linklists, LoadOptions::default());
        analysis.require_if_absent(DataKind::Shop, LoadOptions::default());
    }
}

fn extract_limit(pattern: &Regex, content: &str, default: usize) -> usize {
    pattern
        .captures(content)
        .and_then(|captures| captures[1].parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyze(content: &str) -> TemplateAnalysis {
        TemplateAnalyzer::new().analyze_template(content, "sections/test.liquid")
    }

    #[test]
    fn detects_basic_objects() {
        let analysis = analyze("{{ products }} {{ cart.item_count }} {{ shop.name }}");
        assert!(analysis.required_data.contains_key(&DataKind::Products));
        assert!(analysis.required_data.contains_key(&DataKind::Cart));
        assert!(analysis.required_data.contains_key(&DataKind::Shop));
    }

    #[test]
    fn products_limit_from_filter_or_default() {
        let analysis = analyze("{{ products | limit: 12 }}");
        assert_eq!(
            analysis.required_data[&DataKind::Products].limit,
            Some(12)
        );
        let analysis = analyze("{{ products }}");
        assert_eq!(
            analysis.required_data[&DataKind::Products].limit,
            Some(20)
        );
    }

    #[test]
    fn collection_handle_lookups_branch_on_products_suffix() {
        let analysis = analyze("{{ collections.featured.products }} {{ collections.sale }}");
        assert_eq!(
            analysis.required_data[&DataKind::ProductsByCollection].handles,
            vec!["featured"]
        );
        assert_eq!(
            analysis.required_data[&DataKind::SpecificCollection].handles,
            vec!["sale"]
        );
    }

    #[test]
    fn bracket_lookups_collect_handles() {
        let analysis = analyze("{{ products['red-shirt'] }} {{ products[\"blue-hat\"] }} {{ pages['about'] }}");
        assert_eq!(
            analysis.required_data[&DataKind::SpecificProduct].handles,
            vec!["red-shirt", "blue-hat"]
        );
        assert_eq!(
            analysis.required_data[&DataKind::SpecificPage].handles,
            vec!["about"]
        );
    }

    #[test]
    fn paginate_tag_sets_pagination_and_limit() {
        let analysis = analyze("{% paginate products by 12 %}{% endpaginate %}");
        assert!(analysis.has_pagination);
        assert!(analysis.required_data.contains_key(&DataKind::Pagination));
        assert_eq!(
            analysis.required_data[&DataKind::Products].limit,
            Some(12)
        );
    }

    #[test]
    fn paginate_collection_products_maps_to_collection_products_kind() {
        let analysis = analyze("{% paginate collection.products by 9 %}{% endpaginate %}");
        assert_eq!(
            analysis.required_data[&DataKind::CollectionProducts].limit,
            Some(9)
        );
    }

    #[test]
    fn sections_and_snippets_become_dependencies() {
        let analysis = analyze("{% section 'header' %} {% render 'price' %} {% include 'card' %}");
        assert_eq!(analysis.used_sections, vec!["header"]);
        assert_eq!(
            analysis.dependencies,
            vec![
                "sections/header.liquid",
                "snippets/price.liquid",
                "snippets/card.liquid"
            ]
        );
    }

    #[test]
    fn always_requires_cart_linklists_shop() {
        let analysis = analyze("static text only");
        assert!(analysis.required_data.contains_key(&DataKind::Cart));
        assert!(analysis.required_data.contains_key(&DataKind::Linklists));
        assert!(analysis.required_data.contains_key(&DataKind::Shop));
    }

    #[test]
    fn index_path_infers_collections() {
        let analysis =
            TemplateAnalyzer::new().analyze_template("hello", "templates/index.json");
        assert_eq!(
            analysis.required_data[&DataKind::Collections].limit,
            Some(6)
        );
    }

    #[test]
    fn merge_unions_handles_and_takes_max_limit() {
        let mut target = TemplateAnalysis::default();
        target.require(
            DataKind::SpecificProduct,
            LoadOptions {
                limit: Some(4),
                handles: vec!["a".to_string()],
                ..LoadOptions::default()
            },
        );
        let mut source = TemplateAnalysis::default();
        source.require(
            DataKind::SpecificProduct,
            LoadOptions {
                limit: Some(9),
                handles: vec!["a".to_string(), "b".to_string()],
                ..LoadOptions::default()
            },
        );
        target.merge(&source);

        let merged = &target.required_data[&DataKind::SpecificProduct];
        assert_eq!(merged.limit, Some(9));
        assert_eq!(merged.handles, vec!["a", "b"]);
    }

    #[test]
    fn analyze_set_merges_all_templates() {
        let templates = BTreeMap::from([
            (
                "layout/theme.liquid".to_string(),
                "{% section 'header' %}".to_string(),
            ),
            (
                "templates/index.json".to_string(),
                "{{ products }}".to_string(),
            ),
        ]);
        let analysis = TemplateAnalyzer::new().analyze_set(&templates);
        assert!(analysis.required_data.contains_key(&DataKind::Products));
        assert!(analysis.required_data.contains_key(&DataKind::Collections));
        assert_eq!(analysis.used_sections, vec!["header"]);
    }
}
