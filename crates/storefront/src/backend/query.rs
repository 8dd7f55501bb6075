//! Typed query builder for the hosted backend's REST interface.
//!
//! The backend accepts PostgREST-style filters as query-string pairs
//! (`column=eq.value`, `order=price.asc`, `limit`/`offset`). Handlers
//! build a [`ProductQuery`] with explicit fields instead of assembling
//! stringly-typed filters, so a typo is a compile error rather than an
//! empty result set.

use fernwood_core::CategoryId;

/// Sort orders the product listing supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    /// Newest first (default).
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    NameAsc,
    NameDesc,
}

impl SortKey {
    /// Parse a client-facing sort parameter.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "newest" => Some(Self::Newest),
            "price_asc" => Some(Self::PriceAsc),
            "price_desc" => Some(Self::PriceDesc),
            "name_asc" => Some(Self::NameAsc),
            "name_desc" => Some(Self::NameDesc),
            _ => None,
        }
    }

    /// Render as a PostgREST `order` value.
    const fn as_order(self) -> &'static str {
        match self {
            Self::Newest => "created_at.desc",
            Self::PriceAsc => "price.asc",
            Self::PriceDesc => "price.desc",
            Self::NameAsc => "name.asc",
            Self::NameDesc => "name.desc",
        }
    }
}

/// Default page size for product listings.
const DEFAULT_LIMIT: u32 = 24;

/// Largest page a client may request in one call.
const MAX_LIMIT: u32 = 100;

/// A typed read query over the `products` table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductQuery {
    category: Option<CategoryId>,
    search: Option<String>,
    featured_only: bool,
    sort: SortKey,
    limit: Option<u32>,
    offset: Option<u32>,
}

impl ProductQuery {
    /// Start an unfiltered query.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to one category.
    #[must_use]
    pub fn category(mut self, category: CategoryId) -> Self {
        self.category = Some(category);
        self
    }

    /// Case-insensitive name match. Empty or whitespace-only terms are
    /// ignored.
    #[must_use]
    pub fn search(mut self, term: &str) -> Self {
        let term = sanitize_term(term);
        if !term.is_empty() {
            self.search = Some(term);
        }
        self
    }

    /// Restrict to featured products.
    #[must_use]
    pub const fn featured_only(mut self) -> Self {
        self.featured_only = true;
        self
    }

    /// Sort order.
    #[must_use]
    pub const fn sort(mut self, sort: SortKey) -> Self {
        self.sort = sort;
        self
    }

    /// Page size, clamped to [`MAX_LIMIT`].
    #[must_use]
    pub const fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(if limit > MAX_LIMIT { MAX_LIMIT } else { limit });
        self
    }

    /// Pagination offset.
    #[must_use]
    pub const fn offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Render as query-string pairs for the REST interface.
    #[must_use]
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![("select".to_string(), "*".to_string())];

        if let Some(category) = &self.category {
            pairs.push(("category_id".to_string(), format!("eq.{category}")));
        }
        if let Some(term) = &self.search {
            pairs.push(("name".to_string(), format!("ilike.*{term}*")));
        }
        if self.featured_only {
            pairs.push(("is_featured".to_string(), "eq.true".to_string()));
        }
        pairs.push(("order".to_string(), self.sort.as_order().to_string()));
        pairs.push((
            "limit".to_string(),
            self.limit.unwrap_or(DEFAULT_LIMIT).to_string(),
        ));
        if let Some(offset) = self.offset {
            pairs.push(("offset".to_string(), offset.to_string()));
        }

        pairs
    }

    /// Canonical cache key for this query.
    #[must_use]
    pub fn cache_key(&self) -> String {
        self.to_query_pairs()
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Strip characters the filter grammar treats specially, so a search term
/// cannot alter the shape of the query.
fn sanitize_term(term: &str) -> String {
    term.trim()
        .chars()
        .filter(|c| !matches!(c, '*' | ',' | '(' | ')' | '.' | '"' | '\\'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs_of(query: &ProductQuery) -> Vec<(String, String)> {
        query.to_query_pairs()
    }

    #[test]
    fn default_query_selects_all_with_default_page() {
        let pairs = pairs_of(&ProductQuery::new());
        assert_eq!(
            pairs,
            vec![
                ("select".to_string(), "*".to_string()),
                ("order".to_string(), "created_at.desc".to_string()),
                ("limit".to_string(), "24".to_string()),
            ]
        );
    }

    #[test]
    fn category_renders_equality_filter() {
        let pairs = pairs_of(&ProductQuery::new().category(CategoryId::new("cat_9")));
        assert!(pairs.contains(&("category_id".to_string(), "eq.cat_9".to_string())));
    }

    #[test]
    fn search_renders_ilike_filter() {
        let pairs = pairs_of(&ProductQuery::new().search("beanie"));
        assert!(pairs.contains(&("name".to_string(), "ilike.*beanie*".to_string())));
    }

    #[test]
    fn search_strips_filter_grammar_characters() {
        let pairs = pairs_of(&ProductQuery::new().search("be*an,ie.or(x)"));
        assert!(pairs.contains(&("name".to_string(), "ilike.*beanieorx*".to_string())));
    }

    #[test]
    fn blank_search_is_ignored() {
        let query = ProductQuery::new().search("   ");
        assert_eq!(query, ProductQuery::new());
    }

    #[test]
    fn limit_is_clamped() {
        let pairs = pairs_of(&ProductQuery::new().limit(10_000));
        assert!(pairs.contains(&("limit".to_string(), "100".to_string())));
    }

    #[test]
    fn sort_and_pagination_render() {
        let pairs = pairs_of(
            &ProductQuery::new()
                .sort(SortKey::PriceAsc)
                .limit(12)
                .offset(24),
        );
        assert!(pairs.contains(&("order".to_string(), "price.asc".to_string())));
        assert!(pairs.contains(&("limit".to_string(), "12".to_string())));
        assert!(pairs.contains(&("offset".to_string(), "24".to_string())));
    }

    #[test]
    fn cache_key_is_canonical() {
        let a = ProductQuery::new().search("hat").limit(12);
        let b = ProductQuery::new().search("hat").limit(12);
        assert_eq!(a.cache_key(), b.cache_key());
        assert_ne!(a.cache_key(), ProductQuery::new().cache_key());
    }

    #[test]
    fn sort_key_parses_known_values_only() {
        assert_eq!(SortKey::parse("price_asc"), Some(SortKey::PriceAsc));
        assert_eq!(SortKey::parse("newest"), Some(SortKey::Newest));
        assert_eq!(SortKey::parse("cheapest"), None);
    }
}
