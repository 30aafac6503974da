//! Pagination state shared by the `paginate` tag and the data loader.
//!
//! Both surfaces hand templates the same `paginate` object: page counts,
//! previous/next parts, and a windowed list of page links with ellipsis
//! placeholders. URLs are relative query strings (`?` for page one,
//! `?page=N` otherwise) so they compose with whatever path served the page.

use serde::Serialize;
use serde_json::{json, Value};

use crate::liquid::RequestState;

/// How many numbered page links to show around the current page.
const PAGE_WINDOW: usize = 5;

/// One entry in the rendered pagination controls: a page number, an ellipsis
/// placeholder, or a Previous/Next link.
#[derive(Debug, Clone, Serialize)]
pub struct PagePart {
    pub title: Value,
    pub url: Option<String>,
    pub is_link: bool,
}

impl PagePart {
    fn page(number: usize, current: usize) -> Self {
        Self {
            title: json!(number),
            url: (number != current).then(|| page_url(number)),
            is_link: number != current,
        }
    }

    fn ellipsis() -> Self {
        Self {
            title: json!("…"),
            url: None,
            is_link: false,
        }
    }
}

/// The `paginate` template object.
#[derive(Debug, Clone, Serialize)]
pub struct Paginate {
    pub current_page: usize,
    pub current_offset: usize,
    pub items: usize,
    pub pages: usize,
    pub page_size: usize,
    pub parts: Vec<PagePart>,
    pub previous: Option<PagePart>,
    pub next: Option<PagePart>,
    /// Page 1, always present; `is_link` is false when already there.
    pub first: PagePart,
    /// The last page, always present; `is_link` is false when already there.
    pub last: PagePart,
}

impl Paginate {
    /// Builds pagination state for `total_items` items shown `limit` per
    /// page, with `current_page` 1-based and clamped into range.
    #[must_use]
    pub fn build(current_page: usize, limit: usize, total_items: usize) -> Self {
        let limit = limit.max(1);
        let pages = total_items.div_ceil(limit).max(1);
        let current_page = current_page.clamp(1, pages);

        let previous = (current_page > 1).then(|| PagePart {
            title: json!("Previous"),
            url: Some(page_url(current_page - 1)),
            is_link: true,
        });
        let next = (current_page < pages).then(|| PagePart {
            title: json!("Next"),
            url: Some(page_url(current_page + 1)),
            is_link: true,
        });
        Self {
            current_page,
            current_offset: (current_page - 1) * limit,
            items: total_items,
            pages,
            page_size: limit,
            parts: window_parts(current_page, pages),
            previous,
            next,
            first: PagePart::page(1, current_page),
            last: PagePart::page(pages, current_page),
        }
    }

    /// Builds pagination state from a cursor-style fetch response: the
    /// backend reports a total count and whether another page exists.
    #[must_use]
    pub fn from_cursor(
        next_token: Option<&str>,
        total_items: usize,
        limit: usize,
        request: &RequestState,
    ) -> Self {
        let mut paginate = Self::build(request.page(), limit, total_items);
        if next_token.is_none() {
            // The backend says there is nothing after this page even if the
            // count implies otherwise.
            paginate.next = None;
        }
        paginate
    }

    /// The object as a context value, under the shape templates address
    /// (`paginate.pages`, `paginate.parts`, ...).
    #[must_use]
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Relative URL for a page: page one is the bare path query, later pages
/// carry an explicit `page` parameter.
#[must_use]
pub fn page_url(page: usize) -> String {
    if page <= 1 {
        "?".to_string()
    } else {
        format!("?page={page}")
    }
}

/// Numbered parts windowed around the current page, with the first and last
/// pages always anchored and ellipsis placeholders for the gaps.
fn window_parts(current: usize, pages: usize) -> Vec<PagePart> {
    if pages <= PAGE_WINDOW + 2 {
        return (1..=pages).map(|n| PagePart::page(n, current)).collect();
    }

    let half = PAGE_WINDOW / 2;
    let mut start = current.saturating_sub(half).max(1);
    let mut end = start + PAGE_WINDOW - 1;
    if end > pages {
        end = pages;
        start = end + 1 - PAGE_WINDOW;
    }

    let mut parts = Vec::new();
    if start > 1 {
        parts.push(PagePart::page(1, current));
        if start > 2 {
            parts.push(PagePart::ellipsis());
        }
    }
    for n in start..=end {
        parts.push(PagePart::page(n, current));
    }
    if end < pages {
        if end < pages - 1 {
            parts.push(PagePart::ellipsis());
        }
        parts.push(PagePart::page(pages, current));
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_page_counts_list_every_page() {
        let p = Paginate::build(2, 10, 25);
        assert_eq!(p.pages, 3);
        assert_eq!(p.current_page, 2);
        assert_eq!(p.current_offset, 10);
        assert_eq!(p.parts.len(), 3);
        assert!(p.parts.iter().all(|part| part.title.is_number()));
    }

    #[test]
    fn current_page_part_is_not_a_link() {
        let p = Paginate::build(2, 10, 30);
        let current = &p.parts[1];
        assert_eq!(current.title, serde_json::json!(2));
        assert!(!current.is_link);
        assert!(current.url.is_none());
    }

    #[test]
    fn first_page_has_no_previous_and_last_has_no_next() {
        let first = Paginate::build(1, 10, 30);
        assert!(first.previous.is_none());
        assert!(first.next.is_some());

        let last = Paginate::build(3, 10, 30);
        assert!(last.previous.is_some());
        assert!(last.next.is_none());
    }

    #[test]
    fn first_and_last_are_always_present_with_edge_state_in_is_link() {
        let p = Paginate::build(1, 10, 30);
        assert_eq!(p.first.title, json!(1));
        assert!(!p.first.is_link);
        assert!(p.first.url.is_none());
        assert_eq!(p.last.title, json!(3));
        assert!(p.last.is_link);
        assert_eq!(p.last.url.as_deref(), Some("?page=3"));

        let p = Paginate::build(3, 10, 30);
        assert!(p.first.is_link);
        assert_eq!(p.first.url.as_deref(), Some("?"));
        assert!(!p.last.is_link);

        let value = Paginate::build(1, 10, 30).to_value();
        assert_eq!(value["first"]["title"], json!(1));
        assert_eq!(value["last"]["title"], json!(3));
    }

    #[test]
    fn page_urls_use_query_string_form() {
        assert_eq!(page_url(1), "?");
        assert_eq!(page_url(4), "?page=4");
        let p = Paginate::build(2, 10, 30);
        assert_eq!(p.previous.unwrap().url.unwrap(), "?");
        assert_eq!(p.next.unwrap().url.unwrap(), "?page=3");
    }

    #[test]
    fn long_ranges_window_with_ellipsis() {
        let p = Paginate::build(10, 10, 200);
        let titles: Vec<String> = p
            .parts
            .iter()
            .map(|part| match &part.title {
                Value::Number(n) => n.to_string(),
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect();
        assert_eq!(titles, ["1", "…", "8", "9", "10", "11", "12", "…", "20"]);
    }

    #[test]
    fn window_clamps_at_range_edges() {
        let p = Paginate::build(1, 10, 200);
        let first_titles: Vec<&Value> = p.parts.iter().map(|part| &part.title).collect();
        assert_eq!(first_titles[0], &json!(1));
        // No leading ellipsis when the window already starts at page 1.
        assert!(p.parts[1].title.is_number());

        let p = Paginate::build(20, 10, 200);
        assert_eq!(p.parts.last().unwrap().title, json!(20));
        assert!(p.parts[p.parts.len() - 2].title.is_number());
    }

    #[test]
    fn out_of_range_page_clamps() {
        let p = Paginate::build(99, 10, 30);
        assert_eq!(p.current_page, 3);
        let p = Paginate::build(0, 10, 30);
        assert_eq!(p.current_page, 1);
    }

    #[test]
    fn cursor_form_drops_next_when_no_token() {
        let request = RequestState {
            current_page: Some(1),
            ..RequestState::default()
        };
        let p = Paginate::from_cursor(None, 50, 10, &request);
        assert!(p.next.is_none());
        let p = Paginate::from_cursor(Some("abc"), 50, 10, &request);
        assert!(p.next.is_some());
    }

    #[test]
    fn to_value_exposes_template_fields() {
        let value = Paginate::build(1, 10, 30).to_value();
        assert_eq!(value["pages"], json!(3));
        assert_eq!(value["items"], json!(30));
        assert!(value["parts"].is_array());
    }
}
