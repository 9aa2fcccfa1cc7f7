//! Pagination link resolution

use crate::extract::{compile_selector, element_text, ExtractionError, FieldMap, ParsedPage};
use crate::state::VisitedSet;
use crate::url::resolve_link;
use scraper::{ElementRef, Selector};
use url::Url;

/// Finds the "next page" link on a listing page
///
/// A candidate is any element matching the link selector. When a label is
/// configured, a candidate only qualifies if the label appears in its own
/// text, its `aria-label`, or the text of an enclosing control holding no
/// other link. A `rel="next"` candidate always qualifies. The first
/// qualifying candidate in document order wins.
#[derive(Debug, Clone)]
pub struct PaginationResolver {
    link: Selector,
    anchor: Selector,
    label: Option<String>,
}

impl PaginationResolver {
    pub fn new(fields: &FieldMap) -> Result<Self, ExtractionError> {
        Ok(Self {
            link: fields.compile_next_link()?,
            anchor: compile_selector("next link", "a[href]")?,
            label: fields
                .next_link_label
                .as_deref()
                .map(str::trim)
                .filter(|label| !label.is_empty())
                .map(str::to_string),
        })
    }

    /// Returns the absolute URL of the next page, or None if the chain ends
    ///
    /// The chain ends when no link qualifies, when the link has no usable
    /// href, or when it points at a page that was already visited.
    pub fn resolve_next(&self, page: &ParsedPage, visited: &VisitedSet) -> Option<Url> {
        let mut candidates = page
            .document
            .select(&self.link)
            .filter(|element| self.qualifies(*element));

        let Some(link) = candidates.next() else {
            tracing::debug!(url = %page.url, "No next link found");
            return None;
        };

        let extra = candidates.count();
        if extra > 0 {
            tracing::debug!(
                url = %page.url,
                extra,
                "Several next links matched, using the first"
            );
        }

        let href = link.value().attr("href").unwrap_or("");
        let Some(next) = resolve_link(href, &page.url) else {
            tracing::debug!(url = %page.url, href, "Next link has no usable target");
            return None;
        };

        if visited.contains(&next) {
            tracing::info!(url = %page.url, next = %next, "Next link points at a visited page");
            return None;
        }

        Some(next)
    }

    fn qualifies(&self, element: ElementRef<'_>) -> bool {
        let Some(label) = &self.label else {
            return true;
        };

        let attrs = element.value();

        if attrs
            .attr("rel")
            .is_some_and(|rel| rel.split_whitespace().any(|t| t.eq_ignore_ascii_case("next")))
        {
            return true;
        }

        if element_text(element).contains(label.as_str()) {
            return true;
        }

        if attrs.attr("aria-label").is_some_and(|a| a.contains(label.as_str())) {
            return true;
        }

        element
            .parent()
            .and_then(ElementRef::wrap)
            .filter(|parent| parent.select(&self.anchor).count() == 1)
            .is_some_and(|parent| element_text(parent).contains(label.as_str()))
    }
}
