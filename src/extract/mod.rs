//! Record extraction from parsed listing pages
//!
//! This module defines:
//! - the `Record` written for each review
//! - the declarative `FieldMap` of CSS selectors
//! - the `FieldExtractor` seam and its `scraper`-based implementation

mod field_map;
mod record;
mod selector;

pub use field_map::{compile_selector, CompiledFields, FieldMap, Grouping};
pub use record::{pair_up, QaPair, Record};
pub use selector::{element_text, SelectorExtractor};

use scraper::Html;
use thiserror::Error;
use url::Url;

/// Errors raised while extracting records from a page
///
/// The crawl controller treats these as "no records on this page".
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Invalid selector '{selector}' for {field}")]
    InvalidSelector { field: &'static str, selector: String },

    #[error("Per-review grouping requires a review selector")]
    MissingReviewSelector,
}

/// A fetched page parsed into a document tree
#[derive(Debug)]
pub struct ParsedPage {
    /// URL the content was served from, used to resolve relative links
    pub url: Url,
    pub document: Html,
}

impl ParsedPage {
    pub fn parse(html: &str, url: Url) -> Self {
        Self {
            url,
            document: Html::parse_document(html),
        }
    }
}

/// Turns a parsed page into records according to a field map
pub trait FieldExtractor {
    fn extract(&self, page: &ParsedPage, fields: &FieldMap) -> Result<Vec<Record>, ExtractionError>;
}
