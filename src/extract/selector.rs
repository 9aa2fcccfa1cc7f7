use crate::extract::{ExtractionError, FieldExtractor, FieldMap, Grouping, ParsedPage, Record};
use scraper::ElementRef;

/// Field extractor backed by `scraper` CSS selectors
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectorExtractor;

impl SelectorExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl FieldExtractor for SelectorExtractor {
    fn extract(&self, page: &ParsedPage, fields: &FieldMap) -> Result<Vec<Record>, ExtractionError> {
        let compiled = fields.compile()?;
        let document = &page.document;

        let records = match (fields.grouping, &compiled.review) {
            (Grouping::PerReview, Some(review)) => document
                .select(review)
                .map(|block| {
                    Record::new(
                        texts(block.select(&compiled.author)),
                        texts(block.select(&compiled.company_size)),
                        texts(block.select(&compiled.role)),
                        texts(block.select(&compiled.date)),
                        texts(block.select(&compiled.question)),
                        texts(block.select(&compiled.answer)),
                    )
                })
                .filter(|record| !record.is_empty())
                .collect(),
            (Grouping::PerReview, None) => return Err(ExtractionError::MissingReviewSelector),
            (Grouping::PerPage, review) => {
                // A page without review blocks has nothing to aggregate, even if
                // stray elements elsewhere match the field selectors.
                if let Some(review) = review {
                    if document.select(review).next().is_none() {
                        return Ok(Vec::new());
                    }
                }

                let record = Record::new(
                    texts(document.select(&compiled.author)),
                    texts(document.select(&compiled.company_size)),
                    texts(document.select(&compiled.role)),
                    texts(document.select(&compiled.date)),
                    texts(document.select(&compiled.question)),
                    texts(document.select(&compiled.answer)),
                );

                if record.is_empty() {
                    Vec::new()
                } else {
                    vec![record]
                }
            }
        };

        tracing::debug!(url = %page.url, records = records.len(), "Extracted records");
        Ok(records)
    }
}

/// Returns an element's text with whitespace runs collapsed to single spaces
pub fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Collects the non-empty text of every matched element, in document order
fn texts<'a>(elements: impl Iterator<Item = ElementRef<'a>>) -> Vec<String> {
    elements
        .map(element_text)
        .filter(|text| !text.is_empty())
        .collect()
}
