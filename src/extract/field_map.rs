use crate::extract::ExtractionError;
use crate::ConfigError;
use scraper::Selector;
use serde::{Deserialize, Serialize};

/// How extracted values are grouped into records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Grouping {
    /// One record per page, each field holding every match on the page
    #[default]
    PerPage,

    /// One record per review block, fields scoped to the block
    PerReview,
}

/// Declarative map from logical record fields to CSS selectors
///
/// The defaults target the review listing layout the crawler was first
/// written for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct FieldMap {
    pub grouping: Grouping,

    /// Element wrapping one review
    pub review_selector: Option<String>,

    pub author_selector: String,
    pub company_size_selector: String,
    pub role_selector: String,
    pub date_selector: String,
    pub question_selector: String,
    pub answer_selector: String,

    /// Candidate "next page" anchors
    pub next_link_selector: String,

    /// Text that marks a candidate as the "next" control
    pub next_link_label: Option<String>,
}

impl Default for FieldMap {
    fn default() -> Self {
        Self {
            grouping: Grouping::PerPage,
            review_selector: Some("div[itemprop*=review]".to_string()),
            author_selector: "span[itemprop*=author]".to_string(),
            company_size_selector: "span.ml-4th".to_string(),
            role_selector: "div.mt-4th".to_string(),
            date_selector: "time".to_string(),
            question_selector: "h5.l5".to_string(),
            answer_selector: "p.formatted-text".to_string(),
            next_link_selector: "li a[href]".to_string(),
            next_link_label: Some("Next".to_string()),
        }
    }
}

/// Parsed selectors for one field map
#[derive(Debug)]
pub struct CompiledFields {
    pub review: Option<Selector>,
    pub author: Selector,
    pub company_size: Selector,
    pub role: Selector,
    pub date: Selector,
    pub question: Selector,
    pub answer: Selector,
}

impl FieldMap {
    /// Parses the record field selectors
    pub fn compile(&self) -> Result<CompiledFields, ExtractionError> {
        let review = self
            .review_selector
            .as_deref()
            .map(|s| compile_selector("review", s))
            .transpose()?;

        if self.grouping == Grouping::PerReview && review.is_none() {
            return Err(ExtractionError::MissingReviewSelector);
        }

        Ok(CompiledFields {
            review,
            author: compile_selector("author", &self.author_selector)?,
            company_size: compile_selector("company_size", &self.company_size_selector)?,
            role: compile_selector("role", &self.role_selector)?,
            date: compile_selector("date", &self.date_selector)?,
            question: compile_selector("question", &self.question_selector)?,
            answer: compile_selector("answer", &self.answer_selector)?,
        })
    }

    /// Parses the next-link selector
    pub fn compile_next_link(&self) -> Result<Selector, ExtractionError> {
        compile_selector("next_link", &self.next_link_selector)
    }

    /// Checks that every selector parses and the grouping is usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.compile()
            .and_then(|_| self.compile_next_link())
            .map(|_| ())
            .map_err(|e| match e {
                ExtractionError::InvalidSelector { field, selector } => {
                    ConfigError::InvalidSelector { field, selector }
                }
                other => ConfigError::Validation(other.to_string()),
            })
    }
}

/// Parses one selector, naming the field it belongs to on failure
pub fn compile_selector(field: &'static str, selector: &str) -> Result<Selector, ExtractionError> {
    Selector::parse(selector).map_err(|_| ExtractionError::InvalidSelector {
        field,
        selector: selector.to_string(),
    })
}
