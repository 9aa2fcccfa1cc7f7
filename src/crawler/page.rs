//! Fetched page representation

use crate::extract::ParsedPage;
use url::Url;

/// How a fetched page was delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStatus {
    /// Served directly from the requested URL
    Ok,
    /// Served after one or more redirects
    Redirected,
    /// Delivered, but not something records can be extracted from
    Failed,
}

/// Raw page content, parsed on demand
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageBody(String);

impl PageBody {
    pub fn new(html: impl Into<String>) -> Self {
        Self(html.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The result of one successful fetch
#[derive(Debug, Clone)]
pub struct PageResult {
    /// The URL that was requested
    pub requested_url: Url,
    /// The URL the content was finally served from
    pub url: Url,
    pub status: PageStatus,
    pub body: PageBody,
}

impl PageResult {
    /// A page served directly from `url`
    pub fn ok(url: Url, html: impl Into<String>) -> Self {
        Self {
            requested_url: url.clone(),
            url,
            status: PageStatus::Ok,
            body: PageBody::new(html),
        }
    }

    /// A page served from `final_url` after redirects from `requested_url`
    pub fn redirected(requested_url: Url, final_url: Url, html: impl Into<String>) -> Self {
        Self {
            requested_url,
            url: final_url,
            status: PageStatus::Redirected,
            body: PageBody::new(html),
        }
    }

    /// A delivered page whose content cannot be processed
    pub fn failed(requested_url: Url, final_url: Url) -> Self {
        Self {
            requested_url,
            url: final_url,
            status: PageStatus::Failed,
            body: PageBody::default(),
        }
    }

    /// Returns true if records and links can be taken from this page
    pub fn is_usable(&self) -> bool {
        self.status != PageStatus::Failed
    }

    /// Parses the body, resolving relative links against the final URL
    pub fn parse(&self) -> ParsedPage {
        ParsedPage::parse(self.body.as_str(), self.url.clone())
    }
}
