//! Crawler module for page fetching and pagination
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with retry policy
//! - "Next page" link resolution
//! - Crawl target identity
//! - The controller state machine that ties them together

mod controller;
mod fetcher;
mod page;
mod resolver;
mod target;

pub use controller::{Controller, CrawlReport, FailureReason};
pub use fetcher::{
    build_http_client, user_agent_string, FetchError, HttpFetcher, PageFetcher, RetryPolicy,
};
pub use page::{PageBody, PageResult, PageStatus};
pub use resolver::PaginationResolver;
pub use target::CrawlTarget;
