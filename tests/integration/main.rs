//! Integration tests for review-trawl
//!
//! These tests drive the real HTTP fetcher against wiremock servers and write
//! to real files and SQLite checkpoint databases.

mod crawl_tests;
mod fetcher_tests;
