//! Crawl target description and identity

use crate::config::CrawlConfig;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use url::Url;

/// What to crawl, and how far
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTarget {
    /// Starting pages, processed in order
    pub seeds: Vec<Url>,

    /// Maximum number of pages to fetch, at least 1
    pub max_pages: u32,

    /// Maximum number of records to write, 0 for unbounded
    pub max_records: u64,
}

impl CrawlTarget {
    pub fn new(seeds: Vec<Url>, max_pages: u32, max_records: u64) -> Result<Self, ConfigError> {
        if max_pages < 1 {
            return Err(ConfigError::Validation(format!(
                "max_pages must be >= 1, got {}",
                max_pages
            )));
        }

        if let Some(seed) = seeds
            .iter()
            .find(|seed| seed.scheme() != "http" && seed.scheme() != "https")
        {
            return Err(ConfigError::Validation(format!(
                "Seed URL '{}' must use HTTP or HTTPS",
                seed
            )));
        }

        Ok(Self {
            seeds,
            max_pages,
            max_records,
        })
    }

    /// Builds a target from the `[crawl]` section of the configuration
    pub fn from_config(config: &CrawlConfig) -> Result<Self, ConfigError> {
        let seeds = config
            .seeds
            .iter()
            .map(|seed| {
                Url::parse(seed).map_err(|e| {
                    ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(seeds, config.max_pages, config.max_records)
    }

    /// Seeds in their serialized form, as stored in checkpoints
    pub fn seed_strings(&self) -> Vec<String> {
        self.seeds.iter().map(Url::to_string).collect()
    }

    /// Stable checkpoint key: SHA-256 hex of the seeds joined by newlines
    ///
    /// Budgets are not part of the identity, so a crawl can be resumed
    /// with a larger page or record limit.
    pub fn identity(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.seed_strings().join("\n").as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_rejects_zero_max_pages() {
        let result = CrawlTarget::new(vec![url("https://example.com/reviews")], 0, 0);
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_rejects_non_http_seed() {
        let result = CrawlTarget::new(vec![url("ftp://example.com/reviews")], 5, 0);
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_seeds_allowed() {
        let target = CrawlTarget::new(Vec::new(), 1, 0).unwrap();
        assert!(target.seeds.is_empty());
    }

    #[test]
    fn test_identity_is_stable_and_seed_dependent() {
        let a = CrawlTarget::new(vec![url("https://example.com/a")], 5, 0).unwrap();
        let a_again = CrawlTarget::new(vec![url("https://example.com/a")], 50, 10).unwrap();
        let b = CrawlTarget::new(vec![url("https://example.com/b")], 5, 0).unwrap();

        assert_eq!(a.identity(), a_again.identity());
        assert_ne!(a.identity(), b.identity());
        assert_eq!(a.identity().len(), 64);
    }

    #[test]
    fn test_identity_depends_on_order() {
        let ab = CrawlTarget::new(
            vec![url("https://example.com/a"), url("https://example.com/b")],
            5,
            0,
        )
        .unwrap();
        let ba = CrawlTarget::new(
            vec![url("https://example.com/b"), url("https://example.com/a")],
            5,
            0,
        )
        .unwrap();
        assert_ne!(ab.identity(), ba.identity());
    }

    #[test]
    fn test_from_config() {
        let config = CrawlConfig {
            seeds: vec!["https://example.com/reviews".to_string()],
            max_pages: 3,
            max_records: 7,
            ..CrawlConfig::default()
        };
        let target = CrawlTarget::from_config(&config).unwrap();
        assert_eq!(target.seeds.len(), 1);
        assert_eq!(target.max_pages, 3);
        assert_eq!(target.max_records, 7);

        let bad = CrawlConfig {
            seeds: vec!["::nope".to_string()],
            ..CrawlConfig::default()
        };
        assert!(matches!(
            CrawlTarget::from_config(&bad),
            Err(ConfigError::InvalidUrl(_))
        ));
    }
}
