//! Import configuration from environment variables.

use std::env;

use crate::image::MAX_FILE_SIZE;

/// Default number of recipes fetched at the same time.
pub const DEFAULT_MAX_CONCURRENCY: usize = 8;

/// Default Mealie listing page size.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Tuning knobs for one import run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportConfig {
    /// Maximum item tasks in flight. Never below 1.
    pub max_concurrency: usize,
    /// Images larger than this are not relayed.
    pub max_image_bytes: usize,
    /// Items per listing page, for platforms that take a page size.
    pub page_size: usize,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            max_image_bytes: MAX_FILE_SIZE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ImportConfig {
    /// Load configuration from environment variables.
    ///
    /// Optional:
    /// - `RAMEKIN_IMPORT_CONCURRENCY`: in-flight recipe fetches (default: 8)
    /// - `RAMEKIN_IMPORT_MAX_IMAGE_BYTES`: image size cap (default: 10MB)
    /// - `RAMEKIN_IMPORT_PAGE_SIZE`: listing page size (default: 100)
    ///
    /// Unparseable values fall back to the default.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self::default()
            .max_concurrency(env_usize("RAMEKIN_IMPORT_CONCURRENCY").unwrap_or(defaults.max_concurrency))
            .max_image_bytes(
                env_usize("RAMEKIN_IMPORT_MAX_IMAGE_BYTES").unwrap_or(defaults.max_image_bytes),
            )
            .page_size(env_usize("RAMEKIN_IMPORT_PAGE_SIZE").unwrap_or(defaults.page_size))
    }

    pub fn max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    pub fn max_image_bytes(mut self, max_image_bytes: usize) -> Self {
        self.max_image_bytes = max_image_bytes;
        self
    }

    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }
}

fn env_usize(name: &str) -> Option<usize> {
    let raw = env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(name, value = %raw, "ignoring invalid setting");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ImportConfig::default();
        assert_eq!(config.max_concurrency, 8);
        assert_eq!(config.max_image_bytes, 10 * 1024 * 1024);
        assert_eq!(config.page_size, 100);
    }

    #[test]
    fn test_concurrency_is_at_least_one() {
        assert_eq!(ImportConfig::default().max_concurrency(0).max_concurrency, 1);
        assert_eq!(ImportConfig::default().max_concurrency(3).max_concurrency, 3);
    }
}
