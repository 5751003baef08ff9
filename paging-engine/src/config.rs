// 2022-2026 (c) Copyright Contributors to the GOSH DAO. All rights reserved.
//

use serde::Deserialize;
use serde::Serialize;

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const MAX_PAGE_SIZE: usize = 100;

/// Engine-wide paging limits.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PagingConfig {
    /// Page size used when neither `first` nor `last` is given.
    /// Defaults to 10
    #[serde(default = "default_page_size")]
    pub default_page_size: usize,

    /// Largest accepted `first`/`last`.
    /// Defaults to 100
    #[serde(default = "max_page_size")]
    pub max_page_size: usize,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self { default_page_size: DEFAULT_PAGE_SIZE, max_page_size: MAX_PAGE_SIZE }
    }
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn max_page_size() -> usize {
    MAX_PAGE_SIZE
}

#[cfg(test)]
mod tests {
    use super::PagingConfig;

    #[test]
    fn test_config_defaults() -> anyhow::Result<()> {
        let config: PagingConfig = serde_json::from_str("{}")?;
        assert_eq!(config, PagingConfig::default());
        assert_eq!(config.default_page_size, 10);

        let config: PagingConfig = serde_json::from_str(r#"{ "max_page_size": 500 }"#)?;
        assert_eq!(config.max_page_size, 500);
        assert_eq!(config.default_page_size, 10);
        Ok(())
    }
}
