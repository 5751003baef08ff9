// 2022-2026 (c) Copyright Contributors to the GOSH DAO. All rights reserved.
//

use std::path::PathBuf;

use paging_engine::config::MAX_PAGE_SIZE;
use paging_engine::PagingConfig;
use serde::Deserialize;
use serde::Serialize;

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerConfig {
    /// Page size limits of every paginated field.
    #[serde(default)]
    pub paging: PagingConfig,
}

impl ServerConfig {
    pub fn with_max_page_size(mut self, max_page_size: Option<usize>) -> Self {
        if let Some(max_page_size) = max_page_size {
            self.paging.max_page_size = max_page_size;
        }
        self
    }

    pub fn ensure_page_sizes(mut self) -> Self {
        if self.paging.max_page_size == 0 {
            tracing::warn!(
                target: "gql_server",
                "Zero max page size. Change it to {MAX_PAGE_SIZE}"
            );
            self.paging.max_page_size = MAX_PAGE_SIZE;
        }
        if self.paging.default_page_size == 0
            || self.paging.default_page_size > self.paging.max_page_size
        {
            tracing::warn!(
                target: "gql_server",
                "Default page size {} is out of range. Change it to {}",
                self.paging.default_page_size,
                self.paging.max_page_size
            );
            self.paging.default_page_size = self.paging.max_page_size;
        }
        self
    }
}

pub fn load_config_from_file(path: &PathBuf) -> anyhow::Result<ServerConfig> {
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::format_err!("Failed to open config file: {e}"))
        .and_then(|config_str| {
            serde_json::from_str::<ServerConfig>(&config_str)
                .map_err(|e| anyhow::format_err!("Failed to deserialize config: {e}"))
        })
}
