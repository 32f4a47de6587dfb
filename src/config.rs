use std::path::PathBuf;

/// Default memory budget when the caller does not supply one (512 MiB).
pub const DEFAULT_MEMORY_BUDGET_BYTES: usize = 512 * 1024 * 1024;

/// The asset cache gets one eighth of the memory budget.
pub const DEFAULT_CACHE_FRACTION: usize = 8;

/// Pipeline construction settings
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Memory the process is allowed to use, as seen at construction time
    pub memory_budget_bytes: usize,

    /// Divisor applied to the budget to size the asset cache
    pub cache_fraction: usize,

    /// Root directory of the filter asset store (`filters/{category}/{id}/...` lives under it)
    pub asset_root: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            memory_budget_bytes: DEFAULT_MEMORY_BUDGET_BYTES,
            cache_fraction: DEFAULT_CACHE_FRACTION,
            asset_root: None,
        }
    }
}

impl PipelineConfig {
    pub fn with_memory_budget_mb(mut self, megabytes: usize) -> Self {
        self.memory_budget_bytes = megabytes.saturating_mul(1024 * 1024);
        self
    }

    pub fn with_asset_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.asset_root = Some(root.into());
        self
    }

    /// Byte capacity of the filter asset cache
    pub fn cache_capacity_bytes(&self) -> usize {
        (self.memory_budget_bytes / self.cache_fraction.max(1)).max(1)
    }
}
