//! Restoration filter implementations
//!
//! This module contains the implementations of the Denoiser trait compared by
//! the evaluation: a box filter, a standard median filter, and the switching
//! median filter.

pub mod mean;
pub mod median;
pub mod switching;

use crate::error::DenoiseError;
use crate::filter::Denoiser;
use serde::Serialize;
use std::sync::Arc;

/// Information about an available filter
#[derive(Debug, Clone, Serialize)]
pub struct FilterInfo {
    pub name: &'static str,
    pub description: &'static str,
}

/// Registry of available restoration filters
pub struct FilterRegistry {
    filters: Vec<Arc<dyn Denoiser>>,
    default_filter: String,
}

impl FilterRegistry {
    /// Create a registry holding every filter, switching median as the default
    pub fn new() -> Self {
        let switching = switching::SwitchingMedianRestorer::default();
        let default_filter = switching.name().to_string();

        let filters: Vec<Arc<dyn Denoiser>> = vec![
            Arc::new(mean::MeanFilter),
            Arc::new(median::MedianFilter),
            Arc::new(switching),
        ];

        Self {
            filters,
            default_filter,
        }
    }

    /// Get a filter by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Denoiser>> {
        self.filters.iter().find(|f| f.name() == name).cloned()
    }

    /// Get a filter by name, failing with `UnknownMethod`
    pub fn require(&self, name: &str) -> Result<Arc<dyn Denoiser>, DenoiseError> {
        self.get(name)
            .ok_or_else(|| DenoiseError::UnknownMethod(name.to_string()))
    }

    /// Get the default filter
    pub fn default(&self) -> Option<Arc<dyn Denoiser>> {
        self.get(&self.default_filter)
    }

    /// Get the default filter name
    pub fn default_name(&self) -> &str {
        &self.default_filter
    }

    /// List all filter names in comparison order
    pub fn list(&self) -> Vec<&str> {
        self.filters.iter().map(|f| f.name()).collect()
    }

    /// Get info about all available filters
    pub fn info(&self) -> Vec<FilterInfo> {
        self.filters
            .iter()
            .map(|f| FilterInfo {
                name: f.name(),
                description: f.description(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_lists_filters_in_comparison_order() {
        let registry = FilterRegistry::new();
        assert_eq!(registry.list(), vec!["mean", "median", "switching"]);
        assert_eq!(registry.default_name(), "switching");
        assert_eq!(registry.default().unwrap().name(), "switching");
    }

    #[test]
    fn test_registry_rejects_unknown_method() {
        let registry = FilterRegistry::new();
        assert!(registry.get("gaussian").is_none());
        assert!(matches!(
            registry.require("gaussian"),
            Err(DenoiseError::UnknownMethod(name)) if name == "gaussian"
        ));
    }
}
