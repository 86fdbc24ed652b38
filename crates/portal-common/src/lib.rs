//! Shared wire types for the portal control plane.
//!
//! Every list endpoint in the system speaks the same envelope: a
//! `{ content, totalElements }` page plus an explicit 1-based `page`/`size`
//! parameter pair. Nothing here carries business logic.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

pub mod id;

/// Pagination parameters. Page numbering is 1-based everywhere.
#[derive(Debug, Clone, Copy, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageRequest {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_size")]
    pub size: u32,
}

fn default_page() -> u32 {
    1
}

fn default_size() -> u32 {
    20
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: default_page(),
            size: default_size(),
        }
    }
}

impl PageRequest {
    pub fn new(page: u32, size: u32) -> Self {
        Self { page, size }
    }

    /// Row offset for a 1-based page number.
    pub fn offset(&self) -> u32 {
        self.page.saturating_sub(1).saturating_mul(self.size)
    }

    pub fn limit(&self) -> u32 {
        self.size
    }
}

/// Generic list envelope: `{ content: T[], totalElements: number }`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub total_elements: u64,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, total_elements: u64) -> Self {
        Self {
            content,
            total_elements,
        }
    }

    pub fn empty() -> Self {
        Self {
            content: Vec::new(),
            total_elements: 0,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            total_elements: self.total_elements,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_is_one_based() {
        assert_eq!(PageRequest::new(1, 20).offset(), 0);
        assert_eq!(PageRequest::new(2, 20).offset(), 20);
        assert_eq!(PageRequest::new(3, 5).offset(), 10);
    }

    #[test]
    fn test_offset_saturates_on_page_zero() {
        // Callers that send page=0 get the first page rather than a panic.
        assert_eq!(PageRequest::new(0, 20).offset(), 0);
    }

    #[test]
    fn test_page_map_preserves_total() {
        let page = Page::new(vec![1, 2, 3], 10);
        let mapped = page.map(|n| n.to_string());
        assert_eq!(mapped.total_elements, 10);
        assert_eq!(mapped.content, vec!["1", "2", "3"]);
    }
}
