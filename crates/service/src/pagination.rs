//! Pagination utilities for service layer
//!
//! `PageRequest` carries a zero-based page index, a page size and an optional sort;
//! `Page` carries one slice of results plus the totals needed to walk the rest.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::ServiceError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    #[default]
    Id,
    Number,
    Name,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Ordering for entry listings; defaults to id ascending (insertion order).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Sort {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Sort {
    pub fn new(field: SortField, direction: SortDirection) -> Self { Self { field, direction } }
}

/// Parses `field[,direction]`, e.g. `name`, `number,desc`.
impl FromStr for Sort {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(',').map(str::trim);
        let field = match parts.next().unwrap_or_default().to_ascii_lowercase().as_str() {
            "" | "id" => SortField::Id,
            "number" => SortField::Number,
            "name" => SortField::Name,
            other => return Err(ServiceError::Validation(format!("unknown sort field '{other}'"))),
        };
        let direction = match parts.next().map(str::to_ascii_lowercase).as_deref() {
            None | Some("") | Some("asc") => SortDirection::Asc,
            Some("desc") => SortDirection::Desc,
            Some(other) => return Err(ServiceError::Validation(format!("unknown sort direction '{other}'"))),
        };
        if parts.next().is_some() {
            return Err(ServiceError::Validation("sort takes at most field and direction".into()));
        }
        Ok(Sort { field, direction })
    }
}

/// Page parameters
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRequest {
    /// 0-based page index
    pub page: u64,
    /// items per page
    pub size: u64,
    pub sort: Sort,
}

impl PageRequest {
    pub const DEFAULT_SIZE: u64 = 20;

    pub fn new(page: u64, size: u64) -> Self { Self { page, size, sort: Sort::default() } }

    pub fn with_sort(mut self, sort: Sort) -> Self {
        self.sort = sort;
        self
    }

    /// Clamp size into `1..=max_size`.
    pub fn normalize(self, max_size: u64) -> Self {
        Self { size: self.size.clamp(1, max_size.max(1)), ..self }
    }

    /// Row offset of the first item, or `None` when it does not fit a SQL `OFFSET` (i64).
    pub fn offset(&self) -> Option<u64> {
        self.page.checked_mul(self.size).filter(|o| *o <= i64::MAX as u64)
    }
}

impl Default for PageRequest {
    fn default() -> Self { Self::new(0, Self::DEFAULT_SIZE) }
}

/// One page of results with totals.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub total_elements: u64,
    pub total_pages: u64,
    pub page: u64,
    pub size: u64,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, total_elements: u64, req: PageRequest) -> Self {
        let size = req.size.max(1);
        Self { content, total_elements, total_pages: total_elements.div_ceil(size), page: req.page, size }
    }

    pub fn empty(req: PageRequest) -> Self { Self::new(Vec::new(), 0, req) }
}
