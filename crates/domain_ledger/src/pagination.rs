//! 1-based pagination

use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// A validated page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    page_size: u32,
}

impl PageRequest {
    /// Both values must be at least 1
    pub fn new(page: u32, page_size: u32) -> Result<Self, LedgerError> {
        if page == 0 {
            return Err(LedgerError::validation("page numbers start at 1"));
        }
        if page_size == 0 {
            return Err(LedgerError::validation("page size must be at least 1"));
        }
        Ok(Self { page, page_size })
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.page_size)
    }

    pub fn limit(&self) -> u64 {
        u64::from(self.page_size)
    }

    /// Cuts this page out of an already ordered, already filtered set
    pub fn slice<T: Clone>(&self, ordered: &[T]) -> Page<T> {
        let start = usize::try_from(self.offset()).unwrap_or(usize::MAX).min(ordered.len());
        let end = start.saturating_add(self.page_size as usize).min(ordered.len());
        Page {
            items: ordered[start..end].to_vec(),
            total: ordered.len() as u64,
            page: self.page,
            page_size: self.page_size,
        }
    }
}

/// One page of results plus the size of the whole result set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
}

impl<T> Page<T> {
    pub fn empty(request: PageRequest) -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            page: request.page,
            page_size: request.page_size,
        }
    }

    pub fn total_pages(&self) -> u64 {
        if self.page_size == 0 {
            return 0;
        }
        self.total.div_ceil(u64::from(self.page_size))
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            page_size: self.page_size,
        }
    }
}
