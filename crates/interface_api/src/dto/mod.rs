//! Request and response bodies

pub mod accounts;
pub mod auth;
pub mod ledger;

use serde::Serialize;
use std::str::FromStr;

use domain_ledger::Page;

use crate::error::ApiError;

/// One page of results
#[derive(Debug, Serialize)]
pub struct PageResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u64,
}

impl<T> From<Page<T>> for PageResponse<T> {
    fn from(page: Page<T>) -> Self {
        let total_pages = page.total_pages();
        Self {
            items: page.items,
            total: page.total,
            page: page.page,
            page_size: page.page_size,
            total_pages,
        }
    }
}

/// Parses a path or query value, reporting the field on failure
pub fn parse_field<T: FromStr>(field: &str, value: &str) -> Result<T, ApiError>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| ApiError::Validation(format!("invalid {}", field), vec![format!("{}: {}", field, e)]))
}

/// Parses an optional query value; blank counts as absent
pub fn parse_optional<T: FromStr>(field: &str, value: Option<&str>) -> Result<Option<T>, ApiError>
where
    T::Err: std::fmt::Display,
{
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => parse_field(field, v).map(Some),
        None => Ok(None),
    }
}
