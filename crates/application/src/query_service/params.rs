use std::collections::BTreeMap;

use quire_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Request parameter carrying the search text.
pub const SEARCH_PARAMETER: &str = "q";
/// Request parameter carrying the 1-based page number.
pub const PAGE_PARAMETER: &str = "page";
/// Request parameter carrying the page size or `all`.
pub const COUNT_PARAMETER: &str = "count";
/// Page size used when `count` is absent.
pub const DEFAULT_PAGE_SIZE: usize = 10;

const ALL_SENTINEL: &str = "all";

/// Raw string parameters supplied by the transport layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListParams(BTreeMap<String, String>);

impl ListParams {
    /// Creates an empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a parameter.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    /// Returns a parameter value. Empty values count as absent; whitespace is kept.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .get(name)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    /// Returns the search text, if any.
    #[must_use]
    pub fn search(&self) -> Option<&str> {
        self.get(SEARCH_PARAMETER)
    }
}

impl<K, V> FromIterator<(K, V)> for ListParams
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        )
    }
}

/// Number of items per page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSize {
    /// At most this many items; always at least one.
    Limited(usize),
    /// Every matching item on a single page.
    All,
}

impl PageSize {
    /// Returns the numeric size, `None` for `All`.
    #[must_use]
    pub fn limit(&self) -> Option<usize> {
        match self {
            Self::Limited(size) => Some(*size),
            Self::All => None,
        }
    }
}

/// Validated pagination parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based page number.
    pub page_number: usize,
    /// Requested page size.
    pub page_size: PageSize,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page_number: 1,
            page_size: PageSize::Limited(DEFAULT_PAGE_SIZE),
        }
    }
}

impl PageRequest {
    /// Parses `page` and `count` from raw parameters.
    pub fn from_params(params: &ListParams) -> AppResult<Self> {
        let page_number = match params.get(PAGE_PARAMETER) {
            Some(raw) => parse_positive(PAGE_PARAMETER, raw)?,
            None => 1,
        };

        let page_size = match params.get(COUNT_PARAMETER) {
            Some(raw) if raw.trim() == ALL_SENTINEL => PageSize::All,
            Some(raw) => PageSize::Limited(parse_positive(COUNT_PARAMETER, raw)?),
            None => PageSize::Limited(DEFAULT_PAGE_SIZE),
        };

        Ok(Self {
            page_number,
            page_size,
        })
    }

    /// Number of items skipped before this page.
    #[must_use]
    pub fn offset(&self) -> usize {
        match self.page_size {
            PageSize::Limited(size) => self.page_number.saturating_sub(1).saturating_mul(size),
            PageSize::All => 0,
        }
    }
}

fn parse_positive(parameter: &str, raw: &str) -> AppResult<usize> {
    let value = raw.trim().parse::<i64>().map_err(|_| {
        AppError::invalid_parameter(parameter, format!("'{raw}' is not an integer"))
    })?;

    if value < 1 {
        return Err(AppError::invalid_parameter(
            parameter,
            format!("must be at least 1, got {value}"),
        ));
    }

    usize::try_from(value)
        .map_err(|_| AppError::invalid_parameter(parameter, format!("'{raw}' is out of range")))
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// Items on this page in listing order.
    pub items: Vec<T>,
    /// 1-based page number.
    pub page_number: usize,
    /// Effective page size.
    pub page_size: PageSize,
    /// Number of items across all pages.
    pub total_count: usize,
    /// Number of pages; zero when nothing matched.
    pub total_pages: usize,
}

impl<T> Page<T> {
    /// Assembles a page and derives its page count.
    #[must_use]
    pub fn new(items: Vec<T>, request: PageRequest, total_count: usize) -> Self {
        let (page_number, total_pages) = match request.page_size {
            PageSize::Limited(size) => (request.page_number, total_count.div_ceil(size.max(1))),
            PageSize::All => (1, usize::from(total_count > 0)),
        };

        Self {
            items,
            page_number,
            page_size: request.page_size,
            total_count,
            total_pages,
        }
    }

    /// Converts every item, failing on the first conversion error.
    pub fn try_map<U>(self, convert: impl FnMut(T) -> AppResult<U>) -> AppResult<Page<U>> {
        Ok(Page {
            items: self
                .items
                .into_iter()
                .map(convert)
                .collect::<AppResult<Vec<_>>>()?,
            page_number: self.page_number,
            page_size: self.page_size,
            total_count: self.total_count,
            total_pages: self.total_pages,
        })
    }
}
