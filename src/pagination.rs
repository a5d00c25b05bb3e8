use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::{IntoParams, ToSchema};

use crate::error::AppError;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;
/// Upper bound on the rows a single page may return.
pub const MAX_PAGE_LIMIT: u32 = 100;

/// SortField
///
/// The allow-list of columns a listing may be ordered by. `column()` is the only
/// source of identifier text that ever reaches the SQL string; raw client input
/// never does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    Title,
    #[default]
    CreatedAt,
}

impl SortField {
    /// Exact match against the allow-list; anything else yields the default.
    pub fn parse_or_default(raw: Option<&str>) -> Self {
        match raw {
            Some("title") => SortField::Title,
            Some("created_at") => SortField::CreatedAt,
            _ => SortField::default(),
        }
    }

    pub const fn column(self) -> &'static str {
        match self {
            SortField::Title => "title",
            SortField::CreatedAt => "created_at",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn parse_or_default(raw: Option<&str>) -> Self {
        match raw {
            Some("asc") => SortOrder::Asc,
            Some("desc") => SortOrder::Desc,
            _ => SortOrder::default(),
        }
    }

    pub const fn keyword(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// ListPostsQuery
///
/// Raw query parameters of `GET /api/blog-posts`, kept as strings so that bad
/// values can be resolved (or rejected) here rather than by the extractor.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListPostsQuery {
    /// 1-based page number. Pagination applies only when `limit` is also given.
    pub page: Option<String>,
    /// Page size, at most 100.
    pub limit: Option<String>,
    /// `title` or `created_at`; anything else falls back to `created_at`.
    pub sort: Option<String>,
    /// `asc` or `desc`; anything else falls back to `desc`.
    pub order: Option<String>,
    /// Case-insensitive substring matched against title or description.
    pub search: Option<String>,
}

/// PageRequest
///
/// A fully validated listing request. Every field is safe to hand to a backing
/// store as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
    pub sort: SortField,
    pub order: SortOrder,
    pub search: Option<String>,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
            sort: SortField::default(),
            order: SortOrder::default(),
            search: None,
        }
    }
}

impl PageRequest {
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }

    /// The search term as an `ILIKE` pattern, with the pattern metacharacters of
    /// the raw term escaped so they match literally.
    pub fn search_pattern(&self) -> Option<String> {
        self.search.as_deref().map(|term| {
            let mut escaped = String::with_capacity(term.len() + 2);
            escaped.push('%');
            for ch in term.chars() {
                if matches!(ch, '%' | '_' | '\\') {
                    escaped.push('\\');
                }
                escaped.push(ch);
            }
            escaped.push('%');
            escaped
        })
    }
}

/// Which listing path a request resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostListing {
    /// Every post, newest first.
    All,
    Page(PageRequest),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PaginationError {
    #[error("Invalid pagination params")]
    InvalidParams,
}

impl From<PaginationError> for AppError {
    fn from(err: PaginationError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl ListPostsQuery {
    /// resolve
    ///
    /// Pagination engages only when both `page` and `limit` are present; otherwise
    /// the request is for the unpaginated listing. Empty values count as absent.
    pub fn resolve(self) -> Result<PostListing, PaginationError> {
        let page = non_empty(self.page);
        let limit = non_empty(self.limit);

        let (Some(page), Some(limit)) = (page, limit) else {
            return Ok(PostListing::All);
        };

        let page = parse_positive(&page)?;
        let limit = parse_positive(&limit)?.min(MAX_PAGE_LIMIT);

        Ok(PostListing::Page(PageRequest {
            page,
            limit,
            sort: SortField::parse_or_default(self.sort.as_deref()),
            order: SortOrder::parse_or_default(self.order.as_deref()),
            search: non_empty(self.search),
        }))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn parse_positive(raw: &str) -> Result<u32, PaginationError> {
    match raw.trim().parse::<u32>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(PaginationError::InvalidParams),
    }
}
