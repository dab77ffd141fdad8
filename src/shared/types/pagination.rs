use std::str::FromStr;

use super::errors::DomainError;

pub const DEFAULT_PAGE_SIZE: u64 = 20;
pub const MAX_PAGE_SIZE: u64 = 100;

/// Account attribute a page can be ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    Id,
    Login,
    Email,
    FirstName,
    LastName,
    CreatedAt,
}

impl SortField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Login => "login",
            Self::Email => "email",
            Self::FirstName => "firstName",
            Self::LastName => "lastName",
            Self::CreatedAt => "createdAt",
        }
    }
}

impl FromStr for SortField {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "id" => Ok(Self::Id),
            "login" => Ok(Self::Login),
            "email" => Ok(Self::Email),
            "firstName" | "first_name" => Ok(Self::FirstName),
            "lastName" | "last_name" => Ok(Self::LastName),
            "createdAt" | "created_at" => Ok(Self::CreatedAt),
            other => Err(DomainError::Validation(format!(
                "Unsupported sort property '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Ordering of a page, written on the wire as `property[,asc|desc]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Sort {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Sort {
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let mut parts = raw.splitn(2, ',');
        let field = parts.next().unwrap_or_default().parse::<SortField>()?;
        let direction = match parts.next().map(|d| d.trim().to_ascii_lowercase()) {
            None => SortDirection::Asc,
            Some(d) if d == "asc" => SortDirection::Asc,
            Some(d) if d == "desc" => SortDirection::Desc,
            Some(d) => {
                return Err(DomainError::Validation(format!(
                    "Unsupported sort direction '{}'",
                    d
                )))
            }
        };
        Ok(Self { field, direction })
    }

    pub fn to_query_value(&self) -> String {
        format!("{},{}", self.field.as_str(), self.direction.as_str())
    }
}

/// Page request: zero-based page index, page size and ordering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub size: u64,
    pub sort: Sort,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            size: DEFAULT_PAGE_SIZE,
            sort: Sort::default(),
        }
    }
}

impl PageRequest {
    /// Build a page request from raw query values. The size is clamped to
    /// `1..=MAX_PAGE_SIZE`; an unknown sort property is rejected.
    pub fn new(page: Option<u64>, size: Option<u64>, sort: Option<&str>) -> Result<Self, DomainError> {
        let sort = match sort {
            Some(raw) if !raw.trim().is_empty() => Sort::parse(raw)?,
            _ => Sort::default(),
        };
        Ok(Self {
            page: page.unwrap_or(0),
            size: size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
            sort,
        })
    }

    pub fn offset(&self) -> u64 {
        self.page.saturating_mul(self.size)
    }
}

/// Paginated response wrapper
#[derive(Debug)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub size: u64,
    pub total_pages: u64,
}

impl<T> PaginatedResult<T> {
    pub fn new(items: Vec<T>, total: u64, page: u64, size: u64) -> Self {
        let total_pages = if size == 0 { 0 } else { (total + size - 1) / size };
        Self {
            items,
            total,
            page,
            size,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_request_defaults_and_clamps() {
        let req = PageRequest::new(None, None, None).unwrap();
        assert_eq!(req, PageRequest::default());

        let req = PageRequest::new(Some(3), Some(500), None).unwrap();
        assert_eq!(req.size, MAX_PAGE_SIZE);
        assert_eq!(req.offset(), 300);

        let req = PageRequest::new(None, Some(0), None).unwrap();
        assert_eq!(req.size, 1);
    }

    #[test]
    fn sort_parses_property_and_direction() {
        let sort = Sort::parse("login,desc").unwrap();
        assert_eq!(sort.field, SortField::Login);
        assert_eq!(sort.direction, SortDirection::Desc);

        let sort = Sort::parse("created_at").unwrap();
        assert_eq!(sort.field, SortField::CreatedAt);
        assert_eq!(sort.direction, SortDirection::Asc);
        assert_eq!(sort.to_query_value(), "createdAt,asc");
    }

    #[test]
    fn sort_rejects_unknown_property() {
        assert!(matches!(
            Sort::parse("password_hash"),
            Err(DomainError::Validation(_))
        ));
        assert!(Sort::parse("login,sideways").is_err());
    }

    #[test]
    fn total_pages_rounds_up() {
        let page = PaginatedResult::new(vec![1, 2], 41, 0, 20);
        assert_eq!(page.total_pages, 3);

        let empty: PaginatedResult<u8> = PaginatedResult::new(vec![], 0, 0, 20);
        assert_eq!(empty.total_pages, 0);
    }
}
