use serde::{Deserialize, Serialize};

/// Roles recognised by the record service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserRole {
    Admin,
    Doctor,
    Receptionist,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Doctor => "doctor",
            UserRole::Receptionist => "receptionist",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(UserRole::Admin),
            "doctor" => Some(UserRole::Doctor),
            "receptionist" => Some(UserRole::Receptionist),
            _ => None,
        }
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        match self {
            UserRole::Admin => true,
            UserRole::Doctor => !matches!(permission, Permission::ManageCamps),
            UserRole::Receptionist => matches!(
                permission,
                Permission::ViewRecords
                    | Permission::ManagePatients
                    | Permission::ManageRegistrations
                    | Permission::ManageDocuments
            ),
        }
    }

    pub fn has_permissions(&self, permissions: &[Permission]) -> bool {
        permissions.iter().all(|p| self.has_permission(*p))
    }
}

/// Granular permissions checked by the service layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Permission {
    ViewRecords,
    ManagePatients,
    ManageClinicalRecords,
    ManageCamps,
    ManageRegistrations,
    ManageDocuments,
}

/// Sort direction for list queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl Default for SortDirection {
    fn default() -> Self {
        SortDirection::Descending
    }
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "ASC",
            SortDirection::Descending => "DESC",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "asc" | "ascending" => Some(SortDirection::Ascending),
            "desc" | "descending" => Some(SortDirection::Descending),
            _ => None,
        }
    }
}

/// Pagination parameters
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaginationParams {
    pub page: u32,
    pub per_page: u32,
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 10,
        }
    }
}

impl PaginationParams {
    /// Build params from raw request values, coercing absent or
    /// non-positive values to the defaults.
    pub fn from_request(page: Option<i64>, per_page: Option<i64>) -> Self {
        let defaults = Self::default();
        let page = match page {
            Some(p) if p >= 1 => p as u32,
            _ => defaults.page,
        };
        let per_page = match per_page {
            Some(l) if l >= 1 => l as u32,
            _ => defaults.per_page,
        };
        Self { page, per_page }
    }

    pub fn offset(&self) -> u32 {
        (self.page - 1) * self.per_page
    }

    pub fn limit(&self) -> u32 {
        self.per_page
    }
}

/// Paginated result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_prev: bool,
}

impl<T> PaginatedResult<T> {
    pub fn new(items: Vec<T>, total: u64, params: PaginationParams) -> Self {
        let total_pages = (total as f64 / params.per_page as f64).ceil() as u32;
        Self {
            items,
            total,
            page: params.page,
            per_page: params.per_page,
            total_pages,
            has_next: params.page < total_pages,
            has_prev: params.page > 1 && total > 0,
        }
    }

    /// Map the items while keeping the pagination envelope intact.
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> PaginatedResult<U> {
        PaginatedResult {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            per_page: self.per_page,
            total_pages: self.total_pages,
            has_next: self.has_next,
            has_prev: self.has_prev,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_defaults_and_coercion() {
        let params = PaginationParams::from_request(None, None);
        assert_eq!(params.page, 1);
        assert_eq!(params.per_page, 10);

        let params = PaginationParams::from_request(Some(0), Some(-5));
        assert_eq!(params.page, 1);
        assert_eq!(params.per_page, 10);

        let params = PaginationParams::from_request(Some(2), Some(10));
        assert_eq!(params.offset(), 10);
        assert_eq!(params.limit(), 10);
    }

    #[test]
    fn test_paginated_result_envelope() {
        let params = PaginationParams { page: 2, per_page: 10 };
        let result = PaginatedResult::new(vec![1, 2, 3], 25, params);
        assert_eq!(result.total_pages, 3);
        assert!(result.has_next);
        assert!(result.has_prev);

        let params = PaginationParams { page: 3, per_page: 10 };
        let result = PaginatedResult::new(vec![1], 25, params);
        assert!(!result.has_next);

        let params = PaginationParams::default();
        let result: PaginatedResult<i32> = PaginatedResult::new(vec![], 0, params);
        assert_eq!(result.total_pages, 0);
        assert!(!result.has_next);
        assert!(!result.has_prev);
    }

    #[test]
    fn test_role_permissions() {
        assert!(UserRole::Admin.has_permission(Permission::ManageCamps));
        assert!(!UserRole::Doctor.has_permission(Permission::ManageCamps));
        assert!(UserRole::Doctor.has_permission(Permission::ManageClinicalRecords));
        assert!(UserRole::Receptionist.has_permission(Permission::ManageRegistrations));
        assert!(!UserRole::Receptionist.has_permission(Permission::ManageClinicalRecords));
    }
}
