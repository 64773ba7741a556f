//! List query parameters and resource descriptors

use url::Url;

/// A list-backed admin resource: its endpoint and the name of its total-count
/// field inside `pagination`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Users,
    Roles,
    Courses,
    Medias,
    Notifications,
    /// Any other list endpoint.
    Custom {
        path: &'static str,
        total_field: &'static str,
    },
}

impl Resource {
    /// Endpoint path of the resource.
    pub fn path(&self) -> &'static str {
        match self {
            Self::Users => "/api/users",
            Self::Roles => "/api/roles",
            Self::Courses => "/api/courses",
            Self::Medias => "/api/medias",
            Self::Notifications => "/api/notifications",
            Self::Custom { path, .. } => path,
        }
    }

    /// Field of `pagination` that holds the total row count.
    pub fn total_field(&self) -> &'static str {
        match self {
            Self::Users | Self::Notifications => "total",
            Self::Roles => "totalRoles",
            Self::Courses => "totalCourses",
            Self::Medias => "totalMedias",
            Self::Custom { total_field, .. } => total_field,
        }
    }
}

/// Query parameters of a list request.
///
/// `page` is zero-based here, like the table; it is sent as the 1-based
/// `page` parameter the backend expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub page: usize,
    pub limit: usize,
    pub search: Option<String>,
    pub search_fields: Vec<String>,
}

impl ListQuery {
    /// Creates a query for a zero-based page.
    pub fn new(page: usize, limit: usize) -> Self {
        Self {
            page,
            limit: limit.max(1),
            search: None,
            search_fields: Vec::new(),
        }
    }

    /// Sets the search term; blank terms are dropped.
    pub fn search(mut self, term: impl Into<String>) -> Self {
        let term = term.into();
        let trimmed = term.trim();
        self.search = (!trimmed.is_empty()).then(|| trimmed.to_string());
        self
    }

    /// Sets the fields the search applies to.
    pub fn search_fields(mut self, fields: &[&str]) -> Self {
        self.search_fields = fields.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Wire query parameters.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("page", (self.page + 1).to_string()),
            ("limit", self.limit.to_string()),
        ];
        if let Some(search) = &self.search {
            pairs.push(("search", search.clone()));
            if !self.search_fields.is_empty() {
                pairs.push(("searchFields", self.search_fields.join(",")));
            }
        }
        pairs
    }

    /// Appends the parameters to `url`.
    pub fn apply(&self, url: &mut Url) {
        let mut query = url.query_pairs_mut();
        for (key, value) in self.to_pairs() {
            query.append_pair(key, &value);
        }
    }
}
