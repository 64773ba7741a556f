//! Page type for paginated list results.

use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// One page of a list endpoint, with the resource's total row count.
///
/// # Example
///
/// ```ignore
/// let page = client.list::<UserProfile>(Resource::Users, &query).await?;
///
/// for user in page.records() {
///     println!("{}", user.email);
/// }
/// println!("{} users in total", page.total());
/// ```
#[derive(Debug, Clone)]
pub struct Page<T> {
    records: Vec<T>,
    total: usize,
}

impl<T> Page<T> {
    /// Creates a page from its records and the remote total.
    pub fn new(records: Vec<T>, total: usize) -> Self {
        Self { records, total }
    }

    /// Returns the records of this page.
    pub fn records(&self) -> &[T] {
        &self.records
    }

    /// Consumes the page and returns the records.
    pub fn into_records(self) -> Vec<T> {
        self.records
    }

    /// Total number of records across all pages.
    pub fn total(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}

/// Response wrapper used by list endpoints: `{ status, data, pagination }`.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub status: Option<serde_json::Value>,
    pub data: T,
    #[serde(default)]
    pub pagination: Option<serde_json::Map<String, serde_json::Value>>,
}

impl<T> Envelope<T> {
    /// Reads the total count from `pagination.<field>`.
    ///
    /// The field name depends on the resource (`total`, `totalRoles`, ...).
    pub fn total(&self, field: &str) -> Option<usize> {
        let value = self.pagination.as_ref()?.get(field)?;
        value
            .as_u64()
            .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
            .map(|n| n as usize)
    }
}

impl<T: DeserializeOwned> Envelope<Vec<T>> {
    /// Converts a list envelope into a [`Page`].
    ///
    /// A missing total falls back to the number of records returned.
    pub fn into_page(self, total_field: &str) -> Page<T> {
        let total = self.total(total_field).unwrap_or(self.data.len());
        Page::new(self.data, total)
    }
}

/// Deserializes a response body; an empty body reads as JSON `null`.
pub(crate) fn decode_body<T: DeserializeOwned>(raw: &[u8]) -> Result<T, ApiError> {
    let raw: &[u8] = if raw.iter().all(u8::is_ascii_whitespace) {
        b"null"
    } else {
        raw
    };
    serde_json::from_slice(raw).map_err(|e| {
        ApiError::parse_with_body(e.to_string(), String::from_utf8_lossy(raw).into_owned())
    })
}
