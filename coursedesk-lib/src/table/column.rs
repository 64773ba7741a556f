//! Column definitions and cell values.

use std::fmt;

/// How a column presents its value.
///
/// Presentation only: the kind never changes the underlying value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ColumnKind {
    /// Stringified value.
    #[default]
    Plain,
    /// Pill colored by the value's truthiness.
    Badge,
    /// Same pill as `Badge`, used for system-managed flags.
    System,
    /// The value is an image URL.
    ImagePreview,
    /// The value is a list of labels.
    Group,
}

/// A value read from a row by a column accessor.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Bool(bool),
    Number(f64),
    List(Vec<String>),
    Empty,
}

impl CellValue {
    /// JavaScript-style truthiness: `false`, `0`, `NaN`, `""` and empty
    /// values are falsy; lists are always truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Text(s) => !s.is_empty(),
            Self::Bool(b) => *b,
            Self::Number(n) => *n != 0.0 && !n.is_nan(),
            Self::List(_) => true,
            Self::Empty => false,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Number(n) => write!(f, "{}", n),
            Self::List(items) => f.write_str(&items.join(", ")),
            Self::Empty => Ok(()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<Vec<String>> for CellValue {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Empty, Into::into)
    }
}

/// Column configuration.
///
/// The accessor pairs a field key with a function reading that field, so a
/// column can only name a property the row type actually has.
///
/// # Example
///
/// ```ignore
/// let columns = vec![
///     Column::new("Email", "email", |u: &UserProfile| u.email.as_str().into()),
///     Column::new("Active", "isActive", |u: &UserProfile| u.is_active.into())
///         .kind(ColumnKind::Badge),
///     Column::new("Avatar", "avatar", |u: &UserProfile| u.avatar.clone().into())
///         .kind(ColumnKind::ImagePreview)
///         .hidden(),
/// ];
/// ```
pub struct Column<T> {
    pub header: String,
    /// Field key, also the identity used for visibility toggles.
    pub key: String,
    pub visible: bool,
    pub kind: ColumnKind,
    accessor: Box<dyn Fn(&T) -> CellValue + Send + Sync>,
}

impl<T> Column<T> {
    /// Creates a visible plain column.
    pub fn new(
        header: impl Into<String>,
        key: impl Into<String>,
        accessor: impl Fn(&T) -> CellValue + Send + Sync + 'static,
    ) -> Self {
        Self {
            header: header.into(),
            key: key.into(),
            visible: true,
            kind: ColumnKind::Plain,
            accessor: Box::new(accessor),
        }
    }

    /// Sets the presentation kind.
    pub fn kind(mut self, kind: ColumnKind) -> Self {
        self.kind = kind;
        self
    }

    /// Starts the column hidden.
    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Reads this column's value from `row`.
    pub fn value(&self, row: &T) -> CellValue {
        (self.accessor)(row)
    }
}

impl<T> fmt::Debug for Column<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("header", &self.header)
            .field("key", &self.key)
            .field("visible", &self.visible)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}
