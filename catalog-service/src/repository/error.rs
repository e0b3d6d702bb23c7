//! Repository error types
//!
//! ```rust
//! use catalog_service::repository::{RepositoryError, RepositoryErrorKind};
//!
//! let error = RepositoryError::unique_violation("sku", "LAMP-001");
//! assert!(matches!(error.kind, RepositoryErrorKind::UniqueViolation));
//! assert_eq!(error.field.as_deref(), Some("sku"));
//! ```

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepositoryOperation {
    FindById,
    FindAll,
    Count,
    Create,
    Update,
    Delete,
}

impl fmt::Display for RepositoryOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FindById => write!(f, "find_by_id"),
            Self::FindAll => write!(f, "find_all"),
            Self::Count => write!(f, "count"),
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepositoryErrorKind {
    /// No record with the given id
    NotFound,
    /// A unique column already holds the value
    UniqueViolation,
    /// Some other table constraint rejected the write
    ConstraintViolation,
    ConnectionFailed,
    Timeout,
    DatabaseError,
    Other,
}

impl fmt::Display for RepositoryErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::UniqueViolation => write!(f, "unique_violation"),
            Self::ConstraintViolation => write!(f, "constraint_violation"),
            Self::ConnectionFailed => write!(f, "connection_failed"),
            Self::Timeout => write!(f, "timeout"),
            Self::DatabaseError => write!(f, "database_error"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Storage failure with the operation that hit it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryError {
    pub operation: RepositoryOperation,
    pub kind: RepositoryErrorKind,
    pub message: String,
    /// Column involved, for unique violations
    pub field: Option<String>,
    pub entity_id: Option<String>,
}

impl RepositoryError {
    pub fn new(
        operation: RepositoryOperation,
        kind: RepositoryErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            operation,
            kind,
            message: message.into(),
            field: None,
            entity_id: None,
        }
    }

    pub fn not_found(operation: RepositoryOperation, entity_id: impl Into<String>) -> Self {
        Self {
            operation,
            kind: RepositoryErrorKind::NotFound,
            message: "Product not found".to_string(),
            field: None,
            entity_id: Some(entity_id.into()),
        }
    }

    pub fn unique_violation(field: impl Into<String>, value: impl fmt::Display) -> Self {
        let field = field.into();
        Self {
            operation: RepositoryOperation::Create,
            kind: RepositoryErrorKind::UniqueViolation,
            message: format!("{field} \"{value}\" is already taken"),
            field: Some(field),
            entity_id: None,
        }
    }

    pub fn database_error(operation: RepositoryOperation, message: impl Into<String>) -> Self {
        Self::new(operation, RepositoryErrorKind::DatabaseError, message)
    }

    #[must_use]
    pub fn with_operation(mut self, operation: RepositoryOperation) -> Self {
        self.operation = operation;
        self
    }
}

impl fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Repository {} error during {}: {}",
            self.kind, self.operation, self.message
        )?;
        if let Some(ref entity_id) = self.entity_id {
            write!(f, " [Product: {}]", entity_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for RepositoryError {}

#[cfg(feature = "database")]
impl RepositoryError {
    /// Classify a driver error raised while running `operation`
    pub fn from_sqlx(operation: RepositoryOperation, err: sqlx::Error) -> Self {
        use sqlx::Error as E;
        match err {
            E::Database(ref db) if db.is_unique_violation() => {
                let field = db
                    .constraint()
                    .and_then(|c| c.strip_prefix("products_"))
                    .and_then(|c| c.strip_suffix("_key"))
                    .unwrap_or("sku")
                    .to_string();
                Self {
                    operation,
                    kind: RepositoryErrorKind::UniqueViolation,
                    message: db.message().to_string(),
                    field: Some(field),
                    entity_id: None,
                }
            }
            E::Database(ref db) if db.is_check_violation() => Self::new(
                operation,
                RepositoryErrorKind::ConstraintViolation,
                db.message(),
            ),
            E::PoolTimedOut => Self::new(
                operation,
                RepositoryErrorKind::Timeout,
                "Connection pool timed out",
            ),
            E::PoolClosed | E::Io(_) | E::Tls(_) => Self::new(
                operation,
                RepositoryErrorKind::ConnectionFailed,
                err.to_string(),
            ),
            other => Self::database_error(operation, other.to_string()),
        }
    }
}
