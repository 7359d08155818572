//! Configuration issues
//!
//! Configuration validation never fails outright: it returns a list of
//! structured issues so the caller can decide what is fatal.
//!
//! # Examples
//!
//! ```
//! use toolplan_domain::config::{ConfigIssue, ConfigIssueCode, Severity};
//!
//! let issue = ConfigIssue::warning(
//!     ConfigIssueCode::InvalidEnumValue {
//!         field: "planner.affinity_policy".to_string(),
//!         value: "reorder".to_string(),
//!         valid_values: vec!["annotate".to_string(), "off".to_string()],
//!     },
//!     "planner.affinity_policy: unknown value 'reorder', falling back to 'annotate'",
//! );
//! assert!(!ConfigIssue::has_errors(&[issue]));
//! ```

/// Severity level of a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Fatal: the configuration cannot work at all.
    Error,
    /// Non-fatal: the configuration works but may not behave as expected.
    Warning,
}

/// Identifies a specific configuration issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigIssueCode {
    /// A string field did not parse into its enum.
    InvalidEnumValue {
        field: String,
        value: String,
        valid_values: Vec<String>,
    },
    /// A path-valued field is set but empty.
    EmptyPath { field: String },
    /// The configured tool registry file does not exist.
    RegistryNotFound { path: String },
}

/// A detected issue in the configuration.
#[derive(Debug, Clone)]
pub struct ConfigIssue {
    pub severity: Severity,
    pub code: ConfigIssueCode,
    pub message: String,
}

impl ConfigIssue {
    pub fn error(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
        }
    }

    pub fn warning(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
        }
    }

    /// Check whether any issues are errors (i.e. fatal).
    pub fn has_errors(issues: &[ConfigIssue]) -> bool {
        issues.iter().any(|i| i.severity == Severity::Error)
    }
}
