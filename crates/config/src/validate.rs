//! Semantic checks run on a loaded config before the bot starts.

use secrecy::ExposeSecret;

use crate::{loader::TOKEN_ENV, schema::FieldexConfig};

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

/// A single validation finding.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Dotted path, e.g. "defaults.delimiter".
    pub path: &'static str,
    pub message: String,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at {}: {}", self.severity, self.path, self.message)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
    }

    fn push(&mut self, severity: Severity, path: &'static str, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            severity,
            path,
            message: message.into(),
        });
    }
}

/// Check a fully resolved config (file plus overrides).
#[must_use]
pub fn validate(config: &FieldexConfig) -> ValidationResult {
    let mut result = ValidationResult::default();

    let token = config.telegram.token.expose_secret();
    if token.trim().is_empty() {
        result.push(
            Severity::Error,
            "telegram.token",
            format!("bot token is missing; set {TOKEN_ENV} or telegram.token"),
        );
    } else if token.contains("${") {
        result.push(
            Severity::Error,
            "telegram.token",
            "bot token contains an unresolved ${...} placeholder",
        );
    } else if !token.contains(':') {
        result.push(
            Severity::Warning,
            "telegram.token",
            "bot token does not look like <id>:<secret>",
        );
    }

    if let Some(url) = &config.telegram.api_url
        && !(url.starts_with("http://") || url.starts_with("https://"))
    {
        result.push(
            Severity::Error,
            "telegram.api_url",
            format!("api_url must be an http(s) URL, got {url:?}"),
        );
    }

    if config.defaults.field_index < 0 {
        result.push(
            Severity::Error,
            "defaults.field_index",
            format!(
                "field_index must be non-negative, got {}",
                config.defaults.field_index
            ),
        );
    }

    if config.defaults.delimiter.is_empty() {
        result.push(
            Severity::Error,
            "defaults.delimiter",
            "delimiter must not be empty",
        );
    }

    if config.files.max_file_bytes == 0 {
        result.push(
            Severity::Error,
            "files.max_file_bytes",
            "max_file_bytes must be greater than zero",
        );
    }

    result
}
