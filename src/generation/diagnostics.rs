//! Diagnostics collected while a proxy type is assembled.
//!
//! Building a proxy inspects every member of the proxied type. Some findings are not errors
//! but still worth reporting to the host: a member that cannot be intercepted because it is
//! not virtual, a member the generation hook declined, a mixin that contributes no interface
//! and is ignored. The [`ProxyBuilder`](crate::proxy::ProxyBuilder) records these into a
//! [`Diagnostics`] container, available afterwards through
//! [`ProxyType::diagnostics`](crate::proxy::ProxyType::diagnostics).
//!
//! # Thread Safety
//!
//! [`Diagnostics`] uses `boxcar::Vec` for lock-free appends, so one container can be shared
//! by hooks running on any thread.
//!
//! # Example
//!
//! ```rust
//! use dynproxy::generation::{DiagnosticCategory, Diagnostics};
//!
//! let diagnostics = Diagnostics::new();
//! diagnostics.warning(DiagnosticCategory::Member, "Void Service.Stop() is not virtual");
//!
//! for entry in diagnostics.iter() {
//!     println!("{entry}");
//! }
//! assert!(diagnostics.has_warnings());
//! ```

use std::fmt::{self, Write};

use crate::model::token::MemberToken;

/// Severity level of a diagnostic entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticSeverity {
    /// Informational, nothing is wrong
    Info,
    /// The proxy works, but not everything the host asked for is in effect
    Warning,
}

impl fmt::Display for DiagnosticSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticSeverity::Info => write!(f, "INFO"),
            DiagnosticSeverity::Warning => write!(f, "WARN"),
        }
    }
}

/// Source of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum DiagnosticCategory {
    /// Members declined by the generation hook
    Hook,
    /// Mixin registration and routing
    Mixin,
    /// Individual members of the proxied type
    Member,
}

/// A single diagnostic entry.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Severity level of this diagnostic.
    pub severity: DiagnosticSeverity,

    /// Category indicating the source of this diagnostic.
    pub category: DiagnosticCategory,

    /// Human-readable description of the issue.
    pub message: String,

    /// The member the diagnostic is about, if any.
    pub token: Option<MemberToken>,

    /// Full name of the type the diagnostic is about, if any.
    pub type_name: Option<String>,
}

impl Diagnostic {
    /// Creates a new diagnostic entry.
    pub fn new(
        severity: DiagnosticSeverity,
        category: DiagnosticCategory,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            category,
            message: message.into(),
            token: None,
            type_name: None,
        }
    }

    /// Adds the member the diagnostic is about.
    #[must_use]
    pub fn with_token(mut self, token: MemberToken) -> Self {
        self.token = Some(token);
        self
    }

    /// Adds the type the diagnostic is about.
    #[must_use]
    pub fn with_type(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.category, self.message)?;

        if let Some(token) = self.token {
            write!(f, " (token: {token})")?;
        }

        if let Some(type_name) = &self.type_name {
            write!(f, " (type: {type_name})")?;
        }

        Ok(())
    }
}

/// Thread-safe container for collecting diagnostic entries.
#[derive(Debug)]
pub struct Diagnostics {
    entries: boxcar::Vec<Diagnostic>,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new()
    }
}

impl Diagnostics {
    /// Creates a new empty diagnostics container.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: boxcar::Vec::new(),
        }
    }

    /// Adds an informational diagnostic.
    pub fn info(&self, category: DiagnosticCategory, message: impl Into<String>) {
        self.push(Diagnostic::new(DiagnosticSeverity::Info, category, message));
    }

    /// Adds a warning diagnostic.
    pub fn warning(&self, category: DiagnosticCategory, message: impl Into<String>) {
        self.push(Diagnostic::new(
            DiagnosticSeverity::Warning,
            category,
            message,
        ));
    }

    /// Adds a diagnostic entry directly, for entries carrying a token or type.
    pub fn push(&self, diagnostic: Diagnostic) {
        self.entries.push(diagnostic);
    }

    /// Returns true if any diagnostics have been collected.
    pub fn has_any(&self) -> bool {
        self.entries.count() > 0
    }

    /// Returns true if any warning-level diagnostics have been collected.
    pub fn has_warnings(&self) -> bool {
        self.count_of(DiagnosticSeverity::Warning) > 0
    }

    /// Returns the total number of diagnostics.
    pub fn count(&self) -> usize {
        self.entries.count()
    }

    /// Returns the number of diagnostics with the given severity.
    pub fn count_of(&self, severity: DiagnosticSeverity) -> usize {
        self.iter().filter(|d| d.severity == severity).count()
    }

    /// Returns an iterator over all diagnostics, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().map(|(_, d)| d)
    }

    /// Returns diagnostics filtered by category.
    pub fn by_category(&self, category: DiagnosticCategory) -> Vec<&Diagnostic> {
        self.iter().filter(|d| d.category == category).collect()
    }

    /// Returns diagnostics about one member.
    pub fn by_token(&self, token: MemberToken) -> Vec<&Diagnostic> {
        self.iter().filter(|d| d.token == Some(token)).collect()
    }

    /// Formats a summary of all diagnostics for display.
    pub fn summary(&self) -> String {
        let mut output = String::new();

        let _ = writeln!(
            output,
            "Diagnostics: {} warning(s), {} info(s)",
            self.count_of(DiagnosticSeverity::Warning),
            self.count_of(DiagnosticSeverity::Info)
        );

        for diag in self
            .iter()
            .filter(|d| d.severity == DiagnosticSeverity::Warning)
        {
            let _ = writeln!(output, "  {diag}");
        }

        output
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary())
    }
}
