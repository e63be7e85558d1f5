use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ValidationSeverity {
    Error,
    Warning,
    Info,
}

impl ValidationSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

impl fmt::Display for ValidationSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationDiagnostic {
    pub severity: ValidationSeverity,
    pub context: String,
    pub message: String,
}

impl fmt::Display for ValidationDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.context, self.message)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub diagnostics: Vec<ValidationDiagnostic>,
}

impl ValidationReport {
    pub fn push(
        &mut self,
        severity: ValidationSeverity,
        context: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.diagnostics.push(ValidationDiagnostic {
            severity,
            context: context.into(),
            message: message.into(),
        });
    }

    pub fn error(&mut self, context: impl Into<String>, message: impl Into<String>) {
        self.push(ValidationSeverity::Error, context, message);
    }

    pub fn warning(&mut self, context: impl Into<String>, message: impl Into<String>) {
        self.push(ValidationSeverity::Warning, context, message);
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|diag| diag.severity == ValidationSeverity::Error)
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|diag| diag.severity == ValidationSeverity::Error)
            .count()
    }
}

/// Tracks values that must be unique within one catalog file.
#[derive(Debug)]
pub struct UniqueSet<T: Eq + Hash> {
    what: &'static str,
    seen: HashSet<T>,
}

impl<T: Eq + Hash + fmt::Display> UniqueSet<T> {
    pub fn new(what: &'static str) -> Self {
        Self {
            what,
            seen: HashSet::new(),
        }
    }

    /// Records `value`, reporting an error if it was already seen.
    pub fn check(&mut self, report: &mut ValidationReport, context: &str, value: T) -> bool {
        let message = format!("duplicate {} '{}'", self.what, value);
        if self.seen.insert(value) {
            true
        } else {
            report.error(context, message);
            false
        }
    }
}

/// Reports an error if `value` is outside `min..=max`.
pub fn check_range(
    report: &mut ValidationReport,
    context: &str,
    field: &str,
    value: i64,
    min: i64,
    max: i64,
) -> bool {
    if value < min || value > max {
        report.error(
            context,
            format!("{field} {value} is outside the range {min}..={max}"),
        );
        false
    } else {
        true
    }
}

pub fn check_non_empty(report: &mut ValidationReport, context: &str, field: &str, value: &str) -> bool {
    if value.trim().is_empty() {
        report.error(context, format!("{field} must not be empty"));
        false
    } else {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_values_are_errors() {
        let mut report = ValidationReport::default();
        let mut names = UniqueSet::new("name");
        assert!(names.check(&mut report, "skill[0]", "Attack Boost".to_string()));
        assert!(!names.check(&mut report, "skill[1]", "Attack Boost".to_string()));
        assert_eq!(report.error_count(), 1);
        assert_eq!(report.diagnostics[0].message, "duplicate name 'Attack Boost'");
    }

    #[test]
    fn range_check_reports_bounds() {
        let mut report = ValidationReport::default();
        assert!(check_range(&mut report, "w", "affinity", 100, -100, 100));
        assert!(!check_range(&mut report, "w", "affinity", -101, -100, 100));
        assert!(report.has_errors());
        assert!(report.diagnostics[0].message.contains("-100..=100"));
    }

    #[test]
    fn warnings_do_not_count_as_errors() {
        let mut report = ValidationReport::default();
        report.warning("charm[0]", "max level looks high");
        assert!(!report.has_errors());
        assert_eq!(
            report.diagnostics[0].to_string(),
            "[warning] charm[0]: max level looks high"
        );
    }
}
