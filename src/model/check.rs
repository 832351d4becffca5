/// Outcome of one preflight check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    pub name: String,
    pub message: String,
    pub passed: bool,
    pub warning: bool,
}

impl CheckResult {
    pub fn pass(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            passed: true,
            warning: false,
        }
    }

    pub fn warn(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            passed: false,
            warning: true,
        }
    }

    pub fn fail(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            passed: false,
            warning: false,
        }
    }

    pub fn is_hard_failure(&self) -> bool {
        !self.passed && !self.warning
    }

    pub fn label(&self) -> &'static str {
        if self.passed {
            "[OK]"
        } else if self.warning {
            "[SKIP]"
        } else {
            "[FAIL]"
        }
    }
}

/// Warnings are tolerated; any hard failure blocks installation.
pub fn can_proceed(checks: &[CheckResult]) -> bool {
    !checks.iter().any(CheckResult::is_hard_failure)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hard_failure_blocks_even_with_warnings() {
        let checks = vec![
            CheckResult::fail("Host CLI", "opencode not found"),
            CheckResult::warn("Agent CLI", "not logged in"),
        ];
        assert!(!can_proceed(&checks));
    }

    #[test]
    fn warnings_and_passes_proceed() {
        let checks = vec![
            CheckResult::pass("Host CLI", "1.0.0"),
            CheckResult::warn("Agent CLI", "not logged in"),
            CheckResult::warn("Agent CLI", "not found"),
        ];
        assert!(can_proceed(&checks));
        assert!(can_proceed(&[]));
    }

    #[test]
    fn labels() {
        assert_eq!(CheckResult::pass("a", "b").label(), "[OK]");
        assert_eq!(CheckResult::warn("a", "b").label(), "[SKIP]");
        assert_eq!(CheckResult::fail("a", "b").label(), "[FAIL]");
    }
}
