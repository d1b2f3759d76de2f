use serde::{Deserialize, Serialize};
use std::fmt;

/// A work item pulled from the issue tracker.
///
/// Labels keep set semantics: order is meaningless and matching is
/// case-insensitive, mirroring how the tracker treats them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub number: u64,
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub labels: Vec<String>,
}

impl Issue {
    pub fn new(
        number: u64,
        title: impl Into<String>,
        body: impl Into<String>,
        labels: Vec<String>,
    ) -> Self {
        Self {
            number,
            title: title.into(),
            body: body.into(),
            labels,
        }
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l.eq_ignore_ascii_case(label))
    }
}

/// Closed classification of an issue, computed once per execution and then
/// threaded through selection and scoring.
/// Higher-listed kinds win when several labels apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueType {
    Security,
    Bug,
    Performance,
    Refactor,
    Test,
    Docs,
    Feature,
    General,
}

impl IssueType {
    /// Classify from labels first, then from title keywords.
    pub fn classify(issue: &Issue) -> Self {
        for candidate in Self::PRECEDENCE {
            if issue
                .labels
                .iter()
                .any(|l| candidate.matches_keyword(&l.to_lowercase()))
            {
                return *candidate;
            }
        }

        let title = issue.title.to_lowercase();
        for candidate in Self::PRECEDENCE {
            if title
                .split(|c: char| !c.is_alphanumeric())
                .any(|word| candidate.matches_keyword(word))
            {
                return *candidate;
            }
        }

        IssueType::General
    }

    const PRECEDENCE: &'static [IssueType] = &[
        IssueType::Security,
        IssueType::Bug,
        IssueType::Performance,
        IssueType::Refactor,
        IssueType::Test,
        IssueType::Docs,
        IssueType::Feature,
    ];

    fn matches_keyword(self, word: &str) -> bool {
        match self {
            IssueType::Security => matches!(word, "security" | "vulnerability" | "cve"),
            IssueType::Bug => matches!(word, "bug" | "bugfix" | "defect" | "fix" | "crash"),
            IssueType::Performance => matches!(word, "performance" | "perf" | "slow" | "latency"),
            IssueType::Refactor => matches!(word, "refactor" | "refactoring" | "cleanup"),
            IssueType::Test => matches!(word, "test" | "tests" | "testing"),
            IssueType::Docs => matches!(word, "docs" | "documentation" | "readme"),
            IssueType::Feature => matches!(word, "feature" | "enhancement"),
            IssueType::General => false,
        }
    }
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IssueType::Security => "security",
            IssueType::Bug => "bug",
            IssueType::Performance => "performance",
            IssueType::Refactor => "refactor",
            IssueType::Test => "test",
            IssueType::Docs => "docs",
            IssueType::Feature => "feature",
            IssueType::General => "general",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue_with_labels(labels: &[&str]) -> Issue {
        Issue::new(
            1,
            "Some work item",
            "",
            labels.iter().map(|s| s.to_string()).collect(),
        )
    }

    #[test]
    fn test_label_classification() {
        assert_eq!(
            IssueType::classify(&issue_with_labels(&["security"])),
            IssueType::Security
        );
        assert_eq!(
            IssueType::classify(&issue_with_labels(&["bug"])),
            IssueType::Bug
        );
        assert_eq!(
            IssueType::classify(&issue_with_labels(&["refactor"])),
            IssueType::Refactor
        );
        assert_eq!(
            IssueType::classify(&issue_with_labels(&["documentation"])),
            IssueType::Docs
        );
    }

    #[test]
    fn test_security_wins_over_bug() {
        assert_eq!(
            IssueType::classify(&issue_with_labels(&["bug", "security"])),
            IssueType::Security
        );
    }

    #[test]
    fn test_title_fallback() {
        let issue = Issue::new(7, "Fix crash in parser", "", vec![]);
        assert_eq!(IssueType::classify(&issue), IssueType::Bug);

        let issue = Issue::new(8, "Add dark mode feature", "", vec![]);
        assert_eq!(IssueType::classify(&issue), IssueType::Feature);
    }

    #[test]
    fn test_unlabeled_is_general() {
        let issue = Issue::new(9, "Investigate the thing", "", vec![]);
        assert_eq!(IssueType::classify(&issue), IssueType::General);
    }

    #[test]
    fn test_label_matching_is_case_insensitive() {
        assert_eq!(
            IssueType::classify(&issue_with_labels(&["Security"])),
            IssueType::Security
        );
        assert!(issue_with_labels(&["Critical"]).has_label("critical"));
    }
}
