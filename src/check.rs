//! Check outcomes and their console rendering.

use colored::Colorize;
use std::fmt;

/// Result of one check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Ok,
    /// A single-sample check read the wrong level.
    Failed,
    /// The sample that should have been true was false.
    FailedHigh,
    /// The sample that should have been false was true.
    FailedLow,
    FailedBoth,
    /// Loopback round-trips that did not come back byte-for-byte.
    Mismatched { count: usize, total: usize },
}

impl Outcome {
    /// Reduce an inverse-logic sample pair to an outcome.
    pub fn from_samples(should_be_true: bool, should_be_false: bool) -> Self {
        match (should_be_true, should_be_false) {
            (true, false) => Outcome::Ok,
            (false, false) => Outcome::FailedHigh,
            (true, true) => Outcome::FailedLow,
            (false, true) => Outcome::FailedBoth,
        }
    }

    /// Outcome of a single-sample check.
    pub fn from_match(passed: bool) -> Self {
        if passed {
            Outcome::Ok
        } else {
            Outcome::Failed
        }
    }

    pub fn is_ok(self) -> bool {
        self == Outcome::Ok
    }
}

/// A named outcome, rendered as one or two console lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    pub name: String,
    pub outcome: Outcome,
}

impl CheckResult {
    pub fn new(name: impl Into<String>, outcome: Outcome) -> Self {
        Self {
            name: name.into(),
            outcome,
        }
    }

    pub fn passed(&self) -> bool {
        self.outcome.is_ok()
    }

    /// Plain-text lines, each paired with whether it reports a pass.
    pub fn lines(&self) -> Vec<(String, bool)> {
        let name = &self.name;
        match self.outcome {
            Outcome::Ok => vec![(format!("{name} OK"), true)],
            Outcome::Failed => vec![(format!("{name} failed"), false)],
            Outcome::FailedHigh => vec![(format!("{name} failed on HIGH check"), false)],
            Outcome::FailedLow => vec![(format!("{name} failed on LOW check"), false)],
            Outcome::FailedBoth => vec![
                (format!("{name} failed on HIGH check"), false),
                (format!("{name} failed on LOW check"), false),
            ],
            Outcome::Mismatched { count, .. } => {
                vec![(format!("{name} failed ({count} mismatched strings)"), false)]
            }
        }
    }

    /// Print the result to stdout, green for pass and red for failure.
    pub fn print(&self) {
        for (line, ok) in self.lines() {
            if ok {
                println!("{}", line.green());
            } else {
                println!("{}", line.red());
            }
        }
    }
}

impl fmt::Display for CheckResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lines: Vec<String> = self.lines().into_iter().map(|(line, _)| line).collect();
        f.write_str(&lines.join("\n"))
    }
}

/// Ordered results of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    results: Vec<CheckResult>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, result: CheckResult) {
        self.results.push(result);
    }

    pub fn results(&self) -> &[CheckResult] {
        &self.results
    }

    pub fn all_passed(&self) -> bool {
        self.results.iter().all(CheckResult::passed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &CheckResult> {
        self.results.iter().filter(|r| !r.passed())
    }
}
