use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The four sequential stages of a hiring conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    #[serde(rename = "Context")]
    Context,
    #[serde(rename = "Problem Discovery")]
    ProblemDiscovery,
    #[serde(rename = "Solution Design")]
    SolutionDesign,
    #[serde(rename = "Action Plan")]
    ActionPlan,
}

#[derive(Debug, Clone, Error, PartialEq)]
#[error("Unknown phase: '{0}'. Expected 'Context', 'Problem Discovery', 'Solution Design' or 'Action Plan'")]
pub struct PhaseParseError(pub String);

impl Phase {
    pub fn all() -> [Phase; 4] {
        [
            Phase::Context,
            Phase::ProblemDiscovery,
            Phase::SolutionDesign,
            Phase::ActionPlan,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Context => "Context",
            Phase::ProblemDiscovery => "Problem Discovery",
            Phase::SolutionDesign => "Solution Design",
            Phase::ActionPlan => "Action Plan",
        }
    }

    /// The phase that follows this one, or `None` for the last phase.
    pub fn next(&self) -> Option<Phase> {
        match self {
            Phase::Context => Some(Phase::ProblemDiscovery),
            Phase::ProblemDiscovery => Some(Phase::SolutionDesign),
            Phase::SolutionDesign => Some(Phase::ActionPlan),
            Phase::ActionPlan => None,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = PhaseParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Phase::all()
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| PhaseParseError(s.to_string()))
    }
}

/// A single extracted fact: a category label plus free text.
///
/// Serialized as the canonical `"Category: text"` string, which is also the
/// persisted form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Insight {
    pub category: String,
    pub text: String,
}

#[derive(Debug, Clone, Error, PartialEq)]
#[error("Insight '{0}' has no 'Category: text' prefix")]
pub struct InsightParseError(pub String);

/// Minimum length of a category label.
pub const MIN_CATEGORY_LEN: usize = 2;

impl Insight {
    pub fn new(category: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            text: text.into(),
        }
    }

    /// Splits `"Category: text"` on the first colon.
    /// Returns `None` when there is no colon or the category is too short.
    pub fn parse(raw: &str) -> Option<Insight> {
        let (category, text) = split_category(raw)?;
        if category.chars().count() < MIN_CATEGORY_LEN {
            return None;
        }
        Some(Insight::new(category, text))
    }

    /// Case-insensitive check whether this insight's label covers `category`.
    pub fn covers(&self, category: &str) -> bool {
        self.category
            .to_lowercase()
            .contains(&category.to_lowercase())
    }
}

/// Splits on the first colon, trimming both halves.
pub fn split_category(raw: &str) -> Option<(&str, &str)> {
    raw.split_once(':').map(|(c, t)| (c.trim(), t.trim()))
}

impl fmt::Display for Insight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.category, self.text)
    }
}

impl From<Insight> for String {
    fn from(insight: Insight) -> Self {
        insight.to_string()
    }
}

impl TryFrom<String> for Insight {
    type Error = InsightParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Insight::parse(&value).ok_or(InsightParseError(value))
    }
}
