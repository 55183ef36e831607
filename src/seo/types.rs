use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Pass,
    Warning,
    Fail,
}

impl CheckStatus {
    /// Contribution of one check to the weighted score, out of 100.
    pub fn value(&self) -> u32 {
        match self {
            Self::Pass => 100,
            Self::Warning => 50,
            Self::Fail => 0,
        }
    }
}

/// Impact of a check, or priority of a recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn weight(&self) -> u32 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckName {
    TitleLength,
    TitleGeneric,
    MetaDescription,
    H1Count,
    HeadingHierarchy,
    ContentLength,
    Images,
    ImageAlt,
    Links,
    InternalLinks,
    ExternalLinks,
    FocusKeywords,
    KeywordInTitle,
    KeywordInContent,
    Readability,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeoCheck {
    pub name: CheckName,
    pub status: CheckStatus,
    pub message: String,
    pub impact: Severity,
}

impl SeoCheck {
    pub fn new(name: CheckName, status: CheckStatus, impact: Severity, message: impl Into<String>) -> Self {
        Self {
            name,
            status,
            message: message.into(),
            impact,
        }
    }

    pub fn pass(name: CheckName, impact: Severity, message: impl Into<String>) -> Self {
        Self::new(name, CheckStatus::Pass, impact, message)
    }

    pub fn warning(name: CheckName, impact: Severity, message: impl Into<String>) -> Self {
        Self::new(name, CheckStatus::Warning, impact, message)
    }

    pub fn fail(name: CheckName, impact: Severity, message: impl Into<String>) -> Self {
        Self::new(name, CheckStatus::Fail, impact, message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    Title,
    Description,
    Keywords,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeoRecommendation {
    #[serde(rename = "type")]
    pub kind: RecommendationKind,
    pub priority: Severity,
    pub title: String,
    pub description: String,
    pub current_value: Option<String>,
    pub suggested_value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeoAnalysis {
    pub score: u8,
    pub checks: Vec<SeoCheck>,
    pub recommendations: Vec<SeoRecommendation>,
    pub analyzed_at: DateTime<Utc>,
}

impl SeoAnalysis {
    pub fn check(&self, name: CheckName) -> Option<&SeoCheck> {
        self.checks.iter().find(|c| c.name == name)
    }
}
