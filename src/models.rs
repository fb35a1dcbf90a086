use anyhow::anyhow;
use serde::Deserialize;
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;

/// Which backend service a query is routed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryMode {
    #[default]
    General,
    Policy,
    Complaint,
}

impl QueryMode {
    pub const ALL: [QueryMode; 3] = [QueryMode::General, QueryMode::Policy, QueryMode::Complaint];

    pub fn as_str(&self) -> &'static str {
        match self {
            QueryMode::General => "general",
            QueryMode::Policy => "policy",
            QueryMode::Complaint => "complaint",
        }
    }

    /// Human readable label used in rendered output
    pub fn label(&self) -> &'static str {
        match self {
            QueryMode::General => "General",
            QueryMode::Policy => "Policy guidance",
            QueryMode::Complaint => "Complaint analysis",
        }
    }

    pub fn route(&self) -> &'static str {
        match self {
            QueryMode::General => "/api/cx/answer",
            QueryMode::Policy => "/api/cx/policy-guidance",
            QueryMode::Complaint => "/api/cx/complaint-analysis",
        }
    }
}

impl fmt::Display for QueryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "general" | "answer" => Ok(QueryMode::General),
            "policy" | "policy-guidance" => Ok(QueryMode::Policy),
            "complaint" | "complaint-analysis" => Ok(QueryMode::Complaint),
            other => Err(anyhow!(
                "unknown mode '{}' (expected general, policy or complaint)",
                other
            )),
        }
    }
}

/// Document set searched by a general query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuerySubtype {
    #[default]
    Both,
    Policy,
    Complaint,
}

impl QuerySubtype {
    pub const ALL: [QuerySubtype; 3] = [
        QuerySubtype::Both,
        QuerySubtype::Policy,
        QuerySubtype::Complaint,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QuerySubtype::Both => "both",
            QuerySubtype::Policy => "policy",
            QuerySubtype::Complaint => "complaint",
        }
    }
}

impl fmt::Display for QuerySubtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuerySubtype {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "both" => Ok(QuerySubtype::Both),
            "policy" => Ok(QuerySubtype::Policy),
            "complaint" => Ok(QuerySubtype::Complaint),
            other => Err(anyhow!(
                "unknown type '{}' (expected both, policy or complaint)",
                other
            )),
        }
    }
}

/// A single question as typed by the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    pub text: String,
    pub mode: QueryMode,
    /// Only sent when `mode` is `General`
    pub subtype: QuerySubtype,
}

impl QueryRequest {
    pub fn new(text: impl Into<String>, mode: QueryMode, subtype: QuerySubtype) -> Self {
        Self {
            text: text.into(),
            mode,
            subtype,
        }
    }

    pub fn general(text: impl Into<String>, subtype: QuerySubtype) -> Self {
        Self::new(text, QueryMode::General, subtype)
    }

    /// Blank input is never sent to the backend.
    ///
    /// Whitespace-only text counts as blank too, not only the zero-length
    /// string.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub fn route(&self) -> &'static str {
        self.mode.route()
    }

    /// JSON body for the mode's route
    pub fn payload(&self) -> Value {
        match self.mode {
            QueryMode::General => json!({
                "query": self.text,
                "type": self.subtype.as_str(),
            }),
            QueryMode::Policy => json!({ "scenario": self.text }),
            QueryMode::Complaint => json!({ "complaint": self.text }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Confidence {
    High,
    Medium,
    Low,
    #[default]
    Unknown,
}

impl Confidence {
    /// Labels other than HIGH/MEDIUM/LOW map to `Unknown`
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_uppercase().as_str() {
            "HIGH" => Confidence::High,
            "MEDIUM" => Confidence::Medium,
            "LOW" => Confidence::Low,
            _ => Confidence::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::High => "HIGH",
            Confidence::Medium => "MEDIUM",
            Confidence::Low => "LOW",
            Confidence::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Risk {
    pub kind: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Citation {
    pub policy_name: String,
    pub section_title: String,
}

/// Decoded body of a successful answer call
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawAnswer")]
pub struct AnswerResult {
    pub answer: String,
    pub confidence: Confidence,
    pub next_action: Option<String>,
    pub risks: Vec<Risk>,
    pub citations: Vec<Citation>,
}

pub const NO_ANSWER: &str = "No answer";

impl Default for AnswerResult {
    fn default() -> Self {
        RawAnswer::default().into()
    }
}

impl AnswerResult {
    pub fn from_json(body: &str) -> serde_json::Result<Self> {
        serde_json::from_str(body)
    }
}

// Wire shape: every field optional, explicit nulls treated as absent.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAnswer {
    answer: Option<String>,
    confidence: Option<String>,
    next_action: Option<String>,
    risks: Option<Vec<RawRisk>>,
    citations: Option<Vec<RawCitation>>,
}

#[derive(Debug, Deserialize)]
struct RawRisk {
    #[serde(rename = "type")]
    kind: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCitation {
    policy_name: Option<String>,
    section_title: Option<String>,
}

impl From<RawAnswer> for AnswerResult {
    fn from(raw: RawAnswer) -> Self {
        Self {
            answer: raw.answer.unwrap_or_else(|| NO_ANSWER.to_string()),
            confidence: raw
                .confidence
                .as_deref()
                .map(Confidence::from_label)
                .unwrap_or_default(),
            next_action: raw.next_action,
            risks: raw
                .risks
                .unwrap_or_default()
                .into_iter()
                .map(|r| Risk {
                    kind: r.kind.unwrap_or_default(),
                    description: r.description.unwrap_or_default(),
                })
                .collect(),
            citations: raw
                .citations
                .unwrap_or_default()
                .into_iter()
                .map(|c| Citation {
                    policy_name: c.policy_name.unwrap_or_default(),
                    section_title: c.section_title.unwrap_or_default(),
                })
                .collect(),
        }
    }
}

/// Result of probing the backend health route
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    Online,
    /// Backend answered with a non-200 status
    Offline(u16),
    /// Request never completed
    Unreachable(String),
}

impl HealthStatus {
    pub fn is_online(&self) -> bool {
        matches!(self, HealthStatus::Online)
    }
}

/// Outcome of one submit. Never raised past the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    /// Empty input, nothing was sent
    Skipped,
    Success(AnswerResult),
    /// Non-200 response, carries the body text verbatim
    BackendError(String),
    /// Network failure, timeout or undecodable body
    TransportError(String),
}

impl QueryOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, QueryOutcome::Success(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(
            self,
            QueryOutcome::BackendError(_) | QueryOutcome::TransportError(_)
        )
    }
}
