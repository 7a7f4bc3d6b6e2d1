use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::OnceLock;

/// Which backend endpoint a search goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// The backend's own catalog, ranked with a match score.
    #[default]
    Local,
    /// The backend's proxy to the tariff authority.
    External,
}

impl SearchMode {
    pub fn endpoint(&self) -> &'static str {
        match self {
            SearchMode::Local => "search",
            SearchMode::External => "usitc-search",
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchMode::Local => write!(f, "Local Search"),
            SearchMode::External => write!(f, "USITC API (Live)"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Restriction {
    #[serde(default)]
    pub agency: String,
    #[serde(default)]
    pub description: String,
}

/// A classification candidate in its canonical shape, whichever endpoint produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub code: String,
    pub description: String,
    pub match_score: Option<f64>,
    pub probability: Option<String>,
    pub duty_rate: Option<String>,
    pub restrictions: Vec<Restriction>,
    pub certifications: BTreeSet<String>,
}

impl Candidate {
    pub fn new(code: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            description: description.into(),
            match_score: None,
            probability: None,
            duty_rate: None,
            restrictions: Vec::new(),
            certifications: BTreeSet::new(),
        }
    }

    pub fn with_duty_rate(mut self, rate: impl Into<String>) -> Self {
        self.duty_rate = Some(rate.into());
        self
    }

    pub fn with_match_score(mut self, score: f64) -> Self {
        self.match_score = Some(score);
        self
    }

    /// Display probability: the service-provided string, else derived from the score.
    pub fn probability_label(&self) -> Option<String> {
        self.probability
            .clone()
            .or_else(|| self.match_score.map(|s| format!("{}%", s)))
    }

    /// Numeric probability used for colour banding.
    pub fn probability_value(&self) -> Option<f64> {
        self.probability
            .as_deref()
            .and_then(|p| p.trim().trim_end_matches('%').trim().parse::<f64>().ok())
            .or(self.match_score)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DutyField {
    #[serde(default)]
    pub rate: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DutiesField {
    #[serde(default)]
    pub general: Option<String>,
}

/// Certifications arrive either as a list or as a single string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    Many(Vec<String>),
    One(String),
}

impl Default for OneOrMany {
    fn default() -> Self {
        OneOrMany::Many(Vec::new())
    }
}

impl OneOrMany {
    fn into_set(self) -> BTreeSet<String> {
        match self {
            OneOrMany::Many(items) => items
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            OneOrMany::One(item) => item
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }
}

/// Row shape returned by `GET /search`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocalRecord {
    #[serde(default)]
    pub hts_code: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub probability: Option<String>,
    #[serde(default)]
    pub duty: Option<DutyField>,
    #[serde(default)]
    pub duties: Option<DutiesField>,
    #[serde(default)]
    pub restrictions: Option<Vec<Restriction>>,
    #[serde(default)]
    pub certifications: Option<OneOrMany>,
}

/// Row shape returned by `GET /usitc-search`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExternalRecord {
    #[serde(default, alias = "htsno")]
    pub hts_code: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub duties: Option<DutiesField>,
    #[serde(default)]
    pub general: Option<String>,
}

/// A candidate as received, tagged with the endpoint that produced it.
#[derive(Debug, Clone)]
pub enum RawCandidate {
    Local(LocalRecord),
    External(ExternalRecord),
}

fn html_tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]*>").expect("html tag pattern is valid"))
}

fn clean_html(text: &str) -> String {
    html_tag_regex().replace_all(text, "").trim().to_string()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl From<RawCandidate> for Candidate {
    fn from(raw: RawCandidate) -> Self {
        match raw {
            RawCandidate::Local(r) => {
                let duty_rate = r
                    .duty
                    .and_then(|d| d.rate)
                    .or_else(|| r.duties.and_then(|d| d.general));
                Candidate {
                    code: r.hts_code.unwrap_or_default(),
                    description: non_blank(r.full_name)
                        .or(r.description)
                        .map(|d| clean_html(&d))
                        .unwrap_or_default(),
                    match_score: r.score,
                    probability: non_blank(r.probability),
                    duty_rate: non_blank(duty_rate),
                    restrictions: r.restrictions.unwrap_or_default(),
                    certifications: r.certifications.unwrap_or_default().into_set(),
                }
            }
            RawCandidate::External(r) => {
                let duty_rate = r.duties.and_then(|d| d.general).or(r.general);
                Candidate {
                    code: r.hts_code.unwrap_or_default(),
                    description: r.description.map(|d| clean_html(&d)).unwrap_or_default(),
                    match_score: None,
                    probability: None,
                    duty_rate: non_blank(duty_rate),
                    restrictions: Vec::new(),
                    certifications: BTreeSet::new(),
                }
            }
        }
    }
}

/// A node of the classification hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "WireNode")]
pub struct HierarchyNode {
    pub label: String,
    pub code: Option<String>,
    pub children: Vec<HierarchyNode>,
}

impl HierarchyNode {
    pub fn new(label: impl Into<String>, code: Option<&str>) -> Self {
        Self {
            label: label.into(),
            code: code.map(str::to_string),
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<HierarchyNode>) -> Self {
        self.children = children;
        self
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// `label (code)` the way the tree prints a node.
    pub fn display_label(&self) -> String {
        match &self.code {
            Some(code) if !code.is_empty() => format!("{} ({})", self.label, code),
            _ => self.label.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireNode {
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    full_name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default, alias = "hts_code")]
    code: Option<String>,
    #[serde(default)]
    children: Option<Vec<HierarchyNode>>,
}

impl From<WireNode> for HierarchyNode {
    fn from(w: WireNode) -> Self {
        let label = non_blank(w.label)
            .or_else(|| non_blank(w.name))
            .or_else(|| non_blank(w.full_name))
            .or_else(|| non_blank(w.description))
            .unwrap_or_default();
        HierarchyNode {
            label,
            code: non_blank(w.code),
            children: w.children.unwrap_or_default(),
        }
    }
}

/// Response of `POST /sync`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    #[serde(default)]
    pub rows: u64,
    #[serde(default)]
    pub status: Option<String>,
}
