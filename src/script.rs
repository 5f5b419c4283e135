//! The static step script the loader plays back.
//!
//! A script is an ordered, non-empty list of [`Step`]s. It is never mutated
//! once loaded; the loader only reads it.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

/// Errors raised while validating a step script
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScriptError {
    #[error("step script contains no steps")]
    Empty,

    #[error("duplicate step id {0}")]
    DuplicateId(u32),

    #[error("unsupported script format: {0} (use .toml, .yaml, .yml or .json)")]
    UnsupportedFormat(String),
}

/// Summary content revealed under a step title.
///
/// Prose streams one word at a time, lists stream one item at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Summary {
    Prose(String),
    Items(Vec<String>),
}

impl Summary {
    /// Number of streamable units (words or items)
    pub fn unit_count(&self) -> usize {
        match self {
            Summary::Prose(text) => text.split_whitespace().count(),
            Summary::Items(items) => items.len(),
        }
    }

    /// The streamable units in order
    pub fn units(&self) -> Vec<&str> {
        match self {
            Summary::Prose(text) => text.split_whitespace().collect(),
            Summary::Items(items) => items.iter().map(String::as_str).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.unit_count() == 0
    }
}

/// Presentation hint for list summaries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SummaryType {
    SearchQueries,
}

/// One step of the simulated research process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub id: u32,
    /// Title shown while the step is active
    #[serde(alias = "inProgress")]
    pub in_progress: String,
    /// Title shown once the step has finished
    pub completed: String,
    pub summary: Summary,
    #[serde(default, alias = "summaryType", skip_serializing_if = "Option::is_none")]
    pub summary_type: Option<SummaryType>,
}

impl Step {
    fn prose(id: u32, in_progress: &str, completed: &str, summary: &str) -> Self {
        Self {
            id,
            in_progress: in_progress.to_string(),
            completed: completed.to_string(),
            summary: Summary::Prose(summary.to_string()),
            summary_type: None,
        }
    }
}

/// Ordered, immutable list of steps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Script {
    pub steps: Vec<Step>,
}

impl Script {
    pub fn new(steps: Vec<Step>) -> Result<Self, ScriptError> {
        let script = Self { steps };
        script.validate()?;
        Ok(script)
    }

    /// The research script shown when no script file is configured
    pub fn builtin() -> Self {
        let steps = vec![
            Step::prose(
                1,
                "Analysing the topic...",
                "Analysed the topic",
                "Broke down the core subject to understand what it's really about and how deep we need to go.",
            ),
            Step::prose(
                2,
                "Understanding the context...",
                "Understood the context",
                "The audience, situation, and intent were interpreted to determine how the message should be framed, which assumptions are safe, and what needs to be made explicit. This helps ensure the presentation resonates with viewers and addresses their actual needs.",
            ),
            Step {
                id: 3,
                in_progress: "Forming search queries...".to_string(),
                completed: "Formed search queries".to_string(),
                summary: Summary::Items(vec![
                    "What problem does [topic] solve?".to_string(),
                    "How [topic] is used in practice".to_string(),
                    "Common frameworks or models for [topic]".to_string(),
                    "Examples of effective [topic] presentations".to_string(),
                    "Metrics and benchmarks related to [topic]".to_string(),
                ]),
                summary_type: Some(SummaryType::SearchQueries),
            },
            Step::prose(
                4,
                "Researching relevant background...",
                "Researched relevant background",
                "Pulled in baseline knowledge, known facts, and comparable examples to ground the presentation.",
            ),
            Step::prose(
                5,
                "Consolidating information...",
                "Consolidated information",
                "All gathered inputs were organised into a coherent internal view. Overlaps were resolved, noise was removed, contradictions were flagged, and a single narrative direction was established to guide the rest of the process.",
            ),
            Step::prose(
                6,
                "Planning the presentation outline...",
                "Planned the presentation outline",
                "Defined a slide-by-slide structure with logical flow from context to insight to conclusion.",
            ),
            Step::prose(
                7,
                "Identifying gaps and missing data...",
                "Identified gaps and missing data",
                "Flagged areas where information is incomplete or assumptions need validation.",
            ),
            Step::prose(
                8,
                "Forming key takeaways...",
                "Formed key takeaways",
                "Distilled the most important conclusions\u{2014}what the audience should understand, remember, and act on after viewing. These takeaways will anchor the narrative and ensure every slide serves a clear purpose.",
            ),
            Step::prose(
                9,
                "Preparing content for generation...",
                "Prepared content for generation",
                "Finalised structure and constraints. Ready to generate.",
            ),
        ];
        Self { steps }
    }

    /// Load a script file. The format is chosen from the file extension.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read step script {}", path.display()))?;

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();

        let script: Script = match ext.as_str() {
            "toml" => toml::from_str(&raw).context("Failed to parse TOML step script")?,
            "yaml" | "yml" => {
                serde_yaml::from_str(&raw).context("Failed to parse YAML step script")?
            }
            "json" => serde_json::from_str(&raw).context("Failed to parse JSON step script")?,
            other => return Err(ScriptError::UnsupportedFormat(other.to_string()).into()),
        };

        script.validate()?;
        tracing::debug!(path = %path.display(), steps = script.len(), "Loaded step script");
        Ok(script)
    }

    /// Check the script is well-formed enough to play back
    pub fn validate(&self) -> Result<(), ScriptError> {
        if self.steps.is_empty() {
            return Err(ScriptError::Empty);
        }

        let mut seen = HashSet::new();
        for step in &self.steps {
            if !seen.insert(step.id) {
                return Err(ScriptError::DuplicateId(step.id));
            }
            if step.summary.is_empty() {
                tracing::warn!(step = step.id, "Step has an empty summary");
            }
        }

        Ok(())
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Step> {
        self.steps.get(index)
    }
}
