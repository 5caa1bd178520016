//! Recovery of an [`AnalysisResult`] from free-form model output.
//!
//! Models sometimes wrap the JSON in a Markdown code fence or prepend an
//! explanation. Recovery runs an ordered list of strategies; each one is a
//! pure function that either yields a fully parsed result or nothing.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;
use tracing::{debug, warn};

use super::AnalysisResult;

const FENCE_OPEN: &str = "```json";
const FENCE_CLOSE: &str = "```";

/// Outermost `{...}` span that runs to the end of the text.
static TRAILING_OBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}$").expect("trailing object pattern is valid"));

type Strategy = fn(&str) -> Option<AnalysisResult>;

/// Recovery strategies, tried in order.
const STRATEGIES: &[(&str, Strategy)] = &[
    ("fenced", parse_fenced),
    ("trailing_object", parse_trailing_object),
];

/// The model output could not be turned into an analysis.
#[derive(Debug, Clone, Error)]
#[error("model output is not a valid analysis ({} chars)", .raw.chars().count())]
pub struct MalformedResponse {
    /// The untouched model output.
    pub raw: String,
}

/// Parse model output into an [`AnalysisResult`].
pub fn normalize(raw: &str) -> Result<AnalysisResult, MalformedResponse> {
    for (name, strategy) in STRATEGIES {
        if let Some(result) = strategy(raw) {
            debug!(strategy = name, "Recovered analysis from model output");
            return Ok(result);
        }
        debug!(strategy = name, "Recovery strategy did not match");
    }

    warn!(chars = raw.chars().count(), "No recovery strategy produced a valid analysis");
    Err(MalformedResponse {
        raw: raw.to_string(),
    })
}

/// Trim, then drop a leading ```` ```json ```` and a trailing ```` ``` ````.
fn strip_fences(raw: &str) -> &str {
    let text = raw.trim();
    let text = text.strip_prefix(FENCE_OPEN).unwrap_or(text);
    let text = text.strip_suffix(FENCE_CLOSE).unwrap_or(text);
    text.trim()
}

fn parse_fenced(raw: &str) -> Option<AnalysisResult> {
    serde_json::from_str(strip_fences(raw)).ok()
}

fn parse_trailing_object(raw: &str) -> Option<AnalysisResult> {
    let text = strip_fences(raw);
    let span = TRAILING_OBJECT.find(text)?;
    serde_json::from_str(span.as_str()).ok()
}
