//! Wasted-effort analysis model and the text handling around it.
//!
//! The JSON keys are the Portuguese names the model is instructed to emit
//! (see [`crate::llm::prompts`]); the two must change together.

pub mod normalize;
pub mod truncate;

use std::fmt;

use serde::{de, Deserialize, Deserializer, Serialize};

pub use normalize::{normalize, MalformedResponse};
pub use truncate::{truncate, BoundedContent, Truncation};

/// Structured analysis returned by the model.
///
/// Every field is required: a response missing any of them fails to parse
/// rather than producing a partially filled result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Free-text summary of the findings.
    #[serde(rename = "resumo")]
    pub summary: String,
    /// Total wasted time, in hours.
    #[serde(rename = "tempo_desperdicado_horas_total")]
    pub total_wasted_hours: f64,
    /// Wasted time broken down per task.
    #[serde(rename = "tempo_desperdicado_horas_por_tarefa")]
    pub wasted_hours_by_task: Vec<TaskHours>,
    /// Total estimated cost, in BRL.
    #[serde(rename = "custo_estimado_reais_total")]
    pub total_estimated_cost: f64,
    /// Informal or repetitive activities that were detected.
    #[serde(rename = "tarefas_informais")]
    pub informal_tasks: Vec<InformalTask>,
    /// Automation or standardization suggestions.
    #[serde(rename = "sugestoes")]
    pub suggestions: Vec<Suggestion>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskHours {
    #[serde(rename = "tarefa")]
    pub task: String,
    #[serde(rename = "horas")]
    pub hours: f64,
    #[serde(rename = "ocorrencias", deserialize_with = "whole_count")]
    pub occurrences: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InformalTask {
    #[serde(rename = "tarefa")]
    pub task: String,
    #[serde(rename = "descricao")]
    pub description: String,
    #[serde(rename = "ocorrencias", deserialize_with = "whole_count")]
    pub occurrences: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "descricao")]
    pub description: String,
    #[serde(rename = "prioridade")]
    pub priority: Priority,
    #[serde(rename = "impacto_percentual")]
    pub impact_percent: f64,
}

/// Read a count written as any whole JSON number: `2` and `2.0` are both
/// accepted, `2.5` and negatives are not.
fn whole_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let n = f64::deserialize(deserializer)?;
    if n.is_finite() && n >= 0.0 && n.fract() == 0.0 && n <= f64::from(u32::MAX) {
        Ok(n as u32)
    } else {
        Err(de::Error::invalid_value(
            de::Unexpected::Float(n),
            &"a non-negative whole number",
        ))
    }
}

/// Suggestion priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    #[serde(rename = "Alta", alias = "High", alias = "alta")]
    High,
    #[serde(rename = "Média", alias = "Media", alias = "Medium", alias = "média", alias = "media")]
    Medium,
    #[serde(rename = "Baixa", alias = "Low", alias = "baixa")]
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "Alta",
            Priority::Medium => "Média",
            Priority::Low => "Baixa",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
