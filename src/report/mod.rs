//! HTML report rendering.
//!
//! Reports accept degraded input: every analysis field is optional so a
//! partially filled analysis posted by a client still renders, with
//! placeholders for what is missing. A value of the wrong type is treated
//! as missing rather than rejecting the whole document.

use askama::Template;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::analysis::AnalysisResult;

const NO_SUMMARY: &str = "Sem resumo gerado.";
const NOT_AVAILABLE: &str = "N/A";
const UNNAMED_TASK: &str = "Sem nome";
const UNTITLED_SUGGESTION: &str = "Sem título";

/// Lenient mirror of [`AnalysisResult`] used as report input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportAnalysis {
    #[serde(rename = "resumo", default, deserialize_with = "lenient_text")]
    pub summary: Option<String>,
    #[serde(rename = "tempo_desperdicado_horas_total", default, deserialize_with = "lenient_number")]
    pub total_wasted_hours: Option<f64>,
    #[serde(rename = "tempo_desperdicado_horas_por_tarefa", default, deserialize_with = "lenient_list")]
    pub wasted_hours_by_task: Vec<ReportTaskHours>,
    #[serde(rename = "custo_estimado_reais_total", default, deserialize_with = "lenient_number")]
    pub total_estimated_cost: Option<f64>,
    #[serde(rename = "tarefas_informais", default, deserialize_with = "lenient_list")]
    pub informal_tasks: Vec<ReportInformalTask>,
    #[serde(rename = "sugestoes", default, deserialize_with = "lenient_list")]
    pub suggestions: Vec<ReportSuggestion>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportTaskHours {
    #[serde(rename = "tarefa", default, deserialize_with = "lenient_text")]
    pub task: Option<String>,
    #[serde(rename = "horas", default, deserialize_with = "lenient_number")]
    pub hours: Option<f64>,
    #[serde(rename = "ocorrencias", default, deserialize_with = "lenient_count")]
    pub occurrences: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportInformalTask {
    #[serde(rename = "tarefa", default, deserialize_with = "lenient_text")]
    pub task: Option<String>,
    #[serde(rename = "descricao", default, deserialize_with = "lenient_text")]
    pub description: Option<String>,
    #[serde(rename = "ocorrencias", default, deserialize_with = "lenient_count")]
    pub occurrences: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportSuggestion {
    #[serde(rename = "titulo", default, deserialize_with = "lenient_text")]
    pub title: Option<String>,
    #[serde(rename = "descricao", default, deserialize_with = "lenient_text")]
    pub description: Option<String>,
    /// Kept as free text; reports render whatever label the client sent.
    #[serde(rename = "prioridade", default, deserialize_with = "lenient_text")]
    pub priority: Option<String>,
    #[serde(rename = "impacto_percentual", default, deserialize_with = "lenient_number")]
    pub impact_percent: Option<f64>,
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

/// Numbers, or strings holding a number. Anything else is missing.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let n = match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', ".").parse::<f64>().ok(),
        _ => None,
    };
    Ok(n.filter(|n| n.is_finite()))
}

fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_number(deserializer)?
        .filter(|n| *n >= 0.0 && n.fract() == 0.0 && *n <= f64::from(u32::MAX))
        .map(|n| n as u32))
}

/// Arrays keep the entries that are objects; any other value is an empty list.
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .filter(Value::is_object)
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

impl From<&AnalysisResult> for ReportAnalysis {
    fn from(analysis: &AnalysisResult) -> Self {
        Self {
            summary: Some(analysis.summary.clone()),
            total_wasted_hours: Some(analysis.total_wasted_hours),
            wasted_hours_by_task: analysis
                .wasted_hours_by_task
                .iter()
                .map(|t| ReportTaskHours {
                    task: Some(t.task.clone()),
                    hours: Some(t.hours),
                    occurrences: Some(t.occurrences),
                })
                .collect(),
            total_estimated_cost: Some(analysis.total_estimated_cost),
            informal_tasks: analysis
                .informal_tasks
                .iter()
                .map(|t| ReportInformalTask {
                    task: Some(t.task.clone()),
                    description: Some(t.description.clone()),
                    occurrences: Some(t.occurrences),
                })
                .collect(),
            suggestions: analysis
                .suggestions
                .iter()
                .map(|s| ReportSuggestion {
                    title: Some(s.title.clone()),
                    description: Some(s.description.clone()),
                    priority: Some(s.priority.as_str().to_string()),
                    impact_percent: Some(s.impact_percent),
                })
                .collect(),
        }
    }
}

/// Row of the per-task hours table.
struct TaskRow {
    name: String,
    hours: String,
    occurrences: String,
}

/// Entry of the informal tasks list.
struct InformalRow {
    name: String,
    description: String,
    has_occurrences: bool,
    occurrences: String,
}

/// Entry of the suggestions list.
struct SuggestionRow {
    title: String,
    priority: String,
    description: String,
    has_impact: bool,
    impact: String,
}

#[derive(Template)]
#[template(path = "report.html")]
struct ReportTemplate<'a> {
    file_name: &'a str,
    generated_at: String,
    summary: &'a str,
    total_hours: String,
    total_cost: String,
    task_rows: Vec<TaskRow>,
    has_task_rows: bool,
    informal_tasks: Vec<InformalRow>,
    has_informal_tasks: bool,
    suggestions: Vec<SuggestionRow>,
    has_suggestions: bool,
}

/// Render an analysis as a standalone HTML document.
pub fn render_report(
    original_filename: Option<&str>,
    analysis: &ReportAnalysis,
    generated_at: DateTime<Utc>,
) -> Result<String, askama::Error> {
    let task_rows: Vec<TaskRow> = analysis
        .wasted_hours_by_task
        .iter()
        .map(|t| TaskRow {
            name: text_or(&t.task, UNNAMED_TASK),
            hours: number_or_na(t.hours),
            occurrences: t
                .occurrences
                .map(|n| n.to_string())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        })
        .collect();

    let informal_tasks: Vec<InformalRow> = analysis
        .informal_tasks
        .iter()
        .map(|t| InformalRow {
            name: text_or(&t.task, UNNAMED_TASK),
            description: t.description.clone().unwrap_or_default(),
            has_occurrences: t.occurrences.is_some_and(|n| n > 0),
            occurrences: t.occurrences.unwrap_or(0).to_string(),
        })
        .collect();

    let suggestions: Vec<SuggestionRow> = analysis
        .suggestions
        .iter()
        .map(|s| SuggestionRow {
            title: text_or(&s.title, UNTITLED_SUGGESTION),
            priority: text_or(&s.priority, NOT_AVAILABLE),
            description: s.description.clone().unwrap_or_default(),
            has_impact: s.impact_percent.is_some(),
            impact: number_or_na(s.impact_percent),
        })
        .collect();

    let template = ReportTemplate {
        file_name: original_filename
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(NOT_AVAILABLE),
        generated_at: generated_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        summary: analysis
            .summary
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(NO_SUMMARY),
        total_hours: number_or_na(analysis.total_wasted_hours),
        total_cost: analysis
            .total_estimated_cost
            .map(|cost| format!("{:.2}", cost))
            .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        has_task_rows: !task_rows.is_empty(),
        task_rows,
        has_informal_tasks: !informal_tasks.is_empty(),
        informal_tasks,
        has_suggestions: !suggestions.is_empty(),
        suggestions,
    };

    template.render()
}

fn text_or(value: &Option<String>, fallback: &str) -> String {
    match value.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => fallback.to_string(),
    }
}

fn number_or_na(value: Option<f64>) -> String {
    match value {
        Some(n) if n.is_finite() => n.to_string(),
        _ => NOT_AVAILABLE.to_string(),
    }
}
