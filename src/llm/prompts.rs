//! Instruction template for the wasted-effort analysis.

/// Placeholder replaced by the document content.
const CONTENT_PLACEHOLDER: &str = "{content}";

/// Analysis prompt. The JSON shape must match
/// [`AnalysisResult`](crate::analysis::AnalysisResult).
pub const ANALYSIS_PROMPT: &str = r#"Você é um analista de processos. Analise o conteúdo a seguir (registros, e-mails, planilhas, logs) e identifique:
1. Atividades informais ou repetitivas.
2. Estimativa de tempo desperdiçado (em horas).
3. Estimativa de custo associado (em reais).
4. Sugestões de automação ou padronização (POPs).
5. Priorize as sugestões (Alta/Média/Baixa) e estime impacto.

Responda **apenas** em JSON, no formato:
{
  "resumo": "",
  "tempo_desperdicado_horas_total": 0,
  "tempo_desperdicado_horas_por_tarefa": [
    {"tarefa": "nome", "horas": 0, "ocorrencias": 0}
  ],
  "custo_estimado_reais_total": 0,
  "tarefas_informais": [
    {"tarefa": "nome", "descricao": "", "ocorrencias": 0}
  ],
  "sugestoes": [
    {"titulo": "", "descricao": "", "prioridade": "Alta", "impacto_percentual": 0}
  ]
}

Conteúdo:
{content}"#;

/// Build the analysis prompt for already-bounded document content.
///
/// The content is appended verbatim at the end of the template.
pub fn build_prompt(content: &str) -> String {
    let (head, tail) = ANALYSIS_PROMPT
        .rsplit_once(CONTENT_PLACEHOLDER)
        .unwrap_or((ANALYSIS_PROMPT, ""));

    let mut prompt = String::with_capacity(head.len() + content.len() + tail.len());
    prompt.push_str(head);
    prompt.push_str(content);
    prompt.push_str(tail);
    prompt
}
