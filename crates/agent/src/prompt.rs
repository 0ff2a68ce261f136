//! Prompt composition.
//!
//! One prompt per turn, sent as a single user message. The template carries
//! the generation policies: be direct, fall back to general domain
//! knowledge, use the history, prefer lists, and never emit section labels.

use careguide_core::retriever::RetrievedPassage;

/// The three variable parts of a prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptPayload {
    pub history_text: String,
    pub context_text: String,
    pub question_text: String,
}

impl PromptPayload {
    /// Fill the template.
    pub fn render(&self) -> String {
        format!(
            "Você é um assistente especialista em cuidados com demência.

DIRETRIZES PRINCIPAIS:
1. SEJA SEMPRE DIRETO: Evite frases como \"Entendo sua preocupação\" ou \"não há informações no contexto fornecido\". Vá direto ao ponto com informações úteis.
2. USE CONHECIMENTO GERAL: Se o contexto abaixo não tiver a resposta completa, use seu conhecimento geral sobre cuidados geriátricos e demência para ajudar. NUNCA diga que não sabe - sempre forneça uma resposta útil.
3. MANTENHA CONTEXTO: Considere o histórico da conversa abaixo para evitar repetições e criar respostas adequadas ao que já foi discutido.
4. FORMATO: Use listas e tópicos sempre que possível para facilitar a leitura.
5. IMPORTANTE: NÃO inclua cabeçalhos como \"Resposta Direta:\", \"Dicas:\", \"Informações:\" ou similares. Responda diretamente, sem rótulos ou títulos.

Histórico da Conversa (últimas interações):
{history}

Contexto da Base de Conhecimento:
{context}

Pergunta Atual do Usuário: {question}

Responda diretamente, sem cabeçalhos ou rótulos:",
            history = self.history_text,
            context = self.context_text,
            question = self.question_text,
        )
    }
}

pub struct PromptComposer;

impl PromptComposer {
    /// Build the payload. Passages are joined with blank lines in rank order.
    pub fn compose(
        question: &str,
        history_text: impl Into<String>,
        passages: &[RetrievedPassage],
    ) -> PromptPayload {
        let mut ordered: Vec<&RetrievedPassage> = passages.iter().collect();
        ordered.sort_by_key(|p| p.rank);

        PromptPayload {
            history_text: history_text.into(),
            context_text: ordered
                .iter()
                .map(|p| p.text.as_str())
                .collect::<Vec<_>>()
                .join("\n\n"),
            question_text: question.to_string(),
        }
    }
}
