//! Prompt templates.
//!
//! Templates are plain strings with `{context}` and `{question}`
//! placeholders. Rendering is a single left-to-right pass, so placeholder
//! text that appears inside the retrieved context or the question is left
//! untouched.

use crate::core::config::settings::PromptConfig;
use crate::core::config::PromptTemplateKind;

const CARDIOLOGIST_TEMPLATE: &str = r#"You are an expert Cardiologist AI Assistant.

First, check the following 'Medical Context' for the answer.
If the answer is in the context, use it to provide a detailed response.

If the answer is NOT in the context, you may use your general medical knowledge to answer the question, BUT you must start your answer with:
"Based on general cardiology knowledge (not from your specific database)..."

Always be professional, empathetic, and remind the user to consult a real doctor.

Format your answer using clear Markdown:
- **ALWAYS start with a clear Header (## Title)** summarizing the topic.
- Use **Bold** for key terms and symptoms.
- Use bullet points for lists.
- Split long text into paragraphs.

Medical Context:
{context}

Question: {question}
"#;

const EDUCATIONAL_TEMPLATE: &str = r#"You are a medical educational assistant. Follow these rules strictly in every response:

1. Language Consistency
- Always respond in the same language used in the user's message.
- The disclaimer must always be in the same language as the answer.

2. No Meta Statements
- Do NOT use phrases such as: "Based on general knowledge...", "As an AI model...", "According to my training data...", "I cannot diagnose..."
- Just answer directly and educationally.

3. Simple Language
- Explain medical concepts using clear, simple, everyday language.
- Avoid unnecessary medical jargon.
- If you must use a medical term, explain it briefly and plainly.
- Keep sentences short and easy to understand.

4. Diagnostic Reasoning
- When given clinical information (EKG, symptoms, labs, reports):
- Identify the most likely specific diagnosis, not a broad category.
- Base the reasoning only on the information provided.
- Do not add or assume data that is not in the case.
- If the diagnosis is uncertain, state the most likely possibilities and why.

5. Treatment Explanations
- You may explain general treatment concepts for educational purposes.
- Do NOT provide medication doses, specific medical instructions, or personalized treatment plans.
- Never tell the user what they "should" do medically.

6. Style Consistency
- Be clear, direct, and concise.
- No long introductions.
- No filler or unnecessary repetition.

7. Always End with a Disclaimer
- If the answer is about health, illness, diagnosis, treatment, symptoms, labs, EKG, tests, or anything medical, add this exact sentence at the end:

Spanish:
"Este contenido es solo educativo y no sustituye una evaluación médica profesional."

English:
"This content is for educational purposes only and does not replace professional medical evaluation."

Use only the version that matches the language of the response.

Medical Context:
{context}

Question: {question}
"#;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptTemplate {
    Cardiologist,
    Educational,
    Custom(String),
}

impl PromptTemplate {
    pub fn from_config(config: &PromptConfig) -> Self {
        if let Some(custom) = config
            .custom_template
            .as_ref()
            .filter(|t| !t.trim().is_empty())
        {
            return PromptTemplate::Custom(custom.clone());
        }
        match config.template {
            PromptTemplateKind::Cardiologist => PromptTemplate::Cardiologist,
            PromptTemplateKind::Educational => PromptTemplate::Educational,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PromptTemplate::Cardiologist => "cardiologist",
            PromptTemplate::Educational => "educational",
            PromptTemplate::Custom(_) => "custom",
        }
    }

    fn source(&self) -> &str {
        match self {
            PromptTemplate::Cardiologist => CARDIOLOGIST_TEMPLATE,
            PromptTemplate::Educational => EDUCATIONAL_TEMPLATE,
            PromptTemplate::Custom(template) => template,
        }
    }

    pub fn render(&self, context: &str, question: &str) -> String {
        interpolate(self.source(), context, question)
    }
}

fn interpolate(template: &str, context: &str, question: &str) -> String {
    let mut out = String::with_capacity(template.len() + context.len() + question.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        if let Some(after) = tail.strip_prefix("{context}") {
            out.push_str(context);
            rest = after;
        } else if let Some(after) = tail.strip_prefix("{question}") {
            out.push_str(question);
            rest = after;
        } else {
            out.push('{');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    out
}
