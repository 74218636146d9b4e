//! Prompt template for the Layton persona.
//!
//! [`build_prompt`] is a pure function: the same knowledge and message always
//! produce the same bytes. The persona lives inside the user message; no
//! system-role message is sent.

use crate::knowledge::KnowledgeBase;

const PERSONA: &str = "\
You are Layton, a software developer who is chatting with someone about your \
background, skills, projects or just general knowledge.
Speak in first person, casually and informally unless the tone of the question is formal.";

const GUIDELINES: &str = "\
IMPORTANT:
- ONLY use the information above to answer questions about Layton.
- If you are unsure or the answer is not found in the background information, say something like:
  \"I’ll have to get back to you on that one.\" or
  \"I do not think the real Layton has told me the answer to this one yet.\"";

/// Cue that hands the turn to the model.
pub const TURN_CUE: &str = "Layton:";

/// Assemble the full prompt for one question.
///
/// Both documents are embedded as pretty-printed JSON (two-space indent).
/// Nothing is truncated; prompt size grows with the knowledge base.
pub fn build_prompt(knowledge: &KnowledgeBase, user_message: &str) -> String {
    let general = pretty_json(&knowledge.general);
    let projects = pretty_json(&knowledge.projects);

    format!(
        "{PERSONA}\n\n\
         Here is your background information:\n\n\
         General Info:\n{general}\n\n\
         Projects:\n{projects}\n\n\
         {GUIDELINES}\n\n\
         Now respond to the following message as yourself:\n\n\
         \"{user_message}\"\n\n\
         {TURN_CUE}"
    )
}

fn pretty_json(value: &serde_json::Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn layton() -> KnowledgeBase {
        KnowledgeBase {
            general: json!({"name": "Layton"}),
            projects: json!([]),
        }
    }

    #[test]
    fn full_prompt_for_minimal_knowledge() {
        let prompt = build_prompt(&layton(), "What is your name?");
        let expected = "\
You are Layton, a software developer who is chatting with someone about your background, skills, projects or just general knowledge.
Speak in first person, casually and informally unless the tone of the question is formal.

Here is your background information:

General Info:
{
  \"name\": \"Layton\"
}

Projects:
[]

IMPORTANT:
- ONLY use the information above to answer questions about Layton.
- If you are unsure or the answer is not found in the background information, say something like:
  \"I’ll have to get back to you on that one.\" or
  \"I do not think the real Layton has told me the answer to this one yet.\"

Now respond to the following message as yourself:

\"What is your name?\"

Layton:";
        assert_eq!(prompt, expected);
    }

    #[test]
    fn deterministic() {
        let kb = KnowledgeBase {
            general: json!({"name": "Layton", "skills": ["rust", "typescript"], "city": "Perth"}),
            projects: json!([{"title": "me-ai", "stack": ["axum"]}]),
        };
        let a = build_prompt(&kb, "What do you build?");
        let b = build_prompt(&kb, "What do you build?");
        assert_eq!(a, b);
    }

    #[test]
    fn projects_are_pretty_printed() {
        let kb = KnowledgeBase {
            general: json!({}),
            projects: json!([{"title": "me-ai"}]),
        };
        let prompt = build_prompt(&kb, "hi");
        assert!(prompt.contains("Projects:\n[\n  {\n    \"title\": \"me-ai\"\n  }\n]"));
    }

    #[test]
    fn message_is_quoted_verbatim_before_cue() {
        let message = "Tell me about \"me-ai\"\nand your stack";
        let prompt = build_prompt(&layton(), message);
        assert!(prompt.ends_with(&format!("\"{message}\"\n\n{TURN_CUE}")));
    }

    #[test]
    fn large_knowledge_is_not_truncated() {
        let projects: Vec<_> = (0..500)
            .map(|i| json!({"title": format!("project-{i}")}))
            .collect();
        let kb = KnowledgeBase {
            general: json!({"name": "Layton"}),
            projects: json!(projects),
        };
        let prompt = build_prompt(&kb, "list everything");
        assert!(prompt.contains("project-0"));
        assert!(prompt.contains("project-499"));
    }
}
