//! Role prompts
//!
//! Every role has a fixed system persona and an instruction template with
//! named `{slot}` placeholders filled from the agent input.

use crate::core::Task;

/// Instruction text with named `{slot}` placeholders
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptTemplate {
    /// System message sent before the instruction
    pub system: &'static str,
    /// User message body with `{slot}` placeholders
    pub instruction: &'static str,
}

impl PromptTemplate {
    /// Substitute every `{name}` with its value. Unknown placeholders stay as-is.
    ///
    /// Substitution is single-pass, so braces inside a value are never
    /// expanded again.
    pub fn render(&self, values: &[(&str, &str)]) -> String {
        let template = self.instruction;
        let mut output = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(start) = rest.find('{') {
            output.push_str(&rest[..start]);
            let after = &rest[start + 1..];

            let replaced = after.find('}').and_then(|end| {
                let name = &after[..end];
                values
                    .iter()
                    .find(|(slot, _)| *slot == name)
                    .map(|(_, value)| (*value, end))
            });

            match replaced {
                Some((value, end)) => {
                    output.push_str(value);
                    rest = &after[end + 1..];
                }
                None => {
                    output.push('{');
                    rest = after;
                }
            }
        }

        output.push_str(rest);
        output
    }
}

const SUMMARIZE: PromptTemplate = PromptTemplate {
    system: "You are an AI assistant that summarizes medical texts accurately and concisely.",
    instruction: "Please provide a concise summary of the following medical text. \
Keep every clinically relevant finding, diagnosis, medication and follow-up instruction.\n\n\
Medical text:\n{text}\n\nSummary:",
};

const SUMMARIZE_VALIDATOR: PromptTemplate = PromptTemplate {
    system: "You are an AI assistant that validates summaries of medical texts.",
    instruction: "Given the original text and its summary, assess whether the summary \
accurately and concisely captures the key points.\n\n\
Original text:\n{original_text}\n\nSummary:\n{summary}\n\n\
Point out any omissions, distortions or unsupported statements, then give an overall \
rating from 1 to 5 where 5 is excellent.\n\nValidation:",
};

const WRITE_ARTICLE: PromptTemplate = PromptTemplate {
    system: "You are an expert academic writer specializing in medical research articles.",
    instruction: "Write a research article on the following topic.\n\n\
Topic: {topic}\n\nOutline:\n{outline}\n\n\
Structure the article with an abstract, introduction, body sections and a conclusion.\n\n\
Article:",
};

const REFINER: PromptTemplate = PromptTemplate {
    system: "You are an expert editor who refines and enhances research articles for \
clarity, coherence, and academic quality.",
    instruction: "Please refine the following research article draft to improve its \
language, coherence, and overall quality.\n\nDraft:\n{draft}\n\nRefined article:",
};

const VALIDATOR: PromptTemplate = PromptTemplate {
    system: "You are an AI assistant that validates research articles for accuracy, \
completeness, and adherence to academic standards.",
    instruction: "Given the topic and the article, assess whether the article \
comprehensively covers the topic, follows a logical structure, and maintains academic \
standards.\n\nTopic: {topic}\n\nArticle:\n{article}\n\n\
Provide a brief analysis and rate the article on a scale of 1 to 5, where 5 indicates \
excellent quality.\n\nValidation:",
};

const SANITIZE_DATA: PromptTemplate = PromptTemplate {
    system: "You are an AI assistant that sanitizes sensitive medical data by removing \
Protected Health Information (PHI).",
    instruction: "Remove all personal health information (PHI) from the following data, \
including names, addresses, contact information, dates of birth, medical record numbers \
and any other identifying details. Replace each removed item with a bracketed \
placeholder such as [NAME] or [DATE].\n\nData:\n{medical_data}\n\nSanitized data:",
};

const SANITIZE_DATA_VALIDATOR: PromptTemplate = PromptTemplate {
    system: "You are an AI assistant that validates the sanitization of medical data by \
checking for the removal of Protected Health Information (PHI).",
    instruction: "Given the original data and the sanitized data, verify that all PHI has \
been removed.\n\nOriginal data:\n{original_data}\n\nSanitized data:\n{sanitized_data}\n\n\
List any remaining PHI and suggest corrections. If none remains, state that the data is \
properly sanitized.\n\nValidation:",
};

/// Fixed template for a role
pub fn template_for(task: Task) -> PromptTemplate {
    match task {
        Task::Summarize => SUMMARIZE,
        Task::SummarizeValidator => SUMMARIZE_VALIDATOR,
        Task::WriteArticle => WRITE_ARTICLE,
        Task::Refiner => REFINER,
        Task::Validator => VALIDATOR,
        Task::SanitizeData => SANITIZE_DATA,
        Task::SanitizeDataValidator => SANITIZE_DATA_VALIDATOR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_fills_named_slots() {
        let rendered = template_for(Task::SummarizeValidator).render(&[
            ("original_text", "Patient has mild fever."),
            ("summary", "Mild fever noted."),
        ]);
        assert!(rendered.contains("Original text:\nPatient has mild fever."));
        assert!(rendered.contains("Summary:\nMild fever noted."));
        assert!(!rendered.contains("{summary}"));
    }

    #[test]
    fn test_render_does_not_expand_values() {
        let template = PromptTemplate {
            system: "",
            instruction: "A={a} B={b}",
        };
        let rendered = template.render(&[("a", "{b}"), ("b", "x")]);
        assert_eq!(rendered, "A={b} B=x");
    }

    #[test]
    fn test_render_keeps_unknown_and_unbalanced_braces() {
        let template = PromptTemplate {
            system: "",
            instruction: "{missing} and {text} and {",
        };
        assert_eq!(
            template.render(&[("text", "t")]),
            "{missing} and t and {"
        );
    }

    #[test]
    fn test_every_role_has_a_template() {
        for task in Task::ALL {
            let template = template_for(task);
            assert!(!template.system.is_empty());
            assert!(template.instruction.contains('{'));
        }
    }
}
