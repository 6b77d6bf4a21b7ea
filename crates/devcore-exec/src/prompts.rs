use crate::contracts::ModelRequest;

/// How one streaming panel phrases its request to the model.
#[derive(Debug, Clone, Copy)]
pub struct PromptTemplate {
    pub feature_id: &'static str,
    pub system_instruction: &'static str,
    pub temperature: f32,
    pub render: fn(&str) -> String,
}

impl PromptTemplate {
    pub fn request(&self, input: &str) -> ModelRequest {
        ModelRequest::new((self.render)(input))
            .with_system_instruction(self.system_instruction)
            .with_temperature(self.temperature)
    }

    pub fn get(feature_id: &str) -> Option<&'static PromptTemplate> {
        PROMPT_TEMPLATES
            .iter()
            .find(|template| template.feature_id == feature_id)
    }

    pub fn list() -> &'static [PromptTemplate] {
        &PROMPT_TEMPLATES
    }
}

fn fenced(lang: &str, body: &str) -> String {
    format!("```{lang}\n{body}\n```")
}

static PROMPT_TEMPLATES: [PromptTemplate; 13] = [
    PromptTemplate {
        feature_id: "ai-code-explainer",
        system_instruction: "You are an expert software engineer who explains code clearly and concisely.",
        temperature: 0.5,
        render: |code| format!("Explain what the following code does:\n\n{}", fenced("", code)),
    },
    PromptTemplate {
        feature_id: "regex-sandbox",
        system_instruction: "You are a regular expression expert. Reply with a single JavaScript regex literal and nothing else.",
        temperature: 0.7,
        render: |description| {
            format!("Write one regex literal (for example /abc/gi) matching: \"{description}\"")
        },
    },
    PromptTemplate {
        feature_id: "ai-commit-generator",
        system_instruction: "You write conventional commit messages. Reply with the commit message only.",
        temperature: 0.8,
        render: |diff| format!("Write a conventional commit message for this change:\n\n{diff}"),
    },
    PromptTemplate {
        feature_id: "ai-unit-test-generator",
        system_instruction: "You are a quality engineer who writes thorough, readable unit tests.",
        temperature: 0.6,
        render: |code| format!("Write unit tests for this component:\n\n{}", fenced("tsx", code)),
    },
    PromptTemplate {
        feature_id: "linter-formatter",
        system_instruction: "You are a code formatter. Reply with the formatted code in one markdown block.",
        temperature: 0.2,
        render: |code| format!("Format this code:\n\n{}", fenced("javascript", code)),
    },
    PromptTemplate {
        feature_id: "code-review-bot",
        system_instruction: "You are a senior engineer giving a careful, constructive code review.",
        temperature: 0.6,
        render: |code| {
            format!(
                "Review this code for bugs, readability, performance and anti-patterns. Use headings.\n\n{}",
                fenced("", code)
            )
        },
    },
    PromptTemplate {
        feature_id: "ai-code-migrator",
        system_instruction: "You migrate code between languages and frameworks.",
        temperature: 0.4,
        render: |request| {
            format!("Translate the following code as described. Reply with code in one markdown block.\n\n{request}")
        },
    },
    PromptTemplate {
        feature_id: "dockerfile-generator",
        system_instruction: "You write minimal, production-ready Dockerfiles.",
        temperature: 0.3,
        render: |stack| format!("Write a Dockerfile for this project:\n\n{stack}"),
    },
    PromptTemplate {
        feature_id: "sql-formatter",
        system_instruction: "You format SQL. Reply with the formatted query in one markdown block.",
        temperature: 0.2,
        render: |sql| format!("Format this SQL:\n\n{}", fenced("sql", sql)),
    },
    PromptTemplate {
        feature_id: "json-schema-generator",
        system_instruction: "You infer JSON Schema (draft 2020-12) documents from sample data.",
        temperature: 0.3,
        render: |json| format!("Infer a JSON Schema for this document:\n\n{}", fenced("json", json)),
    },
    PromptTemplate {
        feature_id: "uml-diagram-generator",
        system_instruction: "You turn code into Mermaid class diagrams. Reply with the diagram only.",
        temperature: 0.4,
        render: |code| format!("Draw a class diagram for:\n\n{}", fenced("", code)),
    },
    PromptTemplate {
        feature_id: "dev-notes-sticky-panel",
        system_instruction: "You summarize technical notes into key points and action items.",
        temperature: 0.7,
        render: |notes| format!("Summarize these notes as a bulleted list of key points and action items:\n\n{notes}"),
    },
    PromptTemplate {
        feature_id: "error-message-explainer",
        system_instruction: "You debug web application errors and give actionable next steps.",
        temperature: 0.5,
        render: |error| {
            format!(
                "Explain the likely cause of this error, then list possible fixes as bullets:\n\n{error}"
            )
        },
    },
];
