use std::sync::OnceLock;

use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureCategory {
    Core,
    AiTools,
    Frontend,
    Testing,
    Database,
    Data,
    Productivity,
    Deployment,
    Security,
    Workflow,
}

impl FeatureCategory {
    pub const ALL: [FeatureCategory; 10] = [
        Self::Core,
        Self::AiTools,
        Self::Frontend,
        Self::Testing,
        Self::Database,
        Self::Data,
        Self::Productivity,
        Self::Deployment,
        Self::Security,
        Self::Workflow,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Core => "Core",
            Self::AiTools => "AI Tools",
            Self::Frontend => "Frontend",
            Self::Testing => "Testing",
            Self::Database => "Database",
            Self::Data => "Data",
            Self::Productivity => "Productivity",
            Self::Deployment => "Deployment",
            Self::Security => "Security",
            Self::Workflow => "Workflow",
        }
    }
}

/// A catalog entry. Defined at build time; users can only hide entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureDescriptor {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub category: FeatureCategory,
    pub icon: &'static str,
}

pub struct FeatureRegistry;

static FEATURES: [FeatureDescriptor; 36] = [
    FeatureDescriptor {
        id: "ai-command-center",
        name: "Command Center",
        description: "Route a natural-language request to the right tool.",
        category: FeatureCategory::Core,
        icon: "home",
    },
    FeatureDescriptor {
        id: "ai-code-explainer",
        name: "AI Code Explainer",
        description: "Explain a code snippet in plain language.",
        category: FeatureCategory::AiTools,
        icon: "code-explainer",
    },
    FeatureDescriptor {
        id: "ai-feature-builder",
        name: "AI Feature Builder",
        description: "Generate the files for a feature from a description.",
        category: FeatureCategory::AiTools,
        icon: "feature-builder",
    },
    FeatureDescriptor {
        id: "regex-sandbox",
        name: "RegEx Sandbox",
        description: "Generate and test regular expressions.",
        category: FeatureCategory::Testing,
        icon: "beaker",
    },
    FeatureDescriptor {
        id: "portable-snippet-vault",
        name: "Snippet Vault",
        description: "Store and enhance reusable snippets.",
        category: FeatureCategory::Productivity,
        icon: "snippet",
    },
    FeatureDescriptor {
        id: "json-tree-navigator",
        name: "JSON Tree Navigator",
        description: "Browse nested JSON documents as a tree.",
        category: FeatureCategory::Data,
        icon: "json-tree",
    },
    FeatureDescriptor {
        id: "ai-unit-test-generator",
        name: "AI Unit Test Generator",
        description: "Write unit tests for a component.",
        category: FeatureCategory::Testing,
        icon: "beaker",
    },
    FeatureDescriptor {
        id: "linter-formatter",
        name: "Code Formatter",
        description: "Format source code consistently.",
        category: FeatureCategory::Frontend,
        icon: "formatter",
    },
    FeatureDescriptor {
        id: "screenshot-to-component",
        name: "Screenshot to Component",
        description: "Turn a UI screenshot into a component.",
        category: FeatureCategory::Frontend,
        icon: "photo",
    },
    FeatureDescriptor {
        id: "ai-style-transfer",
        name: "AI Style Transfer",
        description: "Rewrite code to match a style guide.",
        category: FeatureCategory::AiTools,
        icon: "sparkles",
    },
    FeatureDescriptor {
        id: "ai-coding-challenge-generator",
        name: "Coding Challenge Generator",
        description: "Create a fresh coding exercise.",
        category: FeatureCategory::AiTools,
        icon: "puzzle",
    },
    FeatureDescriptor {
        id: "code-review-bot",
        name: "Code Review Bot",
        description: "Review a snippet for bugs and best practices.",
        category: FeatureCategory::AiTools,
        icon: "code-review-bot",
    },
    FeatureDescriptor {
        id: "ai-pr-assistant",
        name: "AI Pull Request Assistant",
        description: "Summarize a diff as a structured PR.",
        category: FeatureCategory::Workflow,
        icon: "pull-request",
    },
    FeatureDescriptor {
        id: "ai-changelog-generator",
        name: "Changelog Generator",
        description: "Build a changelog from raw git log output.",
        category: FeatureCategory::Workflow,
        icon: "changelog",
    },
    FeatureDescriptor {
        id: "cron-job-builder",
        name: "Cron Job Builder",
        description: "Describe a schedule, get a cron expression.",
        category: FeatureCategory::Productivity,
        icon: "clock",
    },
    FeatureDescriptor {
        id: "audio-to-code",
        name: "Audio to Code",
        description: "Dictate code and get a snippet back.",
        category: FeatureCategory::AiTools,
        icon: "microphone",
    },
    FeatureDescriptor {
        id: "color-palette-generator",
        name: "Color Palette Generator",
        description: "Derive a harmonious palette from one color.",
        category: FeatureCategory::Frontend,
        icon: "swatch",
    },
    FeatureDescriptor {
        id: "ai-image-generator",
        name: "AI Image Generator",
        description: "Generate an image from a prompt.",
        category: FeatureCategory::AiTools,
        icon: "photo",
    },
    FeatureDescriptor {
        id: "ai-commit-generator",
        name: "AI Commit Message Generator",
        description: "Write a conventional commit message for a diff.",
        category: FeatureCategory::Workflow,
        icon: "commit",
    },
    FeatureDescriptor {
        id: "connections",
        name: "Connections",
        description: "Connect and manage the GitHub account.",
        category: FeatureCategory::Core,
        icon: "connections",
    },
    FeatureDescriptor {
        id: "project-explorer",
        name: "Project Explorer",
        description: "Browse the selected repository's files.",
        category: FeatureCategory::Workflow,
        icon: "folder",
    },
    FeatureDescriptor {
        id: "ai-code-migrator",
        name: "AI Code Migrator",
        description: "Translate code between languages.",
        category: FeatureCategory::AiTools,
        icon: "arrows",
    },
    FeatureDescriptor {
        id: "uml-diagram-generator",
        name: "UML Diagram Generator",
        description: "Describe a system, get a Mermaid diagram.",
        category: FeatureCategory::AiTools,
        icon: "diagram",
    },
    FeatureDescriptor {
        id: "terraform-config-generator",
        name: "Terraform Config Generator",
        description: "Generate Terraform for described infrastructure.",
        category: FeatureCategory::Deployment,
        icon: "cloud",
    },
    FeatureDescriptor {
        id: "sql-formatter",
        name: "SQL Formatter",
        description: "Format SQL queries.",
        category: FeatureCategory::Database,
        icon: "database",
    },
    FeatureDescriptor {
        id: "security-vulnerability-scanner",
        name: "Security Vulnerability Scanner",
        description: "Scan code for common vulnerabilities.",
        category: FeatureCategory::Security,
        icon: "shield",
    },
    FeatureDescriptor {
        id: "jwt-debugger",
        name: "JWT Debugger",
        description: "Decode and inspect JSON Web Tokens.",
        category: FeatureCategory::Security,
        icon: "key",
    },
    FeatureDescriptor {
        id: "json-schema-generator",
        name: "JSON Schema Generator",
        description: "Infer a JSON Schema from a sample document.",
        category: FeatureCategory::Data,
        icon: "json",
    },
    FeatureDescriptor {
        id: "error-message-explainer",
        name: "Error Message Explainer",
        description: "Explain an error and how to fix it.",
        category: FeatureCategory::AiTools,
        icon: "bug",
    },
    FeatureDescriptor {
        id: "dockerfile-generator",
        name: "Dockerfile Generator",
        description: "Write a multi-stage Dockerfile for an app.",
        category: FeatureCategory::Deployment,
        icon: "container",
    },
    FeatureDescriptor {
        id: "database-query-generator",
        name: "Database Query Generator",
        description: "Turn a request plus schema into SQL.",
        category: FeatureCategory::Database,
        icon: "database",
    },
    FeatureDescriptor {
        id: "code-documentation-generator",
        name: "Code Documentation Generator",
        description: "Document code with usage examples.",
        category: FeatureCategory::Productivity,
        icon: "document",
    },
    FeatureDescriptor {
        id: "ci-cd-generator",
        name: "CI/CD Pipeline Generator",
        description: "Generate a pipeline for a CI provider.",
        category: FeatureCategory::Deployment,
        icon: "pipeline",
    },
    FeatureDescriptor {
        id: "github-repo-explorer",
        name: "GitHub Repo Explorer",
        description: "List and filter your repositories.",
        category: FeatureCategory::Workflow,
        icon: "github",
    },
    FeatureDescriptor {
        id: "ai-repo-creator",
        name: "AI Repo Creator",
        description: "Name, describe and create a repository.",
        category: FeatureCategory::Workflow,
        icon: "github",
    },
    FeatureDescriptor {
        id: "dev-notes-sticky-panel",
        name: "Dev Notes",
        description: "Summarize notes into action items.",
        category: FeatureCategory::Productivity,
        icon: "note",
    },
];

impl FeatureRegistry {
    pub fn list() -> &'static [FeatureDescriptor] {
        &FEATURES
    }

    pub fn get(id: &str) -> Option<&'static FeatureDescriptor> {
        FEATURES.iter().find(|feature| feature.id == id)
    }

    pub fn contains(id: &str) -> bool {
        Self::get(id).is_some()
    }

    pub fn by_category(category: FeatureCategory) -> impl Iterator<Item = &'static FeatureDescriptor> {
        FEATURES
            .iter()
            .filter(move |feature| feature.category == category)
    }

    /// Catalog minus the user's hidden overlay, in catalog order.
    pub fn visible<'a>(
        hidden: &'a [String],
    ) -> impl Iterator<Item = &'static FeatureDescriptor> + 'a {
        FEATURES
            .iter()
            .filter(move |feature| !hidden.iter().any(|id| id == feature.id))
    }

    /// Command-palette search over id, name and description.
    pub fn filtered(query: &str) -> Vec<&'static FeatureDescriptor> {
        let query = query.trim().to_ascii_lowercase();
        if query.is_empty() {
            return FEATURES.iter().collect();
        }

        FEATURES
            .iter()
            .filter(|feature| {
                feature.id.contains(&query)
                    || feature.name.to_ascii_lowercase().contains(&query)
                    || feature.description.to_ascii_lowercase().contains(&query)
            })
            .collect()
    }

    pub fn is_valid_id(id: &str) -> bool {
        static ID_PATTERN: OnceLock<Regex> = OnceLock::new();
        ID_PATTERN
            .get_or_init(|| Regex::new(r"^[a-z0-9]+(-[a-z0-9]+)*$").expect("static pattern"))
            .is_match(id)
    }
}
