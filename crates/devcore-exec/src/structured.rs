//! Single-shot generations constrained to a JSON schema.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde::Serialize;
use serde_json::json;

use crate::contracts::ModelClient;
use crate::contracts::ModelRequest;
use crate::contracts::STRUCTURED_TEMPERATURE;
use crate::error::ExecError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrSummary {
    pub title: String,
    pub summary: String,
    pub changes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoTemplate {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorPalette {
    pub colors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CronParts {
    pub minute: String,
    pub hour: String,
    pub day_of_month: String,
    pub month: String,
    pub day_of_week: String,
}

impl CronParts {
    pub fn expression(&self) -> String {
        format!(
            "{} {} {} {} {}",
            self.minute, self.hour, self.day_of_month, self.month, self.day_of_week
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedFile {
    pub file_path: String,
    pub content: String,
    pub description: String,
}

/// Wire envelope of a feature-files reply.
#[derive(Debug, Deserialize)]
struct GeneratedFeature {
    files: Vec<GeneratedFile>,
}

fn string_object(fields: &[&str]) -> serde_json::Value {
    let properties: serde_json::Map<String, serde_json::Value> = fields
        .iter()
        .map(|field| (field.to_string(), json!({ "type": "STRING" })))
        .collect();
    json!({ "type": "OBJECT", "properties": properties, "required": fields })
}

pub fn pr_summary_schema() -> serde_json::Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "title": { "type": "STRING" },
            "summary": { "type": "STRING" },
            "changes": { "type": "ARRAY", "items": { "type": "STRING" } }
        },
        "required": ["title", "summary", "changes"]
    })
}

pub fn repo_template_schema() -> serde_json::Value {
    string_object(&["name", "description"])
}

pub fn palette_schema() -> serde_json::Value {
    json!({
        "type": "OBJECT",
        "properties": { "colors": { "type": "ARRAY", "items": { "type": "STRING" } } },
        "required": ["colors"]
    })
}

pub fn cron_schema() -> serde_json::Value {
    string_object(&["minute", "hour", "dayOfMonth", "month", "dayOfWeek"])
}

pub fn generated_files_schema() -> serde_json::Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "files": {
                "type": "ARRAY",
                "items": string_object(&["filePath", "content", "description"])
            }
        },
        "required": ["files"]
    })
}

/// Runs a schema-constrained request and decodes the reply into `T`.
pub async fn generate_structured<T: DeserializeOwned>(
    client: &dyn ModelClient,
    context: &str,
    request: ModelRequest,
    schema: &serde_json::Value,
) -> Result<T, ExecError> {
    let value = client.generate_structured(&request, schema).await?;
    serde_json::from_value(value).map_err(|err| {
        tracing::warn!(context, error = %err, "structured reply did not match schema");
        ExecError::UnexpectedResponse {
            context: context.to_string(),
            message: err.to_string(),
        }
    })
}

fn structured_request(system_instruction: &str, prompt: String) -> ModelRequest {
    ModelRequest::new(prompt)
        .with_system_instruction(system_instruction)
        .with_temperature(STRUCTURED_TEMPERATURE)
}

pub async fn summarize_pull_request(
    client: &dyn ModelClient,
    diff: &str,
) -> Result<PrSummary, ExecError> {
    let request = structured_request(
        "You write pull request summaries: a conventional title, a short summary and the key changes.",
        format!("Summarize this diff as a pull request:\n\n```diff\n{diff}\n```"),
    );
    generate_structured(client, "pr summary", request, &pr_summary_schema()).await
}

pub async fn suggest_repo(
    client: &dyn ModelClient,
    idea: &str,
) -> Result<RepoTemplate, ExecError> {
    let request = structured_request(
        "You name software repositories. Names are lowercase and hyphenated.",
        format!("Suggest a repository name and one-line description for: \"{idea}\""),
    );
    generate_structured(client, "repo template", request, &repo_template_schema()).await
}

pub async fn color_palette(
    client: &dyn ModelClient,
    base_color: &str,
) -> Result<ColorPalette, ExecError> {
    let request = structured_request(
        "You are a color theory expert. Return six hex colors.",
        format!("Build a harmonious six-color palette around {base_color}."),
    );
    generate_structured(client, "color palette", request, &palette_schema()).await
}

pub async fn cron_from_description(
    client: &dyn ModelClient,
    description: &str,
) -> Result<CronParts, ExecError> {
    let request = structured_request(
        "You convert schedules into the five fields of a cron expression.",
        format!("Express this schedule as cron fields: \"{description}\""),
    );
    generate_structured(client, "cron", request, &cron_schema()).await
}

pub async fn generate_feature_files(
    client: &dyn ModelClient,
    feature: &str,
) -> Result<Vec<GeneratedFile>, ExecError> {
    let request = structured_request(
        "You generate complete React feature files, including at least one .tsx component.",
        format!("Generate the files for this feature: \"{feature}\""),
    );
    let feature: GeneratedFeature =
        generate_structured(client, "feature files", request, &generated_files_schema()).await?;
    Ok(feature.files)
}
