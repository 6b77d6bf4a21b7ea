//! Natural-language routing to feature panels.
//!
//! The model is offered two tools over the feature catalog. The first call
//! it makes becomes a `SET_VIEW`; a reply without calls is shown as text.

use serde_json::json;

use devcore_core::Action;
use devcore_core::FeatureRegistry;
use devcore_core::ViewId;
use devcore_core::ViewProps;

use crate::contracts::FunctionDeclaration;
use crate::contracts::InferenceReply;
use crate::contracts::ModelClient;
use crate::contracts::ModelRequest;
use crate::error::ExecError;
use crate::reactions::SharedStore;

pub const NAVIGATE_TO: &str = "navigateTo";
pub const RUN_FEATURE_WITH_INPUT: &str = "runFeatureWithInput";

/// Prop names a panel may accept as initial input.
const INPUT_PROPS: [&str; 8] = [
    "initialCode",
    "initialPrompt",
    "beforeCode",
    "afterCode",
    "logInput",
    "diff",
    "codeInput",
    "jsonInput",
];

#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    /// The model picked a panel; the store has already been told.
    Navigated {
        command: String,
        view: ViewId,
        props: ViewProps,
    },
    Reply(String),
}

impl CommandOutcome {
    /// Line shown under the command box.
    pub fn message(&self) -> String {
        match self {
            Self::Navigated { command, .. } => format!("Understood! Executing command: {command}"),
            Self::Reply(text) => text.clone(),
        }
    }
}

pub fn function_declarations() -> Vec<FunctionDeclaration> {
    let feature_ids: Vec<&str> = FeatureRegistry::list()
        .iter()
        .map(|feature| feature.id)
        .collect();
    let props: serde_json::Map<String, serde_json::Value> = INPUT_PROPS
        .iter()
        .map(|name| (name.to_string(), json!({ "type": "STRING" })))
        .collect();

    vec![
        FunctionDeclaration {
            name: NAVIGATE_TO.to_string(),
            description: "Navigates to a specific feature page.".to_string(),
            parameters: json!({
                "type": "OBJECT",
                "properties": {
                    "featureId": {
                        "type": "STRING",
                        "description": "The ID of the feature to navigate to.",
                        "enum": feature_ids
                    }
                },
                "required": ["featureId"]
            }),
        },
        FunctionDeclaration {
            name: RUN_FEATURE_WITH_INPUT.to_string(),
            description: "Navigates to a feature and passes initial data to it.".to_string(),
            parameters: json!({
                "type": "OBJECT",
                "properties": {
                    "featureId": {
                        "type": "STRING",
                        "description": "The ID of the feature to run.",
                        "enum": feature_ids
                    },
                    "props": {
                        "type": "OBJECT",
                        "description": "Initial properties for the feature, based on its inputs.",
                        "properties": props
                    }
                },
                "required": ["featureId", "props"]
            }),
        },
    ]
}

/// One line per catalog entry, handed to the model as its system context.
pub fn knowledge_base() -> String {
    FeatureRegistry::list()
        .iter()
        .map(|feature| format!("- {} ({}): {}", feature.name, feature.id, feature.description))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn command_request(prompt: &str) -> ModelRequest {
    ModelRequest::new(prompt).with_system_instruction(format!(
        "You are the command center for a developer toolkit. Call the function that \
         activates the tool the user asks for, using the knowledge base to tell the tools \
         apart. If the request is a general question or matches no tool, answer in text.\n\n\
         Knowledge Base:\n{}",
        knowledge_base()
    ))
}

/// Turns a model reply into a navigation or a text answer. Only the first
/// function call is honored.
pub fn route(reply: InferenceReply) -> CommandOutcome {
    let Some(call) = reply.function_calls.into_iter().next() else {
        return CommandOutcome::Reply(reply.text);
    };
    if call.name != NAVIGATE_TO && call.name != RUN_FEATURE_WITH_INPUT {
        return CommandOutcome::Reply(format!("Unknown command: {}", call.name));
    }

    let feature_id = call.args["featureId"].as_str().unwrap_or_default();
    if !FeatureRegistry::contains(feature_id) {
        tracing::warn!(command = %call.name, feature_id, "model named an unknown feature");
        return CommandOutcome::Reply(if reply.text.is_empty() {
            format!("Unknown feature: {feature_id}")
        } else {
            reply.text
        });
    }

    let props: ViewProps = match call.args.get("props") {
        Some(serde_json::Value::Object(props)) if call.name == RUN_FEATURE_WITH_INPUT => props
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect(),
        _ => ViewProps::new(),
    };
    CommandOutcome::Navigated {
        view: ViewId::new(feature_id),
        command: call.name,
        props,
    }
}

/// Sends `prompt` to the model and applies the routed navigation, if any.
/// A blank prompt is ignored without a model call.
pub async fn run_command(
    client: &dyn ModelClient,
    store: &SharedStore,
    prompt: &str,
) -> Result<CommandOutcome, ExecError> {
    if prompt.trim().is_empty() {
        return Ok(CommandOutcome::Reply(String::new()));
    }

    let reply = client
        .infer(&command_request(prompt), &function_declarations())
        .await
        .map_err(|err| {
            tracing::error!(error = %err, "command inference failed");
            err
        })?;

    let outcome = route(reply);
    if let CommandOutcome::Navigated { view, props, .. } = &outcome {
        tracing::info!(view = %view.as_str(), "command routed");
        store.lock().await.dispatch(Action::Navigate {
            view: view.clone(),
            props: props.clone(),
        });
    }
    Ok(outcome)
}
