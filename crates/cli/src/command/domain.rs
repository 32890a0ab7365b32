use diacare_engine::{EngineError, RawClinicalInput};
use diacare_protocol::{codes, ErrorEnvelope};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};

/// Number of "did you mean" names attached to a not-found error.
pub const SUGGESTION_HINT_LIMIT: usize = 3;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandRequest {
    pub action: CommandAction,
    #[serde(default = "empty_payload")]
    pub payload: Value,
}

fn empty_payload() -> Value {
    Value::Object(Default::default())
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CommandAction {
    Predict,
    Recommend,
    Suggest,
    Capabilities,
}

impl CommandAction {
    pub const fn as_str(self) -> &'static str {
        match self {
            CommandAction::Predict => "predict",
            CommandAction::Recommend => "recommend",
            CommandAction::Suggest => "suggest",
            CommandAction::Capabilities => "capabilities",
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PredictPayload {
    pub input: RawClinicalInput,
    #[serde(default)]
    pub explain: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecommendPayload {
    pub name: String,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SuggestPayload {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, Clone)]
pub struct FeatureExplanation {
    pub name: &'static str,
    pub value: f64,
    pub scaled: f64,
}

#[derive(Debug, Serialize)]
pub struct SuggestOutput {
    pub query: String,
    pub names: Vec<String>,
    /// Matches before the display cap was applied.
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct CommandResponse {
    pub status: CommandStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorEnvelope>,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub meta: ResponseMeta,
}

impl CommandResponse {
    pub fn ok(data: Value, meta: ResponseMeta) -> Self {
        Self {
            status: CommandStatus::Ok,
            message: None,
            error: None,
            data,
            meta,
        }
    }

    pub fn error(error: ErrorEnvelope, meta: ResponseMeta) -> Self {
        Self {
            status: CommandStatus::Error,
            message: Some(error.message.clone()),
            error: Some(error),
            data: Value::Null,
            meta,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.status, CommandStatus::Error)
    }
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CommandStatus {
    Ok,
    Error,
}

#[derive(Debug, Serialize, Default, Clone)]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

pub fn parse_payload<T: DeserializeOwned>(payload: Value) -> Result<T, ErrorEnvelope> {
    serde_json::from_value(payload).map_err(|err| {
        ErrorEnvelope::new(codes::INVALID_REQUEST, format!("Invalid payload: {err}"))
            .with_hint("Verify the payload matches the Command API schema for this action.")
    })
}

pub fn to_data<T: Serialize>(value: T) -> Result<Value, ErrorEnvelope> {
    serde_json::to_value(value).map_err(|err| {
        log::error!("failed to serialize command output: {err}");
        ErrorEnvelope::new(codes::INTERNAL, "Internal error")
    })
}

/// Maps an engine failure to its stable wire code. `suggestions` feeds the not-found hint.
pub fn classify_error(err: &EngineError, suggestions: &[String]) -> ErrorEnvelope {
    match err {
        EngineError::Validation(_) => {
            let fields: Vec<&str> = err.fields().iter().map(|f| f.field.name()).collect();
            ErrorEnvelope::new(codes::VALIDATION_ERROR, err.to_string())
                .with_details(json!({ "fields": err.fields() }))
                .with_hint(format!("Provide numeric values for: {}", fields.join(", ")))
        }
        EngineError::NotFound { name } => {
            let envelope = ErrorEnvelope::new(codes::NOT_FOUND, err.to_string())
                .with_details(json!({ "name": name, "suggestions": suggestions }));
            if suggestions.is_empty() {
                envelope.with_hint("Use the suggest action to look up catalog names by prefix.")
            } else {
                envelope.with_hint(format!("Did you mean: {}?", suggestions.join(", ")))
            }
        }
        EngineError::ArtifactUnavailable(_) => {
            ErrorEnvelope::new(codes::ARTIFACT_UNAVAILABLE, err.to_string())
                .with_hint("Run `diacare doctor` to check the artifact directory.")
        }
        EngineError::Internal => ErrorEnvelope::new(codes::INTERNAL, err.to_string()),
    }
}
