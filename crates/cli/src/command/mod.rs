pub mod domain;

pub use domain::{
    classify_error, CommandAction, CommandRequest, CommandResponse, CommandStatus,
    FeatureExplanation, ResponseMeta, SuggestOutput,
};

use diacare_engine::Engine;
use diacare_protocol::ErrorEnvelope;
use domain::{
    parse_payload, to_data, PredictPayload, RecommendPayload, SuggestPayload,
    SUGGESTION_HINT_LIMIT,
};
use serde_json::{json, Value};
use std::time::Instant;

/// Routes Command API requests to one loaded engine.
#[derive(Clone)]
pub struct CommandHandler {
    engine: Engine,
}

impl CommandHandler {
    pub fn new(engine: Engine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn execute(&self, request: CommandRequest) -> CommandResponse {
        let started = Instant::now();
        let CommandRequest { action, payload } = request;
        log::debug!("command: action={}", action.as_str());

        let outcome = match action {
            CommandAction::Predict => self.predict(payload),
            CommandAction::Recommend => self.recommend(payload),
            CommandAction::Suggest => self.suggest(payload),
            CommandAction::Capabilities => to_data(self.engine.capabilities()),
        };

        let meta = ResponseMeta {
            action: Some(action.as_str()),
            duration_ms: Some(started.elapsed().as_millis() as u64),
        };
        match outcome {
            Ok(data) => CommandResponse::ok(data, meta),
            Err(error) => CommandResponse::error(error, meta),
        }
    }

    fn predict(&self, payload: Value) -> Result<Value, ErrorEnvelope> {
        let payload: PredictPayload = parse_payload(payload)?;
        let engine = &self.engine;
        let features = engine
            .features(&payload.input)
            .map_err(|err| classify_error(&err, &[]))?;
        let result = engine
            .predict_features(&features)
            .map_err(|err| classify_error(&err, &[]))?;

        let mut data = to_data(result)?;
        if payload.explain {
            let explanation = explain(engine, &features);
            data["features"] = to_data(explanation)?;
        }
        Ok(data)
    }

    fn recommend(&self, payload: Value) -> Result<Value, ErrorEnvelope> {
        let payload: RecommendPayload = parse_payload(payload)?;
        let limit = payload
            .limit
            .unwrap_or(self.engine.options().recommend_limit);
        match self.engine.recommend_with_limit(&payload.name, limit) {
            Ok(recommendations) => to_data(json!({
                "name": payload.name,
                "recommendations": recommendations,
            })),
            Err(err) => {
                let suggestions = self
                    .engine
                    .closest_names(&payload.name, SUGGESTION_HINT_LIMIT);
                Err(classify_error(&err, &suggestions))
            }
        }
    }

    fn suggest(&self, payload: Value) -> Result<Value, ErrorEnvelope> {
        let payload: SuggestPayload = parse_payload(payload)?;
        let mut names = self.engine.suggest(&payload.query);
        let total = names.len();
        if let Some(limit) = payload.limit {
            names.truncate(limit);
        }
        to_data(SuggestOutput {
            query: payload.query,
            names,
            total,
        })
    }
}

/// Per-position name, raw value and the value the classifier actually sees.
pub fn explain(engine: &Engine, features: &diacare_engine::FeatureVector) -> Vec<FeatureExplanation> {
    let scaled = engine.scaled_features(features);
    features
        .named()
        .into_iter()
        .zip(scaled)
        .map(|((name, value), scaled)| FeatureExplanation {
            name,
            value,
            scaled,
        })
        .collect()
}
