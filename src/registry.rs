//! Model-registry collaborator boundary.
//!
//! The core never calls a model. It only mirrors the persisted registry
//! layout, derives the flat runtime option list the UI picks from, and
//! packages the current SVG text with the selected option for the
//! collaborator-owned conversion feature.

use serde::{Deserialize, Serialize};

/// Fixed key the registry JSON document is persisted under.
pub const STORAGE_KEY: &str = "flowpilot.modelRegistry.v1";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointModelConfig {
    pub id: String,
    pub model_id: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub is_streaming: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_validated: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_time: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelEndpointConfig {
    pub id: String,
    pub name: String,
    pub base_url: String,
    pub api_key: String,
    pub models: Vec<EndpointModelConfig>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Persisted shape: `{ endpoints, selectedModelKey? }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelRegistryState {
    pub endpoints: Vec<ModelEndpointConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_model_key: Option<String>,
}

/// One selectable model, flattened across endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeModelOption {
    pub key: String,
    pub model_id: String,
    pub label: String,
    pub base_url: String,
    pub api_key: String,
    pub is_streaming: bool,
    pub endpoint_id: String,
    pub endpoint_name: String,
    pub provider_hint: String,
}

pub fn build_model_key(endpoint_id: &str, model_id: &str) -> String {
    format!("{endpoint_id}:{model_id}")
}

/// Hostname of the base URL, `www.` stripped; falls back to the raw string
/// for values that do not look like URLs.
pub fn derive_provider_hint(base_url: &str) -> String {
    if base_url.is_empty() {
        return "Custom Endpoint".to_string();
    }
    let host = base_url
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(base_url);
    let host = host.split(['/', '?', '#']).next().unwrap_or(host);
    let host = host.rsplit_once('@').map(|(_, h)| h).unwrap_or(host);
    let host = host.split(':').next().unwrap_or(host);
    if host.is_empty() {
        return base_url.to_string();
    }
    host.strip_prefix("www.").unwrap_or(host).to_string()
}

/// Flatten the registry into the option list the selector renders.
pub fn runtime_options(state: &ModelRegistryState) -> Vec<RuntimeModelOption> {
    state
        .endpoints
        .iter()
        .flat_map(|endpoint| {
            endpoint.models.iter().map(|model| RuntimeModelOption {
                key: build_model_key(&endpoint.id, &model.model_id),
                model_id: model.model_id.clone(),
                label: model.label.clone(),
                base_url: endpoint.base_url.clone(),
                api_key: endpoint.api_key.clone(),
                is_streaming: model.is_streaming,
                endpoint_id: endpoint.id.clone(),
                endpoint_name: endpoint.name.clone(),
                provider_hint: derive_provider_hint(&endpoint.base_url),
            })
        })
        .collect()
}

/// The currently selected option, when the stored key still resolves.
pub fn selected_option(state: &ModelRegistryState) -> Option<RuntimeModelOption> {
    let key = state.selected_model_key.as_ref()?;
    runtime_options(state).into_iter().find(|opt| &opt.key == key)
}

/// Hand-off payload for the SVG-to-diagram conversion feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionRequest {
    pub svg_text: String,
    pub model_key: String,
    pub model_id: String,
    pub base_url: String,
    pub is_streaming: bool,
}

impl ConversionRequest {
    /// Package the current SVG and the selected model for the collaborator.
    /// The api key deliberately stays out of the payload; the collaborator
    /// resolves it from the registry at call time.
    pub fn package(svg_text: impl Into<String>, option: &RuntimeModelOption) -> Self {
        ConversionRequest {
            svg_text: svg_text.into(),
            model_key: option.key.clone(),
            model_id: option.model_id.clone(),
            base_url: option.base_url.clone(),
            is_streaming: option.is_streaming,
        }
    }
}
