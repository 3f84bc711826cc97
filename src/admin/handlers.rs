use std::collections::{BTreeMap, HashMap};
use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use crate::admin::AdminState;
use crate::control::LoopState;
use crate::levels::backend::normalize_logger_name;
use crate::levels::Severity;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemStatus {
    pub version: String,
    pub loop_state: String,
    pub sampler: String,
    pub active_overrides: usize,
    pub sampling_overrides: usize,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelsView {
    pub root_level: Severity,
    pub available: BTreeMap<String, Severity>,
    pub active: HashMap<String, Severity>,
    pub sampling: HashMap<String, Severity>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SamplerView {
    pub ratio: f64,
    pub id_upper_bound: i64,
    pub description: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionView {
    pub logger: String,
    pub known: bool,
    pub severity: Option<Severity>,
    pub sampling_severity: Option<Severity>,
}

fn loop_state_name(state: LoopState) -> String {
    serde_json::to_value(state)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default()
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    let overrides = state.registry.overrides();
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        loop_state: loop_state_name(state.loop_state.get()),
        sampler: state.sampler.description(),
        active_overrides: overrides.active.len(),
        sampling_overrides: overrides.sampling.len(),
    })
}

pub async fn get_levels(State(state): State<AdminState>) -> Json<LevelsView> {
    let overrides = state.registry.overrides();
    Json(LevelsView {
        root_level: state.registry.root_level(),
        available: state.registry.available().clone(),
        active: overrides.active.clone(),
        sampling: overrides.sampling.clone(),
    })
}

pub async fn get_sampler(State(state): State<AdminState>) -> Json<SamplerView> {
    Json(SamplerView {
        ratio: state.sampler.ratio(),
        id_upper_bound: state.sampler.id_upper_bound(),
        description: state.sampler.description(),
    })
}

pub async fn get_decision(
    State(state): State<AdminState>,
    Path(logger): Path<String>,
) -> Json<DecisionView> {
    let name = normalize_logger_name(&logger);
    let decision = state.registry.get_log_decision(name);
    Json(DecisionView {
        logger: name.to_string(),
        known: state.registry.available().contains_key(name),
        severity: decision.severity,
        sampling_severity: decision.sampling_severity,
    })
}
