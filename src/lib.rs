//! CDL Channel NIF for MinuteModem SimNet
//!
//! Implements the 3GPP TR 38.901 clustered-delay-line channel model with
//! blockage model A, producing per-pair MIMO channel matrices that are
//! cached until the link condition changes or the update period expires.

pub mod antenna;
pub mod blockage;
pub mod cache;
pub mod channel;
pub mod clusters;
pub mod coefficients;
pub mod condition;
pub mod config;
pub mod error;
pub mod geometry;
pub mod lsp;
pub mod params;
pub mod registry;
pub mod streams;

use rustler::{NifResult, NifStruct};

pub use antenna::{PhasedArray, UniformPlanarArray};
pub use channel::{ChannelMatrix, ChannelModel, ModelState};
pub use condition::{ChannelCondition, ConditionOracle, LosCondition, ManualClock, SimClock};
pub use config::{ModelConfig, Scenario};
pub use error::{ChannelError, Result};
pub use geometry::{Endpoint, Vector3};

use registry::ModelRegistry;

// Global registry, each model behind its own lock
lazy_static::lazy_static! {
    static ref MODELS: ModelRegistry<ChannelModel> = ModelRegistry::new();
}

mod atoms {
    rustler::atoms! {
        ok,
        error,
    }
}

rustler::init!("Elixir.MinutemodemSimnet.Physics.CdlNif");

/// Channel matrix as handed to Elixir.
/// Coefficients are {re, im} tuples indexed [rx][tx][cluster].
#[derive(NifStruct, Debug, Clone)]
#[module = "MinutemodemSimnet.Physics.Types.ChannelMatrix"]
pub struct ChannelMatrixView {
    pub generated_at: f64,
    pub condition: ChannelCondition,
    pub tx_node: u32,
    pub rx_node: u32,
    pub num_clusters: u64,
    pub delays: Vec<f64>,
    pub aoa: Vec<f64>,
    pub zoa: Vec<f64>,
    pub aod: Vec<f64>,
    pub zod: Vec<f64>,
    pub coefficients: Vec<Vec<Vec<(f64, f64)>>>,
}

impl From<&ChannelMatrix> for ChannelMatrixView {
    fn from(m: &ChannelMatrix) -> Self {
        Self {
            generated_at: m.generated_at,
            condition: m.condition,
            tx_node: m.node_ids.0,
            rx_node: m.node_ids.1,
            num_clusters: m.num_clusters as u64,
            delays: m.delays.clone(),
            aoa: m.angles.aoa.clone(),
            zoa: m.angles.zoa.clone(),
            aod: m.angles.aod.clone(),
            zod: m.angles.zod.clone(),
            coefficients: m
                .coefficients
                .iter()
                .map(|rx| {
                    rx.iter()
                        .map(|tx| tx.iter().map(|c| (c.re, c.im)).collect())
                        .collect()
                })
                .collect(),
        }
    }
}

fn model_not_found() -> rustler::Error {
    rustler::Error::Term(Box::new("model_not_found"))
}

fn channel_error(e: ChannelError) -> rustler::Error {
    rustler::Error::Term(Box::new(e.to_string()))
}

/// Creates a new ChannelModel and returns its registry id.
#[rustler::nif]
fn create_model(config: ModelConfig, seed: u64) -> NifResult<(rustler::Atom, u64)> {
    let model = ChannelModel::new(config, seed).map_err(channel_error)?;
    Ok((atoms::ok(), MODELS.insert(model)))
}

/// Moves the model's random streams, returns the number of streams used.
#[rustler::nif]
fn assign_streams(model_id: u64, stream: u64) -> NifResult<(rustler::Atom, u64)> {
    let used = MODELS
        .with_model_mut(model_id, |model| model.assign_streams(stream))
        .ok_or_else(model_not_found)?;

    Ok((atoms::ok(), used))
}

/// Channel matrix between `a` (transmitting) and `b` (receiving).
/// Runs on a dirty CPU scheduler since large arrays take a while.
#[rustler::nif(schedule = "DirtyCpu")]
fn get_channel_matrix(
    model_id: u64,
    a: Endpoint,
    b: Endpoint,
    array_a: UniformPlanarArray,
    array_b: UniformPlanarArray,
    condition: ChannelCondition,
    now_s: f64,
) -> NifResult<(rustler::Atom, ChannelMatrixView)> {
    let matrix = MODELS
        .with_model_mut(model_id, |model| {
            model.channel_matrix_at(&a, &b, &array_a, &array_b, condition, now_s)
        })
        .ok_or_else(model_not_found)?
        .map_err(channel_error)?;

    Ok((atoms::ok(), ChannelMatrixView::from(matrix.as_ref())))
}

/// Changes the carrier frequency of later generations.
#[rustler::nif]
fn set_frequency(model_id: u64, frequency_hz: f64) -> NifResult<rustler::Atom> {
    MODELS
        .with_model_mut(model_id, |model| model.set_frequency(frequency_hz))
        .ok_or_else(model_not_found)?
        .map_err(channel_error)?;

    Ok(atoms::ok())
}

/// Changes the scenario of later generations.
#[rustler::nif]
fn set_scenario(model_id: u64, scenario: String) -> NifResult<rustler::Atom> {
    MODELS
        .with_model_mut(model_id, |model| model.set_scenario(&scenario))
        .ok_or_else(model_not_found)?
        .map_err(channel_error)?;

    Ok(atoms::ok())
}

/// Drops every cached matrix of a model.
#[rustler::nif]
fn clear_cache(model_id: u64) -> NifResult<rustler::Atom> {
    MODELS
        .with_model_mut(model_id, |model| model.clear())
        .ok_or_else(model_not_found)?;

    Ok(atoms::ok())
}

/// Gets the current state of a model for debugging/telemetry.
#[rustler::nif]
fn get_state(model_id: u64) -> NifResult<(rustler::Atom, ModelState)> {
    let state = MODELS
        .with_model(model_id, |model| model.get_state())
        .ok_or_else(model_not_found)?;

    Ok((atoms::ok(), state))
}

/// Gets the configuration a model currently runs with.
#[rustler::nif]
fn get_config(model_id: u64) -> NifResult<(rustler::Atom, ModelConfig)> {
    let config = MODELS
        .with_model(model_id, |model| model.config().clone())
        .ok_or_else(model_not_found)?;

    Ok((atoms::ok(), config))
}

/// Destroys a model and its cache.
#[rustler::nif]
fn destroy_model(model_id: u64) -> NifResult<rustler::Atom> {
    MODELS.remove(model_id);
    Ok(atoms::ok())
}

/// Returns the number of live models.
#[rustler::nif]
fn model_count() -> NifResult<u64> {
    Ok(MODELS.count() as u64)
}
