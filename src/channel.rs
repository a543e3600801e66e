//! 3GPP TR 38.901 clustered-delay-line channel model
//!
//! Per endpoint pair the model produces a complex coefficient tensor
//! indexed [rx element][tx element][cluster]:
//! 1. Look up the scenario parameters for the link condition
//! 2. Draw correlated large scale parameters
//! 3. Generate cluster delays, powers and angles, prune weak clusters
//! 4. Optionally attenuate clusters with blockage model A
//! 5. Couple rays, draw polarisation terms and sum every ray per element pair
//!
//! Results are cached per pair until the link condition changes or the
//! update period runs out.

use rustler::NifStruct;
use std::sync::Arc;
use tracing::{debug, info};

use crate::antenna::PhasedArray;
use crate::blockage::{BlockageModel, BlockerState, SPEED_OF_LIGHT};
use crate::cache::{pair_key, CacheState, ChannelMatrixCache};
use crate::clusters::{strongest_clusters, ClusterAngles, Clusters, Polarisation};
use crate::coefficients::{synthesize, CoefficientTensor, LosRay};
use crate::condition::{ChannelCondition, ConditionOracle, ManualClock, SimClock};
use crate::config::{check_frequency, ModelConfig, Scenario};
use crate::error::Result;
use crate::geometry::{Endpoint, LinkGeometry};
use crate::lsp::LargeScaleParameters;
use crate::params::ParameterSet;
use crate::streams::RandomStreams;

/// Model state for telemetry
#[derive(NifStruct, Debug, Clone, PartialEq)]
#[module = "MinutemodemSimnet.Physics.Types.CdlState"]
pub struct ModelState {
    pub frequency_hz: f64,
    pub scenario: String,
    pub seed: u64,
    pub cached_pairs: u64,
    pub generations: u64,
}

/// One channel realisation for an endpoint pair.
///
/// Endpoint `node_ids.0` is the transmit side (second coefficient index),
/// `node_ids.1` the receive side (first index).
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelMatrix {
    /// Simulation time of generation in seconds
    pub generated_at: f64,
    /// Condition the matrix was generated for
    pub condition: ChannelCondition,
    pub node_ids: (u32, u32),
    /// Clusters left after pruning, sub-clusters excluded
    pub num_clusters: usize,
    /// Delays in seconds including the four (or two) sub-clusters
    pub delays: Vec<f64>,
    /// Cluster angles in degrees, same length as `delays`
    pub angles: ClusterAngles,
    pub coefficients: CoefficientTensor,
    /// Cluster powers after blockage, one per pruned cluster
    pub powers: Vec<f64>,
    /// Blockage loss per pruned cluster in dB
    pub attenuation_db: Vec<f64>,
    pub polarisation: Polarisation,
    pub lsp: LargeScaleParameters,
    pub blocker_state: BlockerState,
}

impl ChannelMatrix {
    /// True when the matrix was generated with `b` transmitting to `a`
    pub fn is_reverse(&self, a: u32, b: u32) -> bool {
        self.node_ids == (b, a) && a != b
    }

    pub fn num_rx_elements(&self) -> usize {
        self.coefficients.len()
    }

    pub fn num_tx_elements(&self) -> usize {
        self.coefficients.first().map_or(0, Vec::len)
    }
}

/// Channel model with its cache, random streams and collaborators
pub struct ChannelModel {
    config: ModelConfig,
    scenario: Scenario,
    streams: RandomStreams,
    cache: ChannelMatrixCache,
    oracle: Box<dyn ConditionOracle>,
    clock: Box<dyn SimClock>,
    generations: u64,
}

impl ChannelModel {
    /// Create a model from a validated config.
    ///
    /// Until replaced, every link is LOS outdoor and the clock stands at 0.
    pub fn new(config: ModelConfig, seed: u64) -> Result<Self> {
        let scenario = config.validate()?;
        info!(
            scenario = scenario.as_str(),
            frequency_hz = config.frequency_hz,
            blockage = config.blockage,
            "creating CDL channel model"
        );

        Ok(Self {
            config,
            scenario,
            streams: RandomStreams::new(seed),
            cache: ChannelMatrixCache::new(),
            oracle: Box::new(ChannelCondition::los()),
            clock: Box::new(ManualClock::default()),
            generations: 0,
        })
    }

    pub fn with_condition_oracle(mut self, oracle: impl ConditionOracle + 'static) -> Self {
        self.oracle = Box::new(oracle);
        self
    }

    pub fn with_clock(mut self, clock: impl SimClock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn frequency_hz(&self) -> f64 {
        self.config.frequency_hz
    }

    pub fn set_frequency(&mut self, frequency_hz: f64) -> Result<()> {
        check_frequency(frequency_hz)?;
        self.config.frequency_hz = frequency_hz;
        Ok(())
    }

    pub fn scenario(&self) -> Scenario {
        self.scenario
    }

    pub fn set_scenario(&mut self, scenario: &str) -> Result<()> {
        self.scenario = scenario.parse()?;
        self.config.scenario = self.scenario.as_str().to_string();
        Ok(())
    }

    /// Move the three random streams to `stream`, `stream + 1`, `stream + 2`.
    ///
    /// # Returns
    /// Number of streams consumed
    pub fn assign_streams(&mut self, stream: u64) -> u64 {
        self.streams.assign(stream)
    }

    /// Drop every cached matrix
    pub fn clear(&mut self) {
        self.cache.clear();
    }

    pub fn get_state(&self) -> ModelState {
        ModelState {
            frequency_hz: self.config.frequency_hz,
            scenario: self.scenario.as_str().to_string(),
            seed: self.streams.seed(),
            cached_pairs: self.cache.len() as u64,
            generations: self.generations,
        }
    }

    /// Channel matrix between `a` and `b` using the configured condition
    /// oracle and clock
    pub fn get_channel_matrix(
        &mut self,
        a: &Endpoint,
        b: &Endpoint,
        array_a: &dyn PhasedArray,
        array_b: &dyn PhasedArray,
    ) -> Result<Arc<ChannelMatrix>> {
        let condition = self.oracle.condition(a, b);
        let now = self.clock.now();
        self.channel_matrix_at(a, b, array_a, array_b, condition, now)
    }

    /// Channel matrix between `a` and `b` for an explicit condition and time.
    ///
    /// A cached matrix is returned while the condition is unchanged and the
    /// update period has not elapsed. Otherwise a new realisation replaces
    /// it, inheriting the blocker state.
    pub fn channel_matrix_at(
        &mut self,
        a: &Endpoint,
        b: &Endpoint,
        array_a: &dyn PhasedArray,
        array_b: &dyn PhasedArray,
        condition: ChannelCondition,
        now: f64,
    ) -> Result<Arc<ChannelMatrix>> {
        let key = pair_key(a.node_id, b.node_id);

        let previous = match self.cache.state(key, &condition, now, self.config.update_period_s) {
            CacheState::Fresh(matrix) => {
                debug!(a = a.node_id, b = b.node_id, "channel matrix present in the cache");
                return Ok(matrix);
            }
            CacheState::Stale(matrix, reason) => {
                debug!(a = a.node_id, b = b.node_id, ?reason, "channel matrix needs update");
                Some(matrix)
            }
            CacheState::Absent => {
                debug!(a = a.node_id, b = b.node_id, "channel matrix not found");
                None
            }
        };

        let blocker_state = previous.map(|m| m.blocker_state.clone()).unwrap_or_default();
        let matrix = Arc::new(self.generate(a, b, array_a, array_b, condition, now, blocker_state)?);
        self.cache.insert(key, Arc::clone(&matrix));
        self.generations += 1;
        Ok(matrix)
    }

    #[allow(clippy::too_many_arguments)]
    fn generate(
        &mut self,
        a: &Endpoint,
        b: &Endpoint,
        array_a: &dyn PhasedArray,
        array_b: &dyn PhasedArray,
        condition: ChannelCondition,
        now: f64,
        mut blocker_state: BlockerState,
    ) -> Result<ChannelMatrix> {
        let link = LinkGeometry::new(a, b);
        // The cache keeps the condition as queried
        let link_condition = self.scenario.link_condition(condition);
        let params = ParameterSet::lookup(
            self.scenario,
            &link_condition,
            self.config.frequency_hz,
            link.h_bs,
            link.h_ut,
            link.distance_2d,
        )?;

        let lsp = LargeScaleParameters::draw(&params, &link_condition, &mut self.streams);
        debug!(
            k_factor_db = lsp.k_factor_db,
            ds = lsp.delay_spread,
            asd = lsp.asd,
            asa = lsp.asa,
            zsd = lsp.zsd,
            zsa = lsp.zsa,
            "large scale parameters"
        );

        let mut clusters = Clusters::generate(&params, &lsp, &link, &link_condition, &mut self.streams)?;
        let num_clusters = clusters.len();

        let attenuation_db = if self.config.blockage {
            let blockage = BlockageModel::new(
                self.config.portrait_mode,
                self.config.num_non_self_blocking,
                self.config.blocker_speed,
                self.scenario.is_indoor(),
                self.config.frequency_hz,
            );
            blockage.update_blockers(&mut blocker_state, link.ut_location, now, link_condition.is_o2i(), &mut self.streams);
            let attenuation = blockage.attenuation(&blocker_state.blockers, &clusters.angles.aoa, &clusters.angles.zoa);
            clusters.attenuate(&attenuation);
            attenuation
        } else {
            vec![0.0; num_clusters]
        };

        clusters.couple_rays(&mut self.streams);
        let polarisation = Polarisation::draw(&params, num_clusters, &mut self.streams);

        let strongest = strongest_clusters(&clusters.powers);
        debug!(first = strongest.0, second = strongest.1, "strongest clusters");

        let los = link_condition.has_los_ray().then(|| LosRay {
            arrival: link.arrival,
            departure: link.departure,
            distance_3d: link.distance_3d,
            wavelength: SPEED_OF_LIGHT / self.config.frequency_hz,
            k_linear: lsp.k_linear(),
            attenuation_db: attenuation_db[0],
        });

        // b receives (u), a transmits (s)
        let coefficients = synthesize(&clusters, &polarisation, strongest, array_b, array_a, los.as_ref());
        clusters.append_sub_clusters(strongest.0, strongest.1, params.c_ds);

        debug!(
            rx = array_b.num_elements(),
            tx = array_a.num_elements(),
            clusters = clusters.delays.len(),
            "generated channel matrix"
        );

        Ok(ChannelMatrix {
            generated_at: now,
            condition,
            node_ids: (a.node_id, b.node_id),
            num_clusters,
            delays: clusters.delays,
            angles: clusters.angles,
            coefficients,
            powers: clusters.powers,
            attenuation_db,
            polarisation,
            lsp,
            blocker_state,
        })
    }
}
