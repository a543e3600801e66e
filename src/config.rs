//! Model configuration
//!
//! Set once before the first query. `ModelConfig::validate` is the only
//! place a bad frequency or scenario string is caught; everything downstream
//! assumes a validated config.

use rustler::NifStruct;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::condition::ChannelCondition;
use crate::error::{ChannelError, Result};

pub const MIN_FREQUENCY_HZ: f64 = 500.0e6;
pub const MAX_FREQUENCY_HZ: f64 = 100.0e9;

/// Propagation scenario (TR 38.901 Table 7.2-1, TR 37.885 for V2V)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scenario {
    #[serde(rename = "RMa")]
    RuralMacro,
    #[serde(rename = "UMa")]
    UrbanMacro,
    #[serde(rename = "UMi-StreetCanyon")]
    UrbanMicroStreetCanyon,
    #[serde(rename = "InH-OfficeOpen")]
    IndoorOfficeOpen,
    #[serde(rename = "InH-OfficeMixed")]
    IndoorOfficeMixed,
    #[serde(rename = "V2V-Urban")]
    V2vUrban,
    #[serde(rename = "V2V-Highway")]
    V2vHighway,
}

impl Scenario {
    pub const ALL: [Scenario; 7] = [
        Scenario::RuralMacro,
        Scenario::UrbanMacro,
        Scenario::UrbanMicroStreetCanyon,
        Scenario::IndoorOfficeOpen,
        Scenario::IndoorOfficeMixed,
        Scenario::V2vUrban,
        Scenario::V2vHighway,
    ];

    /// The 3GPP name of the scenario
    pub fn as_str(&self) -> &'static str {
        match self {
            Scenario::RuralMacro => "RMa",
            Scenario::UrbanMacro => "UMa",
            Scenario::UrbanMicroStreetCanyon => "UMi-StreetCanyon",
            Scenario::IndoorOfficeOpen => "InH-OfficeOpen",
            Scenario::IndoorOfficeMixed => "InH-OfficeMixed",
            Scenario::V2vUrban => "V2V-Urban",
            Scenario::V2vHighway => "V2V-Highway",
        }
    }

    pub fn is_indoor(&self) -> bool {
        matches!(self, Scenario::IndoorOfficeOpen | Scenario::IndoorOfficeMixed)
    }

    pub fn is_vehicular(&self) -> bool {
        matches!(self, Scenario::V2vUrban | Scenario::V2vHighway)
    }

    /// Condition as the parameter tables see it. Vehicular links have no
    /// O2I state, so the flag is dropped.
    pub fn link_condition(&self, condition: ChannelCondition) -> ChannelCondition {
        if self.is_vehicular() {
            ChannelCondition::new(condition.los, false)
        } else {
            condition
        }
    }
}

impl Default for Scenario {
    fn default() -> Self {
        Self::UrbanMacro
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scenario {
    type Err = ChannelError;

    fn from_str(s: &str) -> Result<Self> {
        Scenario::ALL
            .iter()
            .copied()
            .find(|scenario| scenario.as_str() == s)
            .ok_or_else(|| ChannelError::UnknownScenario(s.to_string()))
    }
}

/// Channel model parameters, from Rust callers or from Elixir
#[derive(NifStruct, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[module = "MinutemodemSimnet.Physics.Types.CdlConfig"]
#[serde(default)]
pub struct ModelConfig {
    /// Operating frequency in Hz
    pub frequency_hz: f64,
    /// 3GPP scenario name, e.g. "UMa"
    pub scenario: String,
    /// Channel coherence time in seconds, 0 disables time-based updates
    pub update_period_s: f64,
    /// Enable blockage model A (TR 38.901 7.6.4.1)
    pub blockage: bool,
    /// Number of non-self-blocking regions
    pub num_non_self_blocking: u16,
    /// Portrait (true) or landscape (false) self-blocking region
    pub portrait_mode: bool,
    /// Speed of moving blockers in m/s
    pub blocker_speed: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            frequency_hz: MIN_FREQUENCY_HZ,
            scenario: Scenario::default().as_str().to_string(),
            update_period_s: 0.0,
            blockage: false,
            num_non_self_blocking: 4,
            portrait_mode: true,
            blocker_speed: 1.0,
        }
    }
}

impl ModelConfig {
    /// Config for a scenario at a given carrier, everything else default
    pub fn new(scenario: Scenario, frequency_hz: f64) -> Self {
        Self {
            frequency_hz,
            scenario: scenario.as_str().to_string(),
            ..Default::default()
        }
    }

    /// Check every field and return the parsed scenario
    pub fn validate(&self) -> Result<Scenario> {
        check_frequency(self.frequency_hz)?;
        if !(self.update_period_s >= 0.0) || !self.update_period_s.is_finite() {
            return Err(ChannelError::InvalidUpdatePeriod(self.update_period_s));
        }
        if !(self.blocker_speed >= 0.0) || !self.blocker_speed.is_finite() {
            return Err(ChannelError::InvalidBlockerSpeed(self.blocker_speed));
        }
        self.scenario.parse()
    }
}

pub(crate) fn check_frequency(frequency_hz: f64) -> Result<()> {
    if (MIN_FREQUENCY_HZ..=MAX_FREQUENCY_HZ).contains(&frequency_hz) {
        Ok(())
    } else {
        Err(ChannelError::InvalidFrequency(frequency_hz))
    }
}
