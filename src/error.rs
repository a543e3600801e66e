//! Error types for channel generation
//!
//! Everything here is a configuration defect: the caller asked for a
//! scenario, condition or frequency the model does not define. Generation
//! aborts and nothing is cached.

use thiserror::Error;

/// Configuration errors raised by the channel model.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChannelError {
    #[error("Unknown scenario: {0}. Choose between RMa, UMa, UMi-StreetCanyon, InH-OfficeOpen, InH-OfficeMixed, V2V-Urban or V2V-Highway")]
    UnknownScenario(String),

    #[error("Frequency should be between 0.5 and 100 GHz but is {0} Hz")]
    InvalidFrequency(f64),

    #[error("Scenario {scenario} does not support {condition}")]
    UnsupportedCondition {
        scenario: &'static str,
        condition: String,
    },

    #[error("Invalid cluster number: {0}")]
    InvalidClusterCount(usize),

    #[error("Invalid update period: {0} s")]
    InvalidUpdatePeriod(f64),

    #[error("Invalid blocker speed: {0} m/s")]
    InvalidBlockerSpeed(f64),
}

pub type Result<T> = std::result::Result<T, ChannelError>;
