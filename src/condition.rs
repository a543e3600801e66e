//! Channel condition and simulation clock collaborators
//!
//! Both are owned by the surrounding simulation. The model only asks them
//! for the condition of a link and the current time.

use rustler::{NifStruct, NifUnitEnum};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::geometry::Endpoint;

/// Line-of-sight state of a link
#[derive(NifUnitEnum, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LosCondition {
    Los,
    Nlos,
    /// LOS obstructed by a vehicle (V2V scenarios)
    Nlosv,
}

/// Condition snapshot for an endpoint pair
#[derive(NifStruct, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[module = "MinutemodemSimnet.Physics.Types.ChannelCondition"]
pub struct ChannelCondition {
    pub los: LosCondition,
    /// Outdoor-to-indoor link
    pub o2i: bool,
}

impl ChannelCondition {
    pub const fn new(los: LosCondition, o2i: bool) -> Self {
        Self { los, o2i }
    }

    pub const fn los() -> Self {
        Self::new(LosCondition::Los, false)
    }

    pub const fn nlos() -> Self {
        Self::new(LosCondition::Nlos, false)
    }

    pub fn is_los(&self) -> bool {
        self.los == LosCondition::Los
    }

    pub fn is_nlos(&self) -> bool {
        self.los == LosCondition::Nlos
    }

    pub fn is_nlosv(&self) -> bool {
        self.los == LosCondition::Nlosv
    }

    pub fn is_o2i(&self) -> bool {
        self.o2i
    }

    /// LOS with a direct ray in the small scale model. An O2I link takes
    /// the O2I tables, which have no K-factor, whatever its LOS state.
    pub fn has_los_ray(&self) -> bool {
        self.is_los() && !self.o2i
    }
}

impl fmt::Display for ChannelCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let los = match self.los {
            LosCondition::Los => "LOS",
            LosCondition::Nlos => "NLOS",
            LosCondition::Nlosv => "NLOSv",
        };
        if self.o2i {
            write!(f, "{} O2I", los)
        } else {
            write!(f, "{} outdoor", los)
        }
    }
}

/// Source of the channel condition for a pair of endpoints
pub trait ConditionOracle: Send {
    fn condition(&self, a: &Endpoint, b: &Endpoint) -> ChannelCondition;
}

/// Every link has the same condition
impl ConditionOracle for ChannelCondition {
    fn condition(&self, _a: &Endpoint, _b: &Endpoint) -> ChannelCondition {
        *self
    }
}

impl<F> ConditionOracle for F
where
    F: Fn(&Endpoint, &Endpoint) -> ChannelCondition + Send,
{
    fn condition(&self, a: &Endpoint, b: &Endpoint) -> ChannelCondition {
        self(a, b)
    }
}

/// Monotonic simulation time in seconds
pub trait SimClock: Send {
    fn now(&self) -> f64;
}

/// Clock driven by the caller. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    bits: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start_s: f64) -> Self {
        Self {
            bits: Arc::new(AtomicU64::new(start_s.to_bits())),
        }
    }

    pub fn set(&self, now_s: f64) {
        self.bits.store(now_s.to_bits(), Ordering::Relaxed);
    }

    pub fn advance(&self, dt_s: f64) {
        self.set(self.now() + dt_s);
    }
}

impl SimClock for ManualClock {
    fn now(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Relaxed))
    }
}
