//! Blockage model A (TR 38.901 7.6.4.1)
//!
//! A fixed self-blocking region for the user's body plus a set of
//! non-self-blocking obstacles. Obstacle azimuths are stored as normal
//! variates and carried from one realisation of a link to the next so the
//! blockers drift instead of jumping.

use std::f64::consts::{PI, SQRT_2};
use tracing::debug;

use crate::geometry::{azimuth_offset_deg, Vector3};
use crate::streams::RandomStreams;

/// Loss of a cluster inside the self-blocking region
pub const SELF_BLOCKING_LOSS_DB: f64 = 30.0;

/// Speed of light used for the carrier wavelength
pub const SPEED_OF_LIGHT: f64 = 3e8;

/// Self-blocking region (Table 7.6.4.1-1), all in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelfBlockingRegion {
    pub azimuth: f64,
    pub width: f64,
    pub zenith: f64,
    pub height: f64,
}

impl SelfBlockingRegion {
    pub const PORTRAIT: Self = Self {
        azimuth: 260.0,
        width: 120.0,
        zenith: 100.0,
        height: 80.0,
    };

    pub const LANDSCAPE: Self = Self {
        azimuth: 40.0,
        width: 160.0,
        zenith: 110.0,
        height: 75.0,
    };

    pub fn new(portrait_mode: bool) -> Self {
        if portrait_mode {
            Self::PORTRAIT
        } else {
            Self::LANDSCAPE
        }
    }

    /// True when the cluster direction falls inside the rectangle. The
    /// azimuth test wraps through 0/360.
    pub fn contains(&self, aoa: f64, zoa: f64) -> bool {
        azimuth_offset_deg(aoa, self.azimuth).abs() < self.width / 2.0 && (zoa - self.zenith).abs() < self.height / 2.0
    }
}

/// One non-self-blocking obstacle (Table 7.6.4.1-2)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NonSelfBlocker {
    /// Normal variate mapped onto the blocker azimuth
    pub phase_anchor: f64,
    /// Angular width x_k in degrees
    pub width: f64,
    /// Zenith centre θ_k in degrees
    pub zenith: f64,
    /// Angular height y_k in degrees
    pub height: f64,
    /// Distance r to the blocker in metres
    pub radius: f64,
}

impl NonSelfBlocker {
    fn draw(indoor: bool, streams: &mut RandomStreams) -> Self {
        let phase_anchor = streams.normal();
        if indoor {
            Self {
                phase_anchor,
                width: streams.uniform(15.0, 45.0),
                zenith: 90.0,
                height: streams.uniform(5.0, 15.0),
                radius: 2.0,
            }
        } else {
            Self {
                phase_anchor,
                width: streams.uniform(5.0, 15.0),
                zenith: 90.0,
                height: 5.0,
                radius: 10.0,
            }
        }
    }

    /// Blocker azimuth centre in [0, 360]
    pub fn azimuth(&self) -> f64 {
        0.5 * erfc(-self.phase_anchor / SQRT_2) * 360.0
    }

    /// Knife-edge diffraction loss in dB for a cluster, 0 when the cluster
    /// is outside the blocker's region
    pub fn loss_db(&self, aoa: f64, zoa: f64, wavelength: f64) -> f64 {
        let phi = self.azimuth();
        let (x, theta, y) = (self.width, self.zenith, self.height);
        let d_az = azimuth_offset_deg(aoa, phi);
        let d_ze = zoa - theta;
        if d_az.abs() >= x || d_ze.abs() >= y {
            return 0.0;
        }

        let a1 = d_az - x / 2.0;
        let a2 = d_az + x / 2.0;
        let z1 = zoa - (theta + y / 2.0);
        let z2 = zoa - (theta - y / 2.0);

        // Table 7.6.4.1-3
        let sign_a1 = if x / 2.0 < d_az && d_az <= x { -1.0 } else { 1.0 };
        let sign_a2 = if -x < d_az && d_az <= -x / 2.0 { -1.0 } else { 1.0 };
        let sign_z1 = if y / 2.0 < d_ze && d_ze <= y { -1.0 } else { 1.0 };
        let sign_z2 = if -y < d_ze && d_ze <= -y / 2.0 { -1.0 } else { 1.0 };

        let f = |sign: f64, angle_deg: f64| {
            let inner = PI / wavelength * self.radius * (1.0 / angle_deg.to_radians().cos() - 1.0);
            (sign * PI / 2.0 * inner.sqrt()).atan() / PI
        };

        let fa = f(sign_a1, a1) + f(sign_a2, a2);
        let fz = f(sign_z1, z1) + f(sign_z2, z2);
        -20.0 * (1.0 - fa * fz).log10()
    }
}

/// Blocker memory kept with a link between realisations
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockerState {
    /// User terminal location at the last realisation
    pub ut_location: Vector3,
    /// Simulation time of the last realisation in seconds
    pub generated_at: f64,
    pub blockers: Vec<NonSelfBlocker>,
}

/// Blockage settings of a channel model
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockageModel {
    pub self_region: SelfBlockingRegion,
    pub num_non_self_blocking: u16,
    /// Blocker speed in m/s
    pub blocker_speed: f64,
    /// Indoor scenario, selects blocker priors and correlation distance
    pub indoor: bool,
    pub wavelength: f64,
}

impl BlockageModel {
    pub fn new(portrait_mode: bool, num_non_self_blocking: u16, blocker_speed: f64, indoor: bool, frequency_hz: f64) -> Self {
        Self {
            self_region: SelfBlockingRegion::new(portrait_mode),
            num_non_self_blocking,
            blocker_speed,
            indoor,
            wavelength: SPEED_OF_LIGHT / frequency_hz,
        }
    }

    /// Spatial correlation distance in metres (Table 7.6.4.1-4)
    pub fn correlation_distance(&self, o2i: bool) -> f64 {
        if self.indoor || o2i {
            5.0
        } else {
            10.0
        }
    }

    /// Draw blockers for a new link or move the existing ones, then record
    /// the current UT location and time in `state`
    pub fn update_blockers(
        &self,
        state: &mut BlockerState,
        ut_location: Vector3,
        now: f64,
        o2i: bool,
        streams: &mut RandomStreams,
    ) {
        if state.blockers.is_empty() {
            state.blockers = (0..self.num_non_self_blocking)
                .map(|_| NonSelfBlocker::draw(self.indoor, streams))
                .collect();
        } else {
            let delta_x = state.ut_location.distance_2d(&ut_location);
            let delta_t = now - state.generated_at;

            // Nothing moved, correlation is 1
            if delta_x > 1e-6 || self.blocker_speed > 1e-6 {
                let corr_dis = self.correlation_distance(o2i);
                let mut r = if self.blocker_speed > 1e-6 {
                    let corr_t = corr_dis / self.blocker_speed;
                    (-(delta_x / corr_dis + delta_t / corr_t)).exp()
                } else {
                    (-(delta_x / corr_dis)).exp()
                };
                debug!(delta_x, delta_t, correlation = r, "updating non-self blockers");

                // Normal correlation giving the wanted correlation after the
                // map onto a uniform azimuth
                let distorted = -0.069 * r * r + 1.074 * r - 0.002;
                if distorted < 1.0 {
                    r = distorted;
                }
                for blocker in state.blockers.iter_mut() {
                    blocker.phase_anchor = r * blocker.phase_anchor + (1.0 - r * r).sqrt() * streams.normal();
                }
            }
        }

        state.ut_location = ut_location;
        state.generated_at = now;
    }

    /// Per-cluster attenuation in dB for wrapped cluster arrival angles.
    /// Self and non-self contributions add in dB.
    pub fn attenuation(&self, blockers: &[NonSelfBlocker], aoa: &[f64], zoa: &[f64]) -> Vec<f64> {
        aoa.iter()
            .zip(zoa)
            .enumerate()
            .map(|(n, (&phi, &theta))| {
                assert!((0.0..=360.0).contains(&phi), "AOA {} outside [0, 360]", phi);
                assert!((0.0..=180.0).contains(&theta), "ZOA {} outside [0, 180]", theta);

                let mut loss = 0.0;
                if self.self_region.contains(phi, theta) {
                    loss += SELF_BLOCKING_LOSS_DB;
                    debug!(cluster = n, "cluster inside the self-blocking region");
                }
                for blocker in blockers {
                    loss += blocker.loss_db(phi, theta, self.wavelength);
                }
                loss
            })
            .collect()
    }
}

/// Complementary error function, Abramowitz & Stegun 7.1.26
fn erfc(x: f64) -> f64 {
    let t = 1.0 / (1.0 + 0.3275911 * x.abs());
    let poly = t * (0.254829592 + t * (-0.284496736 + t * (1.421413741 + t * (-1.453152027 + t * 1.061405429))));
    let result = poly * (-x * x).exp();
    if x >= 0.0 {
        result
    } else {
        2.0 - result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(indoor: bool, speed: f64) -> BlockageModel {
        BlockageModel::new(true, 4, speed, indoor, 28e9)
    }

    #[test]
    fn test_erfc_values() {
        assert!((erfc(0.0) - 1.0).abs() < 1e-6);
        assert!((erfc(1.0) - 0.157299).abs() < 1e-6);
        assert!((erfc(-1.0) - 1.842701).abs() < 1e-6);
    }

    #[test]
    fn test_self_blocking_adds_30_db() {
        let model = model(false, 0.0);
        // Inside the portrait region, outside at the far side
        let aoa = [260.0, 80.0];
        let zoa = [100.0, 100.0];
        let att = model.attenuation(&[], &aoa, &zoa);
        assert_eq!(att, vec![30.0, 0.0]);
    }

    #[test]
    fn test_self_blocking_presets() {
        assert!(SelfBlockingRegion::PORTRAIT.contains(205.0, 70.0));
        assert!(!SelfBlockingRegion::PORTRAIT.contains(199.0, 70.0));
        assert!(SelfBlockingRegion::LANDSCAPE.contains(0.0, 110.0));
        assert!(!SelfBlockingRegion::LANDSCAPE.contains(130.0, 110.0));
        // Landscape spans -40 to 120 degrees
        assert!(SelfBlockingRegion::LANDSCAPE.contains(330.0, 110.0));
        assert!(!SelfBlockingRegion::LANDSCAPE.contains(310.0, 110.0));
    }

    #[test]
    fn test_blockers_drawn_from_priors() {
        let mut streams = RandomStreams::new(1);
        let mut state = BlockerState::default();
        model(true, 1.0).update_blockers(&mut state, Vector3::default(), 0.0, false, &mut streams);
        assert_eq!(state.blockers.len(), 4);
        for b in &state.blockers {
            assert!((15.0..45.0).contains(&b.width));
            assert!((5.0..15.0).contains(&b.height));
            assert_eq!(b.zenith, 90.0);
            assert_eq!(b.radius, 2.0);
        }

        let mut outdoor = BlockerState::default();
        model(false, 1.0).update_blockers(&mut outdoor, Vector3::default(), 0.0, false, &mut streams);
        assert!(outdoor.blockers.iter().all(|b| b.height == 5.0 && b.radius == 10.0));
    }

    #[test]
    fn test_anchors_unchanged_without_motion() {
        let model = model(false, 0.0);
        let mut streams = RandomStreams::new(2);
        let mut state = BlockerState::default();
        let here = Vector3::new(10.0, 5.0, 1.5);
        model.update_blockers(&mut state, here, 0.0, false, &mut streams);
        let before = state.blockers.clone();

        model.update_blockers(&mut state, here, 5.0, false, &mut streams);
        assert_eq!(state.blockers, before);
        assert_eq!(state.generated_at, 5.0);
    }

    #[test]
    fn test_anchors_blend_when_moving() {
        let model = model(false, 1.0);
        let mut streams = RandomStreams::new(3);
        let mut state = BlockerState::default();
        model.update_blockers(&mut state, Vector3::default(), 0.0, false, &mut streams);
        let before = state.blockers.clone();

        model.update_blockers(&mut state, Vector3::new(1.0, 0.0, 1.5), 0.1, false, &mut streams);
        assert_eq!(state.blockers.len(), before.len());
        for (old, new) in before.iter().zip(&state.blockers) {
            assert_ne!(old.phase_anchor, new.phase_anchor);
            // Only the anchor moves
            assert_eq!(old.width, new.width);
            assert_eq!(old.radius, new.radius);
        }
        assert_eq!(state.ut_location, Vector3::new(1.0, 0.0, 1.5));
    }

    #[test]
    fn test_correlation_distance() {
        assert_eq!(model(true, 1.0).correlation_distance(false), 5.0);
        assert_eq!(model(false, 1.0).correlation_distance(true), 5.0);
        assert_eq!(model(false, 1.0).correlation_distance(false), 10.0);
    }

    #[test]
    fn test_non_self_blocker_loss() {
        let blocker = NonSelfBlocker {
            phase_anchor: 0.0,
            width: 10.0,
            zenith: 90.0,
            height: 5.0,
            radius: 10.0,
        };
        assert!((blocker.azimuth() - 180.0).abs() < 1e-4);

        let wavelength = SPEED_OF_LIGHT / 28e9;
        let centre = blocker.loss_db(180.0, 90.0, wavelength);
        assert!(centre > 5.0, "centre loss {} dB", centre);

        let edge = blocker.loss_db(186.0, 90.0, wavelength);
        assert!(edge > 0.0 && edge < centre);

        assert_eq!(blocker.loss_db(200.0, 90.0, wavelength), 0.0);
        assert_eq!(blocker.loss_db(180.0, 100.0, wavelength), 0.0);
    }

    #[test]
    fn test_non_self_blocker_wraps_through_north() {
        let blocker = NonSelfBlocker {
            phase_anchor: 2.2,
            width: 10.0,
            zenith: 90.0,
            height: 5.0,
            radius: 10.0,
        };
        let phi = blocker.azimuth();
        assert!(phi > 350.0 && phi < 360.0, "azimuth {}", phi);

        let wavelength = SPEED_OF_LIGHT / 28e9;
        let unwrapped = blocker.loss_db(phi + 4.0, 90.0, wavelength);
        let wrapped = blocker.loss_db(phi + 4.0 - 360.0, 90.0, wavelength);
        assert!(wrapped > 0.0);
        assert!((wrapped - unwrapped).abs() < 1e-9);
    }
}
