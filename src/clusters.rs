//! Cluster and ray geometry (TR 38.901 7.5 steps 5 to 10)
//!
//! Delays, powers, arrival/departure angles of every cluster, the 20 rays
//! inside each cluster, their random coupling and polarisation draws, and
//! the sub-cluster split of the two strongest clusters.

use tracing::debug;

use crate::condition::ChannelCondition;
use crate::error::Result;
use crate::geometry::{wrap_angles, wrap_azimuth_deg, wrap_zenith_deg, LinkGeometry};
use crate::lsp::LargeScaleParameters;
use crate::params::{c_phi_nlos, c_theta_nlos, ParameterSet};
use crate::streams::RandomStreams;

/// Ray offset angles within a cluster for unit RMS spread (Table 7.5-3)
pub const RAY_OFFSETS: [f64; 20] = [
    0.0447, -0.0447, 0.1413, -0.1413, 0.2492, -0.2492, 0.3715, -0.3715, 0.5129, -0.5129, 0.6797,
    -0.6797, 0.8844, -0.8844, 1.1481, -1.1481, 1.5195, -1.5195, 2.1551, -2.1551,
];

/// Clusters weaker than this fraction of the strongest (-25 dB) are dropped
pub const PRUNING_THRESHOLD: f64 = 0.0032;

/// Sub-cluster delay offsets in units of cDS
pub const SUB_CLUSTER_DELAYS: [f64; 2] = [1.28, 2.56];

/// Sub-cluster (0, 1 or 2) a ray of a strongest cluster contributes to
#[inline]
pub fn sub_cluster_of(ray: usize) -> usize {
    match ray {
        9..=12 | 17 | 18 => 1,
        13..=16 => 2,
        _ => 0,
    }
}

/// Per-cluster angles in degrees
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClusterAngles {
    pub aoa: Vec<f64>,
    pub zoa: Vec<f64>,
    pub aod: Vec<f64>,
    pub zod: Vec<f64>,
}

impl ClusterAngles {
    fn push_copy(&mut self, index: usize) {
        self.aoa.push(self.aoa[index]);
        self.zoa.push(self.zoa[index]);
        self.aod.push(self.aod[index]);
        self.zod.push(self.zod[index]);
    }
}

/// Per-ray angles in radians, indexed [cluster][ray]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RayAngles {
    pub aoa: Vec<Vec<f64>>,
    pub zoa: Vec<Vec<f64>>,
    pub aod: Vec<Vec<f64>>,
    pub zod: Vec<Vec<f64>>,
}

/// Cross-polarisation ratios and initial phases, indexed [cluster][ray]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Polarisation {
    /// Linear XPR per ray
    pub xpr: Vec<Vec<f64>>,
    /// Initial phases (θθ, θφ, φθ, φφ) in radians
    pub phases: Vec<Vec<[f64; 4]>>,
}

impl Polarisation {
    /// XPR drawn log-normally in dB, four phases uniform in (-π, π)
    pub fn draw(params: &ParameterSet, num_clusters: usize, streams: &mut RandomStreams) -> Self {
        use std::f64::consts::PI;

        let rays = params.rays_per_cluster;
        let mut xpr = Vec::with_capacity(num_clusters);
        let mut phases = Vec::with_capacity(num_clusters);
        for _ in 0..num_clusters {
            let mut cluster_xpr = Vec::with_capacity(rays);
            let mut cluster_phases = Vec::with_capacity(rays);
            for _ in 0..rays {
                let x_db = streams.normal() * params.sig_xpr + params.u_xpr;
                cluster_xpr.push(10f64.powf(x_db / 10.0));
                cluster_phases.push([
                    streams.uniform(-PI, PI),
                    streams.uniform(-PI, PI),
                    streams.uniform(-PI, PI),
                    streams.uniform(-PI, PI),
                ]);
            }
            xpr.push(cluster_xpr);
            phases.push(cluster_phases);
        }
        Self { xpr, phases }
    }
}

/// Cluster and ray geometry of one channel realisation
#[derive(Debug, Clone, PartialEq)]
pub struct Clusters {
    /// Delays in seconds, ascending, first cluster at 0
    pub delays: Vec<f64>,
    /// Cluster powers, summing to 1 before blockage
    pub powers: Vec<f64>,
    /// Wrapped cluster angles in degrees
    pub angles: ClusterAngles,
    /// Wrapped ray angles in radians
    pub rays: RayAngles,
}

impl Clusters {
    /// Generate delays, powers and angles for a link.
    pub fn generate(
        params: &ParameterSet,
        lsp: &LargeScaleParameters,
        link: &LinkGeometry,
        condition: &ChannelCondition,
        streams: &mut RandomStreams,
    ) -> Result<Self> {
        let los = condition.has_los_ray();
        let num_clusters = params.num_clusters;
        let ds = lsp.delay_spread;
        let k_db = lsp.k_factor_db;

        // Angle scaling factors are keyed on the nominal cluster count
        let mut c_phi = c_phi_nlos(num_clusters)?;
        let mut c_theta = c_theta_nlos(num_clusters)?;
        if los {
            c_phi *= 1.1035 - 0.028 * k_db - 2e-3 * k_db.powi(2) + 1e-4 * k_db.powi(3);
            c_theta *= 1.3086 + 0.0339 * k_db - 0.0077 * k_db.powi(2) + 2e-4 * k_db.powi(3);
        }

        let mut delays = cluster_delays(params.r_tau, ds, num_clusters, streams);
        let mut powers = cluster_powers(&delays, params, ds, streams);

        let mut angle_powers = powers.clone();
        if los {
            let k = lsp.k_linear();
            for p in angle_powers.iter_mut() {
                *p /= 1.0 + k;
            }
            angle_powers[0] += k / (1.0 + k);
        }
        let power_max = angle_powers.iter().copied().fold(0.0, f64::max);

        prune(&mut delays, &mut powers, &mut angle_powers, power_max);
        let reduced = powers.len();
        debug!(nominal = num_clusters, reduced, "pruned clusters");

        if los {
            let c_tau = los_delay_scaling(k_db);
            for d in delays.iter_mut() {
                *d /= c_tau;
            }
        }

        let arrival_az = link.arrival.azimuth_deg();
        let arrival_incl = link.arrival.inclination_deg();
        let departure_az = link.departure.azimuth_deg();
        let departure_incl = link.departure.inclination_deg();

        let mut angles = ClusterAngles::default();
        for &p in &angle_powers {
            let log_calc = -(p / power_max).ln();
            let azimuth = 2.0 * log_calc.sqrt() / 1.4 / c_phi;
            let zenith = log_calc / c_theta;
            angles.aoa.push(lsp.asa * azimuth);
            angles.aod.push(lsp.asd * azimuth);
            angles.zoa.push(lsp.zsa * zenith);
            angles.zod.push(lsp.zsd * zenith);
        }

        for n in 0..reduced {
            let sign = if streams.unit() < 0.5 { -1.0 } else { 1.0 };
            angles.aoa[n] = angles.aoa[n] * sign + streams.normal() * lsp.asa / 7.0 + arrival_az;
            angles.aod[n] = angles.aod[n] * sign + streams.normal() * lsp.asd / 7.0 + departure_az;
            let zoa_centre = if condition.is_o2i() { 90.0 } else { arrival_incl };
            angles.zoa[n] = angles.zoa[n] * sign + streams.normal() * lsp.zsa / 7.0 + zoa_centre;
            angles.zod[n] =
                angles.zod[n] * sign + streams.normal() * lsp.zsd / 7.0 + departure_incl + params.offset_zod;
        }

        // Pin the first cluster onto the LOS direction
        if los {
            let diff_aoa = angles.aoa[0] - arrival_az;
            let diff_aod = angles.aod[0] - departure_az;
            let diff_zoa = angles.zoa[0] - arrival_incl;
            let diff_zod = angles.zod[0] - departure_incl;
            for n in 0..reduced {
                angles.aoa[n] -= diff_aoa;
                angles.aod[n] -= diff_aod;
                angles.zoa[n] -= diff_zoa;
                angles.zod[n] -= diff_zod;
            }
        }

        let rays = ray_angles(&angles, params);

        for n in 0..reduced {
            angles.aoa[n] = wrap_azimuth_deg(angles.aoa[n]);
            angles.aod[n] = wrap_azimuth_deg(angles.aod[n]);
            angles.zoa[n] = wrap_zenith_deg(angles.zoa[n]);
            angles.zod[n] = wrap_zenith_deg(angles.zod[n]);
        }

        Ok(Self {
            delays,
            powers,
            angles,
            rays,
        })
    }

    pub fn len(&self) -> usize {
        self.powers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.powers.is_empty()
    }

    /// Divide each cluster power by its blockage loss
    pub fn attenuate(&mut self, attenuation_db: &[f64]) {
        for (p, att) in self.powers.iter_mut().zip(attenuation_db) {
            *p /= 10f64.powf(att / 10.0);
        }
    }

    /// Randomly couple rays within each cluster by shuffling each of the
    /// four ray angle sets independently
    pub fn couple_rays(&mut self, streams: &mut RandomStreams) {
        for n in 0..self.len() {
            streams.shuffle(&mut self.rays.aod[n]);
            streams.shuffle(&mut self.rays.aoa[n]);
            streams.shuffle(&mut self.rays.zod[n]);
            streams.shuffle(&mut self.rays.zoa[n]);
        }
    }

    /// Append delay and angle entries for the sub-clusters of the two
    /// strongest clusters, lower index first. Coincident strongest
    /// clusters append a single set.
    pub fn append_sub_clusters(&mut self, first: usize, second: usize, c_ds: f64) {
        let n = self.len();
        assert!(
            first < n && second < n,
            "strongest clusters ({}, {}) out of range for {} clusters",
            first,
            second,
            n
        );

        let parents = if first == second {
            vec![first]
        } else {
            vec![first.min(second), first.max(second)]
        };
        for parent in parents {
            for offset in SUB_CLUSTER_DELAYS {
                self.delays.push(self.delays[parent] + offset * c_ds);
                self.angles.push_copy(parent);
            }
        }
    }
}

/// Exponential delays with the minimum shifted to zero, sorted ascending
pub fn cluster_delays(r_tau: f64, ds: f64, num_clusters: usize, streams: &mut RandomStreams) -> Vec<f64> {
    let mut delays: Vec<f64> = (0..num_clusters).map(|_| -r_tau * ds * streams.unit().ln()).collect();
    let min_tau = delays.iter().copied().fold(f64::INFINITY, f64::min);
    for d in delays.iter_mut() {
        *d -= min_tau;
    }
    delays.sort_by(|a, b| a.total_cmp(b));
    delays
}

/// Exponential power profile with per-cluster shadowing, normalised to 1
pub fn cluster_powers(delays: &[f64], params: &ParameterSet, ds: f64, streams: &mut RandomStreams) -> Vec<f64> {
    let r_tau = params.r_tau;
    let mut powers: Vec<f64> = delays
        .iter()
        .map(|&tau| {
            (-tau * (r_tau - 1.0) / r_tau / ds).exp()
                * 10f64.powf(-streams.normal() * params.per_cluster_shadowing_std / 10.0)
        })
        .collect();
    normalize(&mut powers);
    powers
}

fn normalize(powers: &mut [f64]) {
    let sum: f64 = powers.iter().sum();
    for p in powers.iter_mut() {
        *p /= sum;
    }
}

/// Drop clusters whose angle power is below the threshold, keeping the
/// order of survivors, and renormalise the remaining powers
fn prune(delays: &mut Vec<f64>, powers: &mut Vec<f64>, angle_powers: &mut Vec<f64>, power_max: f64) {
    let survivors: Vec<usize> = (0..angle_powers.len())
        .filter(|&n| angle_powers[n] >= PRUNING_THRESHOLD * power_max)
        .collect();
    *delays = survivors.iter().map(|&n| delays[n]).collect();
    *powers = survivors.iter().map(|&n| powers[n]).collect();
    *angle_powers = survivors.iter().map(|&n| angle_powers[n]).collect();
    normalize(powers);
}

/// LOS delay scaling constant for a K-factor in dB (eq. 7.5-3)
pub fn los_delay_scaling(k_db: f64) -> f64 {
    0.7705 - 0.0433 * k_db + 2e-4 * k_db.powi(2) + 17e-6 * k_db.powi(3)
}

fn ray_angles(angles: &ClusterAngles, params: &ParameterSet) -> RayAngles {
    let zod_spread = 0.375 * 10f64.powf(params.u_lg_zsd);
    let offsets = &RAY_OFFSETS[..params.rays_per_cluster.min(RAY_OFFSETS.len())];

    let mut rays = RayAngles::default();
    for n in 0..angles.aoa.len() {
        let (mut aoa, mut zoa, mut aod, mut zod) = (Vec::new(), Vec::new(), Vec::new(), Vec::new());
        for &alpha in offsets {
            let arrival = wrap_angles(
                (angles.aoa[n] + params.c_asa * alpha).to_radians(),
                (angles.zoa[n] + params.c_zsa * alpha).to_radians(),
            );
            aoa.push(arrival.azimuth);
            zoa.push(arrival.inclination);

            let departure = wrap_angles(
                (angles.aod[n] + params.c_asd * alpha).to_radians(),
                (angles.zod[n] + zod_spread * alpha).to_radians(),
            );
            aod.push(departure.azimuth);
            zod.push(departure.inclination);
        }
        rays.aoa.push(aoa);
        rays.zoa.push(zoa);
        rays.aod.push(aod);
        rays.zod.push(zod);
    }
    rays
}

/// Indices of the strongest and second strongest cluster. The first
/// cluster found wins a tie; a single cluster is returned twice.
pub fn strongest_clusters(powers: &[f64]) -> (usize, usize) {
    let mut first = 0;
    let mut max_power = 0.0;
    for (n, &p) in powers.iter().enumerate() {
        if max_power < p {
            max_power = p;
            first = n;
        }
    }

    let mut second = 0;
    max_power = 0.0;
    for (n, &p) in powers.iter().enumerate() {
        if max_power < p && n != first {
            max_power = p;
            second = n;
        }
    }
    (first, second)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::LosCondition;
    use crate::config::Scenario;
    use crate::geometry::{Endpoint, Vector3};
    use std::f64::consts::PI;

    fn link() -> LinkGeometry {
        let bs = Endpoint::new(0, Vector3::new(0.0, 0.0, 25.0));
        let ut = Endpoint::new(1, Vector3::new(120.0, 60.0, 1.5));
        LinkGeometry::new(&bs, &ut)
    }

    fn generate(scenario: Scenario, condition: ChannelCondition, seed: u64) -> (ParameterSet, Clusters) {
        let link = link();
        let params =
            ParameterSet::lookup(scenario, &condition, 28e9, link.h_bs, link.h_ut, link.distance_2d).unwrap();
        let mut streams = RandomStreams::new(seed);
        let lsp = LargeScaleParameters::draw(&params, &condition, &mut streams);
        let clusters = Clusters::generate(&params, &lsp, &link, &condition, &mut streams).unwrap();
        (params, clusters)
    }

    #[test]
    fn test_sub_cluster_groups() {
        let groups: Vec<usize> = (0..20).map(sub_cluster_of).collect();
        assert_eq!(groups.iter().filter(|&&g| g == 0).count(), 10);
        assert_eq!(groups.iter().filter(|&&g| g == 1).count(), 6);
        assert_eq!(groups.iter().filter(|&&g| g == 2).count(), 4);
        assert_eq!(sub_cluster_of(9), 1);
        assert_eq!(sub_cluster_of(16), 2);
        assert_eq!(sub_cluster_of(19), 0);
    }

    #[test]
    fn test_delays_sorted_from_zero() {
        let mut streams = RandomStreams::new(1);
        let delays = cluster_delays(2.3, 300e-9, 20, &mut streams);
        assert_eq!(delays.len(), 20);
        assert_eq!(delays[0], 0.0);
        assert!(delays.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_powers_sum_to_one_before_and_after_pruning() {
        let params = ParameterSet::lookup(Scenario::UrbanMacro, &ChannelCondition::nlos(), 3.5e9, 25.0, 1.5, 200.0)
            .unwrap();
        for seed in 0..20 {
            let mut streams = RandomStreams::new(seed);
            let delays = cluster_delays(params.r_tau, 400e-9, params.num_clusters, &mut streams);
            let powers = cluster_powers(&delays, &params, 400e-9, &mut streams);
            assert!((powers.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        }

        for seed in 0..20 {
            let (_, clusters) = generate(Scenario::UrbanMacro, ChannelCondition::nlos(), seed);
            assert!((clusters.powers.iter().sum::<f64>() - 1.0).abs() < 1e-12);
            assert_eq!(clusters.delays.len(), clusters.len());
        }
    }

    #[test]
    fn test_pruning_preserves_order() {
        let mut delays = vec![0.0, 1.0, 2.0, 3.0];
        let mut powers = vec![0.5, 0.0001, 0.3, 0.1999];
        let mut angle_powers = powers.clone();
        prune(&mut delays, &mut powers, &mut angle_powers, 0.5);

        assert_eq!(delays, vec![0.0, 2.0, 3.0]);
        assert_eq!(angle_powers, vec![0.5, 0.3, 0.1999]);
        assert!((powers.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_angles_in_canonical_ranges() {
        let conditions = [
            ChannelCondition::los(),
            ChannelCondition::nlos(),
            ChannelCondition::new(LosCondition::Nlos, true),
            ChannelCondition::new(LosCondition::Los, true),
        ];
        for condition in conditions {
            for seed in 0..10 {
                let (params, clusters) = generate(Scenario::UrbanMicroStreetCanyon, condition, seed);
                let a = &clusters.angles;
                assert!(a.aoa.iter().chain(&a.aod).all(|x| (0.0..360.0).contains(x)));
                assert!(a.zoa.iter().chain(&a.zod).all(|x| (0.0..=180.0).contains(x)));

                let r = &clusters.rays;
                for n in 0..clusters.len() {
                    assert_eq!(r.aoa[n].len(), params.rays_per_cluster);
                    assert!(r.aoa[n].iter().chain(&r.aod[n]).all(|x| (0.0..2.0 * PI).contains(x)));
                    assert!(r.zoa[n].iter().chain(&r.zod[n]).all(|x| (0.0..=PI).contains(x)));
                }
            }
        }
    }

    #[test]
    fn test_los_first_cluster_on_bearing() {
        let link = link();
        for seed in 0..10 {
            let (_, clusters) = generate(Scenario::UrbanMacro, ChannelCondition::los(), seed);
            let a = &clusters.angles;
            assert!((a.aoa[0] - link.arrival.azimuth_deg()).abs() < 1e-9);
            assert!((a.aod[0] - link.departure.azimuth_deg()).abs() < 1e-9);
            assert!((a.zoa[0] - link.arrival.inclination_deg()).abs() < 1e-9);
            assert!((a.zod[0] - link.departure.inclination_deg()).abs() < 1e-9);
        }
    }

    #[test]
    fn test_o2i_zenith_of_arrival_centred_on_horizon() {
        let condition = ChannelCondition::new(LosCondition::Nlos, true);
        let mut mean = 0.0;
        let mut count = 0.0;
        for seed in 0..50 {
            let (_, clusters) = generate(Scenario::UrbanMacro, condition, seed);
            mean += clusters.angles.zoa.iter().sum::<f64>();
            count += clusters.len() as f64;
        }
        mean /= count;
        assert!((mean - 90.0).abs() < 10.0, "mean ZOA {}", mean);
    }

    #[test]
    fn test_strongest_clusters() {
        assert_eq!(strongest_clusters(&[0.1, 0.5, 0.2, 0.2]), (1, 2));
        // First found wins a tie
        assert_eq!(strongest_clusters(&[0.3, 0.3, 0.3]), (0, 1));
        assert_eq!(strongest_clusters(&[1.0]), (0, 0));
    }

    #[test]
    fn test_append_sub_clusters() {
        let (params, mut clusters) = generate(Scenario::UrbanMacro, ChannelCondition::nlos(), 3);
        let n = clusters.len();
        let (first, second) = strongest_clusters(&clusters.powers);
        assert_ne!(first, second);
        let low = first.min(second);
        let high = first.max(second);

        clusters.append_sub_clusters(first, second, params.c_ds);
        assert_eq!(clusters.delays.len(), n + 4);
        assert_eq!(clusters.angles.aoa.len(), n + 4);
        assert!((clusters.delays[n] - clusters.delays[low] - 1.28 * params.c_ds).abs() < 1e-18);
        assert!((clusters.delays[n + 3] - clusters.delays[high] - 2.56 * params.c_ds).abs() < 1e-18);
        assert_eq!(clusters.angles.zod[n + 2], clusters.angles.zod[high]);
    }

    #[test]
    fn test_coincident_strongest_appends_once() {
        let (params, mut clusters) = generate(Scenario::UrbanMacro, ChannelCondition::nlos(), 4);
        let n = clusters.len();
        clusters.append_sub_clusters(1, 1, params.c_ds);
        assert_eq!(clusters.delays.len(), n + 2);
        assert_eq!(clusters.angles.aoa[n + 1], clusters.angles.aoa[1]);
    }

    #[test]
    #[should_panic]
    fn test_sub_cluster_index_out_of_range() {
        let (params, mut clusters) = generate(Scenario::UrbanMacro, ChannelCondition::nlos(), 5);
        let n = clusters.len();
        clusters.append_sub_clusters(0, n, params.c_ds);
    }

    #[test]
    fn test_couple_rays_permutes_within_cluster() {
        let (_, mut clusters) = generate(Scenario::UrbanMacro, ChannelCondition::nlos(), 6);
        let before = clusters.rays.clone();
        let mut streams = RandomStreams::new(99);
        clusters.couple_rays(&mut streams);

        assert_ne!(before.aoa, clusters.rays.aoa);
        for n in 0..clusters.len() {
            let mut a = before.zod[n].clone();
            let mut b = clusters.rays.zod[n].clone();
            a.sort_by(|x, y| x.total_cmp(y));
            b.sort_by(|x, y| x.total_cmp(y));
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_xpr_log_mean() {
        let params = ParameterSet::lookup(Scenario::UrbanMacro, &ChannelCondition::nlos(), 3.5e9, 25.0, 1.5, 200.0)
            .unwrap();
        let mut streams = RandomStreams::new(8);
        let pol = Polarisation::draw(&params, 100, &mut streams);

        let all: Vec<f64> = pol.xpr.iter().flatten().map(|k| 10.0 * k.log10()).collect();
        let mean = all.iter().sum::<f64>() / all.len() as f64;
        assert!((mean - params.u_xpr).abs() < 0.3, "mean XPR {} dB", mean);
        assert!(pol.phases.iter().flatten().flatten().all(|p| (-PI..PI).contains(p)));
    }

    #[test]
    fn test_los_delay_scaling() {
        assert!((los_delay_scaling(0.0) - 0.7705).abs() < 1e-12);
        assert!(los_delay_scaling(9.0) < 1.0);
    }
}
