//! Scenario parameter tables
//!
//! TR 38.901 Table 7.5-6 (RMa, UMa, UMi, InH) and TR 37.885 Table 6.2.3-1
//! (V2V). One `ParameterSet` per (scenario, LOS/NLOS/O2I) combination, with
//! the frequency and distance dependent entries evaluated for the link.

use tracing::warn;

use crate::condition::ChannelCondition;
use crate::config::Scenario;
use crate::error::{ChannelError, Result};

/// Cluster counts that appear in Table 7.5-2
pub const SUPPORTED_CLUSTER_COUNTS: [usize; 11] = [4, 5, 8, 10, 11, 12, 14, 15, 16, 19, 20];

// Square-root correlation matrices, Cholesky factors of Table 7.5-6.
// Order: [SF, K, DS, ASD, ASA, ZSD, ZSA]. NLOS and O2I drop the K row.

const SQRT_C_RMA_LOS: [[f64; 7]; 7] = [
    [1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [-0.5, 0.0, 0.866025, 0.0, 0.0, 0.0, 0.0],
    [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0],
    [0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0],
    [0.01, 0.0, -0.0519615, 0.73, -0.2, 0.651383, 0.0],
    [-0.17, -0.02, 0.21362, -0.14, 0.24, 0.142773, 0.909661],
];

const SQRT_C_RMA_NLOS: [[f64; 6]; 6] = [
    [1.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [-0.5, 0.866025, 0.0, 0.0, 0.0, 0.0],
    [0.6, -0.11547, 0.791623, 0.0, 0.0, 0.0],
    [0.0, 0.0, 0.0, 1.0, 0.0, 0.0],
    [-0.04, -0.138564, 0.540662, -0.18, 0.809003, 0.0],
    [-0.25, -0.606218, -0.240013, 0.26, -0.231685, 0.625392],
];

const SQRT_C_RMA_O2I: [[f64; 6]; 6] = [
    [1.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0, 0.0, 0.0],
    [0.0, 0.0, -0.7, 0.714143, 0.0, 0.0],
    [0.0, 0.0, 0.66, -0.123225, 0.741091, 0.0],
    [0.0, 0.0, 0.47, 0.152631, -0.393194, 0.775373],
];

const SQRT_C_UMA_LOS: [[f64; 7]; 7] = [
    [1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [-0.4, -0.4, 0.824621, 0.0, 0.0, 0.0, 0.0],
    [-0.5, 0.0, 0.242536, 0.83137, 0.0, 0.0, 0.0],
    [-0.5, -0.2, 0.630593, -0.484671, 0.278293, 0.0, 0.0],
    [0.0, 0.0, -0.242536, 0.672172, 0.642214, 0.27735, 0.0],
    [-0.8, 0.0, -0.388057, -0.367926, 0.238537, -3.58949e-15, 0.130931],
];

const SQRT_C_UMA_NLOS: [[f64; 6]; 6] = [
    [1.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [-0.4, 0.916515, 0.0, 0.0, 0.0, 0.0],
    [-0.6, 0.174574, 0.78072, 0.0, 0.0, 0.0],
    [0.0, 0.654654, 0.365963, 0.661438, 0.0, 0.0],
    [0.0, -0.545545, 0.762422, 0.118114, 0.327327, 0.0],
    [-0.4, -0.174574, -0.396459, 0.392138, 0.49099, 0.507445],
];

// Shared by UMa and UMi outdoor-to-indoor
const SQRT_C_O2I: [[f64; 6]; 6] = [
    [1.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [-0.5, 0.866025, 0.0, 0.0, 0.0, 0.0],
    [0.2, 0.57735, 0.791623, 0.0, 0.0, 0.0],
    [0.0, 0.46188, -0.336861, 0.820482, 0.0, 0.0],
    [0.0, -0.69282, 0.252646, 0.493742, 0.460857, 0.0],
    [0.0, -0.23094, 0.16843, 0.808554, -0.220827, 0.464515],
];

const SQRT_C_UMI_LOS: [[f64; 7]; 7] = [
    [1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [0.5, 0.866025, 0.0, 0.0, 0.0, 0.0, 0.0],
    [-0.4, -0.57735, 0.711805, 0.0, 0.0, 0.0, 0.0],
    [-0.5, 0.057735, 0.468293, 0.726201, 0.0, 0.0, 0.0],
    [-0.4, -0.11547, 0.805464, -0.23482, 0.350363, 0.0, 0.0],
    [0.0, 0.0, 0.0, 0.688514, 0.461454, 0.559471, 0.0],
    [0.0, 0.0, 0.280976, 0.231921, -0.490509, 0.11916, 0.782603],
];

const SQRT_C_UMI_NLOS: [[f64; 6]; 6] = [
    [1.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [-0.7, 0.714143, 0.0, 0.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0, 0.0, 0.0],
    [-0.4, 0.168034, 0.0, 0.90098, 0.0, 0.0],
    [0.0, -0.70014, 0.5, 0.130577, 0.4927, 0.0],
    [0.0, 0.0, 0.5, 0.221981, -0.566238, 0.616522],
];

const SQRT_C_OFFICE_LOS: [[f64; 7]; 7] = [
    [1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [0.5, 0.866025, 0.0, 0.0, 0.0, 0.0, 0.0],
    [-0.8, -0.11547, 0.588784, 0.0, 0.0, 0.0, 0.0],
    [-0.4, 0.23094, 0.520847, 0.717903, 0.0, 0.0, 0.0],
    [-0.5, 0.288675, 0.73598, -0.348236, 0.0610847, 0.0, 0.0],
    [0.2, -0.11547, 0.418943, 0.541106, 0.219905, 0.655744, 0.0],
    [0.3, -0.057735, 0.73598, -0.348236, 0.0610847, -0.304997, 0.383375],
];

const SQRT_C_OFFICE_NLOS: [[f64; 6]; 6] = [
    [1.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [-0.5, 0.866025, 0.0, 0.0, 0.0, 0.0],
    [0.0, 0.46188, 0.886942, 0.0, 0.0, 0.0],
    [-0.4, -0.23094, 0.120263, 0.878751, 0.0, 0.0],
    [0.0, -0.311769, 0.55697, -0.249198, 0.728344, 0.0],
    [0.0, -0.069282, 0.295397, 0.430696, 0.468462, 0.709214],
];

fn matrix<const N: usize>(rows: &[[f64; N]; N]) -> Vec<Vec<f64>> {
    rows.iter().map(|row| row.to_vec()).collect()
}

/// Statistical parameters for one link realisation
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSet {
    pub num_clusters: usize,
    pub rays_per_cluster: usize,
    pub u_lg_ds: f64,
    pub sig_lg_ds: f64,
    pub u_lg_asd: f64,
    pub sig_lg_asd: f64,
    pub u_lg_asa: f64,
    pub sig_lg_asa: f64,
    pub u_lg_zsa: f64,
    pub sig_lg_zsa: f64,
    pub u_lg_zsd: f64,
    pub sig_lg_zsd: f64,
    /// ZOD offset in degrees
    pub offset_zod: f64,
    /// Cluster delay spread in seconds
    pub c_ds: f64,
    /// Cluster ASD in degrees
    pub c_asd: f64,
    /// Cluster ASA in degrees
    pub c_asa: f64,
    /// Cluster ZSA in degrees
    pub c_zsa: f64,
    /// Ricean K mean in dB
    pub u_k: f64,
    /// Ricean K std in dB
    pub sig_k: f64,
    /// Delay distribution proportionality factor
    pub r_tau: f64,
    /// Cross-polarisation ratio mean in dB
    pub u_xpr: f64,
    /// Cross-polarisation ratio std in dB
    pub sig_xpr: f64,
    /// Per-cluster shadowing std in dB
    pub per_cluster_shadowing_std: f64,
    /// Square-root correlation matrix, 7x7 for LOS and 6x6 otherwise
    pub sqrt_c: Vec<Vec<f64>>,
}

impl ParameterSet {
    /// Build the parameter set for a link.
    ///
    /// `frequency_hz` is the carrier, `h_bs`/`h_ut` the heights of the
    /// higher and lower endpoint, `distance_2d` their horizontal separation.
    pub fn lookup(
        scenario: Scenario,
        condition: &ChannelCondition,
        frequency_hz: f64,
        h_bs: f64,
        h_ut: f64,
        distance_2d: f64,
    ) -> Result<Self> {
        let condition = &scenario.link_condition(*condition);
        let fc = frequency_hz / 1e9;
        let los = condition.is_los();
        let o2i = condition.is_o2i();

        let params = match scenario {
            Scenario::RuralMacro => rma(los, o2i, h_ut, distance_2d),
            Scenario::UrbanMacro => uma(los, o2i, fc, h_ut, distance_2d),
            Scenario::UrbanMicroStreetCanyon => umi(los, o2i, fc, h_bs, h_ut, distance_2d),
            Scenario::IndoorOfficeOpen | Scenario::IndoorOfficeMixed => {
                if o2i {
                    return Err(ChannelError::UnsupportedCondition {
                        scenario: scenario.as_str(),
                        condition: condition.to_string(),
                    });
                }
                indoor_office(los, fc)
            }
            Scenario::V2vUrban => v2v_urban(condition, fc),
            Scenario::V2vHighway => v2v_highway(condition, fc),
        };

        if !SUPPORTED_CLUSTER_COUNTS.contains(&params.num_clusters) {
            return Err(ChannelError::InvalidClusterCount(params.num_clusters));
        }
        Ok(params)
    }

    /// Number of large scale parameters drawn, 7 with K-factor else 6.
    /// Always 7 exactly when the condition `has_los_ray`.
    pub fn num_lsps(&self) -> usize {
        self.sqrt_c.len()
    }
}

fn rma(los: bool, o2i: bool, h_ut: f64, d2d: f64) -> ParameterSet {
    let d_km = d2d / 1000.0;
    // 3.91 ns is used where the cluster DS entry is N/A
    if los && !o2i {
        ParameterSet {
            num_clusters: 11,
            rays_per_cluster: 20,
            u_lg_ds: -7.49,
            sig_lg_ds: 0.55,
            u_lg_asd: 0.90,
            sig_lg_asd: 0.38,
            u_lg_asa: 1.52,
            sig_lg_asa: 0.24,
            u_lg_zsa: 0.47,
            sig_lg_zsa: 0.40,
            u_lg_zsd: 0.34,
            sig_lg_zsd: f64::max(-1.0, -0.17 * d_km - 0.01 * (h_ut - 1.5) + 0.22),
            offset_zod: 0.0,
            c_ds: 3.91e-9,
            c_asd: 2.0,
            c_asa: 3.0,
            c_zsa: 3.0,
            u_k: 7.0,
            sig_k: 4.0,
            r_tau: 3.8,
            u_xpr: 12.0,
            sig_xpr: 4.0,
            per_cluster_shadowing_std: 3.0,
            sqrt_c: matrix(&SQRT_C_RMA_LOS),
        }
    } else {
        let u_lg_zsd = f64::max(-1.0, -0.19 * d_km - 0.01 * (h_ut - 1.5) + 0.28);
        let offset_zod = ((35.0 - 3.5) / d2d).atan().to_degrees() - ((35.0 - 1.5) / d2d).atan().to_degrees();
        let nlos = ParameterSet {
            num_clusters: 10,
            rays_per_cluster: 20,
            u_lg_ds: -7.43,
            sig_lg_ds: 0.48,
            u_lg_asd: 0.95,
            sig_lg_asd: 0.45,
            u_lg_asa: 1.52,
            sig_lg_asa: 0.13,
            u_lg_zsa: 0.58,
            sig_lg_zsa: 0.37,
            u_lg_zsd,
            sig_lg_zsd: 0.30,
            offset_zod,
            c_ds: 3.91e-9,
            c_asd: 2.0,
            c_asa: 3.0,
            c_zsa: 3.0,
            u_k: 0.0,
            sig_k: 0.0,
            r_tau: 1.7,
            u_xpr: 7.0,
            sig_xpr: 3.0,
            per_cluster_shadowing_std: 3.0,
            sqrt_c: matrix(&SQRT_C_RMA_NLOS),
        };
        if !o2i {
            return nlos;
        }
        ParameterSet {
            u_lg_ds: -7.47,
            sig_lg_ds: 0.24,
            u_lg_asd: 0.67,
            sig_lg_asd: 0.18,
            u_lg_asa: 1.66,
            sig_lg_asa: 0.21,
            u_lg_zsa: 0.93,
            sig_lg_zsa: 0.22,
            sqrt_c: matrix(&SQRT_C_RMA_O2I),
            ..nlos
        }
    }
}

fn uma(los: bool, o2i: bool, fc: f64, h_ut: f64, d2d: f64) -> ParameterSet {
    let lg_fc = fc.log10();
    let c_ds = f64::max(0.25, -3.4084 * lg_fc + 6.5622) * 1e-9;
    if los && !o2i {
        return ParameterSet {
            num_clusters: 12,
            rays_per_cluster: 20,
            u_lg_ds: -6.955 - 0.0963 * lg_fc,
            sig_lg_ds: 0.66,
            u_lg_asd: 1.06 + 0.1114 * lg_fc,
            sig_lg_asd: 0.28,
            u_lg_asa: 1.81,
            sig_lg_asa: 0.20,
            u_lg_zsa: 0.95,
            sig_lg_zsa: 0.16,
            u_lg_zsd: f64::max(-0.5, -2.1 * d2d / 1000.0 - 0.01 * (h_ut - 1.5) + 0.75),
            sig_lg_zsd: 0.40,
            offset_zod: 0.0,
            c_ds,
            c_asd: 5.0,
            c_asa: 11.0,
            c_zsa: 7.0,
            u_k: 9.0,
            sig_k: 3.5,
            r_tau: 2.5,
            u_xpr: 8.0,
            sig_xpr: 4.0,
            per_cluster_shadowing_std: 3.0,
            sqrt_c: matrix(&SQRT_C_UMA_LOS),
        };
    }

    let u_lg_zsd = f64::max(-0.5, -2.1 * d2d / 1000.0 - 0.01 * (h_ut - 1.5) + 0.9);
    let afc = 0.208 * lg_fc - 0.782;
    let bfc = 25.0;
    let cfc = -0.13 * lg_fc + 2.03;
    let efc = 7.66 * lg_fc - 5.96;
    let offset_zod = efc - 10f64.powf(afc * f64::max(bfc, d2d).log10() + cfc);

    if !o2i {
        ParameterSet {
            num_clusters: 20,
            rays_per_cluster: 20,
            u_lg_ds: -6.28 - 0.204 * lg_fc,
            sig_lg_ds: 0.39,
            u_lg_asd: 1.5 - 0.1144 * lg_fc,
            sig_lg_asd: 0.28,
            u_lg_asa: 2.08 - 0.27 * lg_fc,
            sig_lg_asa: 0.11,
            u_lg_zsa: -0.3236 * lg_fc + 1.512,
            sig_lg_zsa: 0.16,
            u_lg_zsd,
            sig_lg_zsd: 0.49,
            offset_zod,
            c_ds,
            c_asd: 2.0,
            c_asa: 15.0,
            c_zsa: 7.0,
            u_k: 0.0,
            sig_k: 0.0,
            r_tau: 2.3,
            u_xpr: 7.0,
            sig_xpr: 3.0,
            per_cluster_shadowing_std: 3.0,
            sqrt_c: matrix(&SQRT_C_UMA_NLOS),
        }
    } else {
        outdoor_to_indoor(u_lg_zsd, 0.49, offset_zod)
    }
}

fn umi(los: bool, o2i: bool, fc: f64, h_bs: f64, h_ut: f64, d2d: f64) -> ParameterSet {
    let lg_fc = (1.0 + fc).log10();
    if los && !o2i {
        return ParameterSet {
            num_clusters: 12,
            rays_per_cluster: 20,
            u_lg_ds: -0.24 * lg_fc - 7.14,
            sig_lg_ds: 0.38,
            u_lg_asd: -0.05 * lg_fc + 1.21,
            sig_lg_asd: 0.41,
            u_lg_asa: -0.08 * lg_fc + 1.73,
            sig_lg_asa: 0.014 * lg_fc + 0.28,
            u_lg_zsa: -0.1 * lg_fc + 0.73,
            sig_lg_zsa: -0.04 * lg_fc + 0.34,
            u_lg_zsd: f64::max(-0.21, -14.8 * d2d / 1000.0 + 0.01 * (h_ut - h_bs).abs() + 0.83),
            sig_lg_zsd: 0.35,
            offset_zod: 0.0,
            c_ds: 5e-9,
            c_asd: 3.0,
            c_asa: 17.0,
            c_zsa: 7.0,
            u_k: 9.0,
            sig_k: 5.0,
            r_tau: 3.0,
            u_xpr: 9.0,
            sig_xpr: 3.0,
            per_cluster_shadowing_std: 3.0,
            sqrt_c: matrix(&SQRT_C_UMI_LOS),
        };
    }

    let u_lg_zsd = f64::max(-0.5, -3.1 * d2d / 1000.0 + 0.01 * f64::max(h_ut - h_bs, 0.0) + 0.2);
    let offset_zod = -10f64.powf(-1.5 * f64::max(10.0, d2d).log10() + 3.3);

    if !o2i {
        ParameterSet {
            num_clusters: 19,
            rays_per_cluster: 20,
            u_lg_ds: -0.24 * lg_fc - 6.83,
            sig_lg_ds: 0.16 * lg_fc + 0.28,
            u_lg_asd: -0.23 * lg_fc + 1.53,
            sig_lg_asd: 0.11 * lg_fc + 0.33,
            u_lg_asa: -0.08 * lg_fc + 1.81,
            sig_lg_asa: 0.05 * lg_fc + 0.3,
            u_lg_zsa: -0.04 * lg_fc + 0.92,
            sig_lg_zsa: -0.07 * lg_fc + 0.41,
            u_lg_zsd,
            sig_lg_zsd: 0.35,
            offset_zod,
            c_ds: 11e-9,
            c_asd: 10.0,
            c_asa: 22.0,
            c_zsa: 7.0,
            u_k: 0.0,
            sig_k: 0.0,
            r_tau: 2.1,
            u_xpr: 8.0,
            sig_xpr: 3.0,
            per_cluster_shadowing_std: 3.0,
            sqrt_c: matrix(&SQRT_C_UMI_NLOS),
        }
    } else {
        outdoor_to_indoor(u_lg_zsd, 0.35, offset_zod)
    }
}

/// UMa and UMi O2I share everything but the ZSD statistics
fn outdoor_to_indoor(u_lg_zsd: f64, sig_lg_zsd: f64, offset_zod: f64) -> ParameterSet {
    ParameterSet {
        num_clusters: 12,
        rays_per_cluster: 20,
        u_lg_ds: -6.62,
        sig_lg_ds: 0.32,
        u_lg_asd: 1.25,
        sig_lg_asd: 0.42,
        u_lg_asa: 1.76,
        sig_lg_asa: 0.16,
        u_lg_zsa: 1.01,
        sig_lg_zsa: 0.43,
        u_lg_zsd,
        sig_lg_zsd,
        offset_zod,
        c_ds: 11e-9,
        c_asd: 5.0,
        c_asa: 8.0,
        c_zsa: 3.0,
        u_k: 0.0,
        sig_k: 0.0,
        r_tau: 2.2,
        u_xpr: 9.0,
        sig_xpr: 5.0,
        per_cluster_shadowing_std: 4.0,
        sqrt_c: matrix(&SQRT_C_O2I),
    }
}

fn indoor_office(los: bool, fc: f64) -> ParameterSet {
    let lg_fc = (1.0 + fc).log10();
    if los {
        ParameterSet {
            num_clusters: 15,
            rays_per_cluster: 20,
            u_lg_ds: -0.01 * lg_fc - 7.692,
            sig_lg_ds: 0.18,
            u_lg_asd: 1.60,
            sig_lg_asd: 0.18,
            u_lg_asa: -0.19 * lg_fc + 1.781,
            sig_lg_asa: 0.12 * lg_fc + 0.119,
            u_lg_zsa: -0.26 * lg_fc + 1.44,
            sig_lg_zsa: -0.04 * lg_fc + 0.264,
            u_lg_zsd: -1.43 * lg_fc + 2.228,
            sig_lg_zsd: 0.13 * lg_fc + 0.30,
            offset_zod: 0.0,
            c_ds: 3.91e-9,
            c_asd: 5.0,
            c_asa: 8.0,
            c_zsa: 9.0,
            u_k: 7.0,
            sig_k: 4.0,
            r_tau: 3.6,
            u_xpr: 11.0,
            sig_xpr: 4.0,
            per_cluster_shadowing_std: 6.0,
            sqrt_c: matrix(&SQRT_C_OFFICE_LOS),
        }
    } else {
        ParameterSet {
            num_clusters: 19,
            rays_per_cluster: 20,
            u_lg_ds: -0.28 * lg_fc - 7.173,
            sig_lg_ds: 0.1 * lg_fc + 0.055,
            u_lg_asd: 1.62,
            sig_lg_asd: 0.25,
            u_lg_asa: -0.11 * lg_fc + 1.863,
            sig_lg_asa: 0.12 * lg_fc + 0.059,
            u_lg_zsa: -0.15 * lg_fc + 1.387,
            sig_lg_zsa: -0.09 * lg_fc + 0.746,
            u_lg_zsd: 1.08,
            sig_lg_zsd: 0.36,
            offset_zod: 0.0,
            c_ds: 3.91e-9,
            c_asd: 5.0,
            c_asa: 11.0,
            c_zsa: 9.0,
            u_k: 0.0,
            sig_k: 0.0,
            r_tau: 3.0,
            u_xpr: 10.0,
            sig_xpr: 4.0,
            per_cluster_shadowing_std: 3.0,
            sqrt_c: matrix(&SQRT_C_OFFICE_NLOS),
        }
    }
}

/// V2V NLOS, shared by urban and (as a fallback) highway
fn v2v_nlos(lg_fc: f64) -> ParameterSet {
    ParameterSet {
        num_clusters: 19,
        rays_per_cluster: 20,
        u_lg_ds: -0.3 * lg_fc - 7.0,
        sig_lg_ds: 0.28,
        u_lg_asd: -0.08 * lg_fc + 1.81,
        sig_lg_asd: 0.05 * lg_fc + 0.3,
        u_lg_asa: -0.08 * lg_fc + 1.81,
        sig_lg_asa: 0.05 * lg_fc + 0.3,
        u_lg_zsa: -0.04 * lg_fc + 0.92,
        sig_lg_zsa: -0.07 * lg_fc + 0.41,
        u_lg_zsd: -0.04 * lg_fc + 0.92,
        sig_lg_zsd: -0.07 * lg_fc + 0.41,
        offset_zod: 0.0,
        c_ds: 11e-9,
        c_asd: 22.0,
        c_asa: 22.0,
        c_zsa: 7.0,
        u_k: 0.0,
        sig_k: 0.0,
        r_tau: 2.1,
        u_xpr: 8.0,
        sig_xpr: 3.0,
        per_cluster_shadowing_std: 4.0,
        sqrt_c: matrix(&SQRT_C_UMI_NLOS),
    }
}

fn v2v_urban(condition: &ChannelCondition, fc: f64) -> ParameterSet {
    let lg_fc = (1.0 + fc).log10();
    if condition.is_los() {
        ParameterSet {
            num_clusters: 12,
            rays_per_cluster: 20,
            u_lg_ds: -0.2 * lg_fc - 7.5,
            sig_lg_ds: 0.1,
            u_lg_asd: -0.1 * lg_fc + 1.6,
            sig_lg_asd: 0.1,
            u_lg_asa: -0.1 * lg_fc + 1.6,
            sig_lg_asa: 0.1,
            u_lg_zsa: -0.1 * lg_fc + 0.73,
            sig_lg_zsa: -0.04 * lg_fc + 0.34,
            u_lg_zsd: -0.1 * lg_fc + 0.73,
            sig_lg_zsd: -0.04 * lg_fc + 0.34,
            offset_zod: 0.0,
            c_ds: 5e-9,
            c_asd: 17.0,
            c_asa: 17.0,
            c_zsa: 7.0,
            u_k: 3.48,
            sig_k: 2.0,
            r_tau: 3.0,
            u_xpr: 9.0,
            sig_xpr: 3.0,
            per_cluster_shadowing_std: 4.0,
            sqrt_c: matrix(&SQRT_C_UMI_LOS),
        }
    } else if condition.is_nlosv() {
        ParameterSet {
            u_lg_ds: -0.4 * lg_fc - 7.0,
            sig_lg_ds: 0.1,
            u_lg_asd: -0.1 * lg_fc + 1.7,
            sig_lg_asd: 0.1,
            u_lg_asa: -0.1 * lg_fc + 1.7,
            sig_lg_asa: 0.1,
            sig_k: 4.5,
            ..v2v_nlos(lg_fc)
        }
    } else {
        v2v_nlos(lg_fc)
    }
}

fn v2v_highway(condition: &ChannelCondition, fc: f64) -> ParameterSet {
    let lg_fc = (1.0 + fc).log10();
    if condition.is_los() {
        ParameterSet {
            num_clusters: 12,
            rays_per_cluster: 20,
            u_lg_ds: -8.3,
            sig_lg_ds: 0.2,
            u_lg_asd: 1.4,
            sig_lg_asd: 0.1,
            u_lg_asa: 1.4,
            sig_lg_asa: 0.1,
            u_lg_zsa: -0.1 * lg_fc + 0.73,
            sig_lg_zsa: -0.04 * lg_fc + 0.34,
            u_lg_zsd: -0.1 * lg_fc + 0.73,
            sig_lg_zsd: -0.04 * lg_fc + 0.34,
            offset_zod: 0.0,
            c_ds: 5e-9,
            c_asd: 17.0,
            c_asa: 17.0,
            c_zsa: 7.0,
            u_k: 9.0,
            sig_k: 3.5,
            r_tau: 3.0,
            u_xpr: 9.0,
            sig_xpr: 3.0,
            per_cluster_shadowing_std: 4.0,
            sqrt_c: matrix(&SQRT_C_UMI_LOS),
        }
    } else if condition.is_nlosv() {
        ParameterSet {
            u_lg_ds: -8.3,
            sig_lg_ds: 0.3,
            u_lg_asd: 1.5,
            sig_lg_asd: 0.1,
            u_lg_asa: 1.5,
            sig_lg_asa: 0.1,
            sig_k: 4.5,
            ..v2v_nlos(lg_fc)
        }
    } else {
        warn!(
            "NLOS fast fading parameters for V2V-Highway are not defined in TR 37.885, \
             using the R1-1803671 values"
        );
        v2v_nlos(lg_fc)
    }
}

/// Azimuth scaling factor C_phi^NLOS (Table 7.5-2)
pub fn c_phi_nlos(num_clusters: usize) -> Result<f64> {
    match num_clusters {
        4 => Ok(0.779),
        5 => Ok(0.860),
        8 => Ok(1.018),
        10 => Ok(1.090),
        11 => Ok(1.123),
        12 => Ok(1.146),
        14 => Ok(1.190),
        15 => Ok(1.221),
        16 => Ok(1.226),
        19 => Ok(1.273),
        20 => Ok(1.289),
        n => Err(ChannelError::InvalidClusterCount(n)),
    }
}

/// Zenith scaling factor C_theta^NLOS (Table 7.5-4)
pub fn c_theta_nlos(num_clusters: usize) -> Result<f64> {
    match num_clusters {
        8 => Ok(0.889),
        10 => Ok(0.957),
        11 => Ok(1.031),
        12 => Ok(1.104),
        15 => Ok(1.1088),
        19 => Ok(1.184),
        20 => Ok(1.178),
        n => Err(ChannelError::InvalidClusterCount(n)),
    }
}
