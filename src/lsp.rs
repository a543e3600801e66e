//! Correlated large scale parameters (TR 38.901 7.5 step 4)

use crate::condition::ChannelCondition;
use crate::params::ParameterSet;
use crate::streams::RandomStreams;

/// Azimuth spreads are capped at 104 degrees
pub const MAX_AZIMUTH_SPREAD_DEG: f64 = 104.0;
/// Zenith spreads are capped at 52 degrees
pub const MAX_ZENITH_SPREAD_DEG: f64 = 52.0;

/// One draw of the large scale parameters for a link
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LargeScaleParameters {
    /// Correlated shadowing normal, left for the propagation loss model
    pub shadowing: f64,
    /// Ricean K-factor in dB, 0 for non-LOS links
    pub k_factor_db: f64,
    /// Delay spread in seconds
    pub delay_spread: f64,
    /// Azimuth spread of departure in degrees
    pub asd: f64,
    /// Azimuth spread of arrival in degrees
    pub asa: f64,
    /// Zenith spread of departure in degrees
    pub zsd: f64,
    /// Zenith spread of arrival in degrees
    pub zsa: f64,
}

impl LargeScaleParameters {
    /// Draw independent normals, correlate them through the square-root
    /// matrix and map each onto its distribution.
    ///
    /// Order is [SF, K, DS, ASD, ASA, ZSD, ZSA], K only present when the
    /// condition has a direct ray.
    pub fn draw(params: &ParameterSet, condition: &ChannelCondition, streams: &mut RandomStreams) -> Self {
        let los = condition.has_los_ray();
        let n = params.num_lsps();
        assert_eq!(
            n,
            if los { 7 } else { 6 },
            "{} parameters drawn for a {} link",
            n,
            condition
        );
        let independent: Vec<f64> = (0..n).map(|_| streams.normal()).collect();

        let correlated: Vec<f64> = params
            .sqrt_c
            .iter()
            .map(|row| row.iter().zip(&independent).map(|(c, x)| c * x).sum())
            .collect();

        let (k_factor_db, spreads) = if los {
            (correlated[1] * params.sig_k + params.u_k, &correlated[2..])
        } else {
            (0.0, &correlated[1..])
        };

        let log_normal = |x: f64, mu: f64, sigma: f64| 10f64.powf(x * sigma + mu);

        Self {
            shadowing: correlated[0],
            k_factor_db,
            delay_spread: log_normal(spreads[0], params.u_lg_ds, params.sig_lg_ds),
            asd: log_normal(spreads[1], params.u_lg_asd, params.sig_lg_asd).min(MAX_AZIMUTH_SPREAD_DEG),
            asa: log_normal(spreads[2], params.u_lg_asa, params.sig_lg_asa).min(MAX_AZIMUTH_SPREAD_DEG),
            zsd: log_normal(spreads[3], params.u_lg_zsd, params.sig_lg_zsd).min(MAX_ZENITH_SPREAD_DEG),
            zsa: log_normal(spreads[4], params.u_lg_zsa, params.sig_lg_zsa).min(MAX_ZENITH_SPREAD_DEG),
        }
    }

    /// K-factor as a linear power ratio
    pub fn k_linear(&self) -> f64 {
        10f64.powf(self.k_factor_db / 10.0)
    }
}
