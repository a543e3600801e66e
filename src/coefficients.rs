//! Channel coefficients per element pair and cluster (TR 38.901 7.5 step 11)

use num_complex::Complex64;
use std::f64::consts::PI;

use crate::antenna::PhasedArray;
use crate::clusters::{sub_cluster_of, Clusters, Polarisation};
use crate::geometry::{Angles, Vector3};

/// Coefficients indexed [rx element][tx element][cluster]
pub type CoefficientTensor = Vec<Vec<Vec<Complex64>>>;

/// Direct path of a LOS link
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LosRay {
    pub arrival: Angles,
    pub departure: Angles,
    pub distance_3d: f64,
    pub wavelength: f64,
    /// Ricean K-factor, linear
    pub k_linear: f64,
    /// Blockage loss of the first cluster in dB
    pub attenuation_db: f64,
}

/// Ray direction and element-independent polarisation term
struct RayTerm {
    arrival: Vector3,
    departure: Vector3,
    polarisation: Complex64,
    sub_cluster: usize,
}

fn polarisation_term(rx: (f64, f64), tx: (f64, f64), xpr: f64, phases: &[f64; 4]) -> Complex64 {
    let (rx_phi, rx_theta) = rx;
    let (tx_phi, tx_theta) = tx;
    let cross = (1.0 / xpr).sqrt();

    Complex64::cis(phases[0]) * (rx_theta * tx_theta)
        + Complex64::cis(phases[1]) * (cross * rx_theta * tx_phi)
        + Complex64::cis(phases[2]) * (cross * rx_phi * tx_theta)
        + Complex64::cis(phases[3]) * (rx_phi * tx_phi)
}

#[inline]
fn element_phase(direction: &Vector3, location: &Vector3) -> f64 {
    2.0 * PI * direction.dot(location)
}

/// Sum the rays of every cluster for every receive/transmit element pair.
///
/// The two strongest clusters are split into three sub-clusters; the first
/// stays at the parent index and the other two are appended in cluster
/// order. `clusters` must not have its sub-clusters appended yet.
pub fn synthesize(
    clusters: &Clusters,
    polarisation: &Polarisation,
    strongest: (usize, usize),
    rx: &dyn PhasedArray,
    tx: &dyn PhasedArray,
    los: Option<&LosRay>,
) -> CoefficientTensor {
    let num_clusters = clusters.len();
    let (first, second) = strongest;
    let rays = &clusters.rays;

    let terms: Vec<Vec<RayTerm>> = (0..num_clusters)
        .map(|n| {
            (0..rays.aoa[n].len())
                .map(|m| {
                    let arrival = Angles::new(rays.aoa[n][m], rays.zoa[n][m]);
                    let departure = Angles::new(rays.aod[n][m], rays.zod[n][m]);
                    RayTerm {
                        arrival: arrival.unit_vector(),
                        departure: departure.unit_vector(),
                        polarisation: polarisation_term(
                            rx.element_field_pattern(&arrival),
                            tx.element_field_pattern(&departure),
                            polarisation.xpr[n][m],
                            &polarisation.phases[n][m],
                        ),
                        sub_cluster: sub_cluster_of(m),
                    }
                })
                .collect()
        })
        .collect();

    let los_term = los.map(|ray| {
        let (rx_phi, rx_theta) = rx.element_field_pattern(&ray.arrival);
        let (tx_phi, tx_theta) = tx.element_field_pattern(&ray.departure);
        let specular = Complex64::cis(-2.0 * PI * ray.distance_3d / ray.wavelength)
            * (rx_theta * tx_theta - rx_phi * tx_phi);
        (ray, specular)
    });

    let rx_locations: Vec<Vector3> = (0..rx.num_elements()).map(|u| rx.element_location(u)).collect();
    let tx_locations: Vec<Vector3> = (0..tx.num_elements()).map(|s| tx.element_location(s)).collect();

    rx_locations
        .iter()
        .map(|u_loc| {
            tx_locations
                .iter()
                .map(|s_loc| {
                    let mut h = Vec::with_capacity(num_clusters + 4);
                    let mut appended = Vec::with_capacity(4);

                    for (n, cluster) in terms.iter().enumerate() {
                        let scale = (clusters.powers[n] / cluster.len() as f64).sqrt();
                        let mut sums = [Complex64::new(0.0, 0.0); 3];
                        for ray in cluster {
                            let phase = element_phase(&ray.arrival, u_loc) + element_phase(&ray.departure, s_loc);
                            sums[ray.sub_cluster] += ray.polarisation * Complex64::cis(phase);
                        }

                        if n == first || n == second {
                            h.push(sums[0] * scale);
                            appended.push(sums[1] * scale);
                            appended.push(sums[2] * scale);
                        } else {
                            h.push((sums[0] + sums[1] + sums[2]) * scale);
                        }
                    }
                    h.extend(appended);

                    if let Some((ray, specular)) = &los_term {
                        let phase = element_phase(&ray.arrival.unit_vector(), u_loc)
                            + element_phase(&ray.departure.unit_vector(), s_loc);
                        let direct = specular * Complex64::cis(phase);
                        let k = ray.k_linear;

                        let scattered = (1.0 / (k + 1.0)).sqrt();
                        for coefficient in h.iter_mut() {
                            *coefficient *= scattered;
                        }
                        h[0] += (k / (k + 1.0)).sqrt() * direct / 10f64.powf(ray.attenuation_db / 10.0);
                    }
                    h
                })
                .collect()
        })
        .collect()
}
