//! Phased antenna array interface
//!
//! The channel model only needs element positions and the polarised field
//! pattern of each element. Radiation patterns are the caller's business;
//! `UniformPlanarArray` ships isotropic elements so the NIF layer and tests
//! have something concrete to hand in.

use rustler::NifStruct;
use serde::{Deserialize, Serialize};

use crate::geometry::{Angles, Vector3};

/// Antenna array as seen by the channel model
pub trait PhasedArray: Send + Sync {
    /// Number of antenna elements
    fn num_elements(&self) -> usize;

    /// Element offset from the array reference point, in wavelengths
    fn element_location(&self, index: usize) -> Vector3;

    /// Field pattern of an element in the global coordinate system
    ///
    /// # Returns
    /// Tuple of (phi component, theta component)
    fn element_field_pattern(&self, angles: &Angles) -> (f64, f64);
}

/// Uniform planar array of isotropic elements (TR 38.901 7.1, 7.3)
#[derive(NifStruct, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[module = "MinutemodemSimnet.Physics.Types.UniformPlanarArray"]
pub struct UniformPlanarArray {
    pub rows: u32,
    pub columns: u32,
    /// Horizontal element spacing in wavelengths
    pub h_spacing: f64,
    /// Vertical element spacing in wavelengths
    pub v_spacing: f64,
    /// Array bearing (alpha) in radians
    pub bearing: f64,
    /// Array downtilt (beta) in radians
    pub downtilt: f64,
    /// Polarisation slant (zeta) in radians, 0 = vertical
    pub polarization_slant: f64,
}

impl Default for UniformPlanarArray {
    fn default() -> Self {
        Self {
            rows: 1,
            columns: 1,
            h_spacing: 0.5,
            v_spacing: 0.5,
            bearing: 0.0,
            downtilt: 0.0,
            polarization_slant: 0.0,
        }
    }
}

impl UniformPlanarArray {
    /// Half-wavelength spaced rows x columns array facing +x
    pub fn new(rows: u32, columns: u32) -> Self {
        Self {
            rows,
            columns,
            ..Default::default()
        }
    }

    /// Single isotropic element
    pub fn single_element() -> Self {
        Self::default()
    }
}

impl PhasedArray for UniformPlanarArray {
    fn num_elements(&self) -> usize {
        (self.rows * self.columns) as usize
    }

    fn element_location(&self, index: usize) -> Vector3 {
        assert!(index < self.num_elements(), "element index {} out of range", index);

        let columns = self.columns.max(1) as usize;
        let col = (index % columns) as f64;
        let row = (index / columns) as f64;
        let (sin_a, cos_a) = self.bearing.sin_cos();
        let (sin_b, cos_b) = self.downtilt.sin_cos();

        Vector3::new(
            -self.h_spacing * col * sin_a + self.v_spacing * row * sin_b * cos_a,
            self.h_spacing * col * cos_a + self.v_spacing * row * sin_b * sin_a,
            self.v_spacing * row * cos_b,
        )
    }

    fn element_field_pattern(&self, angles: &Angles) -> (f64, f64) {
        let (sin_b, cos_b) = self.downtilt.sin_cos();
        let (sin_t, cos_t) = angles.inclination.sin_cos();
        let (sin_dp, cos_dp) = (angles.azimuth - self.bearing).sin_cos();

        // Isotropic element: unit field magnitude in the local system
        let gain = 1.0;
        let (sin_z, cos_z) = self.polarization_slant.sin_cos();
        let field_theta_local = gain * cos_z;
        let field_phi_local = gain * sin_z;

        // Rotation from LCS to GCS polarisation basis (eq. 7.1-15)
        let psi = (sin_b * sin_dp).atan2(cos_b * sin_t - sin_b * cos_t * cos_dp);
        let (sin_psi, cos_psi) = psi.sin_cos();

        let field_theta = cos_psi * field_theta_local - sin_psi * field_phi_local;
        let field_phi = sin_psi * field_theta_local + cos_psi * field_phi_local;

        (field_phi, field_theta)
    }
}
