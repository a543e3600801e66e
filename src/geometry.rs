//! Positions, bearings and angle wrapping

use rustler::NifStruct;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Cartesian vector in metres (positions) or wavelengths (element offsets)
#[derive(NifStruct, Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[module = "MinutemodemSimnet.Physics.Types.Vector3"]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn sub(&self, other: &Vector3) -> Vector3 {
        Vector3::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }

    pub fn norm(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Horizontal distance to another point
    pub fn distance_2d(&self, other: &Vector3) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn dot(&self, other: &Vector3) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }
}

/// A node taking part in a link: identity plus current position
#[derive(NifStruct, Debug, Clone, Copy, PartialEq)]
#[module = "MinutemodemSimnet.Physics.Types.Endpoint"]
pub struct Endpoint {
    pub node_id: u32,
    pub position: Vector3,
}

impl Endpoint {
    pub fn new(node_id: u32, position: Vector3) -> Self {
        Self { node_id, position }
    }
}

/// Azimuth in [0, 2π) and inclination in [0, π], both radians.
/// Inclination is measured from the +z axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Angles {
    pub azimuth: f64,
    pub inclination: f64,
}

impl Angles {
    pub fn new(azimuth: f64, inclination: f64) -> Self {
        Self { azimuth, inclination }
    }

    /// Direction of `target` as seen from `origin`
    pub fn between(target: &Vector3, origin: &Vector3) -> Self {
        let d = target.sub(origin);
        let r = d.norm();
        let azimuth = wrap_to_2pi(d.y.atan2(d.x));
        let inclination = if r > 0.0 { (d.z / r).clamp(-1.0, 1.0).acos() } else { 0.0 };
        Self { azimuth, inclination }
    }

    pub fn azimuth_deg(&self) -> f64 {
        self.azimuth.to_degrees()
    }

    pub fn inclination_deg(&self) -> f64 {
        self.inclination.to_degrees()
    }

    /// Unit vector pointing along this direction
    pub fn unit_vector(&self) -> Vector3 {
        let (sin_t, cos_t) = self.inclination.sin_cos();
        let (sin_p, cos_p) = self.azimuth.sin_cos();
        Vector3::new(sin_t * cos_p, sin_t * sin_p, cos_t)
    }
}

/// Geometry of one link. Endpoint `a` transmits (s), `b` receives (u).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkGeometry {
    /// Direction of the transmitter seen from the receiver
    pub arrival: Angles,
    /// Direction of the receiver seen from the transmitter
    pub departure: Angles,
    pub distance_2d: f64,
    pub distance_3d: f64,
    /// Height of the higher endpoint
    pub h_bs: f64,
    /// Height of the lower endpoint
    pub h_ut: f64,
    /// Position of the lower endpoint, used as the user terminal location
    pub ut_location: Vector3,
}

impl LinkGeometry {
    pub fn new(a: &Endpoint, b: &Endpoint) -> Self {
        let (pa, pb) = (a.position, b.position);
        let distance_2d = pa.distance_2d(&pb);
        let h_bs = pa.z.max(pb.z);
        let h_ut = pa.z.min(pb.z);
        let ut_location = if pa.z <= pb.z { pa } else { pb };

        Self {
            arrival: Angles::between(&pa, &pb),
            departure: Angles::between(&pb, &pa),
            distance_2d,
            distance_3d: (distance_2d * distance_2d + (h_bs - h_ut) * (h_bs - h_ut)).sqrt(),
            h_bs,
            h_ut,
            ut_location,
        }
    }
}

/// Wrap to [0, 2π)
#[inline]
pub fn wrap_to_2pi(angle: f64) -> f64 {
    let a = angle.rem_euclid(2.0 * PI);
    // rem_euclid can round up to exactly 2π for tiny negative inputs
    if a >= 2.0 * PI {
        0.0
    } else {
        a
    }
}

/// Wrap to [0, 360)
#[inline]
pub fn wrap_to_360(angle_deg: f64) -> f64 {
    let a = angle_deg.rem_euclid(360.0);
    if a >= 360.0 {
        0.0
    } else {
        a
    }
}

/// Wrap a ray direction so inclination lands in [0, π]. Reflecting the
/// inclination across the pole flips the azimuth by π.
pub fn wrap_angles(azimuth_rad: f64, inclination_rad: f64) -> Angles {
    let mut inclination = wrap_to_2pi(inclination_rad);
    let mut azimuth = azimuth_rad;
    if inclination > PI {
        inclination -= PI;
        azimuth += PI;
    }
    let azimuth = wrap_to_2pi(azimuth);

    assert!(
        (0.0..=PI).contains(&inclination),
        "inclination {} not valid, should be in [0, pi]",
        inclination
    );
    assert!(
        (0.0..2.0 * PI).contains(&azimuth),
        "azimuth {} not valid, should be in [0, 2pi)",
        azimuth
    );

    Angles::new(azimuth, inclination)
}

/// Wrap a cluster azimuth into [0, 360)
pub fn wrap_azimuth_deg(angle_deg: f64) -> f64 {
    let a = wrap_to_360(angle_deg);
    assert!((0.0..360.0).contains(&a), "azimuth {} outside [0, 360)", a);
    a
}

/// Signed azimuth difference `a - b` in degrees, taken the short way
/// round into [-180, 180)
pub fn azimuth_offset_deg(a: f64, b: f64) -> f64 {
    (a - b + 180.0).rem_euclid(360.0) - 180.0
}

/// Wrap a cluster zenith into [0, 180] by reflection
pub fn wrap_zenith_deg(angle_deg: f64) -> f64 {
    let mut a = wrap_to_360(angle_deg);
    if a > 180.0 {
        a = 360.0 - a;
    }
    assert!((0.0..=180.0).contains(&a), "zenith {} outside [0, 180]", a);
    a
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_angles_between_horizontal() {
        let a = Vector3::new(0.0, 0.0, 10.0);
        let b = Vector3::new(100.0, 0.0, 10.0);

        let ab = Angles::between(&b, &a);
        assert!(ab.azimuth.abs() < 1e-12);
        assert!((ab.inclination - PI / 2.0).abs() < 1e-12);

        let ba = Angles::between(&a, &b);
        assert!((ba.azimuth - PI).abs() < 1e-12);
    }

    #[test]
    fn test_angles_between_elevated() {
        let bs = Vector3::new(0.0, 0.0, 25.0);
        let ut = Vector3::new(0.0, 100.0, 1.5);
        let down = Angles::between(&ut, &bs);
        assert!((down.azimuth - PI / 2.0).abs() < 1e-12);
        assert!(down.inclination > PI / 2.0, "UT is below the BS");
    }

    #[test]
    fn test_azimuth_offset_short_way() {
        assert_eq!(azimuth_offset_deg(10.0, 350.0), 20.0);
        assert_eq!(azimuth_offset_deg(350.0, 10.0), -20.0);
        assert_eq!(azimuth_offset_deg(100.0, 40.0), 60.0);
        assert_eq!(azimuth_offset_deg(220.0, 40.0), -180.0);
    }

    #[test]
    fn test_wrap_to_360() {
        assert_eq!(wrap_to_360(0.0), 0.0);
        assert_eq!(wrap_to_360(360.0), 0.0);
        assert!((wrap_to_360(-10.0) - 350.0).abs() < 1e-12);
        assert!((wrap_to_360(725.0) - 5.0).abs() < 1e-12);
        assert!(wrap_to_360(-1e-18) < 360.0);
    }

    #[test]
    fn test_wrap_zenith_reflects() {
        assert!((wrap_zenith_deg(190.0) - 170.0).abs() < 1e-12);
        assert!((wrap_zenith_deg(-10.0) - 10.0).abs() < 1e-12);
        assert_eq!(wrap_zenith_deg(180.0), 180.0);
    }

    #[test]
    fn test_wrap_angles_flips_azimuth() {
        let wrapped = wrap_angles(0.1, 1.5 * PI);
        assert!((wrapped.inclination - 0.5 * PI).abs() < 1e-12);
        assert!((wrapped.azimuth - (0.1 + PI)).abs() < 1e-12);

        let negative = wrap_angles(-0.1, -0.2);
        assert!((0.0..=PI).contains(&negative.inclination));
        assert!((0.0..2.0 * PI).contains(&negative.azimuth));
    }

    #[test]
    fn test_link_geometry_heights_and_bearings() {
        let bs = Endpoint::new(1, Vector3::new(0.0, 0.0, 25.0));
        let ut = Endpoint::new(2, Vector3::new(30.0, 40.0, 1.5));
        let link = LinkGeometry::new(&bs, &ut);

        assert_eq!(link.h_bs, 25.0);
        assert_eq!(link.h_ut, 1.5);
        assert_eq!(link.ut_location, ut.position);
        assert!((link.distance_2d - 50.0).abs() < 1e-12);
        assert!((link.distance_3d - (2500.0f64 + 23.5 * 23.5).sqrt()).abs() < 1e-12);

        // Arrival and departure point at each other
        let diff = (link.arrival.azimuth - link.departure.azimuth).abs();
        assert!((diff - PI).abs() < 1e-12);
        assert!((link.arrival.inclination + link.departure.inclination - PI).abs() < 1e-12);
    }

    #[test]
    fn test_unit_vector() {
        let up = Angles::new(0.0, 0.0).unit_vector();
        assert!((up.z - 1.0).abs() < 1e-12);
        let east = Angles::new(0.0, PI / 2.0).unit_vector();
        assert!((east.x - 1.0).abs() < 1e-12);
    }
}
