// tl-core/src/units.rs
//
// Plant math runs in plain f64 on the imperial flight-dynamics convention
// (ft, slug, lbf, s, rad). These uom types are used where values cross the
// configuration boundary (CLI flags, YAML) and need a unit conversion.

use uom::si::f64::{
    Acceleration as UomAcceleration, Angle as UomAngle, AngularVelocity as UomAngularVelocity,
    Length as UomLength, Velocity as UomVelocity,
};

pub type Accel = UomAcceleration;
pub type Angle = UomAngle;
pub type AngularRate = UomAngularVelocity;
pub type Length = UomLength;
pub type Velocity = UomVelocity;

#[inline]
pub fn deg(v: f64) -> Angle {
    use uom::si::angle::degree;
    Angle::new::<degree>(v)
}

#[inline]
pub fn rad(v: f64) -> Angle {
    use uom::si::angle::radian;
    Angle::new::<radian>(v)
}

#[inline]
pub fn fps(v: f64) -> Velocity {
    use uom::si::velocity::foot_per_second;
    Velocity::new::<foot_per_second>(v)
}

#[inline]
pub fn kts(v: f64) -> Velocity {
    use uom::si::velocity::knot;
    Velocity::new::<knot>(v)
}

#[inline]
pub fn ft(v: f64) -> Length {
    use uom::si::length::foot;
    Length::new::<foot>(v)
}

#[inline]
pub fn dps(v: f64) -> AngularRate {
    use uom::si::angular_velocity::degree_per_second;
    AngularRate::new::<degree_per_second>(v)
}

/// Angle in radians, the unit every plant quantity uses.
#[inline]
pub fn to_rad(a: Angle) -> f64 {
    use uom::si::angle::radian;
    a.get::<radian>()
}

#[inline]
pub fn to_deg(a: Angle) -> f64 {
    use uom::si::angle::degree;
    a.get::<degree>()
}

#[inline]
pub fn to_fps(v: Velocity) -> f64 {
    use uom::si::velocity::foot_per_second;
    v.get::<foot_per_second>()
}

#[inline]
pub fn to_ft(l: Length) -> f64 {
    use uom::si::length::foot;
    l.get::<foot>()
}

#[inline]
pub fn to_rps(w: AngularRate) -> f64 {
    use uom::si::angular_velocity::radian_per_second;
    w.get::<radian_per_second>()
}

pub mod constants {
    use super::*;

    /// Standard gravity, ft/s^2.
    pub const G0_FPS2: f64 = 32.174;

    /// Pounds-force per slug at standard gravity.
    pub const SLUG_TO_LB: f64 = 32.174_049;

    /// WGS84 gravitational parameter, ft^3/s^2.
    pub const GM_WGS84_FT3_S2: f64 = 14.076_441_80e15;

    /// Equatorial reference radius, ft.
    pub const RADIUS_REFERENCE_FT: f64 = 20_925_646.325_46;

    /// Sea-level standard density, slug/ft^3.
    pub const RHO0_SLUG_FT3: f64 = 0.002_376_9;

    #[inline]
    pub fn g0() -> Accel {
        use uom::si::acceleration::foot_per_second_squared;
        Accel::new::<foot_per_second_squared>(G0_FPS2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degree_radian_round_trip() {
        let a = deg(20.0);
        assert!((to_rad(a) - 20.0_f64.to_radians()).abs() < 1e-15);
        assert!((to_deg(rad(std::f64::consts::PI)) - 180.0).abs() < 1e-12);
    }

    #[test]
    fn knots_to_feet_per_second() {
        // 1 kt = 1.687 809 857 ft/s
        assert!((to_fps(kts(100.0)) - 168.780_985_7).abs() < 1e-6);
        assert!((to_ft(ft(1000.0)) - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn g0_matches_constant() {
        use uom::si::acceleration::foot_per_second_squared;
        let g = constants::g0().get::<foot_per_second_squared>();
        assert!((g - constants::G0_FPS2).abs() < 1e-9);
    }

    #[test]
    fn degree_rate_to_radian_rate() {
        assert!((to_rps(dps(180.0)) - std::f64::consts::PI).abs() < 1e-12);
    }
}
