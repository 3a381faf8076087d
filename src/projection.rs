// ABOUTME: Texas Central state plane (ESRI:102739, US feet) to WGS-84 conversion
// ABOUTME: Inverse Lambert Conformal Conic on the GRS80 ellipsoid

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

/// Meters per US survey foot.
const US_SURVEY_FOOT: f64 = 1200.0 / 3937.0;

/// GRS80 semi-major axis in meters.
const SEMI_MAJOR: f64 = 6_378_137.0;
const INVERSE_FLATTENING: f64 = 298.257_222_101;

/// Parameters of a two-standard-parallel Lambert Conformal Conic projection.
#[derive(Debug, Clone, Copy)]
pub struct LambertConformalConic {
    /// Eccentricity of the ellipsoid
    e: f64,
    /// Cone constant
    n: f64,
    /// a * F
    af: f64,
    /// Radius at the latitude of origin
    rho0: f64,
    central_meridian: f64,
    false_easting_m: f64,
    false_northing_m: f64,
    unit_to_meters: f64,
}

impl LambertConformalConic {
    /// NAD 1983 StatePlane Texas Central FIPS 4203, US survey feet.
    pub fn texas_central() -> Self {
        Self::new(
            30.0 + 7.0 / 60.0,
            31.0 + 53.0 / 60.0,
            29.0 + 40.0 / 60.0,
            -(100.0 + 20.0 / 60.0),
            2_296_583.333_333_333,
            9_842_500.0,
            US_SURVEY_FOOT,
        )
    }

    /// Angles in degrees, false origin in projection units.
    pub fn new(
        standard_parallel_1: f64,
        standard_parallel_2: f64,
        latitude_of_origin: f64,
        central_meridian: f64,
        false_easting: f64,
        false_northing: f64,
        unit_to_meters: f64,
    ) -> Self {
        let f = 1.0 / INVERSE_FLATTENING;
        let e = (2.0 * f - f * f).sqrt();

        let phi1 = standard_parallel_1.to_radians();
        let phi2 = standard_parallel_2.to_radians();
        let phi0 = latitude_of_origin.to_radians();

        let (m1, m2) = (m(e, phi1), m(e, phi2));
        let (t0, t1, t2) = (t(e, phi0), t(e, phi1), t(e, phi2));

        let n = (m1.ln() - m2.ln()) / (t1.ln() - t2.ln());
        let big_f = m1 / (n * t1.powf(n));
        let af = SEMI_MAJOR * big_f;

        Self {
            e,
            n,
            af,
            rho0: af * t0.powf(n),
            central_meridian: central_meridian.to_radians(),
            false_easting_m: false_easting * unit_to_meters,
            false_northing_m: false_northing * unit_to_meters,
            unit_to_meters,
        }
    }

    /// Project easting/northing back to `(latitude, longitude)` in degrees.
    pub fn inverse(&self, easting: f64, northing: f64) -> (f64, f64) {
        let x = easting * self.unit_to_meters - self.false_easting_m;
        let y = self.rho0 - (northing * self.unit_to_meters - self.false_northing_m);

        let rho = (x * x + y * y).sqrt().copysign(self.n);
        let t_prime = (rho / self.af).powf(1.0 / self.n);
        let theta = x.atan2(y);
        let longitude = theta / self.n + self.central_meridian;

        let half_e = self.e / 2.0;
        let mut phi = FRAC_PI_2 - 2.0 * t_prime.atan();
        for _ in 0..15 {
            let es = self.e * phi.sin();
            let next = FRAC_PI_2 - 2.0 * (t_prime * ((1.0 - es) / (1.0 + es)).powf(half_e)).atan();
            if (next - phi).abs() < 1e-12 {
                phi = next;
                break;
            }
            phi = next;
        }

        (phi.to_degrees(), longitude.to_degrees())
    }

    /// Like [`inverse`](Self::inverse) but yields `None` for non-finite input
    /// or output, so missing coordinates never turn into a bogus point.
    pub fn try_inverse(&self, easting: f64, northing: f64) -> Option<(f64, f64)> {
        if !easting.is_finite() || !northing.is_finite() {
            return None;
        }
        let (lat, lon) = self.inverse(easting, northing);
        (lat.is_finite() && lon.is_finite()).then_some((lat, lon))
    }
}

fn m(e: f64, phi: f64) -> f64 {
    let es = e * phi.sin();
    phi.cos() / (1.0 - es * es).sqrt()
}

fn t(e: f64, phi: f64) -> f64 {
    let es = e * phi.sin();
    (FRAC_PI_4 - phi / 2.0).tan() / ((1.0 - es) / (1.0 + es)).powf(e / 2.0)
}
