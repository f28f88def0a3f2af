//! Frame conversions between TEME, ECEF and WGS-84 geodetic coordinates.
//!
//! Vectors are plain `[f64; 3]` in meters (or m/s) unless a name says `_km`.

use crate::orbit::GeodeticPosition;

pub const EARTH_ROTATION_RAD_S: f64 = 7.292_115e-5;
/// WGS-84 semi-major axis in meters
pub const WGS84_A: f64 = 6_378_137.0;
/// WGS-84 first eccentricity squared
pub const WGS84_E2: f64 = 0.006_694_379_990_14;

pub fn teme_to_ecef_position(pos_teme: [f64; 3], gmst: f64) -> [f64; 3] {
    let cos_gmst = gmst.cos();
    let sin_gmst = gmst.sin();
    [
        pos_teme[0] * cos_gmst + pos_teme[1] * sin_gmst,
        -pos_teme[0] * sin_gmst + pos_teme[1] * cos_gmst,
        pos_teme[2],
    ]
}

/// Rotate a TEME velocity into ECEF, removing the Earth-rotation term.
/// Units of the result follow the units of the inputs.
pub fn teme_to_ecef_velocity(pos_teme: [f64; 3], vel_teme: [f64; 3], gmst: f64) -> [f64; 3] {
    let cos_gmst = gmst.cos();
    let sin_gmst = gmst.sin();
    let pos = teme_to_ecef_position(pos_teme, gmst);
    let rotated = [
        vel_teme[0] * cos_gmst + vel_teme[1] * sin_gmst,
        -vel_teme[0] * sin_gmst + vel_teme[1] * cos_gmst,
        vel_teme[2],
    ];
    let rotation = [
        -EARTH_ROTATION_RAD_S * pos[1],
        EARTH_ROTATION_RAD_S * pos[0],
        0.0,
    ];
    [
        rotated[0] - rotation[0],
        rotated[1] - rotation[1],
        rotated[2] - rotation[2],
    ]
}

pub fn geodetic_to_ecef(position: &GeodeticPosition) -> [f64; 3] {
    let lat = position.latitude_deg.to_radians();
    let lon = position.longitude_deg.to_radians();
    let sin_lat = lat.sin();
    let cos_lat = lat.cos();
    let n = WGS84_A / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
    let alt = position.altitude_m;
    [
        (n + alt) * cos_lat * lon.cos(),
        (n + alt) * cos_lat * lon.sin(),
        (n * (1.0 - WGS84_E2) + alt) * sin_lat,
    ]
}

/// ECEF to geodetic using Bowring's iteration on the parametric latitude.
pub fn ecef_to_geodetic(ecef: [f64; 3]) -> GeodeticPosition {
    let [x, y, z] = ecef;
    let p = (x * x + y * y).sqrt();
    let b = WGS84_A * (1.0 - WGS84_E2).sqrt();

    if p < 1e-9 && z.abs() < 1e-9 {
        return GeodeticPosition {
            longitude_deg: 0.0,
            latitude_deg: 0.0,
            altitude_m: -b,
        };
    }

    let ep2 = (WGS84_A * WGS84_A - b * b) / (b * b);
    let mut beta = (WGS84_A * z).atan2(b * p);
    let mut lat = 0.0;

    for _ in 0..5 {
        let (sin_beta, cos_beta) = beta.sin_cos();
        lat = (z + ep2 * b * sin_beta.powi(3)).atan2(p - WGS84_E2 * WGS84_A * cos_beta.powi(3));
        beta = (b * lat.sin()).atan2(WGS84_A * lat.cos());
    }

    let sin_lat = lat.sin();
    let n = WGS84_A / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
    let altitude_m = if lat.cos().abs() > 1e-10 {
        p / lat.cos() - n
    } else {
        z.abs() - b
    };

    GeodeticPosition {
        longitude_deg: normalize_longitude(y.atan2(x).to_degrees()),
        latitude_deg: lat.to_degrees(),
        altitude_m,
    }
}

/// Wrap a longitude into [-180, 180].
pub fn normalize_longitude(lon_deg: f64) -> f64 {
    if (-180.0..=180.0).contains(&lon_deg) {
        return lon_deg;
    }
    let wrapped = (lon_deg + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped == -180.0 && lon_deg > 0.0 {
        180.0
    } else {
        wrapped
    }
}

pub fn norm(v: [f64; 3]) -> f64 {
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}

pub fn distance(a: [f64; 3], b: [f64; 3]) -> f64 {
    norm([a[0] - b[0], a[1] - b[1], a[2] - b[2]])
}

/// Unit vector pointing from `from` to `to`, or `None` when they coincide.
pub fn direction(from: [f64; 3], to: [f64; 3]) -> Option<[f64; 3]> {
    let d = [to[0] - from[0], to[1] - from[1], to[2] - from[2]];
    let r = norm(d);
    if r < 1e-9 || !r.is_finite() {
        return None;
    }
    Some([d[0] / r, d[1] / r, d[2] / r])
}
