//! Equatorial sky coordinates
//!
//! Right ascension is written `14h 39m 36s`, declination `-60° 50' 02"`.

use glam::DVec3;
use nom::{
    character::complete::{char, one_of, space0, u64},
    combinator::{all_consuming, opt},
    number::complete::double,
    sequence::{pair, terminated, tuple},
    IResult,
};

fn hours_minutes_seconds(input: &str) -> IResult<&str, (u64, u64, f64)> {
    tuple((
        terminated(u64, pair(char('h'), space0)),
        terminated(u64, pair(char('m'), space0)),
        terminated(double, char('s')),
    ))(input)
}

fn degrees_minutes_seconds(input: &str) -> IResult<&str, (Option<char>, u64, u64, f64)> {
    tuple((
        opt(one_of("+-")),
        terminated(u64, pair(char('°'), space0)),
        terminated(u64, pair(char('\''), space0)),
        terminated(double, char('"')),
    ))(input)
}

/// Parse a right ascension into radians
pub fn parse_right_ascension(input: &str) -> Option<f64> {
    let (_, (h, m, s)) = all_consuming(hours_minutes_seconds)(input.trim()).ok()?;
    if h >= 24 || m >= 60 || !(0.0..60.0).contains(&s) {
        return None;
    }
    let hours = h as f64 + m as f64 / 60.0 + s / 3600.0;
    Some((hours * 15.0).to_radians())
}

/// Parse a declination into radians
pub fn parse_declination(input: &str) -> Option<f64> {
    let (_, (sign, d, m, s)) = all_consuming(degrees_minutes_seconds)(input.trim()).ok()?;
    if m >= 60 || !(0.0..60.0).contains(&s) {
        return None;
    }
    let degrees = d as f64 + m as f64 / 60.0 + s / 3600.0;
    if degrees > 90.0 {
        return None;
    }
    let sign = if sign == Some('-') { -1.0 } else { 1.0 };
    Some(sign * degrees.to_radians())
}

/// Cartesian position for a direction and distance, +Y towards the celestial pole
pub fn sky_to_cartesian(right_ascension: f64, declination: f64, distance: f64) -> DVec3 {
    let (sin_dec, cos_dec) = declination.sin_cos();
    let (sin_ra, cos_ra) = right_ascension.sin_cos();
    DVec3::new(
        distance * cos_dec * cos_ra,
        distance * sin_dec,
        distance * cos_dec * sin_ra,
    )
}
