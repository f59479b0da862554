//! Scene scale constants and the human-readable distance readout

use std::fmt;

/// Scene units per astronomical unit. Everything else derives from this.
pub const SCENE_UNITS_PER_AU: f64 = 35.0;
pub const AU_PER_LIGHT_YEAR: f64 = 63_241.1;
pub const SCENE_UNITS_PER_LIGHT_YEAR: f64 = SCENE_UNITS_PER_AU * AU_PER_LIGHT_YEAR;
pub const KM_PER_AU: f64 = 149.6e6;
pub const LIGHT_YEARS_PER_PARSEC: f64 = 3.26156;
pub const PARSECS_PER_KILOPARSEC: f64 = 1000.0;

pub const EARTH_RADIUS_KM: f64 = 6371.0;
pub const SUN_RADIUS_KM: f64 = 696_340.0;

/// Planets and moons render smaller than stars of the same catalog radius.
pub const PLANET_SCALE_FACTOR: f64 = 0.1;

pub fn scene_to_au(scene_units: f64) -> f64 {
    scene_units / SCENE_UNITS_PER_AU
}

pub fn au_to_scene(au: f64) -> f64 {
    au * SCENE_UNITS_PER_AU
}

pub fn light_years_to_scene(light_years: f64) -> f64 {
    light_years * SCENE_UNITS_PER_LIGHT_YEAR
}

/// Camera distance expressed in the unit that suits its magnitude
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DistanceReadout {
    Kilometres(f64),
    AstronomicalUnits(f64),
    LightYears(f64),
    Kiloparsecs(f64),
}

impl DistanceReadout {
    /// Pick the unit for a distance in scene units
    pub fn from_scene_units(scene_units: f64) -> Self {
        let au = scene_to_au(scene_units);
        if au < 0.01 {
            DistanceReadout::Kilometres(au * KM_PER_AU)
        } else if au < AU_PER_LIGHT_YEAR {
            DistanceReadout::AstronomicalUnits(au)
        } else if au < AU_PER_LIGHT_YEAR * LIGHT_YEARS_PER_PARSEC * PARSECS_PER_KILOPARSEC {
            DistanceReadout::LightYears(au / AU_PER_LIGHT_YEAR)
        } else {
            DistanceReadout::Kiloparsecs(
                au / AU_PER_LIGHT_YEAR / LIGHT_YEARS_PER_PARSEC / PARSECS_PER_KILOPARSEC,
            )
        }
    }
}

impl fmt::Display for DistanceReadout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DistanceReadout::Kilometres(km) => {
                write!(f, "Distance: {} km", group_thousands(km.round() as i64))
            }
            DistanceReadout::AstronomicalUnits(au) => write!(f, "Distance: {au:.2} AU"),
            DistanceReadout::LightYears(ly) => write!(f, "Distance: {ly:.2} ly"),
            DistanceReadout::Kiloparsecs(kpc) => write!(f, "Distance: {kpc:.2} kpc"),
        }
    }
}

fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        grouped.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_selection() {
        assert!(matches!(
            DistanceReadout::from_scene_units(0.1),
            DistanceReadout::Kilometres(_)
        ));
        assert!(matches!(
            DistanceReadout::from_scene_units(35.0),
            DistanceReadout::AstronomicalUnits(au) if (au - 1.0).abs() < 1e-12
        ));
        assert!(matches!(
            DistanceReadout::from_scene_units(SCENE_UNITS_PER_LIGHT_YEAR * 4.0),
            DistanceReadout::LightYears(ly) if (ly - 4.0).abs() < 1e-9
        ));
        assert!(matches!(
            DistanceReadout::from_scene_units(light_years_to_scene(27_000.0)),
            DistanceReadout::Kiloparsecs(_)
        ));
    }

    #[test]
    fn test_readout_formatting() {
        // 0.001 AU = 149,600 km
        let readout = DistanceReadout::from_scene_units(au_to_scene(0.001));
        assert_eq!(readout.to_string(), "Distance: 149,600 km");
        assert_eq!(
            DistanceReadout::AstronomicalUnits(5.2).to_string(),
            "Distance: 5.20 AU"
        );
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1_000), "1,000");
        assert_eq!(group_thousands(-1_234_567), "-1,234,567");
    }
}
