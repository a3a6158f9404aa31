//! Molecule generation from an emitter template
//!
//! Positions are sampled uniformly in angle and radius, which biases the
//! population toward the emitter origin rather than filling the disc evenly.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;

use super::EmitterSettings;
use crate::molecule::MoleculeSettings;
use crate::units::Percent;

/// Derive one molecule's settings from the emitter template plus jitter
pub fn generate_molecule_settings<R: Rng + ?Sized>(template: &EmitterSettings, rng: &mut R) -> MoleculeSettings {
    let position = sample_position(template.spawn_radius, rng);

    MoleculeSettings {
        color: template.color,
        x: position.x,
        y: position.y,
        radius: template.molecule_point_radius,
        size: template.molecule_size,
        line_thickness: template.molecule_line_thickness,
        line_length_scale: template.molecule_line_length_scale,
        opacity: jitter_value(template.opacity_jitter, rng),
        rotation: rng.random_range(0.0..TAU),
        scale: jitter_value(template.size_jitter, rng),
        ..Default::default()
    }
}

/// Sample a local offset inside the spawn disc
pub fn sample_position<R: Rng + ?Sized>(spawn_radius: f32, rng: &mut R) -> Vec2 {
    let angle = rng.random_range(0.0_f32..360.0).to_radians();
    let distance = rng.random::<f32>() * spawn_radius;
    Vec2::new(angle.cos(), angle.sin()) * distance
}

/// `1 - U(0,1) * jitter`, or exactly 1 when the jitter is not positive.
///
/// Jitter above 100% is treated as 100%, so the result stays within 0-1.
pub fn jitter_value<R: Rng + ?Sized>(jitter: Percent, rng: &mut R) -> f32 {
    if jitter.is_positive() {
        1.0 - rng.random::<f32>() * jitter.fraction().min(1.0)
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn thyroid_template() -> EmitterSettings {
        EmitterSettings {
            molecule_amount: 19,
            spawn_radius: 9.0,
            size_jitter: Percent(36.0),
            opacity_jitter: Percent(75.0),
            molecule_size: 10.0,
            molecule_point_radius: 1.5,
            molecule_line_thickness: 1.5,
            ..Default::default()
        }
    }

    #[test]
    fn test_generated_values_stay_in_range() {
        let template = thyroid_template();
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..500 {
            let m = generate_molecule_settings(&template, &mut rng);
            assert!(Vec2::new(m.x, m.y).length() <= 9.0 + 1e-4);
            assert!(m.scale >= 0.64 - 1e-6 && m.scale <= 1.0);
            assert!(m.opacity >= 0.25 - 1e-6 && m.opacity <= 1.0);
            assert!(m.rotation >= 0.0 && m.rotation < TAU);
        }
    }

    #[test]
    fn test_template_fields_are_copied() {
        let template = thyroid_template();
        let mut rng = StdRng::seed_from_u64(1);
        let m = generate_molecule_settings(&template, &mut rng);
        assert_eq!(m.radius, 1.5);
        assert_eq!(m.size, 10.0);
        assert_eq!(m.line_thickness, 1.5);
        assert_eq!(m.line_length_scale, Percent::FULL);
        assert_eq!(m.color, template.color);
    }

    #[test]
    fn test_zero_jitter_keeps_defaults() {
        let template = EmitterSettings::default();
        let mut rng = StdRng::seed_from_u64(3);
        let m = generate_molecule_settings(&template, &mut rng);
        assert_eq!(m.scale, 1.0);
        assert_eq!(m.opacity, 1.0);
    }

    #[test]
    fn test_excess_jitter_stays_non_negative() {
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..200 {
            let value = jitter_value(Percent(300.0), &mut rng);
            assert!((0.0..=1.0).contains(&value));
        }
    }

    #[test]
    fn test_same_seed_same_output() {
        let template = thyroid_template();
        let a = generate_molecule_settings(&template, &mut StdRng::seed_from_u64(9));
        let b = generate_molecule_settings(&template, &mut StdRng::seed_from_u64(9));
        assert_eq!(a, b);
    }
}
