//! Table validation
//!
//! Checks a [`TableTemplate`] for mistakes that would not fail to load but
//! would produce a broken game: duplicate element names, impossible physics
//! values and balls placed off the playfield.

use std::collections::HashSet;

use pinball_math::Vec3;

use crate::table::TableTemplate;

/// Largest gravity constant accepted (units per time unit squared)
const MAX_GRAVITY: f32 = 100.0;

/// Validation error found in a table
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Table has no playfield objects
    EmptyTable,
    /// Two objects share a name
    DuplicateName(String),
    /// Object has no shapes
    MissingShape(String),
    /// Gravity is not finite, negative or above 100
    UnreasonableGravity(f32),
    /// Slope outside 0..90 degrees
    UnreasonableSlope(f32),
    /// Left/right, top/bottom or glass height are inverted
    InvalidBounds,
    /// Ball radius or mass is not positive
    InvalidBall(usize),
    /// Ball centre is outside the table volume
    BallOutsideTable(usize, Vec3),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::EmptyTable => write!(f, "Table has no objects"),
            ValidationError::DuplicateName(name) => write!(f, "Duplicate object name: '{}'", name),
            ValidationError::MissingShape(name) => write!(f, "Object '{}' has no shapes", name),
            ValidationError::UnreasonableGravity(g) => {
                write!(f, "Unreasonable gravity value: {} (expected 0..={})", g, MAX_GRAVITY)
            }
            ValidationError::UnreasonableSlope(s) => {
                write!(f, "Unreasonable slope: {} degrees (expected 0..90)", s)
            }
            ValidationError::InvalidBounds => write!(f, "Table bounds are inverted"),
            ValidationError::InvalidBall(i) => write!(f, "Ball {} has a non-positive radius or mass", i),
            ValidationError::BallOutsideTable(i, p) => {
                write!(f, "Ball {} starts outside the table at ({}, {}, {})", i, p.x, p.y, p.z)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Table validator that checks for common errors
///
/// # Example
/// ```ignore
/// let errors = TableValidator::validate(&table);
/// for error in &errors {
///     log::warn!("{}", error);
/// }
/// ```
pub struct TableValidator;

impl TableValidator {
    /// Validate a table, returning all errors found
    pub fn validate(table: &TableTemplate) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if table.objects.is_empty() {
            errors.push(ValidationError::EmptyTable);
        }

        let mut seen_names = HashSet::new();
        for object in &table.objects {
            if !seen_names.insert(object.name.as_str()) {
                errors.push(ValidationError::DuplicateName(object.name.clone()));
            }
            if object.shapes.is_empty() {
                errors.push(ValidationError::MissingShape(object.name.clone()));
            }
        }

        let settings = &table.settings;
        if !(0.0..=MAX_GRAVITY).contains(&settings.gravity) {
            errors.push(ValidationError::UnreasonableGravity(settings.gravity));
        }
        if !(0.0..90.0).contains(&settings.slope_degrees) {
            errors.push(ValidationError::UnreasonableSlope(settings.slope_degrees));
        }

        let bounds_ok = settings.left < settings.right && settings.top < settings.bottom && settings.glass_height > 0.0;
        if !bounds_ok {
            errors.push(ValidationError::InvalidBounds);
        }

        let volume = settings.bounds();
        for (i, ball) in table.balls.iter().enumerate() {
            if !(ball.radius > 0.0 && ball.mass > 0.0) {
                errors.push(ValidationError::InvalidBall(i));
            }
            if bounds_ok && !volume.contains(ball.position) {
                errors.push(ValidationError::BallOutsideTable(i, ball.position));
            }
        }

        errors
    }

    /// Validate and return Result (Ok if no errors, Err with all errors)
    pub fn validate_or_error(table: &TableTemplate) -> Result<(), Vec<ValidationError>> {
        let errors = Self::validate(table);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{BallSpawn, ObjectTemplate};
    use crate::shapes::ShapeTemplate;

    fn make_valid_table() -> TableTemplate {
        let mut table = TableTemplate::new("Valid").with_ball(BallSpawn::at(Vec3::new(500.0, 1000.0, 25.0)));
        table.add_object(ObjectTemplate::new("post").with_shape(ShapeTemplate::post(300.0, 300.0, 0.0, 50.0)));
        table
    }

    #[test]
    fn test_valid_table() {
        assert!(TableValidator::validate(&make_valid_table()).is_empty());
        assert!(TableValidator::validate_or_error(&make_valid_table()).is_ok());
    }

    #[test]
    fn test_empty_table() {
        let errors = TableValidator::validate(&TableTemplate::new("Empty"));
        assert_eq!(errors, vec![ValidationError::EmptyTable]);
    }

    #[test]
    fn test_duplicate_and_missing_shape() {
        let mut table = make_valid_table();
        table.add_object(ObjectTemplate::new("post"));
        let errors = TableValidator::validate(&table);
        assert!(errors.contains(&ValidationError::DuplicateName("post".to_string())));
        assert!(errors.contains(&ValidationError::MissingShape("post".to_string())));
    }

    #[test]
    fn test_unreasonable_settings() {
        let mut table = make_valid_table();
        table.settings.gravity = f32::NAN;
        table.settings.slope_degrees = 95.0;
        let errors = TableValidator::validate(&table);
        assert!(errors.iter().any(|e| matches!(e, ValidationError::UnreasonableGravity(_))));
        assert!(errors.contains(&ValidationError::UnreasonableSlope(95.0)));
    }

    #[test]
    fn test_ball_outside_table() {
        let table = make_valid_table().with_ball(BallSpawn::at(Vec3::new(-50.0, 100.0, 25.0)));
        let errors = TableValidator::validate(&table);
        assert_eq!(
            errors,
            vec![ValidationError::BallOutsideTable(1, Vec3::new(-50.0, 100.0, 25.0))]
        );
    }

    #[test]
    fn test_invalid_ball() {
        let mut table = make_valid_table();
        table.balls[0].radius = 0.0;
        let errors = TableValidator::validate(&table);
        assert_eq!(errors, vec![ValidationError::InvalidBall(0)]);
    }

    #[test]
    fn test_error_display() {
        let msg = format!("{}", ValidationError::DuplicateName("bumper".to_string()));
        assert!(msg.contains("bumper"));
    }
}
