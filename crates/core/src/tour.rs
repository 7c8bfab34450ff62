//! Tour status state machine and input validation.
//!
//! Validation runs before any write reaches the store; the lifecycle service
//! and the HTTP handlers both call into these helpers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Minimum number of steps the dashboard requires when a tour is created or
/// trimmed. The lifecycle layer itself does not enforce this.
pub const MIN_TOUR_STEPS: usize = 5;

/// Maximum length of a tour or step title.
pub const MAX_TITLE_LEN: usize = 200;

/// Maximum length of a tour or step description.
pub const MAX_DESCRIPTION_LEN: usize = 2000;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Publication status of a tour. Owners toggle it freely; nothing changes it
/// automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TourStatus {
    Active,
    #[default]
    Inactive,
}

impl TourStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            TourStatus::Active => "active",
            TourStatus::Inactive => "inactive",
        }
    }

    /// The other state.
    pub const fn toggled(self) -> Self {
        match self {
            TourStatus::Active => TourStatus::Inactive,
            TourStatus::Inactive => TourStatus::Active,
        }
    }

    pub const fn is_active(self) -> bool {
        matches!(self, TourStatus::Active)
    }
}

impl fmt::Display for TourStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TourStatus {
    type Err = CoreError;

    /// Parsing is case-insensitive: older rows were written as `"Inactive"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(TourStatus::Active),
            "inactive" => Ok(TourStatus::Inactive),
            other => Err(CoreError::Validation(format!(
                "Invalid tour status '{other}'. Must be one of: [\"active\", \"inactive\"]"
            ))),
        }
    }
}

impl TryFrom<String> for TourStatus {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate that a text field is non-blank and within `max` characters.
fn validate_text(value: &str, label: &str, max: usize) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::Validation(format!("{label} is required")));
    }
    if value.chars().count() > max {
        return Err(CoreError::Validation(format!(
            "{label} must be at most {max} characters"
        )));
    }
    Ok(())
}

pub fn validate_tour_title(title: &str) -> Result<(), CoreError> {
    validate_text(title, "Tour title", MAX_TITLE_LEN)
}

pub fn validate_tour_description(description: &str) -> Result<(), CoreError> {
    validate_text(description, "Tour description", MAX_DESCRIPTION_LEN)
}

/// Validate a step's title and description. `position` is 1-based and only
/// used to make the message point at the offending step.
pub fn validate_step_fields(
    title: &str,
    description: &str,
    position: Option<usize>,
) -> Result<(), CoreError> {
    let label = match position {
        Some(n) => format!("Step {n}"),
        None => "Step".to_string(),
    };
    validate_text(title, &format!("{label} title"), MAX_TITLE_LEN)?;
    validate_text(description, &format!("{label} description"), MAX_DESCRIPTION_LEN)
}

pub fn validate_step_title(title: &str) -> Result<(), CoreError> {
    validate_text(title, "Step title", MAX_TITLE_LEN)
}

pub fn validate_step_description(description: &str) -> Result<(), CoreError> {
    validate_text(description, "Step description", MAX_DESCRIPTION_LEN)
}

/// Validate that a tour being created carries at least [`MIN_TOUR_STEPS`] steps.
pub fn validate_min_steps(count: usize) -> Result<(), CoreError> {
    if count < MIN_TOUR_STEPS {
        return Err(CoreError::Validation(format!(
            "A tour needs at least {MIN_TOUR_STEPS} steps (got {count})"
        )));
    }
    Ok(())
}

/// Validate that removing one step keeps the tour at or above [`MIN_TOUR_STEPS`].
pub fn validate_step_removal(current_steps: usize) -> Result<(), CoreError> {
    if current_steps <= MIN_TOUR_STEPS {
        return Err(CoreError::Validation(format!(
            "Cannot delete step: a tour needs at least {MIN_TOUR_STEPS} steps"
        )));
    }
    Ok(())
}

/// Validate a step completion rate percentage.
pub fn validate_completion_rate(rate: f64) -> Result<(), CoreError> {
    if !rate.is_finite() || !(0.0..=100.0).contains(&rate) {
        return Err(CoreError::Validation(format!(
            "Completion rate must be between 0 and 100 (got {rate})"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_defaults_to_inactive() {
        assert_eq!(TourStatus::default(), TourStatus::Inactive);
    }

    #[test]
    fn toggling_twice_is_identity() {
        for status in [TourStatus::Active, TourStatus::Inactive] {
            assert_eq!(status.toggled().toggled(), status);
            assert_ne!(status.toggled(), status);
        }
    }

    #[test]
    fn status_parses_legacy_capitalised_values() {
        assert_eq!("Inactive".parse::<TourStatus>().unwrap(), TourStatus::Inactive);
        assert_eq!("ACTIVE".parse::<TourStatus>().unwrap(), TourStatus::Active);
        assert!("paused".parse::<TourStatus>().is_err());
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&TourStatus::Active).unwrap();
        assert_eq!(json, "\"active\"");
    }

    #[test]
    fn blank_title_is_rejected() {
        assert!(validate_tour_title("").is_err());
        assert!(validate_tour_title("   ").is_err());
        assert!(validate_tour_title("Welcome").is_ok());
    }

    #[test]
    fn overlong_description_is_rejected() {
        let long = "x".repeat(MAX_DESCRIPTION_LEN + 1);
        assert!(validate_tour_description(&long).is_err());
    }

    #[test]
    fn step_error_names_the_position() {
        let err = validate_step_fields("Intro", "", Some(3)).unwrap_err();
        assert!(err.to_string().contains("Step 3 description"));
    }

    #[test]
    fn minimum_step_count() {
        assert!(validate_min_steps(4).is_err());
        assert!(validate_min_steps(5).is_ok());
        assert!(validate_step_removal(5).is_err());
        assert!(validate_step_removal(6).is_ok());
    }

    #[test]
    fn completion_rate_bounds() {
        assert!(validate_completion_rate(0.0).is_ok());
        assert!(validate_completion_rate(100.0).is_ok());
        assert!(validate_completion_rate(100.5).is_err());
        assert!(validate_completion_rate(-1.0).is_err());
        assert!(validate_completion_rate(f64::NAN).is_err());
    }
}
