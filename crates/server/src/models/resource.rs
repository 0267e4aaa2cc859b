use std::str::FromStr;

use chrono::{DateTime, Utc};
use strum_macros::{Display, EnumIter, EnumString};

use crate::error::ValidationError;
use crate::models::user::UserId;

pub type ResourceId = i64;

pub const SEMESTER_MIN: i16 = 1;
pub const SEMESTER_MAX: i16 = 8;
const RESOURCE_TITLE_LENGTH_LIMIT: usize = 200;
const RESOURCE_SUBJECT_LENGTH_LIMIT: usize = 100;

#[derive(Clone, Debug, Copy, PartialEq, Eq, Display, EnumString, EnumIter)]
#[strum(ascii_case_insensitive)]
pub enum ResourceType {
    Notes,
    Assignment,
    Quiz,
    Lab,
    Project,
    Paper,
    Other,
}

/// Resource row joined with the uploader's display name.
#[derive(Clone, Debug, sqlx::FromRow)]
pub struct ResourceRow {
    pub id: ResourceId,
    pub title: String,
    pub subject: String,
    pub semester: i16,
    pub resource_type: String,
    pub file_path: String,
    pub file_size: i64,
    pub owner_id: UserId,
    pub is_public: bool,
    pub downloads: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub uploader_name: String,
}

#[derive(Clone, Debug)]
pub struct CreateResourceRequest {
    pub title: String,
    pub subject: String,
    pub semester: i16,
    pub resource_type: ResourceType,
    pub file_path: String,
    pub file_size: i64,
    pub owner_id: UserId,
    pub is_public: bool,
}

/// Position of a row in the `(created_at DESC, id DESC)` listing order.
#[derive(Clone, Debug, Copy, PartialEq, Eq, sqlx::FromRow)]
pub struct KeysetPosition {
    pub created_at: DateTime<Utc>,
    pub id: ResourceId,
}

pub fn parse_resource_type(value: &str) -> Result<ResourceType, ValidationError> {
    ResourceType::from_str(value.trim()).map_err(|_| {
        ValidationError::invalid(
            value,
            "resource type must be one of Notes, Assignment, Quiz, Lab, Project, Paper, Other",
        )
    })
}

pub fn validate_semester(semester: i16) -> Result<(), ValidationError> {
    if !(SEMESTER_MIN..=SEMESTER_MAX).contains(&semester) {
        return Err(ValidationError::invalid(
            semester.to_string(),
            format!("semester should be between {SEMESTER_MIN} and {SEMESTER_MAX}"),
        ));
    }
    Ok(())
}

fn validate_text_field(field: &str, value: &str, limit: usize) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::invalid(value, format!("{field} cannot be empty")));
    }
    if value.chars().count() > limit {
        return Err(ValidationError::invalid(
            value,
            format!("{field} cannot be longer than {limit} chars"),
        ));
    }
    Ok(())
}

pub fn validate_resource_title(title: &str) -> Result<(), ValidationError> {
    validate_text_field("title", title, RESOURCE_TITLE_LENGTH_LIMIT)
}

pub fn validate_resource_subject(subject: &str) -> Result<(), ValidationError> {
    validate_text_field("subject", subject, RESOURCE_SUBJECT_LENGTH_LIMIT)
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn resource_type_parses_case_insensitively() {
        assert_eq!(parse_resource_type("notes").unwrap(), ResourceType::Notes);
        assert_eq!(parse_resource_type(" QUIZ ").unwrap(), ResourceType::Quiz);
        assert!(parse_resource_type("poster").is_err());
    }

    #[test]
    fn resource_type_display_round_trips() {
        for kind in ResourceType::iter() {
            assert_eq!(parse_resource_type(&kind.to_string()).unwrap(), kind);
        }
    }

    #[test]
    fn semester_range() {
        assert!(validate_semester(0).is_err());
        validate_semester(1).unwrap();
        validate_semester(8).unwrap();
        assert!(validate_semester(9).is_err());
    }

    #[test]
    fn text_fields_must_be_present() {
        assert!(validate_resource_title("   ").is_err());
        validate_resource_title("Linear Algebra midterm notes").unwrap();
        assert!(validate_resource_subject(&"s".repeat(101)).is_err());
    }
}
