//! Listing filters.
//!
//! A [`ResourceFilter`] is built once per request from the raw query or form
//! parameters and can either be rendered into SQL conditions or evaluated
//! against an already loaded row. Both forms must agree.

use sqlx::{Postgres, QueryBuilder};

use crate::models::resource::ResourceRow;
use crate::models::user::UserId;

/// Value of the `type` parameter that the filter bar sends for "any type".
const ANY_TYPE: &str = "all";

#[derive(Clone, Debug, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Only published resources, regardless of owner.
    Public,
    /// Every resource of one owner, published or not.
    Owner(UserId),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceFilter {
    pub visibility: Visibility,
    pub semester: Option<i16>,
    pub resource_type: Option<String>,
    pub search: Option<String>,
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

impl ResourceFilter {
    pub fn new(visibility: Visibility) -> Self {
        Self {
            visibility,
            semester: None,
            resource_type: None,
            search: None,
        }
    }

    /// Blank values and unparseable or non-positive semesters mean "no filter".
    pub fn from_params(
        visibility: Visibility,
        semester: Option<&str>,
        resource_type: Option<&str>,
        search: Option<&str>,
    ) -> Self {
        let semester = non_blank(semester)
            .and_then(|s| s.parse::<i16>().ok())
            .filter(|s| *s > 0);
        let resource_type =
            non_blank(resource_type).filter(|t| !t.eq_ignore_ascii_case(ANY_TYPE));
        Self {
            visibility,
            semester,
            resource_type,
            search: non_blank(search),
        }
    }

    pub fn matches(&self, row: &ResourceRow) -> bool {
        let visible = match self.visibility {
            Visibility::Public => row.is_public,
            Visibility::Owner(owner_id) => row.owner_id == owner_id,
        };
        let semester = self.semester.map_or(true, |s| row.semester == s);
        let resource_type = self
            .resource_type
            .as_deref()
            .map_or(true, |t| row.resource_type.to_lowercase() == t.to_lowercase());
        let search = self.search.as_deref().map_or(true, |q| {
            let q = q.to_lowercase();
            row.title.to_lowercase().contains(&q) || row.subject.to_lowercase().contains(&q)
        });
        visible && semester && resource_type && search
    }

    /// Appends ` AND ...` conditions on the `resources` alias `r`.
    pub fn push_conditions(&self, builder: &mut QueryBuilder<'_, Postgres>) {
        match self.visibility {
            Visibility::Public => {
                builder.push(" AND r.is_public");
            }
            Visibility::Owner(owner_id) => {
                builder.push(" AND r.owner_id = ").push_bind(owner_id);
            }
        }
        if let Some(semester) = self.semester {
            builder.push(" AND r.semester = ").push_bind(semester);
        }
        if let Some(resource_type) = &self.resource_type {
            builder
                .push(" AND LOWER(r.resource_type) = LOWER(")
                .push_bind(resource_type.clone())
                .push(")");
        }
        if let Some(search) = &self.search {
            let pattern = format!("%{}%", escape_like(search));
            builder
                .push(" AND (r.title ILIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\' OR r.subject ILIKE ")
                .push_bind(pattern)
                .push(" ESCAPE '\\')");
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn row(id: i64, title: &str, subject: &str, semester: i16, kind: &str, public: bool) -> ResourceRow {
        ResourceRow {
            id,
            title: title.to_string(),
            subject: subject.to_string(),
            semester,
            resource_type: kind.to_string(),
            file_path: format!("user-1/{id}-file.pdf"),
            file_size: 1024,
            owner_id: 1,
            is_public: public,
            downloads: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            uploader_name: "Ada".to_string(),
        }
    }

    fn sample() -> Vec<ResourceRow> {
        vec![
            row(1, "Graph theory notes", "Discrete Math", 3, "Notes", true),
            row(2, "Week 4 assignment", "Discrete Math", 3, "Assignment", true),
            row(3, "Calculus quiz", "Mathematics", 1, "Quiz", true),
            row(4, "Private notes", "Physics", 3, "Notes", false),
            row(5, "Thermo notes", "Physics", 3, "notes", true),
        ]
    }

    fn ids(filter: &ResourceFilter) -> Vec<i64> {
        sample()
            .iter()
            .filter(|r| filter.matches(r))
            .map(|r| r.id)
            .collect()
    }

    #[test]
    fn empty_filter_matches_every_public_resource() {
        assert_eq!(ids(&ResourceFilter::new(Visibility::Public)), vec![1, 2, 3, 5]);
    }

    #[test]
    fn owner_scope_includes_private_resources() {
        assert_eq!(ids(&ResourceFilter::new(Visibility::Owner(1))), vec![1, 2, 3, 4, 5]);
        assert!(ids(&ResourceFilter::new(Visibility::Owner(2))).is_empty());
    }

    #[test]
    fn type_and_semester_combine_conjunctively() {
        let filter =
            ResourceFilter::from_params(Visibility::Public, Some("3"), Some("notes"), None);
        assert_eq!(ids(&filter), vec![1, 5]);
    }

    #[test]
    fn search_covers_title_and_subject() {
        let filter = ResourceFilter::from_params(Visibility::Public, None, None, Some("PHYS"));
        assert_eq!(ids(&filter), vec![5]);
        let filter = ResourceFilter::from_params(Visibility::Public, None, None, Some("quiz"));
        assert_eq!(ids(&filter), vec![3]);
    }

    #[test]
    fn blank_and_placeholder_params_are_ignored() {
        let filter =
            ResourceFilter::from_params(Visibility::Public, Some(""), Some("all"), Some("  "));
        assert_eq!(filter, ResourceFilter::new(Visibility::Public));
        let filter = ResourceFilter::from_params(Visibility::Public, Some("abc"), None, None);
        assert_eq!(filter.semester, None);
        let filter = ResourceFilter::from_params(Visibility::Public, Some("-2"), None, None);
        assert_eq!(filter.semester, None);
    }

    #[test]
    fn renders_bound_conditions() {
        let filter = ResourceFilter::from_params(
            Visibility::Owner(9),
            Some("2"),
            Some("Quiz"),
            Some("50%_off"),
        );
        let mut builder = QueryBuilder::<Postgres>::new("SELECT 1 FROM resources r WHERE TRUE");
        filter.push_conditions(&mut builder);
        assert_eq!(
            builder.sql(),
            "SELECT 1 FROM resources r WHERE TRUE AND r.owner_id = $1 AND r.semester = $2 \
             AND LOWER(r.resource_type) = LOWER($3) \
             AND (r.title ILIKE $4 ESCAPE '\\' OR r.subject ILIKE $5 ESCAPE '\\')"
        );
    }

    #[test]
    fn like_metacharacters_are_escaped() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
    }
}
