use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{RequestError, ValidationError};
use crate::models::display::ResourceView;
use crate::models::filter::{ResourceFilter, Visibility};
use crate::models::resource::{ResourceId, ResourceRow};
use crate::server::constants::{DEFAULT_PAGE_SIZE, MAX_LISTING_ELEMENTS};

/// Raw listing parameters, shared by query strings and `load-more` forms.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ListingQuery {
    pub cursor: Option<String>,
    pub search: Option<String>,
    pub semester: Option<String>,
    #[serde(rename = "type")]
    pub resource_type: Option<String>,
    pub limit: Option<String>,
}

#[derive(Clone, Debug, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ListingIntent {
    LoadMore,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ListingForm {
    pub intent: ListingIntent,
    #[serde(flatten)]
    pub query: ListingQuery,
}

/// Where a listing resumes. Tokens that do not parse start from the newest row.
#[derive(Clone, Debug, Copy, PartialEq, Eq)]
pub enum Cursor {
    Start,
    After(ResourceId),
}

impl Cursor {
    pub fn encode(id: ResourceId) -> String {
        id.to_string()
    }

    pub fn decode(token: Option<&str>) -> Self {
        token
            .and_then(|t| t.trim().parse::<ResourceId>().ok())
            .filter(|id| *id > 0)
            .map_or(Self::Start, Self::After)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListResourcesRequest {
    pub filter: ResourceFilter,
    pub cursor: Cursor,
    pub page_size: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourcePage {
    pub resources: Vec<ResourceView>,
    pub next_cursor: Option<String>,
    pub has_more: bool,
}

impl ResourcePage {
    pub fn empty() -> Self {
        Self {
            resources: Vec::new(),
            next_cursor: None,
            has_more: false,
        }
    }

    /// `rows` is the `page_size + 1` lookahead window in listing order.
    pub fn assemble(mut rows: Vec<ResourceRow>, page_size: i64, now: DateTime<Utc>) -> Self {
        let page_size = usize::try_from(page_size).unwrap_or(0);
        let has_more = rows.len() > page_size;
        rows.truncate(page_size);
        let next_cursor = if has_more {
            rows.last().map(|row| Cursor::encode(row.id))
        } else {
            None
        };
        let resources = rows
            .into_iter()
            .map(|row| ResourceView::from_row(row, now))
            .collect();
        Self {
            resources,
            next_cursor,
            has_more,
        }
    }
}

pub fn validate_limit(limit: i64) -> Result<(), RequestError> {
    if limit < 1 {
        return Err(ValidationError::invalid(limit.to_string(), "limit should be >= 1").into());
    }
    if limit > MAX_LISTING_ELEMENTS {
        return Err(ValidationError::LimitExceeded {
            subject: "listing limit".to_string(),
            unit: "element".to_string(),
            attempted: limit as u64,
            limit: MAX_LISTING_ELEMENTS as u64,
        }
        .into());
    }
    Ok(())
}

impl ListingQuery {
    pub fn into_request(self, visibility: Visibility) -> Result<ListResourcesRequest, RequestError> {
        let page_size = match self.limit.as_deref().map(str::trim).filter(|l| !l.is_empty()) {
            Some(limit) => limit
                .parse::<i64>()
                .map_err(|_| ValidationError::invalid(limit, "limit should be an integer"))?,
            None => DEFAULT_PAGE_SIZE,
        };
        validate_limit(page_size)?;
        let filter = ResourceFilter::from_params(
            visibility,
            self.semester.as_deref(),
            self.resource_type.as_deref(),
            self.search.as_deref(),
        );
        Ok(ListResourcesRequest {
            filter,
            cursor: Cursor::decode(self.cursor.as_deref()),
            page_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn rows(ids: &[i64]) -> Vec<ResourceRow> {
        let now = Utc::now();
        ids.iter()
            .map(|&id| ResourceRow {
                id,
                title: format!("Resource {id}"),
                subject: "Algorithms".to_string(),
                semester: 2,
                resource_type: "Notes".to_string(),
                file_path: format!("user-1/{id}-algo.pdf"),
                file_size: 2048,
                owner_id: 1,
                is_public: true,
                downloads: 0,
                created_at: now - Duration::minutes(id),
                updated_at: now,
                uploader_name: "Ada".to_string(),
            })
            .collect()
    }

    #[test]
    fn cursor_decoding_is_lenient() {
        assert_eq!(Cursor::decode(None), Cursor::Start);
        assert_eq!(Cursor::decode(Some("")), Cursor::Start);
        assert_eq!(Cursor::decode(Some("abc")), Cursor::Start);
        assert_eq!(Cursor::decode(Some("-4")), Cursor::Start);
        assert_eq!(Cursor::decode(Some("0")), Cursor::Start);
        assert_eq!(Cursor::decode(Some("17")), Cursor::After(17));
        assert_eq!(Cursor::decode(Some(&Cursor::encode(99))), Cursor::After(99));
    }

    #[test]
    fn lookahead_row_signals_more_pages() {
        let page = ResourcePage::assemble(rows(&[9, 8, 7, 6]), 3, Utc::now());
        assert!(page.has_more);
        assert_eq!(page.resources.len(), 3);
        assert_eq!(page.next_cursor.as_deref(), Some("7"));
    }

    #[test]
    fn short_window_is_the_last_page() {
        let page = ResourcePage::assemble(rows(&[9, 8, 7]), 3, Utc::now());
        assert!(!page.has_more);
        assert_eq!(page.resources.len(), 3);
        assert_eq!(page.next_cursor, None);

        let page = ResourcePage::assemble(Vec::new(), 3, Utc::now());
        assert_eq!(page, ResourcePage::empty());
    }

    #[test]
    fn query_defaults() {
        let request = ListingQuery::default().into_request(Visibility::Public).unwrap();
        assert_eq!(request.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(request.cursor, Cursor::Start);
        assert_eq!(request.filter, ResourceFilter::new(Visibility::Public));
    }

    #[test]
    fn query_parses_filters() {
        let query = ListingQuery {
            cursor: Some("31".to_string()),
            search: Some("graphs".to_string()),
            semester: Some("3".to_string()),
            resource_type: Some("notes".to_string()),
            limit: Some("5".to_string()),
        };
        let request = query.into_request(Visibility::Public).unwrap();
        assert_eq!(request.cursor, Cursor::After(31));
        assert_eq!(request.page_size, 5);
        assert_eq!(request.filter.semester, Some(3));
        assert_eq!(request.filter.resource_type.as_deref(), Some("notes"));
        assert_eq!(request.filter.search.as_deref(), Some("graphs"));
    }

    #[test]
    fn query_rejects_bad_limits() {
        for limit in ["0", "101", "ten"] {
            let query = ListingQuery {
                limit: Some(limit.to_string()),
                ..Default::default()
            };
            let err = query.into_request(Visibility::Public).unwrap_err();
            assert!(matches!(err, RequestError::Validation(_)), "{limit}");
        }
    }

    #[test]
    fn load_more_form_deserializes() {
        let form: ListingForm =
            parse_form("intent=load-more&cursor=12&type=quiz&semester=");
        assert_eq!(form.intent, ListingIntent::LoadMore);
        assert_eq!(form.query.cursor.as_deref(), Some("12"));
        assert_eq!(form.query.resource_type.as_deref(), Some("quiz"));
        assert_eq!(form.query.semester.as_deref(), Some(""));
    }

    fn parse_form(body: &str) -> ListingForm {
        use axum::extract::Query;
        use axum::http::Uri;
        let uri: Uri = format!("/?{body}").parse().unwrap();
        Query::<ListingForm>::try_from_uri(&uri).unwrap().0
    }
}
