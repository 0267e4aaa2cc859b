use std::str::FromStr;

use serde::Deserialize;

use crate::error::ValidationError;
use crate::models::listing::ListingQuery;
use crate::models::resource::ResourceId;
use crate::models::upload::{ConfirmUploadRequest, PrepareUploadRequest};

#[derive(Clone, Debug, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DashboardIntent {
    LoadMore,
    GetUploadUrl,
    ConfirmUpload,
    Publish,
    Unpublish,
    Delete,
}

/// Every field any dashboard intent may post; each intent reads its own subset.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardForm {
    pub intent: DashboardIntent,
    pub resource_id: Option<String>,
    pub file_name: Option<String>,
    pub file_size: Option<String>,
    pub content_type: Option<String>,
    pub file_key: Option<String>,
    pub title: Option<String>,
    pub subject: Option<String>,
    pub semester: Option<String>,
    pub resource_type: Option<String>,
    pub is_public: Option<String>,
    pub cursor: Option<String>,
    pub search: Option<String>,
    #[serde(rename = "type")]
    pub type_filter: Option<String>,
    pub limit: Option<String>,
}

fn required<'a>(field: &str, value: &'a Option<String>) -> Result<&'a str, ValidationError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ValidationError::invalid("", format!("`{field}` is required")))
}

fn parse_required<T: FromStr>(field: &str, value: &Option<String>) -> Result<T, ValidationError> {
    let raw = required(field, value)?;
    raw.parse()
        .map_err(|_| ValidationError::invalid(raw, format!("`{field}` should be a number")))
}

fn parse_flag(value: &Option<String>) -> bool {
    matches!(
        value.as_deref().map(str::trim),
        Some("true" | "on" | "1")
    )
}

impl DashboardForm {
    pub fn resource_id(&self) -> Result<ResourceId, ValidationError> {
        parse_required("resourceId", &self.resource_id)
    }

    pub fn listing_query(&self) -> ListingQuery {
        ListingQuery {
            cursor: self.cursor.clone(),
            search: self.search.clone(),
            semester: self.semester.clone(),
            resource_type: self.type_filter.clone(),
            limit: self.limit.clone(),
        }
    }

    pub fn prepare_request(&self) -> Result<PrepareUploadRequest, ValidationError> {
        Ok(PrepareUploadRequest {
            file_name: required("fileName", &self.file_name)?.to_string(),
            file_size: parse_required("fileSize", &self.file_size)?,
            content_type: required("contentType", &self.content_type)?.to_string(),
        })
    }

    pub fn confirm_request(&self) -> Result<ConfirmUploadRequest, ValidationError> {
        Ok(ConfirmUploadRequest {
            file_key: required("fileKey", &self.file_key)?.to_string(),
            file_size: parse_required("fileSize", &self.file_size)?,
            title: required("title", &self.title)?.to_string(),
            subject: required("subject", &self.subject)?.to_string(),
            semester: parse_required("semester", &self.semester)?,
            resource_type: required("resourceType", &self.resource_type)?.to_string(),
            is_public: parse_flag(&self.is_public),
        })
    }
}
