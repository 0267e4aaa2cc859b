use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::ValidationError;
use crate::models::resource::{
    parse_resource_type, validate_resource_subject, validate_resource_title, validate_semester,
    CreateResourceRequest,
};
use crate::models::user::UserId;

const FILE_NAME_LENGTH_LIMIT: usize = 100;

/// Accepted extensions and the MIME types a browser may declare for them.
const ALLOWED_UPLOADS: &[(&str, &[&str])] = &[
    ("pdf", &["application/pdf"]),
    ("doc", &["application/msword"]),
    (
        "docx",
        &["application/vnd.openxmlformats-officedocument.wordprocessingml.document"],
    ),
    ("ppt", &["application/vnd.ms-powerpoint"]),
    (
        "pptx",
        &["application/vnd.openxmlformats-officedocument.presentationml.presentation"],
    ),
    ("xls", &["application/vnd.ms-excel"]),
    (
        "xlsx",
        &["application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"],
    ),
    ("txt", &["text/plain"]),
    ("md", &["text/markdown", "text/plain"]),
    ("png", &["image/png"]),
    ("jpg", &["image/jpeg"]),
    ("jpeg", &["image/jpeg"]),
    ("zip", &["application/zip", "application/x-zip-compressed"]),
];

#[derive(Clone, Debug)]
pub struct PrepareUploadRequest {
    pub file_name: String,
    pub file_size: i64,
    pub content_type: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreparedUpload {
    pub upload_url: String,
    pub file_key: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct ConfirmUploadRequest {
    pub file_key: String,
    pub file_size: i64,
    pub title: String,
    pub subject: String,
    pub semester: i16,
    pub resource_type: String,
    pub is_public: bool,
}

fn extension(file_name: &str) -> Option<String> {
    file_name
        .rsplit_once('.')
        .filter(|(stem, ext)| !stem.is_empty() && !ext.is_empty())
        .map(|(_, ext)| ext.to_ascii_lowercase())
}

pub fn validate_file_size(size: i64, max_file_size: i64) -> Result<(), ValidationError> {
    if size < 1 {
        return Err(ValidationError::invalid(size.to_string(), "file cannot be empty"));
    }
    if size > max_file_size {
        return Err(ValidationError::LimitExceeded {
            subject: "file size".to_string(),
            unit: "byte".to_string(),
            attempted: size as u64,
            limit: max_file_size as u64,
        });
    }
    Ok(())
}

pub fn validate_file_kind(file_name: &str, content_type: &str) -> Result<(), ValidationError> {
    let ext = extension(file_name).ok_or_else(|| {
        ValidationError::invalid(file_name, "file name must have an extension")
    })?;
    let Some((_, mime_types)) = ALLOWED_UPLOADS.iter().find(|(allowed, _)| *allowed == ext) else {
        return Err(ValidationError::invalid(
            file_name,
            format!("files of type `.{ext}` are not accepted"),
        ));
    };
    let content_type = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    if !mime_types.contains(&content_type.as_str()) {
        return Err(ValidationError::invalid(
            content_type,
            format!("content type does not match a `.{ext}` file"),
        ));
    }
    Ok(())
}

impl PrepareUploadRequest {
    pub fn validate(&self, max_file_size: i64) -> Result<(), ValidationError> {
        validate_file_size(self.file_size, max_file_size)?;
        validate_file_kind(&self.file_name, &self.content_type)
    }
}

/// Keeps the last path component and replaces anything outside `[A-Za-z0-9._-]`.
pub fn sanitize_file_name(file_name: &str) -> String {
    let base = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(file_name)
        .trim();
    let mut sanitized: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if sanitized.len() > FILE_NAME_LENGTH_LIMIT {
        let ext = extension(&sanitized).map(|e| format!(".{e}")).unwrap_or_default();
        let keep = FILE_NAME_LENGTH_LIMIT.saturating_sub(ext.len());
        sanitized.truncate(keep);
        sanitized.push_str(&ext);
    }
    if sanitized.trim_matches('.').is_empty() {
        return "file".to_string();
    }
    sanitized
}

fn user_prefix(user_id: UserId) -> String {
    format!("user-{user_id}/")
}

pub fn build_storage_key(user_id: UserId, now: DateTime<Utc>, file_name: &str) -> String {
    format!(
        "{}{}-{}",
        user_prefix(user_id),
        now.timestamp_millis(),
        sanitize_file_name(file_name)
    )
}

/// Original file name as embedded in a key built by [`build_storage_key`].
pub fn file_name_from_key(key: &str) -> &str {
    let name = key.rsplit('/').next().unwrap_or(key);
    match name.split_once('-') {
        Some((millis, rest)) if !rest.is_empty() && millis.chars().all(|c| c.is_ascii_digit()) => {
            rest
        }
        _ => name,
    }
}

pub fn validate_key_owner(user_id: UserId, key: &str) -> Result<(), ValidationError> {
    let owned = key
        .strip_prefix(&user_prefix(user_id))
        .is_some_and(|rest| !rest.is_empty() && !rest.contains('/') && !rest.contains(".."));
    if !owned {
        return Err(ValidationError::invalid(
            key,
            "file key is not an upload of the current user",
        ));
    }
    Ok(())
}

impl ConfirmUploadRequest {
    pub fn into_create_request(
        self,
        owner_id: UserId,
        max_file_size: i64,
    ) -> Result<CreateResourceRequest, ValidationError> {
        validate_key_owner(owner_id, &self.file_key)?;
        validate_file_size(self.file_size, max_file_size)?;
        let title = self.title.trim().to_string();
        let subject = self.subject.trim().to_string();
        validate_resource_title(&title)?;
        validate_resource_subject(&subject)?;
        validate_semester(self.semester)?;
        let resource_type = parse_resource_type(&self.resource_type)?;
        Ok(CreateResourceRequest {
            title,
            subject,
            semester: self.semester,
            resource_type,
            file_path: self.file_key,
            file_size: self.file_size,
            owner_id,
            is_public: self.is_public,
        })
    }
}
