use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::resource::{ResourceId, ResourceRow};
use crate::models::user::UserId;

const SIZE_UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];

/// Resource as shown in listings and on the resource page.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceView {
    pub id: ResourceId,
    pub title: String,
    pub subject: String,
    pub semester: i16,
    pub resource_type: String,
    pub file_type: String,
    pub file_size: String,
    pub size_bytes: i64,
    pub uploaded_at: DateTime<Utc>,
    pub uploaded_ago: String,
    pub uploader_id: UserId,
    pub uploader_name: String,
    pub downloads: i64,
    pub is_public: bool,
}

impl ResourceView {
    pub fn from_row(row: ResourceRow, now: DateTime<Utc>) -> Self {
        Self {
            file_type: file_type_label(&row.file_path),
            file_size: format_file_size(row.file_size),
            uploaded_ago: relative_time(row.created_at, now),
            id: row.id,
            title: row.title,
            subject: row.subject,
            semester: row.semester,
            resource_type: row.resource_type,
            size_bytes: row.file_size,
            uploaded_at: row.created_at,
            uploader_id: row.owner_id,
            uploader_name: row.uploader_name,
            downloads: row.downloads,
            is_public: row.is_public,
        }
    }
}

/// Base-1024 size rounded to two decimals, trailing zeros dropped.
pub fn format_file_size(bytes: i64) -> String {
    if bytes <= 0 {
        return "0 Bytes".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = format!("{value:.2}");
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed} {}", SIZE_UNITS[unit])
}

pub fn file_type_label(path: &str) -> String {
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => ext.to_uppercase(),
        _ => "FILE".to_string(),
    }
}

fn plural(count: i64, unit: &str) -> String {
    if count == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{count} {unit}s ago")
    }
}

pub fn relative_time(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - then).num_seconds().max(0);
    let minutes = seconds / 60;
    let hours = minutes / 60;
    let days = hours / 24;
    if seconds < 60 {
        "just now".to_string()
    } else if minutes < 60 {
        plural(minutes, "minute")
    } else if hours < 24 {
        plural(hours, "hour")
    } else if days < 30 {
        plural(days, "day")
    } else if days / 30 < 12 {
        plural(days / 30, "month")
    } else {
        plural((days / 365).max(1), "year")
    }
}
