use chrono::NaiveDate;

use super::ApiError;
use crate::services::{CustomRequest, DailyRequest, MediaRequest};

const MAX_TITLE_LEN: usize = 200;
const MAX_STORY_LEN: usize = 10_000;

pub fn validate_location(location: &str) -> Result<&str, ApiError> {
    let trimmed = location.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("Location cannot be empty"));
    }
    if trimmed.len() > MAX_TITLE_LEN {
        return Err(ApiError::validation(format!(
            "Location must be {MAX_TITLE_LEN} characters or less"
        )));
    }
    Ok(trimmed)
}

pub fn validate_daily(request: &DailyRequest) -> Result<(), ApiError> {
    validate_location(&request.location)?;
    Ok(())
}

pub fn validate_custom(request: &CustomRequest) -> Result<(), ApiError> {
    let title = request.title.trim();
    if title.is_empty() {
        return Err(ApiError::validation("Title cannot be empty"));
    }
    if title.len() > MAX_TITLE_LEN {
        return Err(ApiError::validation(format!(
            "Title must be {MAX_TITLE_LEN} characters or less"
        )));
    }

    let story = request.story.trim();
    if story.is_empty() {
        return Err(ApiError::validation("Story cannot be empty"));
    }
    if story.len() > MAX_STORY_LEN {
        return Err(ApiError::validation(format!(
            "Story must be {MAX_STORY_LEN} characters or less"
        )));
    }

    validate_location(&request.location)?;
    Ok(())
}

pub fn validate_media(request: &MediaRequest) -> Result<(), ApiError> {
    if request.path.as_os_str().is_empty() {
        return Err(ApiError::validation("Media path cannot be empty"));
    }
    if !request.path.exists() {
        return Err(ApiError::validation(format!(
            "Media path does not exist: {}",
            request.path.display()
        )));
    }
    validate_location(&request.location)?;
    Ok(())
}

pub fn parse_date(value: Option<&str>, field: &str) -> Result<Option<NaiveDate>, ApiError> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(|v| {
            NaiveDate::parse_from_str(v.trim(), "%Y-%m-%d").map_err(|_| {
                ApiError::validation(format!("Invalid {field}: {v}. Expected YYYY-MM-DD"))
            })
        })
        .transpose()
}
