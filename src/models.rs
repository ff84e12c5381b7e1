use crate::errors::AppError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const MAX_FEEDBACK_WORDS: usize = 500;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Member {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Task {
    pub id: i64,
    pub member_id: i64,
    pub date: String,
    pub title: String,
    pub description: Option<String>,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Feedback {
    pub id: i64,
    pub content: String,
    pub date: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub date: String,
    pub name: String,
    #[serde(rename = "totalHours")]
    pub total_hours: f64,
}

#[derive(Debug, Serialize)]
pub struct ExportDocument {
    pub timestamp: String,
    pub members: Vec<Member>,
    pub tasks: Vec<Task>,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub token: String,
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct TaskFilter {
    pub member_id: Option<i64>,
    pub date: Option<NaiveDate>,
}

/// Inclusive date bounds for the report view.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub member_id: i64,
    pub date: NaiveDate,
    pub title: String,
    pub description: Option<String>,
    pub weight: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeaveChange {
    pub member_id: i64,
    pub date: NaiveDate,
    pub active: bool,
}

#[derive(Debug, Deserialize)]
pub struct AddMemberRequest {
    pub name: Option<String>,
}

impl AddMemberRequest {
    pub fn validate(self) -> Result<String, AppError> {
        required_text(self.name, "name")
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddTaskRequest {
    pub member_id: Option<i64>,
    pub date: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub weight: Option<f64>,
}

impl AddTaskRequest {
    pub fn validate(self) -> Result<NewTask, AppError> {
        let member_id = self
            .member_id
            .ok_or_else(|| AppError::bad_request("memberId is required"))?;
        let date = parse_date(&required_text(self.date, "date")?)?;
        let title = required_text(self.title, "title")?;
        let weight = self
            .weight
            .ok_or_else(|| AppError::bad_request("weight is required"))?;
        if !weight.is_finite() || weight < 0.0 {
            return Err(AppError::bad_request(
                "weight must be a non-negative number of hours",
            ));
        }
        let description = self
            .description
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty());

        Ok(NewTask {
            member_id,
            date,
            title,
            description,
            weight,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveRequest {
    pub member_id: Option<i64>,
    pub date: Option<String>,
    pub active: Option<bool>,
}

impl LeaveRequest {
    pub fn validate(self) -> Result<LeaveChange, AppError> {
        let member_id = self
            .member_id
            .ok_or_else(|| AppError::bad_request("memberId is required"))?;
        let date = parse_date(&required_text(self.date, "date")?)?;
        let active = self
            .active
            .ok_or_else(|| AppError::bad_request("active is required"))?;
        Ok(LeaveChange {
            member_id,
            date,
            active,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub content: Option<String>,
}

impl FeedbackRequest {
    pub fn validate(self) -> Result<String, AppError> {
        let content = self
            .content
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| AppError::bad_request("Content is required"))?;

        let words = word_count(&content);
        if words > MAX_FEEDBACK_WORDS {
            return Err(AppError::bad_request(format!(
                "Feedback too long ({words}/{MAX_FEEDBACK_WORDS} words)."
            )));
        }
        Ok(content)
    }
}

/// Query string shared by the task list and the member summary.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberDateQuery {
    pub member_id: Option<String>,
    pub date: Option<String>,
}

impl MemberDateQuery {
    pub fn filter(self) -> Result<TaskFilter, AppError> {
        Ok(TaskFilter {
            member_id: non_blank(self.member_id)
                .map(|value| parse_id(&value))
                .transpose()?,
            date: non_blank(self.date)
                .map(|value| parse_date(&value))
                .transpose()?,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct DateQuery {
    pub date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

impl ReportQuery {
    pub fn range(self) -> Result<DateRange, AppError> {
        let range = DateRange {
            from: non_blank(self.from)
                .map(|value| parse_date(&value))
                .transpose()?,
            to: non_blank(self.to)
                .map(|value| parse_date(&value))
                .transpose()?,
        };
        if let (Some(from), Some(to)) = (range.from, range.to) {
            if from > to {
                return Err(AppError::bad_request("from must not be after to"));
            }
        }
        Ok(range)
    }
}

pub fn word_count(content: &str) -> usize {
    content.split_whitespace().count()
}

pub fn parse_date(value: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::bad_request(format!("invalid date '{value}', expected YYYY-MM-DD")))
}

pub fn parse_id(value: &str) -> Result<i64, AppError> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|_| AppError::bad_request(format!("invalid id '{value}'")))
}

pub fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}

fn required_text(value: Option<String>, field: &str) -> Result<String, AppError> {
    non_blank(value)
        .map(|text| text.trim().to_string())
        .ok_or_else(|| AppError::bad_request(format!("{field} is required")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn task_request(weight: Option<f64>) -> AddTaskRequest {
        AddTaskRequest {
            member_id: Some(1),
            date: Some("2026-03-02".to_string()),
            title: Some("  Review PRs ".to_string()),
            description: Some("   ".to_string()),
            weight,
        }
    }

    #[test]
    fn task_request_is_trimmed_and_typed() {
        let task = task_request(Some(2.5)).validate().unwrap();
        assert_eq!(task.member_id, 1);
        assert_eq!(task.date, NaiveDate::from_ymd_opt(2026, 3, 2).unwrap());
        assert_eq!(task.title, "Review PRs");
        assert_eq!(task.description, None);
        assert_eq!(task.weight, 2.5);
    }

    #[test]
    fn task_request_rejects_negative_or_missing_weight() {
        let err = task_request(Some(-1.0)).validate().unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let err = task_request(None).validate().unwrap_err();
        assert_eq!(err.message, "weight is required");
    }

    #[test]
    fn task_request_rejects_impossible_dates() {
        let mut request = task_request(Some(1.0));
        request.date = Some("2026-02-30".to_string());
        let err = request.validate().unwrap_err();
        assert!(err.message.contains("2026-02-30"));
    }

    #[test]
    fn feedback_word_limit_is_inclusive() {
        let at_limit = vec!["word"; MAX_FEEDBACK_WORDS].join(" ");
        assert!(
            FeedbackRequest {
                content: Some(at_limit)
            }
            .validate()
            .is_ok()
        );

        let over_limit = vec!["word"; MAX_FEEDBACK_WORDS + 1].join("\n");
        let err = FeedbackRequest {
            content: Some(over_limit),
        }
        .validate()
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.message.contains("501/500"));
    }

    #[test]
    fn blank_feedback_is_rejected() {
        let err = FeedbackRequest {
            content: Some(" \t ".to_string()),
        }
        .validate()
        .unwrap_err();
        assert_eq!(err.message, "Content is required");
    }

    #[test]
    fn word_count_collapses_whitespace_runs() {
        assert_eq!(word_count("  one \t two\n\nthree  "), 3);
        assert_eq!(word_count(""), 0);
    }

    #[test]
    fn empty_query_values_are_treated_as_absent() {
        let filter = MemberDateQuery {
            member_id: Some(String::new()),
            date: Some("2026-01-05".to_string()),
        }
        .filter()
        .unwrap();
        assert_eq!(filter.member_id, None);
        assert_eq!(filter.date, NaiveDate::from_ymd_opt(2026, 1, 5));

        assert!(
            MemberDateQuery {
                member_id: Some("abc".to_string()),
                date: None,
            }
            .filter()
            .is_err()
        );
    }

    #[test]
    fn report_range_must_be_ordered() {
        let err = ReportQuery {
            from: Some("2026-02-01".to_string()),
            to: Some("2026-01-01".to_string()),
        }
        .range()
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }
}
