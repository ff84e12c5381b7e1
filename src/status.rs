//! Performance classification for a single member or the whole team on one date.
//!
//! Inputs are the aggregates read by the store ([`MemberDay`], [`TeamDay`]);
//! everything here is pure so the thresholds can be tested without a database.

use serde::Serialize;

/// Below this many hours a day counts as underperforming.
pub const UNDER_HOURS: f64 = 4.0;
/// Above this many hours a day counts as overperforming.
pub const OVER_HOURS: f64 = 6.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Status {
    Underperforming,
    Normal,
    Overperforming,
    #[serde(rename = "On Leave")]
    OnLeave,
    #[serde(rename = "No Team")]
    NoTeam,
    #[serde(rename = "All Absent")]
    AllAbsent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusColor {
    Red,
    Yellow,
    Green,
    Blue,
    Gray,
}

impl Status {
    pub fn color(self) -> StatusColor {
        match self {
            Status::Underperforming => StatusColor::Red,
            Status::Normal => StatusColor::Yellow,
            Status::Overperforming => StatusColor::Green,
            Status::OnLeave | Status::AllAbsent => StatusColor::Blue,
            Status::NoTeam => StatusColor::Gray,
        }
    }
}

/// What the store knows about one member on one date.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MemberDay {
    pub on_leave: bool,
    pub total_hours: f64,
}

/// What the store knows about the whole team on one date.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TeamDay {
    pub total_members: i64,
    pub absent_members: i64,
    pub team_total_hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberSummary {
    pub total_hours: f64,
    pub status: Status,
    pub color: StatusColor,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_leave: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamSummary {
    /// Average hours per active member; 0 when nobody is active.
    pub total_hours: f64,
    pub status: Status,
    pub color: StatusColor,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_members: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_total_hours: Option<f64>,
}

/// Thresholds are strict: exactly 4 and exactly 6 hours are both `Normal`.
pub fn classify_hours(hours: f64) -> Status {
    if hours < UNDER_HOURS {
        Status::Underperforming
    } else if hours > OVER_HOURS {
        Status::Overperforming
    } else {
        Status::Normal
    }
}

pub fn member_summary(day: MemberDay) -> MemberSummary {
    if day.on_leave {
        return MemberSummary {
            total_hours: 0.0,
            status: Status::OnLeave,
            color: Status::OnLeave.color(),
            is_leave: Some(true),
        };
    }

    let status = classify_hours(day.total_hours);
    MemberSummary {
        total_hours: day.total_hours,
        status,
        color: status.color(),
        is_leave: None,
    }
}

pub fn team_summary(day: TeamDay) -> TeamSummary {
    if day.total_members == 0 {
        return empty_team(Status::NoTeam);
    }

    let active_members = day.total_members - day.absent_members;
    if active_members <= 0 {
        return empty_team(Status::AllAbsent);
    }

    let avg_hours = day.team_total_hours / active_members as f64;
    let status = classify_hours(avg_hours);
    TeamSummary {
        total_hours: avg_hours,
        status,
        color: status.color(),
        active_members: Some(active_members),
        team_total_hours: Some(day.team_total_hours),
    }
}

fn empty_team(status: Status) -> TeamSummary {
    TeamSummary {
        total_hours: 0.0,
        status,
        color: status.color(),
        active_members: None,
        team_total_hours: None,
    }
}
