use serde::{Deserialize, Serialize};

use crate::models::{Campground, CampgroundDetail, UserSummary};

// -- Accounts --

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

// -- Validated input --

/// Campground fields after validation. Images and geometry are filled in
/// server-side and never come from the client.
#[derive(Debug, Clone, PartialEq)]
pub struct CampgroundInput {
    pub title: String,
    pub price: f64,
    pub location: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewInput {
    pub body: String,
    pub rating: u8,
}

// -- Notices --

/// Severity of a one-shot notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "success" => Some(Self::Success),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub severity: Severity,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }
}

/// Notices drained from the session, grouped by severity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notices {
    pub success: Vec<String>,
    pub error: Vec<String>,
}

impl Notices {
    pub fn push(&mut self, notice: Notice) {
        match notice.severity {
            Severity::Success => self.success.push(notice.message),
            Severity::Error => self.error.push(notice.message),
        }
    }
}

impl FromIterator<Notice> for Notices {
    fn from_iter<I: IntoIterator<Item = Notice>>(iter: I) -> Self {
        let mut notices = Self::default();
        for notice in iter {
            notices.push(notice);
        }
        notices
    }
}

// -- Pages --

/// Everything a page template would need: who is logged in, the notices
/// queued for this render, and the page's own data.
#[derive(Debug, Serialize, Deserialize)]
pub struct Page<T> {
    pub current_user: Option<UserSummary>,
    pub notices: Notices,
    pub data: T,
}

/// Which static page or form a page shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    Home,
    Register,
    Login,
    NewCampground,
    EditCampground,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ViewData {
    pub view: View,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub campground: Option<Campground>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CampgroundIndex {
    pub campgrounds: Vec<Campground>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CampgroundShow {
    pub campground: CampgroundDetail,
}

// -- Errors --

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorPage {
    pub status: u16,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notices_group_by_severity_in_order() {
        let notices: Notices = vec![
            Notice::success("one"),
            Notice::error("bad"),
            Notice::success("two"),
        ]
        .into_iter()
        .collect();
        assert_eq!(notices.success, vec!["one", "two"]);
        assert_eq!(notices.error, vec!["bad"]);
    }

    #[test]
    fn severity_round_trips_through_its_column_form() {
        for s in [Severity::Success, Severity::Error] {
            assert_eq!(Severity::parse(s.as_str()), Some(s));
        }
        assert_eq!(Severity::parse("info"), None);
    }
}
