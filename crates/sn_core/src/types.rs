use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A news headline that matched a company name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Headline {
    pub text: String,
    pub link: String,
    /// Publication day in UTC, serialized as `YYYY-MM-DD`.
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
}

/// A user row as stored, including the password hash. Never serialized.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub user: User,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stock {
    pub id: i64,
    pub stock: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockNews {
    pub stock: String,
    pub news: Vec<Headline>,
}

/// The `{status, error, message}` body every API route answers with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub status: u16,
    pub error: bool,
    pub message: T,
}

impl<T> ApiResponse<T> {
    pub fn new(status: u16, error: bool, message: T) -> Self {
        Self { status, error, message }
    }

    pub fn ok(message: T) -> Self {
        Self::new(200, false, message)
    }

    pub fn failure(status: u16, message: T) -> Self {
        Self::new(status, true, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headline_date_serializes_as_day() {
        let headline = Headline {
            text: "Acme posts record profit".to_string(),
            link: "https://www.livemint.com/companies/acme".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 6, 20).unwrap(),
        };
        let json = serde_json::to_value(&headline).unwrap();
        assert_eq!(json["date"], "2024-06-20");
    }

    #[test]
    fn test_envelope_shape() {
        let json = serde_json::to_value(ApiResponse::failure(403, "Sign In required")).unwrap();
        assert_eq!(json["status"], 403);
        assert_eq!(json["error"], true);
        assert_eq!(json["message"], "Sign In required");
    }
}
