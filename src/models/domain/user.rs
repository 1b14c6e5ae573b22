use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub id: String,
    pub email: Option<String>,
    pub username: Option<String>,
    pub user_type: Option<String>,
    pub email_verified: bool,
    pub created_at: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: Option<i64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Student,
    Teacher,
    Parent,
    Employee,
    Academic,
    Other,
}

impl UserType {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "student" => Some(UserType::Student),
            "teacher" => Some(UserType::Teacher),
            "parent" => Some(UserType::Parent),
            "employee" => Some(UserType::Employee),
            "academic" => Some(UserType::Academic),
            "other" => Some(UserType::Other),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Student => "student",
            UserType::Teacher => "teacher",
            UserType::Parent => "parent",
            UserType::Employee => "employee",
            UserType::Academic => "academic",
            UserType::Other => "other",
        }
    }
}
