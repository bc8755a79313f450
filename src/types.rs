/// Shared types used across the codebase

use serde::{Deserialize, Serialize};

/// Authenticated user identity as returned by login/registration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub student_id: String,
    pub name: String,
}

/// Canonical result of login and registration, independent of envelope nesting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResult {
    pub message: String,
    pub user: User,
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginForm {
    pub student_id: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterForm {
    pub student_id: String,
    pub name: String,
    pub password: String,
}

/// Paged list payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginationData<T> {
    pub total: u64,
    pub list: Vec<T>,
}
