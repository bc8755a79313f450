pub mod auth;
pub mod class;
pub mod route;
pub mod teacher;
