pub mod auth;
pub mod content;
pub mod credential;
pub mod generation;
pub mod project;
pub mod status;
