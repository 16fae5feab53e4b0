pub mod credential;
pub mod generation;
pub mod health;
pub mod project;
