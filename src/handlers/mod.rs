pub mod auth;
pub mod extract;
pub mod health;
pub mod params;
pub mod tasks;
pub mod todos;
pub mod users;
