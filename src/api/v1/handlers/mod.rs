pub mod auth;
pub mod did;
pub mod health;
pub mod revoke;
pub mod uploads;
