pub mod accounts;
pub mod auth;
pub mod configuration;
pub mod error;
pub mod gate;
pub mod logger;
pub mod middleware;
pub mod models;
pub mod response;
pub mod routes;
pub mod startup;
pub mod store;
pub mod telemetry;
pub mod validators;
