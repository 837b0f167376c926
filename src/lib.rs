pub mod config;
pub mod controllers;
pub mod database;
pub mod errors;
pub mod models;
pub mod services;
pub mod timezone;

use chrono_tz::Tz;

// Shared state для всего приложения
#[derive(Clone)]
pub struct AppState {
    pub db: database::Database,
    pub config: config::Config,
    /// Пояс площадки, разобранный один раз на старте.
    pub tz: Tz,
}
