//! Unified application error type.
//! All modules (db, core, cli, utils) return AppError to keep the error
//! handling consistent and easy to manage.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    // ---------------------------
    // IO
    // ---------------------------
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    // ---------------------------
    // Database-related
    // ---------------------------
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("Database migration error: {0}")]
    Migration(String),

    // ---------------------------
    // Parsing errors
    // ---------------------------
    #[error("Invalid date format: {0}")]
    InvalidDate(String),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(String),

    #[error("Invalid location type: {0}")]
    InvalidLocationType(String),

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ---------------------------
    // Input errors (fail fast)
    // ---------------------------
    #[error("Shift {0} not found")]
    ShiftNotFound(i64),

    #[error("Shift {0} is still active; segmentation requires a closed shift")]
    ShiftStillActive(i64),

    #[error("Location {0} not found")]
    LocationNotFound(i64),

    #[error("Trip {0} not found")]
    TripNotFound(i64),

    #[error("Location radius {radius} m is outside the allowed range {min}..={max} m")]
    InvalidRadius { radius: f64, min: f64, max: f64 },

    #[error("Invalid period: {0}")]
    InvalidPeriod(String),

    // ---------------------------
    // Config errors
    // ---------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to load configuration")]
    ConfigLoad,

    #[error("Failed to save configuration")]
    ConfigSave,

    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    // ---------------------------
    // Generic fallback
    // ---------------------------
    #[error("Internal error: {0}")]
    Other(String),
}

pub type AppResult<T> = Result<T, AppError>;
