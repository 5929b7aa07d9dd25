//! Row conversion helpers shared by the query modules.
//!
//! Timestamps are stored as fixed-width RFC 3339 text and dates as
//! `YYYY-MM-DD`; enums as their lowercase DB string. Conversion failures are
//! reported through rusqlite so they surface as `AppError::Db`.

use crate::errors::AppError;
use crate::utils::date::{parse_date, parse_ts};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::Row;
use rusqlite::types::Type;

fn conversion_error(idx: usize, err: AppError) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn column_index(row: &Row, name: &str) -> usize {
    row.as_ref().column_index(name).unwrap_or(0)
}

pub fn ts_col(row: &Row, name: &str) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(name)?;
    parse_ts(&raw).ok_or_else(|| {
        conversion_error(column_index(row, name), AppError::InvalidTimestamp(raw.clone()))
    })
}

pub fn opt_ts_col(row: &Row, name: &str) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(name)?;
    match raw {
        None => Ok(None),
        Some(s) => parse_ts(&s).map(Some).ok_or_else(|| {
            conversion_error(column_index(row, name), AppError::InvalidTimestamp(s.clone()))
        }),
    }
}

pub fn date_col(row: &Row, name: &str) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(name)?;
    parse_date(&raw).ok_or_else(|| {
        conversion_error(column_index(row, name), AppError::InvalidDate(raw.clone()))
    })
}

pub fn opt_date_col(row: &Row, name: &str) -> rusqlite::Result<Option<NaiveDate>> {
    let raw: Option<String> = row.get(name)?;
    match raw {
        None => Ok(None),
        Some(s) => parse_date(&s).map(Some).ok_or_else(|| {
            conversion_error(column_index(row, name), AppError::InvalidDate(s.clone()))
        }),
    }
}

/// Read a text column and convert it with one of the models' `from_db_str`.
pub fn enum_col<T>(
    row: &Row,
    name: &'static str,
    parse: impl Fn(&str) -> Option<T>,
) -> rusqlite::Result<T> {
    let raw: String = row.get(name)?;
    parse(&raw).ok_or_else(|| {
        conversion_error(
            column_index(row, name),
            AppError::InvalidValue {
                field: name,
                value: raw.clone(),
            },
        )
    })
}
