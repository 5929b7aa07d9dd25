//! Configuration file upgrades.
//!
//! Older configuration files only carry the keys that existed when they were
//! written. `missing_keys` reports which keys (dotted paths) are absent and
//! `fill_missing_keys` merges the defaults in without touching user values.

use super::Config;
use crate::errors::{AppError, AppResult};
use crate::ui::messages::{info, success};
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::Path;

/// Collect every dotted key present in `defaults` but absent from `current`.
fn collect_missing(defaults: &Mapping, current: &Mapping, prefix: &str, out: &mut Vec<String>) {
    for (key, default_val) in defaults {
        let name = key.as_str().unwrap_or_default();
        let dotted = if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{prefix}.{name}")
        };

        match (current.get(key), default_val) {
            (None, _) => out.push(dotted),
            (Some(Value::Mapping(cur)), Value::Mapping(def)) => {
                collect_missing(def, cur, &dotted, out)
            }
            _ => {}
        }
    }
}

/// Insert default values for every missing key, recursing into sections.
fn merge_defaults(defaults: &Mapping, current: &mut Mapping) -> usize {
    let mut added = 0;
    for (key, default_val) in defaults {
        match current.get_mut(key) {
            None => {
                current.insert(key.clone(), default_val.clone());
                added += 1;
            }
            Some(Value::Mapping(cur)) => {
                if let Value::Mapping(def) = default_val {
                    added += merge_defaults(def, cur);
                }
            }
            Some(_) => {}
        }
    }
    added
}

fn default_mapping() -> AppResult<Mapping> {
    match serde_yaml::to_value(Config::default())? {
        Value::Mapping(m) => Ok(m),
        _ => Err(AppError::Config("default configuration is not a mapping".into())),
    }
}

fn read_mapping(path: &Path) -> AppResult<Mapping> {
    let content = fs::read_to_string(path).map_err(|_| AppError::ConfigLoad)?;
    match serde_yaml::from_str::<Value>(&content)? {
        Value::Mapping(m) => Ok(m),
        Value::Null => Ok(Mapping::new()),
        _ => Err(AppError::Config(format!(
            "{} does not contain a YAML mapping",
            path.display()
        ))),
    }
}

/// Return the dotted names of configuration keys missing from `path`.
pub fn missing_keys(path: &Path) -> AppResult<Vec<String>> {
    let defaults = default_mapping()?;
    let current = read_mapping(path)?;
    let mut out = Vec::new();
    collect_missing(&defaults, &current, "", &mut out);
    Ok(out)
}

/// Add missing keys to the configuration file at `path`, keeping existing values.
/// Returns the number of keys that were added.
pub fn fill_missing_keys(path: &Path) -> AppResult<usize> {
    let defaults = default_mapping()?;
    let mut current = read_mapping(path)?;

    let added = merge_defaults(&defaults, &mut current);
    if added == 0 {
        info("Configuration already up to date.");
        return Ok(0);
    }

    let serialized =
        serde_yaml::to_string(&Value::Mapping(current)).map_err(|_| AppError::ConfigSave)?;
    fs::write(path, serialized)?;

    success(format!("Configuration migrated: {added} key(s) added."));
    Ok(added)
}
