use serde::{Deserialize, Serialize};

/// How a segment endpoint got its location.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMethod {
    #[default]
    Auto,
    Manual,
}

impl MatchMethod {
    /// Convert enum → DB string
    pub fn to_db_str(&self) -> &'static str {
        match self {
            MatchMethod::Auto => "auto",
            MatchMethod::Manual => "manual",
        }
    }

    /// Convert DB string → enum
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "auto" => Some(MatchMethod::Auto),
            "manual" => Some(MatchMethod::Manual),
            _ => None,
        }
    }

    pub fn is_manual(&self) -> bool {
        matches!(self, MatchMethod::Manual)
    }
}

/// Which end of a trip an operation refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endpoint {
    Start,
    End,
}

impl Endpoint {
    /// Column holding the endpoint's location id.
    pub fn location_column(&self) -> &'static str {
        match self {
            Endpoint::Start => "start_location_id",
            Endpoint::End => "end_location_id",
        }
    }

    /// Column holding the endpoint's match method.
    pub fn method_column(&self) -> &'static str {
        match self {
            Endpoint::Start => "start_match_method",
            Endpoint::End => "end_match_method",
        }
    }
}
