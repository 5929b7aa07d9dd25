pub mod clusters;
pub mod db_utils;
pub mod ignored;
pub mod initialize;
pub mod locations;
pub mod log;
pub mod matches;
pub mod migrate;
pub mod points;
pub mod pool;
pub mod rates;
pub mod shifts;
pub mod stats;
pub mod trips;
