pub mod config;
pub mod db;
pub mod import;
pub mod init;
pub mod list;
pub mod location;
pub mod log;
pub mod mileage;
pub mod rate;
pub mod segment;
pub mod suggest;
pub mod trip;
pub mod vehicle;
