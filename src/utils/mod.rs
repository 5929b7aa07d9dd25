pub mod colors;
pub mod date;
pub mod formatting;
pub mod geo;
pub mod path;
pub mod table;
