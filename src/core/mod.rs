pub mod import;
pub mod location_match;
pub mod log;
pub mod matcher;
pub mod mileage;
pub mod recompute;
pub mod registry;
pub mod rematch;
pub mod segmentation;
pub mod suggest;
pub mod timeline;
pub mod trip_edit;
