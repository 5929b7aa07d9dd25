pub mod gps_point;
pub mod ignored;
pub mod location;
pub mod location_match;
pub mod match_method;
pub mod mileage;
pub mod reimbursement_rate;
pub mod shift;
pub mod stationary_cluster;
pub mod suggestion;
pub mod trip;
