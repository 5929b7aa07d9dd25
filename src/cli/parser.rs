use clap::{Parser, Subcommand};

/// Command-line interface definition for rTriplogger
/// CLI application turning shift GPS telemetry into trips, stops and mileage
#[derive(Parser)]
#[command(
    name = "rtriplogger",
    version = env!("CARGO_PKG_VERSION"),
    about = "Trip segmentation, geofence matching and mileage reimbursement from shift GPS data",
    long_about = None
)]
pub struct Cli {
    /// Override database path (useful for tests or custom DB)
    #[arg(global = true, long = "db")]
    pub db: Option<String>,

    /// Run in test mode (no config file update)
    #[arg(global = true, long = "test", hide = true)]
    pub test: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database and configuration
    Init,

    /// Manage the configuration file (view or edit)
    Config {
        #[arg(long = "print", help = "Print the current configuration file")]
        print_config: bool,

        #[arg(long = "check", help = "Check configuration file for missing fields")]
        check: bool,

        #[arg(long = "migrate", help = "Add missing fields to the configuration file")]
        migrate: bool,

        #[arg(
            long = "edit",
            help = "Edit the configuration file (default editor: $EDITOR, or nano/notepad)"
        )]
        edit_config: bool,

        #[arg(
            long = "editor",
            help = "Specify the editor to use (vim, nano, or custom path)"
        )]
        editor: Option<String>,
    },

    /// Manage the database (migrations, integrity checks, etc.)
    Db {
        #[arg(long = "migrate", help = "Run pending database migrations")]
        migrate: bool,

        #[arg(long = "check", help = "Check database integrity")]
        check: bool,

        #[arg(long = "vacuum", help = "Optimize the database using VACUUM")]
        vacuum: bool,

        #[arg(long = "info", help = "Show database information")]
        info: bool,

        #[arg(
            long = "rebuild-matches",
            help = "Drop and rebuild the per-point location match cache"
        )]
        rebuild_matches: bool,
    },

    /// Print or manage the internal log table
    Log {
        #[arg(long = "print", help = "Print rows from the internal log table")]
        print: bool,
    },

    /// Load GPS points or shift boundaries from a CSV file
    Import {
        #[arg(long = "points", value_name = "FILE", conflicts_with = "shifts")]
        points: Option<String>,

        #[arg(long = "shifts", value_name = "FILE")]
        shifts: Option<String>,
    },

    /// Recompute trips and stops for a closed shift (or all of them)
    Segment {
        #[arg(long = "shift", conflicts_with = "all", help = "Shift id to recompute")]
        shift: Option<i64>,

        #[arg(long = "all", help = "Recompute every closed shift")]
        all: bool,
    },

    /// List the trips, stops or timeline of a shift
    List {
        #[arg(long = "shift", help = "Shift id")]
        shift: i64,

        #[arg(long = "stops", help = "List stops instead of trips")]
        stops: bool,

        #[arg(long = "timeline", conflicts_with = "stops", help = "Show the merged day timeline")]
        timeline: bool,

        #[arg(long = "json", help = "Print JSON instead of a table")]
        json: bool,
    },

    /// Manage the location registry
    Location {
        #[arg(long = "add", help = "Create a location")]
        add: bool,

        #[arg(long = "edit", value_name = "ID", help = "Edit a location")]
        edit: Option<i64>,

        #[arg(long = "del", value_name = "ID", help = "Delete a location")]
        del: Option<i64>,

        #[arg(long = "activate", value_name = "ID")]
        activate: Option<i64>,

        #[arg(long = "deactivate", value_name = "ID")]
        deactivate: Option<i64>,

        #[arg(long = "list", help = "List locations")]
        list: bool,

        #[arg(long = "name")]
        name: Option<String>,

        #[arg(
            long = "type",
            help = "office, building, vendor, home, gaz, cafe_restaurant, other"
        )]
        kind: Option<String>,

        #[arg(long = "lat", allow_hyphen_values = true)]
        lat: Option<f64>,

        #[arg(long = "lon", allow_hyphen_values = true)]
        lon: Option<f64>,

        #[arg(long = "radius", help = "Geofence radius in meters")]
        radius: Option<f64>,

        #[arg(long = "inactive", help = "Create the location as inactive")]
        inactive: bool,

        #[arg(long = "json", help = "Print JSON instead of a table")]
        json: bool,
    },

    /// Show or edit a trip (manual endpoint overrides and annotations)
    Trip {
        /// Trip id
        id: i64,

        #[arg(long = "start-location", value_name = "LOCATION_ID")]
        start_location: Option<i64>,

        #[arg(long = "end-location", value_name = "LOCATION_ID")]
        end_location: Option<i64>,

        #[arg(long = "clear-start", help = "Manually mark the start as matching no location")]
        clear_start: bool,

        #[arg(long = "clear-end", help = "Manually mark the end as matching no location")]
        clear_end: bool,

        #[arg(long = "reset-start", help = "Return the start to automatic matching")]
        reset_start: bool,

        #[arg(long = "reset-end", help = "Return the end to automatic matching")]
        reset_end: bool,

        #[arg(long = "classify", help = "business or personal")]
        classify: Option<String>,

        #[arg(long = "mode", help = "driving, walking, cycling, transit, other")]
        mode: Option<String>,

        #[arg(long = "carpool", help = "solo, driver or passenger")]
        carpool: Option<String>,

        #[arg(long = "road-km", help = "Road distance from map matching")]
        road_km: Option<f64>,

        #[arg(long = "start-address")]
        start_address: Option<String>,

        #[arg(long = "end-address")]
        end_address: Option<String>,

        #[arg(long = "json", help = "Print JSON instead of text")]
        json: bool,
    },

    /// Suggested locations from recurring unmatched endpoints
    Suggest {
        #[arg(long = "min", help = "Minimum occurrences per suggestion")]
        min: Option<usize>,

        #[arg(long = "occurrences", value_name = "LAT,LON", allow_hyphen_values = true)]
        occurrences: Option<String>,

        #[arg(long = "radius", default_value_t = 50.0, help = "Drill-down radius in meters")]
        radius: f64,

        #[arg(
            long = "dismiss",
            value_name = "LAT,LON",
            allow_hyphen_values = true,
            requires = "count"
        )]
        dismiss: Option<String>,

        #[arg(long = "count", help = "Occurrence count at dismissal")]
        count: Option<i64>,

        #[arg(long = "dismiss-endpoint", value_name = "SOURCE:ID")]
        dismiss_endpoint: Option<String>,

        #[arg(long = "restore", value_name = "ID", help = "Remove a cluster dismissal")]
        restore: Option<i64>,

        #[arg(long = "dismissed", help = "List dismissed clusters and endpoints")]
        dismissed: bool,

        #[arg(
            long = "as-of",
            value_name = "TIMESTAMP",
            help = "Evaluate the window as of this time"
        )]
        as_of: Option<String>,

        #[arg(long = "json", help = "Print JSON instead of a table")]
        json: bool,
    },

    /// Manage reimbursement rates
    Rate {
        #[arg(long = "add", requires_all = ["per_km", "from"])]
        add: bool,

        #[arg(long = "list")]
        list: bool,

        #[arg(long = "per-km", help = "Rate per km")]
        per_km: Option<f64>,

        #[arg(long = "threshold", help = "Yearly km threshold of the base tier")]
        threshold: Option<f64>,

        #[arg(long = "after", help = "Rate per km beyond the threshold")]
        after: Option<f64>,

        #[arg(long = "from", help = "Effective from (YYYY-MM-DD)")]
        from: Option<String>,

        #[arg(long = "to", help = "Effective until (YYYY-MM-DD)")]
        to: Option<String>,
    },

    /// Record a day on which an employee used a company vehicle
    Vehicle {
        #[arg(long = "employee")]
        employee: String,

        #[arg(long = "date", help = "YYYY-MM-DD")]
        date: String,
    },

    /// Mileage and reimbursement summary
    Mileage {
        #[arg(long = "employee")]
        employee: String,

        #[arg(long = "from", help = "Period start (YYYY-MM-DD)")]
        from: String,

        #[arg(long = "to", help = "Period end (YYYY-MM-DD)")]
        to: String,

        #[arg(long = "json", help = "Print JSON instead of text")]
        json: bool,
    },
}
