//! Trip detection as a finite-state machine folded over the filtered stream.

use super::{IntervalKind, classify, usable_points};
use crate::config::SegmentationConfig;
use crate::models::gps_point::GpsPoint;
use crate::models::match_method::MatchMethod;
use crate::models::trip::{CarpoolRole, Classification, TransportMode, Trip};
use log::debug;

/// Trace shorter than this before a signal loss counts as no trace at all.
const NEAR_ZERO_TRACE_M: f64 = 10.0;

/// Low-speed stretch inside a trip that may still turn out to be its end.
#[derive(Debug, Clone, Copy)]
struct StationaryRun<'a> {
    since: &'a GpsPoint,
    distance_m: f64,
    points: usize,
    low_accuracy: usize,
}

#[derive(Debug, Clone, Copy)]
struct OpenTrip<'a> {
    start: &'a GpsPoint,
    end: &'a GpsPoint,
    distance_m: f64,
    points: usize,
    low_accuracy: usize,
    /// Distance of the most recent moving interval.
    last_leg_m: f64,
    stationary_since: Option<StationaryRun<'a>>,
}

#[derive(Debug, Clone, Copy)]
enum TripState<'a> {
    Idle,
    InTrip(OpenTrip<'a>),
}

struct Segmenter<'a, 'c> {
    cfg: &'c SegmentationConfig,
    state: TripState<'a>,
    prev: Option<&'a GpsPoint>,
    trips: Vec<Trip>,
}

impl<'a, 'c> Segmenter<'a, 'c> {
    fn new(cfg: &'c SegmentationConfig) -> Self {
        Self {
            cfg,
            state: TripState::Idle,
            prev: None,
            trips: Vec::new(),
        }
    }

    fn is_low(&self, p: &GpsPoint) -> usize {
        (p.accuracy_m > self.cfg.low_accuracy_m) as usize
    }

    fn step(mut self, cur: &'a GpsPoint) -> Self {
        let Some(prev) = self.prev else {
            self.prev = Some(cur);
            return self;
        };

        let interval = classify(prev, cur, self.cfg);
        if interval.kind == IntervalKind::Glitch {
            debug!("skipping glitch transition {} -> {}", prev.id, cur.id);
            return self;
        }

        self.state = match (self.state, interval.kind) {
            (TripState::Idle, IntervalKind::Vehicle) => TripState::InTrip(OpenTrip {
                start: prev,
                end: cur,
                distance_m: interval.distance_m,
                points: 2,
                low_accuracy: self.is_low(prev) + self.is_low(cur),
                last_leg_m: interval.distance_m,
                stationary_since: None,
            }),
            (TripState::Idle, _) => TripState::Idle,

            (TripState::InTrip(mut trip), IntervalKind::Vehicle | IntervalKind::Transitional) => {
                if let Some(run) = trip.stationary_since.take() {
                    trip.distance_m += run.distance_m;
                    trip.points += run.points;
                    trip.low_accuracy += run.low_accuracy;
                }
                trip.distance_m += interval.distance_m;
                trip.points += 1;
                trip.low_accuracy += self.is_low(cur);
                trip.last_leg_m = interval.distance_m;
                trip.end = cur;
                TripState::InTrip(trip)
            }

            (TripState::InTrip(mut trip), IntervalKind::Stationary) => {
                let mut run = trip.stationary_since.unwrap_or(StationaryRun {
                    since: prev,
                    distance_m: 0.0,
                    points: 0,
                    low_accuracy: 0,
                });
                run.distance_m += interval.distance_m;
                run.points += 1;
                run.low_accuracy += self.is_low(cur);

                if cur.seconds_since(run.since) >= self.cfg.stationary_close_seconds {
                    self.close(trip, false);
                    TripState::Idle
                } else {
                    trip.stationary_since = Some(run);
                    TripState::InTrip(trip)
                }
            }

            (TripState::InTrip(mut trip), IntervalKind::Gap) => {
                let closing_m = match trip.stationary_since.take() {
                    Some(run) => {
                        trip.distance_m += run.distance_m;
                        trip.points += run.points;
                        trip.low_accuracy += run.low_accuracy;
                        trip.end = prev;
                        run.distance_m
                    }
                    None => trip.last_leg_m,
                };
                debug!("signal lost for {}s after {}", interval.seconds, prev.id);
                self.close(trip, closing_m < NEAR_ZERO_TRACE_M);
                TripState::Idle
            }

            (state, IntervalKind::Glitch) => state,
        };

        self.prev = Some(cur);
        self
    }

    /// Emit the trip ending at its last committed point, unless it is too
    /// short to be significant.
    fn close(&mut self, trip: OpenTrip<'a>, has_gps_gap: bool) {
        let distance_km = trip.distance_m / 1000.0 * self.cfg.distance_correction_factor;

        if distance_km < self.cfg.min_trip_km || trip.points < self.cfg.min_trip_points {
            debug!(
                "discarding trip {} -> {} ({:.3} km, {} points)",
                trip.start.id, trip.end.id, distance_km, trip.points
            );
            return;
        }

        let seconds = trip.end.seconds_since(trip.start);
        let duration_minutes = ((seconds as f64) / 60.0).round().max(1.0) as i64;
        let confidence = 1.0 - trip.low_accuracy as f64 / trip.points as f64;

        self.trips.push(Trip {
            id: 0,
            shift_id: trip.start.shift_id,
            employee_id: trip.start.employee_id.clone(),
            started_at: trip.start.captured_at,
            ended_at: trip.end.captured_at,
            start_lat: trip.start.latitude,
            start_lon: trip.start.longitude,
            start_accuracy: trip.start.accuracy_m,
            end_lat: trip.end.latitude,
            end_lon: trip.end.longitude,
            end_accuracy: trip.end.accuracy_m,
            distance_km,
            road_distance_km: None,
            duration_minutes,
            classification: Classification::Business,
            transport_mode: TransportMode::Driving,
            carpool_role: CarpoolRole::Solo,
            confidence_score: confidence.clamp(0.0, 1.0),
            gps_point_count: trip.points as i64,
            low_accuracy_point_count: trip.low_accuracy as i64,
            has_gps_gap,
            start_location_id: None,
            end_location_id: None,
            start_match_method: MatchMethod::Auto,
            end_match_method: MatchMethod::Auto,
            start_address: None,
            end_address: None,
        });
    }

    fn finish(mut self) -> Vec<Trip> {
        if let TripState::InTrip(trip) = self.state {
            self.close(trip, false);
        }
        self.trips
    }
}

/// Split a shift's ordered points into trips. Deterministic for a given input.
pub fn segment_trips(points: &[GpsPoint], cfg: &SegmentationConfig) -> Vec<Trip> {
    usable_points(points, cfg)
        .into_iter()
        .fold(Segmenter::new(cfg), Segmenter::step)
        .finish()
}
