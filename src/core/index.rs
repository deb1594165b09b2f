//! Candidate event set and the uniform lat/lon grid used to find nearest events.
//!
//! The exhaustive scan ([`nearest_exhaustive`]) is the reference answer. The
//! grid ([`EventGrid`]) visits square rings of cells around a query point and
//! stops once a great-circle lower bound on every unvisited cell exceeds the
//! best distance found, so both return the same event for every query.
//!
//! Selection rule shared by both: take the minimum distance `d*`, then among
//! all candidates within `d* + TIE_TOLERANCE_MI` pick the lowest id rank. The
//! rule only depends on the set of candidates seen, never on visiting order.

use std::collections::HashMap;

use geo::{BoundingRect, MultiPoint, Point};

use crate::core::distance::{degrees_to_miles, haversine_miles, EARTH_RADIUS_MI};
use crate::core::error::NumericFault;
use crate::core::filters::is_valid_event;
use crate::core::radius::RadiusPolicy;
use crate::models::{EventId, StormEvent};

/// Distances closer than this are treated as ties
pub const TIE_TOLERANCE_MI: f64 = 1e-9;

/// Absorbs rounding differences between the cell bounds and haversine
const BOUND_SLACK_MI: f64 = 1e-6;

const MIN_CELL_DEG: f64 = 0.01;
const MAX_CELL_DEG: f64 = 10.0;

/// A storm event that passed validation and the hail-size threshold
#[derive(Debug, Clone)]
pub struct Candidate {
    pub id: EventId,
    /// Position in the input event sequence
    pub event_index: usize,
    /// Position in ascending id order; lower wins ties
    pub rank: usize,
    /// `x` is longitude, `y` is latitude
    pub point: Point<f64>,
    pub hail_size_in: f64,
    pub radius_mi: f64,
}

impl Candidate {
    #[inline]
    pub fn distance_from(&self, latitude: f64, longitude: f64) -> f64 {
        haversine_miles(latitude, longitude, self.point.y(), self.point.x())
    }
}

/// Events eligible to be matched, plus what was screened out
#[derive(Debug, Clone, Default)]
pub struct CandidateSet {
    pub candidates: Vec<Candidate>,
    /// Ids of events with invalid coordinates or hail size
    pub rejected: Vec<EventId>,
    /// Valid events smaller than the hail-size threshold
    pub below_threshold: usize,
}

impl CandidateSet {
    pub fn build(events: &[StormEvent], policy: &RadiusPolicy) -> Self {
        let mut rejected = Vec::new();
        let mut below_threshold = 0;
        let mut eligible = Vec::with_capacity(events.len());

        for (index, event) in events.iter().enumerate() {
            if !is_valid_event(event) {
                rejected.push(event.id.clone());
                continue;
            }
            if !policy.qualifies(event.hail_size()) {
                below_threshold += 1;
                continue;
            }
            eligible.push(index);
        }

        // Rank by id; the sort is stable so duplicate ids keep load order.
        let mut by_id = eligible.clone();
        by_id.sort_by(|&a, &b| events[a].id.cmp(&events[b].id));
        let mut rank_of = HashMap::with_capacity(by_id.len());
        for (rank, &index) in by_id.iter().enumerate() {
            rank_of.insert(index, rank);
        }

        let candidates = eligible
            .into_iter()
            .map(|index| {
                let event = &events[index];
                let hail_size_in = event.hail_size();
                Candidate {
                    id: event.id.clone(),
                    event_index: index,
                    rank: rank_of[&index],
                    point: Point::new(event.longitude, event.latitude),
                    hail_size_in,
                    radius_mi: policy.radius_mi(hail_size_in),
                }
            })
            .collect();

        Self {
            candidates,
            rejected,
            below_threshold,
        }
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// Nearest qualifying event for one query point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Nearest {
    /// Index into the candidate slice
    pub candidate: usize,
    pub distance_mi: f64,
}

#[derive(Debug, Default)]
struct NearestTracker {
    best: Option<f64>,
    /// (distance, rank, candidate) for everything within tolerance of `best`
    near: Vec<(f64, usize, usize)>,
    fault: bool,
}

impl NearestTracker {
    #[inline]
    fn offer(&mut self, distance: f64, rank: usize, candidate: usize) {
        if !distance.is_finite() {
            self.fault = true;
            return;
        }

        let best = match self.best {
            Some(best) if best <= distance => best,
            _ => {
                self.best = Some(distance);
                self.near.retain(|&(d, _, _)| d <= distance + TIE_TOLERANCE_MI);
                distance
            }
        };

        if distance <= best + TIE_TOLERANCE_MI {
            self.near.push((distance, rank, candidate));
        }
    }

    fn best(&self) -> Option<f64> {
        self.best
    }

    fn finish(self, latitude: f64, longitude: f64) -> Result<Option<Nearest>, NumericFault> {
        if self.fault {
            return Err(NumericFault { latitude, longitude });
        }

        let Some(best) = self.best else {
            return Ok(None);
        };

        Ok(self
            .near
            .into_iter()
            .filter(|&(d, _, _)| d <= best + TIE_TOLERANCE_MI)
            .min_by_key(|&(_, rank, _)| rank)
            .map(|(distance_mi, _, candidate)| Nearest { candidate, distance_mi }))
    }
}

/// Reference all-pairs search over every candidate
pub fn nearest_exhaustive(
    candidates: &[Candidate],
    latitude: f64,
    longitude: f64,
) -> Result<Option<Nearest>, NumericFault> {
    let mut tracker = NearestTracker::default();
    for (i, candidate) in candidates.iter().enumerate() {
        tracker.offer(candidate.distance_from(latitude, longitude), candidate.rank, i);
    }
    tracker.finish(latitude, longitude)
}

/// Uniform latitude/longitude bucket grid over candidate events
///
/// Read-only after construction and shared by reference across worker threads.
#[derive(Debug)]
pub struct EventGrid<'a> {
    candidates: &'a [Candidate],
    cell_deg: f64,
    rows: i64,
    cols: i64,
    buckets: HashMap<(i64, i64), Vec<usize>>,
    /// Ring area (in cells) beyond which a query switches to the exhaustive scan
    fallback_cells: i64,
}

impl<'a> EventGrid<'a> {
    pub fn build(candidates: &'a [Candidate]) -> Self {
        let cell_deg = choose_cell_size(candidates);
        let cols = ((360.0 / cell_deg).round() as i64).max(1);
        let rows = (180.0 / cell_deg).ceil() as i64;

        let mut grid = Self {
            candidates,
            cell_deg,
            rows,
            cols,
            buckets: HashMap::new(),
            fallback_cells: 0,
        };

        for (i, candidate) in candidates.iter().enumerate() {
            let cell = grid.cell_of(candidate.point.y(), candidate.point.x());
            grid.buckets.entry(cell).or_default().push(i);
        }
        grid.fallback_cells = 4 * grid.buckets.len() as i64 + 64;

        tracing::debug!(
            "Built event grid: {} candidates in {} buckets ({:.3}° cells)",
            candidates.len(),
            grid.buckets.len(),
            cell_deg
        );

        grid
    }

    pub fn cell_size_deg(&self) -> f64 {
        self.cell_deg
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    #[inline]
    fn cell_of(&self, latitude: f64, longitude: f64) -> (i64, i64) {
        let row = (((latitude + 90.0) / self.cell_deg).floor() as i64).clamp(0, self.rows - 1);
        let col = (((longitude + 180.0) / self.cell_deg).floor() as i64).clamp(0, self.cols - 1);
        (row, col)
    }

    /// Find the nearest candidate to a point
    pub fn nearest(&self, latitude: f64, longitude: f64) -> Result<Option<Nearest>, NumericFault> {
        if self.candidates.is_empty() {
            return Ok(None);
        }

        let (row, col) = self.cell_of(latitude, longitude);
        let mut tracker = NearestTracker::default();

        let mut ring = 0i64;
        loop {
            self.scan_ring(latitude, longitude, (row, col), ring, &mut tracker);

            let all_rows = row - ring <= 0 && row + ring >= self.rows - 1;
            let all_cols = 2 * ring + 1 >= self.cols;
            if all_rows && all_cols {
                break;
            }

            if let Some(best) = tracker.best() {
                let bound = self.unvisited_bound(latitude, longitude, row, col, ring);
                if bound - BOUND_SLACK_MI > best + TIE_TOLERANCE_MI {
                    break;
                }
            }

            let side = 2 * ring + 1;
            if side * side > self.fallback_cells {
                return nearest_exhaustive(self.candidates, latitude, longitude);
            }

            ring += 1;
        }

        tracker.finish(latitude, longitude)
    }

    fn scan_ring(
        &self,
        latitude: f64,
        longitude: f64,
        (row, col): (i64, i64),
        ring: i64,
        tracker: &mut NearestTracker,
    ) {
        let scan = |r: i64, c: i64, tracker: &mut NearestTracker| {
            let Some(bucket) = self.buckets.get(&(r, c)) else {
                return;
            };
            for &i in bucket {
                let candidate = &self.candidates[i];
                tracker.offer(candidate.distance_from(latitude, longitude), candidate.rank, i);
            }
        };
        let full_width = 2 * ring + 1 >= self.cols;

        for dr in -ring..=ring {
            let r = row + dr;
            if r < 0 || r >= self.rows {
                continue;
            }

            if dr.abs() == ring {
                if full_width {
                    for c in 0..self.cols {
                        scan(r, c, tracker);
                    }
                } else {
                    for dc in -ring..=ring {
                        scan(r, (col + dc).rem_euclid(self.cols), tracker);
                    }
                }
            } else {
                scan(r, (col - ring).rem_euclid(self.cols), tracker);
                scan(r, (col + ring).rem_euclid(self.cols), tracker);
            }
        }
    }

    /// Lower bound in miles on the distance to any cell outside `ring`
    fn unvisited_bound(&self, latitude: f64, longitude: f64, row: i64, col: i64, ring: i64) -> f64 {
        let south = if row - ring <= 0 {
            f64::INFINITY
        } else {
            latitude - ((row - ring) as f64 * self.cell_deg - 90.0)
        };
        let north = if row + ring >= self.rows - 1 {
            f64::INFINITY
        } else {
            (row + ring + 1) as f64 * self.cell_deg - 90.0 - latitude
        };
        let lat_bound = degrees_to_miles(south.min(north).max(0.0));

        let lon_bound = if 2 * ring + 1 >= self.cols {
            f64::INFINITY
        } else {
            let west = longitude - ((col - ring) as f64 * self.cell_deg - 180.0);
            let east = (col + ring + 1) as f64 * self.cell_deg - 180.0 - longitude;
            let gap = west.min(east).clamp(0.0, 90.0).to_radians();
            // Distance from the query point to the nearest meridian `gap` away
            let sin_d = (latitude.to_radians().cos().abs() * gap.sin()).clamp(0.0, 1.0);
            EARTH_RADIUS_MI * sin_d.asin()
        };

        lat_bound.min(lon_bound)
    }
}

/// Cell edge length in degrees: roughly one event per cell over the event
/// extent, and an exact divisor of 360° so columns wrap cleanly.
fn choose_cell_size(candidates: &[Candidate]) -> f64 {
    let points: MultiPoint<f64> = candidates.iter().map(|c| c.point).collect();
    let target = match points.bounding_rect() {
        Some(extent) => {
            let width = extent.width().max(MIN_CELL_DEG);
            let height = extent.height().max(MIN_CELL_DEG);
            (width * height / candidates.len() as f64).sqrt()
        }
        None => MAX_CELL_DEG,
    };
    let target = target.clamp(MIN_CELL_DEG, MAX_CELL_DEG);
    360.0 / (360.0 / target).ceil()
}
