//! Animal movement classification.
//!
//! Each animal moves through a small state machine as evidence is fed in:
//! pre-interval positions and chipping locations can only make an animal
//! [`AnimalState::Present`]; in-interval visits drive the transitions
//! between inside and outside. Feed order matters, so the three
//! `record_*` methods must be called in the order they are declared.

use std::collections::{BTreeMap, BTreeSet};

use chipping_analytics_models::{AnalyticsGroup, VisitedLocation};
use chipping_geometry::contains_point;
use chipping_geometry_models::GeoPoint;
use geo::Polygon;

/// Where an animal stands relative to the area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimalState {
    /// Inside since before the interval (or chipped inside).
    Present,
    /// Entered during the interval and still inside.
    ArrivedPresent,
    /// Was present, then left during the interval.
    Departed,
    /// Entered during the interval, then left (or re-entered after leaving).
    ArrivedDeparted,
}

impl AnimalState {
    /// Counted in the quantity group.
    #[must_use]
    pub const fn is_present(self) -> bool {
        matches!(self, Self::Present | Self::ArrivedPresent)
    }

    /// Counted in the arrived group.
    #[must_use]
    pub const fn has_arrived(self) -> bool {
        matches!(self, Self::ArrivedPresent | Self::ArrivedDeparted)
    }

    /// Counted in the gone group.
    #[must_use]
    pub const fn has_gone(self) -> bool {
        matches!(self, Self::Departed | Self::ArrivedDeparted)
    }

    /// Transition for one in-interval visit.
    ///
    /// An animal that already left never becomes present again within the
    /// same interval; re-entering only marks it as arrived.
    #[must_use]
    pub const fn after_visit(current: Option<Self>, inside: bool) -> Option<Self> {
        match (current, inside) {
            (None, true) => Some(Self::ArrivedPresent),
            (None, false) => None,
            (Some(Self::Present), false) => Some(Self::Departed),
            (Some(Self::ArrivedPresent), false) => Some(Self::ArrivedDeparted),
            (Some(Self::Departed), true) => Some(Self::ArrivedDeparted),
            (Some(state), _) => Some(state),
        }
    }
}

/// The three animal id groups produced by classification.
///
/// `quantity` and `gone` are always disjoint; `arrived` may overlap
/// either of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    /// Inside the area at the end of the interval.
    pub quantity: BTreeSet<i64>,
    /// Entered during the interval.
    pub arrived: BTreeSet<i64>,
    /// Left during the interval.
    pub gone: BTreeSet<i64>,
}

impl Classification {
    /// The ids in one group.
    #[must_use]
    pub const fn group(&self, group: AnalyticsGroup) -> &BTreeSet<i64> {
        match group {
            AnalyticsGroup::Quantity => &self.quantity,
            AnalyticsGroup::Arrived => &self.arrived,
            AnalyticsGroup::Gone => &self.gone,
        }
    }

    /// Every id that appears in at least one group.
    #[must_use]
    pub fn all_ids(&self) -> BTreeSet<i64> {
        self.quantity
            .iter()
            .chain(&self.arrived)
            .chain(&self.gone)
            .copied()
            .collect()
    }
}

/// Classifies animals against one area polygon.
pub struct MovementClassifier<'a> {
    polygon: &'a Polygon<f64>,
    states: BTreeMap<i64, AnimalState>,
}

impl<'a> MovementClassifier<'a> {
    /// Starts a classification with every animal unseen.
    #[must_use]
    pub const fn new(polygon: &'a Polygon<f64>) -> Self {
        Self {
            polygon,
            states: BTreeMap::new(),
        }
    }

    /// Pass 1: each animal's last visit before the interval.
    pub fn record_prior_visits(&mut self, visits: &[VisitedLocation]) {
        for visit in visits {
            self.mark_present_if_inside(visit.animal_id, &visit.point);
        }
        log::debug!(
            "After prior visits: {} of {} animals present",
            self.states.len(),
            visits.len()
        );
    }

    /// Pass 2: chipping locations of animals without a usable visit
    /// history, as `(animal_id, chipping_point)` pairs.
    pub fn record_chipping(&mut self, chipped: &[(i64, GeoPoint)]) {
        for (animal_id, point) in chipped {
            self.mark_present_if_inside(*animal_id, point);
        }
        log::debug!(
            "After chipping locations: {} animals present",
            self.states.len()
        );
    }

    /// Pass 3: visits inside the interval.
    ///
    /// Visits are replayed in ascending timestamp order. The sort is
    /// stable, so visits with equal timestamps keep the order storage
    /// returned them in.
    pub fn record_interval_visits(&mut self, visits: &[VisitedLocation]) {
        let mut ordered: Vec<&VisitedLocation> = visits.iter().collect();
        ordered.sort_by_key(|visit| visit.visited_at);

        for visit in ordered {
            let inside = contains_point(self.polygon, &visit.point);
            let current = self.states.get(&visit.animal_id).copied();

            match AnimalState::after_visit(current, inside) {
                Some(next) => {
                    if current != Some(next) {
                        log::trace!(
                            "Animal {} {current:?} -> {next:?} at {}",
                            visit.animal_id,
                            visit.visited_at
                        );
                    }
                    self.states.insert(visit.animal_id, next);
                }
                None => {
                    self.states.remove(&visit.animal_id);
                }
            }
        }
    }

    /// Current state of an animal, `None` if it has not been seen inside.
    #[must_use]
    pub fn state(&self, animal_id: i64) -> Option<AnimalState> {
        self.states.get(&animal_id).copied()
    }

    /// Collapses the per-animal states into the three groups.
    #[must_use]
    pub fn finish(self) -> Classification {
        let mut classification = Classification::default();

        for (animal_id, state) in self.states {
            if state.is_present() {
                classification.quantity.insert(animal_id);
            }
            if state.has_arrived() {
                classification.arrived.insert(animal_id);
            }
            if state.has_gone() {
                classification.gone.insert(animal_id);
            }
        }

        log::debug!(
            "Classified {} present, {} arrived, {} gone",
            classification.quantity.len(),
            classification.arrived.len(),
            classification.gone.len()
        );

        classification
    }

    fn mark_present_if_inside(&mut self, animal_id: i64, point: &GeoPoint) {
        if contains_point(self.polygon, point) {
            self.states.entry(animal_id).or_insert(AnimalState::Present);
        }
    }
}
