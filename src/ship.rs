//! Ship navigation along a planned route.
//!
//! The navigator never looks at the terrain or the tide; everything it needs
//! is already in the waypoint arrival times. Between two waypoints the ship
//! waits in place until the last `required_time` before the arrival, then
//! glides linearly to the next cell.

use crate::route::Waypoint;
use crate::stage::WorldCell;

/// Emitted by [`Navigator::update`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NavEvent {
    /// The final waypoint was reached. Fires once per route.
    Arrived { position: WorldCell, at: f64 },
}

#[derive(Clone, Debug)]
pub struct Navigator {
    cell: WorldCell,
    required_time: f64,
    route: Vec<Waypoint>,
    navigating: bool,
}

impl Navigator {
    pub fn new(cell: WorldCell, required_time: f64) -> Self {
        Self {
            cell,
            required_time,
            route: Vec::new(),
            navigating: false,
        }
    }

    /// Last cell the ship was known to occupy.
    pub fn cell(&self) -> WorldCell {
        self.cell
    }

    pub fn required_time(&self) -> f64 {
        self.required_time
    }

    pub fn is_navigating(&self) -> bool {
        self.navigating
    }

    /// The route being followed; empty when idle.
    pub fn route(&self) -> &[Waypoint] {
        &self.route
    }

    pub fn route_start_time(&self) -> Option<f64> {
        self.route.first().map(|w| w.duration)
    }

    pub fn route_end_time(&self) -> Option<f64> {
        self.route.last().map(|w| w.duration)
    }

    /// Start following `route`. An empty route means no route was found:
    /// nothing changes and `false` is returned.
    pub fn begin(&mut self, route: Vec<Waypoint>) -> bool {
        let Some(first) = route.first() else {
            return false;
        };
        self.cell = first.position;
        self.route = route;
        self.navigating = true;
        true
    }

    /// Continue a route already under way, e.g. after loading a save. The
    /// ship keeps its current cell.
    pub fn resume(&mut self, route: Vec<Waypoint>) -> bool {
        if route.is_empty() {
            return false;
        }
        self.route = route;
        self.navigating = true;
        true
    }

    /// Advance to `duration`. Returns [`NavEvent::Arrived`] on the first
    /// update at or past the final waypoint; the route is then dropped.
    pub fn update(&mut self, duration: f64) -> Option<NavEvent> {
        if !self.navigating {
            return None;
        }
        let last = *self.route.last()?;

        if duration >= last.duration {
            self.cell = last.position;
            self.route.clear();
            self.navigating = false;
            return Some(NavEvent::Arrived {
                position: last.position,
                at: last.duration,
            });
        }

        if let Some(reached) = self.route.iter().rev().find(|w| w.duration <= duration) {
            self.cell = reached.position;
        }
        None
    }

    /// Continuous position at `duration`, as `[x, y, z]`.
    pub fn position(&self, duration: f64) -> [f64; 3] {
        let Some((from, to)) = self.leg(duration) else {
            return to_f64(self.cell);
        };
        let depart = (to.duration - self.required_time).max(from.duration);
        let span = to.duration - depart;
        let t = if span > 0.0 {
            ((duration - depart) / span).clamp(0.0, 1.0)
        } else {
            1.0
        };
        let a = to_f64(from.position);
        let b = to_f64(to.position);
        [lerp(a[0], b[0], t), lerp(a[1], b[1], t), lerp(a[2], b[2], t)]
    }

    /// Horizontal direction of travel at `duration`, `None` while idle.
    pub fn heading(&self, duration: f64) -> Option<(i32, i32)> {
        let (from, to) = self.leg(duration)?;
        Some((to.position.x - from.position.x, to.position.z - from.position.z))
    }

    /// The pair of waypoints surrounding `duration`.
    fn leg(&self, duration: f64) -> Option<(Waypoint, Waypoint)> {
        if !self.navigating || self.route.len() < 2 {
            return None;
        }
        let next = self
            .route
            .iter()
            .position(|w| w.duration > duration)
            .unwrap_or(self.route.len() - 1)
            .max(1);
        Some((self.route[next - 1], self.route[next]))
    }
}

fn to_f64(cell: WorldCell) -> [f64; 3] {
    [cell.x as f64, cell.y as f64, cell.z as f64]
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route() -> Vec<Waypoint> {
        vec![
            Waypoint::new(WorldCell::new(0, -2, 0), 10.0),
            Waypoint::new(WorldCell::new(1, -2, 0), 10.5),
            // waited 1.5s for the tide before this leg
            Waypoint::new(WorldCell::new(1, -4, 1), 12.5),
        ]
    }

    #[test]
    fn test_empty_route_leaves_state() {
        let mut nav = Navigator::new(WorldCell::new(3, 0, 3), 0.5);
        assert!(nav.begin(route()));
        assert!(!nav.begin(Vec::new()));
        assert!(nav.is_navigating());
        assert_eq!(nav.route().len(), 3);
        assert_eq!(nav.route_end_time(), Some(12.5));
    }

    #[test]
    fn test_interpolates_within_leg() {
        let mut nav = Navigator::new(WorldCell::default(), 0.5);
        nav.begin(route());
        let p = nav.position(10.25);
        assert!((p[0] - 0.5).abs() < 1e-9);
        assert_eq!(nav.heading(10.25), Some((1, 0)));
    }

    #[test]
    fn test_waits_before_departure() {
        let mut nav = Navigator::new(WorldCell::default(), 0.5);
        nav.begin(route());
        assert_eq!(nav.position(11.0), [1.0, -2.0, 0.0]);
        let p = nav.position(12.25);
        assert!((p[2] - 0.5).abs() < 1e-9);
        assert!((p[1] + 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_arrives_exactly_once() {
        let mut nav = Navigator::new(WorldCell::default(), 0.5);
        nav.begin(route());
        assert_eq!(nav.update(10.7), None);
        assert_eq!(nav.cell(), WorldCell::new(1, -2, 0));

        let event = nav.update(13.0);
        assert_eq!(
            event,
            Some(NavEvent::Arrived {
                position: WorldCell::new(1, -4, 1),
                at: 12.5
            })
        );
        assert_eq!(nav.update(14.0), None);
        assert!(!nav.is_navigating());
        assert!(nav.route().is_empty());
        assert_eq!(nav.position(20.0), [1.0, -4.0, 1.0]);
    }

    #[test]
    fn test_resume_keeps_cell() {
        let mut nav = Navigator::new(WorldCell::new(1, -2, 0), 0.5);
        assert!(nav.resume(route()));
        assert_eq!(nav.cell(), WorldCell::new(1, -2, 0));
        assert!(nav.is_navigating());
        assert!(!Navigator::new(WorldCell::default(), 0.5).resume(Vec::new()));
    }

    #[test]
    fn test_single_waypoint_route_arrives_immediately() {
        let mut nav = Navigator::new(WorldCell::default(), 0.5);
        let here = WorldCell::new(2, -1, 2);
        assert!(nav.begin(vec![Waypoint::new(here, 4.0)]));
        assert!(matches!(nav.update(4.0), Some(NavEvent::Arrived { .. })));
        assert_eq!(nav.cell(), here);
    }
}
