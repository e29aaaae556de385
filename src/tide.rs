//! Tide model.
//!
//! The sea level is a pure function of elapsed game time: two sine waves are
//! summed, squeezed into `[0, 1]` and mapped onto the configured level range.
//! No clock lives here; every query takes the duration explicitly, so a
//! `Tide` can be shared freely between threads.

use crate::config::TideParams;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tide {
    speed: [f64; 2],
    level: [f64; 2],
}

impl Tide {
    pub fn new(speed: [f64; 2], level: [f64; 2]) -> Self {
        assert!(
            level[0] <= level[1],
            "tide level range is inverted: [{}, {}]",
            level[0], level[1]
        );
        Self { speed, level }
    }

    pub fn from_params(params: &TideParams) -> Self {
        Self::new(params.speed, params.level)
    }

    pub fn min_level(&self) -> f64 {
        self.level[0]
    }

    pub fn max_level(&self) -> f64 {
        self.level[1]
    }

    /// Sea level after `duration` seconds, always within `[min, max]`.
    pub fn level(&self, duration: f64) -> f64 {
        let waves = (duration * self.speed[0]).sin() + (duration * self.speed[1]).sin();
        let t = waves * 0.25 + 0.5;
        mix(self.level[0], self.level[1], t).clamp(self.level[0], self.level[1])
    }

    /// A cell is crossable while its terrain is strictly below the sea.
    pub fn is_submerged(&self, height: i32, duration: f64) -> bool {
        (height as f64) < self.level(duration)
    }

    /// Whether any tide could ever cover `height`. Cells failing this are
    /// permanent land.
    pub fn can_submerge(&self, height: i32) -> bool {
        (height as f64) < self.max_level()
    }
}

fn mix(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_bounded() {
        let tide = Tide::new([0.37, 1.91], [-1.3, 3.7]);
        let mut t = -500.0;
        while t < 500.0 {
            let level = tide.level(t);
            assert!(level >= tide.min_level() && level <= tide.max_level(), "level {} at {}", level, t);
            t += 0.173;
        }
    }

    #[test]
    fn test_level_at_zero_is_midpoint() {
        let tide = Tide::new([1.0, 2.0], [0.0, 10.0]);
        assert!((tide.level(0.0) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_level_reaches_extremes_when_in_phase() {
        let tide = Tide::new([1.0, 1.0], [2.0, 6.0]);
        let peak = std::f64::consts::FRAC_PI_2;
        assert!((tide.level(peak) - 6.0).abs() < 1e-9);
        assert!((tide.level(3.0 * peak) - 2.0).abs() < 1e-9);
    }

    #[test]
    #[should_panic(expected = "inverted")]
    fn test_inverted_range_rejected() {
        let _ = Tide::new([1.0, 1.0], [5.0, 1.0]);
    }

    #[test]
    fn test_submersion_is_strict() {
        let tide = Tide::new([0.0, 0.0], [4.0, 4.0]);
        assert!(tide.is_submerged(3, 12.0));
        assert!(!tide.is_submerged(4, 12.0));
        assert!(tide.can_submerge(3));
        assert!(!tide.can_submerge(4));
    }
}
