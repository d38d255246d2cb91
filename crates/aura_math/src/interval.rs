/// A closed range `[min, max]` of ray parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub min: f32,
    pub max: f32,
}

impl Interval {
    /// Create a new interval given min and max values.
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Interval starting just off a surface, so a ray does not re-hit its origin.
    pub fn from_surface(max: f32) -> Self {
        Self::new(Self::SURFACE_OFFSET, max)
    }

    /// Returns the size of the interval (max - min).
    pub fn size(&self) -> f32 {
        self.max - self.min
    }

    /// Returns true if x is within the interval [min, max] (inclusive).
    pub fn contains(&self, x: f32) -> bool {
        self.min <= x && x <= self.max
    }

    /// Returns true if x is strictly within the interval (min, max).
    pub fn surrounds(&self, x: f32) -> bool {
        self.min < x && x < self.max
    }

    /// Same interval with the upper end pulled in to `max` if that is closer.
    pub fn clip_max(&self, max: f32) -> Interval {
        Interval::new(self.min, self.max.min(max))
    }

    /// Distance a ray starts away from the surface it leaves.
    pub const SURFACE_OFFSET: f32 = 1e-4;

    /// An empty interval (min > max, contains nothing).
    pub const EMPTY: Interval = Interval {
        min: f32::INFINITY,
        max: f32::NEG_INFINITY,
    };

    /// Everything in front of the ray origin.
    pub const FORWARD: Interval = Interval {
        min: 0.0,
        max: f32::INFINITY,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_contains() {
        let interval = Interval::new(0.0, 10.0);

        assert!(interval.contains(0.0));
        assert!(interval.contains(10.0));
        assert!(!interval.contains(-0.1));
        assert!(!interval.contains(10.1));
    }

    #[test]
    fn test_interval_surrounds_excludes_endpoints() {
        let interval = Interval::new(0.0, 10.0);

        assert!(!interval.surrounds(0.0));
        assert!(!interval.surrounds(10.0));
        assert!(interval.surrounds(5.0));
    }

    #[test]
    fn test_interval_clip_max() {
        let interval = Interval::new(1.0, 10.0);
        assert_eq!(interval.clip_max(4.0).max, 4.0);
        assert_eq!(interval.clip_max(40.0).max, 10.0);
    }

    #[test]
    fn test_interval_empty() {
        assert!(Interval::EMPTY.size() < 0.0);
        assert!(!Interval::EMPTY.contains(0.0));
    }
}
