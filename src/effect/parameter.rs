//! Effect Parameters
//!
//! Range-limited scalar parameters used by effect settings. Every setter keeps
//! the value inside its declared limits, so a shader never sees an
//! out-of-range value regardless of where it came from (code, persisted data
//! or interpolation between two configurations).

/// Linear interpolation helper.
#[inline]
fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t
}

/// A float clamped into `[min, max]` on every write.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClampedFloat {
    value: f32,
    min: f32,
    max: f32,
}

impl ClampedFloat {
    #[must_use]
    pub fn new(value: f32, min: f32, max: f32) -> Self {
        debug_assert!(min <= max, "ClampedFloat limits are inverted");
        let mut clamped = Self {
            value: min,
            min,
            max,
        };
        clamped.set(value);
        clamped
    }

    #[inline]
    #[must_use]
    pub fn get(&self) -> f32 {
        self.value
    }

    /// Sets the value, clamping into range. NaN collapses to the lower limit.
    #[inline]
    pub fn set(&mut self, value: f32) {
        self.value = if value.is_nan() {
            self.min
        } else {
            value.clamp(self.min, self.max)
        };
    }

    #[inline]
    #[must_use]
    pub fn min(&self) -> f32 {
        self.min
    }

    #[inline]
    #[must_use]
    pub fn max(&self) -> f32 {
        self.max
    }

    /// Sets the value to the clamped interpolation between `from` and `to`.
    pub fn interp(&mut self, from: f32, to: f32, t: f32) {
        self.set(lerp(from, to, t));
    }
}

/// An integer clamped into `[min, max]` on every write.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClampedInt {
    value: i32,
    min: i32,
    max: i32,
}

impl ClampedInt {
    #[must_use]
    pub fn new(value: i32, min: i32, max: i32) -> Self {
        debug_assert!(min <= max, "ClampedInt limits are inverted");
        Self {
            value: value.clamp(min, max),
            min,
            max,
        }
    }

    #[inline]
    #[must_use]
    pub fn get(&self) -> i32 {
        self.value
    }

    #[inline]
    pub fn set(&mut self, value: i32) {
        self.value = value.clamp(self.min, self.max);
    }

    /// Sets the value to the rounded, clamped interpolation between `from` and `to`.
    pub fn interp(&mut self, from: i32, to: i32, t: f32) {
        self.set(lerp(from as f32, to as f32, t).round() as i32);
    }
}

/// An integer with a lower bound only.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MinInt {
    value: i32,
    min: i32,
}

impl MinInt {
    #[must_use]
    pub fn new(value: i32, min: i32) -> Self {
        Self {
            value: value.max(min),
            min,
        }
    }

    #[inline]
    #[must_use]
    pub fn get(&self) -> i32 {
        self.value
    }

    #[inline]
    pub fn set(&mut self, value: i32) {
        self.value = value.max(self.min);
    }
}

/// A float with a lower bound only.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MinFloat {
    value: f32,
    min: f32,
}

impl MinFloat {
    #[must_use]
    pub fn new(value: f32, min: f32) -> Self {
        Self {
            value: value.max(min),
            min,
        }
    }

    #[inline]
    #[must_use]
    pub fn get(&self) -> f32 {
        self.value
    }

    #[inline]
    pub fn set(&mut self, value: f32) {
        self.value = value.max(self.min);
    }
}

/// A float whose limits apply to interpolated values only.
///
/// Direct writes are stored as given; blending between two configurations
/// with [`interp`](Self::interp) clamps the result into
/// `[limit_min, limit_max]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MinMaxFloat {
    value: f32,
    limit_min: f32,
    limit_max: f32,
}

impl MinMaxFloat {
    #[must_use]
    pub fn new(value: f32, limit_min: f32, limit_max: f32) -> Self {
        Self {
            value,
            limit_min,
            limit_max,
        }
    }

    #[inline]
    #[must_use]
    pub fn get(&self) -> f32 {
        self.value
    }

    #[inline]
    pub fn set(&mut self, value: f32) {
        self.value = value;
    }

    #[inline]
    #[must_use]
    pub fn limits(&self) -> (f32, f32) {
        (self.limit_min, self.limit_max)
    }

    pub fn interp(&mut self, from: f32, to: f32, t: f32) {
        self.value = lerp(from, to, t).clamp(self.limit_min, self.limit_max);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamped_float_clamps_on_construction_and_set() {
        let mut blend = ClampedFloat::new(2.0, 0.0, 1.0);
        assert_eq!(blend.get(), 1.0);
        blend.set(-0.5);
        assert_eq!(blend.get(), 0.0);
        blend.set(f32::NAN);
        assert_eq!(blend.get(), 0.0);
        blend.set(0.25);
        assert_eq!(blend.get(), 0.25);
    }

    #[test]
    fn clamped_float_rejects_nan_on_construction() {
        let intensity = ClampedFloat::new(f32::NAN, 0.5, 2.0);
        assert_eq!(intensity.get(), 0.5);
    }

    #[test]
    fn clamped_int_interp_rounds() {
        let mut downsample = ClampedInt::new(1, 0, 8);
        downsample.interp(0, 8, 0.3);
        assert_eq!(downsample.get(), 2);
        downsample.interp(0, 100, 1.0);
        assert_eq!(downsample.get(), 8);
    }

    #[test]
    fn min_max_float_only_clamps_interpolation() {
        let mut value = MinMaxFloat::new(0.0, 1.0, 99.0);
        value.set(150.0);
        assert_eq!(value.get(), 150.0);
        value.interp(50.0, 150.0, 1.0);
        assert_eq!(value.get(), 99.0);
        value.interp(0.0, 10.0, 0.5);
        assert_eq!(value.get(), 5.0);
    }

    #[test]
    fn min_int_has_floor() {
        let mut scale = MinInt::new(0, 1);
        assert_eq!(scale.get(), 1);
        scale.set(4);
        assert_eq!(scale.get(), 4);
    }
}
