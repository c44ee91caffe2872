use crate::foundation::core::Rgba8;

/// Maps a per-pixel occupancy count to an output color.
///
/// Zero is fully transparent black. Any positive count renders the base color with
/// `alpha = round(255 * count / saturation_count)`, clamped to 255, so coverage intensifies until
/// `saturation_count` layers overlap and stays fully opaque beyond that.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OccupancyColorPolicy {
    base: [u8; 3],
    saturation_count: u32,
}

impl OccupancyColorPolicy {
    pub const DEFAULT_BASE: [u8; 3] = [255, 0, 0];
    pub const DEFAULT_SATURATION_COUNT: u32 = 10;
    pub const TRANSPARENT: Rgba8 = [0, 0, 0, 0];

    /// `saturation_count` of zero is treated as one.
    pub fn new(base: [u8; 3], saturation_count: u32) -> Self {
        Self {
            base,
            saturation_count: saturation_count.max(1),
        }
    }

    pub fn saturation_count(&self) -> u32 {
        self.saturation_count
    }

    /// Halves round up, not to even: count 3 of 10 gives 77 and count 7 gives 179.
    pub fn alpha(&self, count: u32) -> u8 {
        if count == 0 {
            return 0;
        }
        if count >= self.saturation_count {
            return 255;
        }
        // round-half-up of 255 * count / saturation
        let num = 2 * 255 * u64::from(count) + u64::from(self.saturation_count);
        let den = 2 * u64::from(self.saturation_count);
        (num / den).min(255) as u8
    }

    pub fn color(&self, count: u32) -> Rgba8 {
        if count == 0 {
            return Self::TRANSPARENT;
        }
        let [r, g, b] = self.base;
        [r, g, b, self.alpha(count)]
    }

    /// Colors for every count in `0..=max_count`, indexed by count.
    pub fn lookup_table(&self, max_count: u32) -> Vec<Rgba8> {
        (0..=max_count).map(|count| self.color(count)).collect()
    }
}

impl Default for OccupancyColorPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_BASE, Self::DEFAULT_SATURATION_COUNT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_transparent_black() {
        assert_eq!(OccupancyColorPolicy::default().color(0), [0, 0, 0, 0]);
        let blue = OccupancyColorPolicy::new([0, 0, 255], 3);
        assert_eq!(blue.color(0), [0, 0, 0, 0]);
    }

    #[test]
    fn default_alpha_values() {
        let p = OccupancyColorPolicy::default();
        assert_eq!(p.color(1), [255, 0, 0, 26]);
        assert_eq!(p.color(2), [255, 0, 0, 51]);
        assert_eq!(p.alpha(3), 77);
        assert_eq!(p.alpha(5), 128);
        assert_eq!(p.alpha(7), 179);
        assert_eq!(p.alpha(9), 230);
        assert_eq!(p.alpha(10), 255);
    }

    #[test]
    fn alpha_is_monotonic_then_saturates() {
        let p = OccupancyColorPolicy::default();
        let mut prev = 0u8;
        for count in 0..=10 {
            let a = p.alpha(count);
            assert!(a >= prev, "alpha dropped at count {count}");
            prev = a;
        }
        for count in [10, 11, 50, 1_000, u32::MAX] {
            assert_eq!(p.alpha(count), 255);
        }
    }

    #[test]
    fn base_color_and_threshold_are_configurable() {
        let p = OccupancyColorPolicy::new([10, 20, 30], 2);
        assert_eq!(p.color(1), [10, 20, 30, 128]);
        assert_eq!(p.color(2), [10, 20, 30, 255]);
    }

    #[test]
    fn zero_threshold_is_clamped_to_one() {
        let p = OccupancyColorPolicy::new([255, 0, 0], 0);
        assert_eq!(p.saturation_count(), 1);
        assert_eq!(p.alpha(1), 255);
    }

    #[test]
    fn lookup_table_matches_color() {
        let p = OccupancyColorPolicy::default();
        let lut = p.lookup_table(12);
        assert_eq!(lut.len(), 13);
        for (count, c) in lut.iter().enumerate() {
            assert_eq!(*c, p.color(count as u32));
        }
    }
}
