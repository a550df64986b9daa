use serde::{Deserialize, Serialize};

/// Half-height of the band around a row's midpoint that means "drop inside".
pub const DEFAULT_DROP_BAND: f32 = 10.;

/// Where a drop lands relative to its target row.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropPosition {
    /// Geometry was unavailable; nothing may be dropped.
    #[default]
    Unknown,
    /// Sibling immediately preceding the target.
    Before,
    /// First child of the target.
    Child,
    /// Sibling immediately following the target.
    After,
}

impl DropPosition {
    #[inline]
    pub fn is_known(self) -> bool {
        self != DropPosition::Unknown
    }

    /// Class name a row renderer attaches while this position is hovered.
    pub fn class_name(self) -> &'static str {
        match self {
            DropPosition::Before => "drop-over-upward",
            DropPosition::Child => "drop-over-child",
            DropPosition::After => "drop-over-downward",
            DropPosition::Unknown => "",
        }
    }
}

/// Vertical extent of a target row, in the pointer's coordinate space.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DropRect {
    pub top: f32,
    pub bottom: f32,
}

impl DropRect {
    pub fn new(top: f32, bottom: f32) -> Self {
        Self { top, bottom }
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    fn is_usable(&self) -> bool {
        self.top.is_finite() && self.bottom.is_finite() && self.bottom >= self.top
    }
}

/// Classifier settings.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DropZoneConfig {
    /// Distance from the midpoint, on either side, that still counts as [`DropPosition::Child`].
    pub band: f32,
}

impl Default for DropZoneConfig {
    fn default() -> Self {
        Self {
            band: DEFAULT_DROP_BAND,
        }
    }
}

impl DropZoneConfig {
    pub fn new(band: f32) -> Self {
        Self { band }
    }

    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// Classify a pointer hovering `rect`.
    ///
    /// `pointer_y` is page relative; it is moved into the rect's local space by
    /// subtracting `rect.top`. Missing or unusable geometry yields
    /// [`DropPosition::Unknown`].
    pub fn classify(&self, rect: Option<DropRect>, pointer_y: Option<f32>) -> DropPosition {
        let (Some(rect), Some(pointer_y)) = (rect, pointer_y) else {
            return DropPosition::Unknown;
        };
        if !rect.is_usable() || !pointer_y.is_finite() {
            return DropPosition::Unknown;
        }

        let band = self.band.max(0.);
        let mid = rect.height() / 2.;
        let local_y = pointer_y - rect.top;

        if local_y >= mid - band && local_y <= mid + band {
            DropPosition::Child
        } else if local_y < mid - band {
            DropPosition::Before
        } else {
            DropPosition::After
        }
    }
}

/// Classify with the default band, see [`DropZoneConfig::classify`].
pub fn classify_drop_position(rect: Option<DropRect>, pointer_y: Option<f32>) -> DropPosition {
    DropZoneConfig::default().classify(rect, pointer_y)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn classify(top: f32, bottom: f32, y: f32) -> DropPosition {
        classify_drop_position(Some(DropRect::new(top, bottom)), Some(y))
    }

    #[test]
    fn bands_of_a_forty_pixel_row() {
        // mid = 20, child band is 10..=30 in local space
        assert_eq!(classify(100., 140., 100.), DropPosition::Before);
        assert_eq!(classify(100., 140., 109.9), DropPosition::Before);
        assert_eq!(classify(100., 140., 110.), DropPosition::Child);
        assert_eq!(classify(100., 140., 120.), DropPosition::Child);
        assert_eq!(classify(100., 140., 130.), DropPosition::Child);
        assert_eq!(classify(100., 140., 130.1), DropPosition::After);
        assert_eq!(classify(100., 140., 140.), DropPosition::After);
    }

    #[test]
    fn short_rows_are_all_child() {
        // mid = 8, so the child band covers the whole row
        for y in [0., 4., 8., 12., 16.] {
            assert_eq!(classify(0., 16., y), DropPosition::Child);
        }
    }

    #[test]
    fn zero_height_row_is_child() {
        assert_eq!(classify(50., 50., 50.), DropPosition::Child);
    }

    #[test]
    fn missing_geometry_is_unknown() {
        let rect = DropRect::new(0., 40.);
        assert_eq!(classify_drop_position(None, Some(20.)), DropPosition::Unknown);
        assert_eq!(classify_drop_position(Some(rect), None), DropPosition::Unknown);
        assert_eq!(classify(40., 0., 20.), DropPosition::Unknown);
        assert_eq!(classify(0., 40., f32::NAN), DropPosition::Unknown);
    }

    #[test]
    fn custom_band_widens_child_zone() {
        let config = DropZoneConfig::from_json_str(r#"{ "band": 18 }"#).unwrap();
        let rect = Some(DropRect::new(0., 40.));
        assert_eq!(config.classify(rect, Some(3.)), DropPosition::Child);
        assert_eq!(config.classify(rect, Some(1.)), DropPosition::Before);

        let defaulted = DropZoneConfig::from_json_str("{}").unwrap();
        assert_eq!(defaulted, DropZoneConfig::default());
    }

    #[test]
    fn class_names() {
        assert_eq!(DropPosition::Before.class_name(), "drop-over-upward");
        assert_eq!(DropPosition::Child.class_name(), "drop-over-child");
        assert_eq!(DropPosition::After.class_name(), "drop-over-downward");
        assert_eq!(DropPosition::Unknown.class_name(), "");
    }

    proptest! {
        #[test]
        fn midpoint_is_child(top in -10_000f32..10_000., height in 0.5f32..500.) {
            let bottom = top + height;
            prop_assert_eq!(classify(top, bottom, top + height / 2.), DropPosition::Child);
        }

        #[test]
        fn above_band_is_before(
            top in -10_000f32..10_000.,
            height in 0.5f32..500.,
            offset in 0.05f32..1_000.,
        ) {
            let bottom = top + height;
            let y = top + height / 2. - DEFAULT_DROP_BAND - offset;
            prop_assert_eq!(classify(top, bottom, y), DropPosition::Before);
        }

        #[test]
        fn below_band_is_after(
            top in -10_000f32..10_000.,
            height in 0.5f32..500.,
            offset in 0.05f32..1_000.,
        ) {
            let bottom = top + height;
            let y = top + height / 2. + DEFAULT_DROP_BAND + offset;
            prop_assert_eq!(classify(top, bottom, y), DropPosition::After);
        }
    }
}
