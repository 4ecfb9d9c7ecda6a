//! Раскраска полигонов по доступной площади крыши.

use std::ops::{Bound, RangeBounds};

use serde::Serialize;
use serde_json::Value;

const STROKE_COLOR: &str = "#000000";
const STROKE_WEIGHT: f64 = 0.5;
const FILL_OPACITY: f64 = 0.7;

/// Стиль полигона в терминах Leaflet (`fillColor`, `color`, `weight`, `fillOpacity`).
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PolygonStyle {
    pub fill_color: &'static str,
    pub color: &'static str,
    pub weight: f64,
    pub fill_opacity: f64,
}

impl PolygonStyle {
    const fn filled(fill_color: &'static str) -> Self {
        Self {
            fill_color,
            color: STROKE_COLOR,
            weight: STROKE_WEIGHT,
            fill_opacity: FILL_OPACITY,
        }
    }
}

/// Интервал площади (м²) и соответствующий ему стиль.
#[derive(Clone, Copy, Debug)]
pub struct StyleBucket {
    pub lower: Bound<f64>,
    pub upper: Bound<f64>,
    pub style: PolygonStyle,
}

impl StyleBucket {
    pub fn contains(&self, value: f64) -> bool {
        (self.lower, self.upper).contains(&value)
    }

    /// Подпись для легенды, например `20 - 80 m²`.
    pub fn label(&self) -> String {
        format!(
            "{} - {} m²",
            bound_value(self.lower),
            bound_value(self.upper)
        )
    }
}

fn bound_value(bound: Bound<f64>) -> String {
    match bound {
        Bound::Included(value) | Bound::Excluded(value) => format!("{value}"),
        Bound::Unbounded => "∞".to_string(),
    }
}

pub const AREA_BUCKET_COUNT: usize = 5;

// Первый интервал включает 0, остальные открыты слева: значение на границе
// достаётся предыдущему интервалу.
pub static AREA_BUCKETS: [StyleBucket; AREA_BUCKET_COUNT] = [
    StyleBucket {
        lower: Bound::Included(0.0),
        upper: Bound::Included(20.0),
        style: PolygonStyle::filled("#FFFFB2"),
    },
    StyleBucket {
        lower: Bound::Excluded(20.0),
        upper: Bound::Included(80.0),
        style: PolygonStyle::filled("#FECC5C"),
    },
    StyleBucket {
        lower: Bound::Excluded(80.0),
        upper: Bound::Included(400.0),
        style: PolygonStyle::filled("#FD8D3C"),
    },
    StyleBucket {
        lower: Bound::Excluded(400.0),
        upper: Bound::Included(800.0),
        style: PolygonStyle::filled("#F03B20"),
    },
    StyleBucket {
        lower: Bound::Excluded(800.0),
        upper: Bound::Included(1603.0),
        style: PolygonStyle::filled("#BD0026"),
    },
];

/// Стиль для значений вне всех интервалов (отрицательных, пропущенных, нечисловых).
pub static FALLBACK_STYLE: PolygonStyle = PolygonStyle::filled("#FFFFFF");

/// Индекс интервала, в который попадает площадь; `None` означает запасной стиль.
pub fn bucket_index(area_m2: Option<f64>) -> Option<usize> {
    let area = area_m2?;
    AREA_BUCKETS.iter().position(|bucket| bucket.contains(area))
}

pub fn classify_area(area_m2: Option<f64>) -> &'static PolygonStyle {
    bucket_index(area_m2).map_or(&FALLBACK_STYLE, |idx| &AREA_BUCKETS[idx].style)
}

/// То же, что [`classify_area`], но по сырому значению свойства GeoJSON.
pub fn classify_property(value: Option<&Value>) -> &'static PolygonStyle {
    classify_area(value.and_then(Value::as_f64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn matching_buckets(value: f64) -> usize {
        AREA_BUCKETS
            .iter()
            .filter(|bucket| bucket.contains(value))
            .count()
    }

    #[test]
    fn boundaries_belong_to_the_lower_bucket() {
        assert_eq!(classify_area(Some(0.0)).fill_color, "#FFFFB2");
        assert_eq!(classify_area(Some(20.0)).fill_color, "#FFFFB2");
        assert_eq!(classify_area(Some(20.5)).fill_color, "#FECC5C");
        assert_eq!(classify_area(Some(80.0)).fill_color, "#FECC5C");
        assert_eq!(classify_area(Some(400.0)).fill_color, "#FD8D3C");
        assert_eq!(classify_area(Some(500.0)).fill_color, "#F03B20");
        assert_eq!(classify_area(Some(800.0)).fill_color, "#F03B20");
        assert_eq!(classify_area(Some(1603.0)).fill_color, "#BD0026");
    }

    #[test]
    fn out_of_range_values_use_fallback() {
        for value in [-0.01, -500.0, 1603.5, 10_000.0, f64::NAN, f64::INFINITY] {
            assert_eq!(classify_area(Some(value)), &FALLBACK_STYLE, "value {value}");
        }
        assert_eq!(classify_area(None), &FALLBACK_STYLE);
    }

    #[test]
    fn every_value_matches_at_most_one_bucket() {
        let mut value = -50.0;
        while value <= 1700.0 {
            let hits = matching_buckets(value);
            assert!(hits <= 1, "value {value} matched {hits} buckets");
            if (0.0..=1603.0).contains(&value) {
                assert_eq!(hits, 1, "value {value} is not covered");
            }
            value += 0.25;
        }
        for bucket in &AREA_BUCKETS {
            if let Bound::Included(upper) = bucket.upper {
                assert_eq!(matching_buckets(upper), 1);
            }
        }
    }

    #[test]
    fn all_styles_share_stroke_and_opacity() {
        for style in AREA_BUCKETS
            .iter()
            .map(|bucket| &bucket.style)
            .chain(std::iter::once(&FALLBACK_STYLE))
        {
            assert_eq!(style.color, "#000000");
            assert!((style.weight - 0.5).abs() < f64::EPSILON);
            assert!((style.fill_opacity - 0.7).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn raw_properties_never_fail() {
        assert_eq!(classify_property(Some(&json!(500))).fill_color, "#F03B20");
        assert_eq!(classify_property(Some(&json!("500"))), &FALLBACK_STYLE);
        assert_eq!(classify_property(Some(&json!(null))), &FALLBACK_STYLE);
        assert_eq!(classify_property(None), &FALLBACK_STYLE);
    }

    #[test]
    fn style_serializes_with_leaflet_keys() {
        let value = serde_json::to_value(AREA_BUCKETS[0].style).unwrap();
        assert_eq!(
            value,
            json!({"fillColor": "#FFFFB2", "color": "#000000", "weight": 0.5, "fillOpacity": 0.7})
        );
    }

    #[test]
    fn legend_labels_follow_bounds() {
        assert_eq!(AREA_BUCKETS[0].label(), "0 - 20 m²");
        assert_eq!(AREA_BUCKETS[4].label(), "800 - 1603 m²");
    }
}
