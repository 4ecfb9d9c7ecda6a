//! Загрузка GeoJSON с крышами и разбор свойств отдельного здания.

use std::fs;
use std::io;
use std::path::Path;

use geojson::feature::Id;
use geojson::{Feature, FeatureCollection, GeoJson};
use serde_json::Value;
use tracing::debug;

use crate::constants::MONTH_COUNT;
use crate::error::MapError;

pub const FIELD_CADASTRAL_REF: &str = "Referencia_Catastral";
pub const FIELD_USAGE: &str = "Uso";
pub const FIELD_ROOF_AREA: &str = "Tejado_Disponible_m2";
pub const FIELD_IRRADIATION_PREFIX: &str = "Radiacion_kWh_m2_";
pub const FIELD_ENERGY_PREFIX: &str = "Energia_KWh_";
pub const FIELD_IRRADIATION_ANNUAL: &str = "Radiacion_kWh_m2_Anual";
pub const FIELD_ENERGY_ANNUAL: &str = "Energia_KWh_Anual";
const FIELD_ID: &str = "id";

const EXPECTED_NUMBER: &str = "a number";
const EXPECTED_TEXT: &str = "a string or a number";

/// Читает файл и разбирает его как `FeatureCollection`.
///
/// Схема свойств здесь не проверяется: недостающие поля всплывут позже
/// в [`BuildingFeature::from_feature`].
pub fn load_dataset(path: &Path) -> Result<FeatureCollection, MapError> {
    if !path.exists() {
        return Err(MapError::DatasetNotFound {
            path: path.to_path_buf(),
        });
    }
    let raw = fs::read_to_string(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => MapError::DatasetNotFound {
            path: path.to_path_buf(),
        },
        _ => MapError::DatasetRead {
            path: path.to_path_buf(),
            source,
        },
    })?;
    let malformed = |reason: String| MapError::DatasetMalformed {
        path: path.to_path_buf(),
        reason,
    };
    let collection = match raw.parse::<GeoJson>().map_err(|err| malformed(err.to_string()))? {
        GeoJson::FeatureCollection(collection) => collection,
        GeoJson::Feature(_) => {
            return Err(malformed("expected FeatureCollection, got Feature".into()));
        }
        GeoJson::Geometry(_) => {
            return Err(malformed("expected FeatureCollection, got Geometry".into()));
        }
    };
    debug!(
        path = %path.display(),
        features = collection.features.len(),
        "Loaded dataset"
    );
    Ok(collection)
}

/// Помесячный ряд в календарном порядке (январь..декабрь).
pub type MonthlySeries = [f64; MONTH_COUNT];

/// Типизированное представление одного здания.
#[derive(Clone, Debug, PartialEq)]
pub struct BuildingFeature {
    pub id: String,
    pub cadastral_ref: String,
    pub usage: String,
    pub roof_area_m2: f64,
    pub irradiation_kwh_m2: MonthlySeries,
    pub energy_kwh: MonthlySeries,
    pub annual_irradiation_kwh_m2: f64,
    pub annual_energy_kwh: f64,
}

impl BuildingFeature {
    /// Извлекает все обязательные свойства за один проход.
    ///
    /// Отсутствующее свойство (или `null`) даёт [`MapError::MissingField`] с его именем,
    /// свойство неверного типа даёт [`MapError::InvalidField`].
    pub fn from_feature(feature: &Feature) -> Result<Self, MapError> {
        let id = feature_id(feature).ok_or_else(|| MapError::missing("<unknown>", FIELD_ID))?;
        let props = Properties { feature, id: &id };
        Ok(Self {
            cadastral_ref: props.text(FIELD_CADASTRAL_REF)?,
            usage: props.text(FIELD_USAGE)?,
            roof_area_m2: props.number(FIELD_ROOF_AREA)?,
            irradiation_kwh_m2: props.monthly(FIELD_IRRADIATION_PREFIX)?,
            energy_kwh: props.monthly(FIELD_ENERGY_PREFIX)?,
            annual_irradiation_kwh_m2: props.number(FIELD_IRRADIATION_ANNUAL)?,
            annual_energy_kwh: props.number(FIELD_ENERGY_ANNUAL)?,
            id,
        })
    }
}

/// Идентификатор фичи в виде строки (числа печатаются как есть).
pub fn feature_id(feature: &Feature) -> Option<String> {
    feature.id.as_ref().map(|id| match id {
        Id::String(value) => value.clone(),
        Id::Number(value) => value.to_string(),
    })
}

struct Properties<'a> {
    feature: &'a Feature,
    id: &'a str,
}

impl Properties<'_> {
    fn value(&self, field: &str) -> Result<&Value, MapError> {
        match self.feature.property(field) {
            None | Some(Value::Null) => Err(MapError::missing(self.id, field)),
            Some(value) => Ok(value),
        }
    }

    fn number(&self, field: &str) -> Result<f64, MapError> {
        self.value(field)?
            .as_f64()
            .ok_or_else(|| MapError::invalid(self.id, field, EXPECTED_NUMBER))
    }

    fn text(&self, field: &str) -> Result<String, MapError> {
        match self.value(field)? {
            Value::String(value) => Ok(value.clone()),
            Value::Number(value) => Ok(value.to_string()),
            _ => Err(MapError::invalid(self.id, field, EXPECTED_TEXT)),
        }
    }

    fn monthly(&self, prefix: &str) -> Result<MonthlySeries, MapError> {
        let mut series = [0.0; MONTH_COUNT];
        for (idx, slot) in series.iter_mut().enumerate() {
            *slot = self.number(&format!("{prefix}{}", idx + 1))?;
        }
        Ok(series)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::{Map, json};

    /// Свойства здания со всеми обязательными полями.
    pub(crate) fn building_properties(area: f64, usage: &str) -> Map<String, Value> {
        let mut props = Map::new();
        props.insert(FIELD_CADASTRAL_REF.into(), json!("7845301VK3774F0001XY"));
        props.insert(FIELD_USAGE.into(), json!(usage));
        props.insert(FIELD_ROOF_AREA.into(), json!(area));
        for month in 1..=MONTH_COUNT {
            props.insert(
                format!("{FIELD_IRRADIATION_PREFIX}{month}"),
                json!(60.0 + month as f64 * 10.0),
            );
            props.insert(
                format!("{FIELD_ENERGY_PREFIX}{month}"),
                json!(1000.0 + month as f64 * 25.0),
            );
        }
        props.insert(FIELD_IRRADIATION_ANNUAL.into(), json!(1750.4));
        props.insert(FIELD_ENERGY_ANNUAL.into(), json!(14_950));
        props
    }

    pub(crate) fn building_feature_json(id: u64, props: Map<String, Value>) -> Value {
        json!({
            "type": "Feature",
            "id": id,
            "geometry": {
                "type": "Polygon",
                "coordinates": [[
                    [-3.7160, 40.3698],
                    [-3.7155, 40.3698],
                    [-3.7155, 40.3701],
                    [-3.7160, 40.3701],
                    [-3.7160, 40.3698]
                ]]
            },
            "properties": props
        })
    }

    pub(crate) fn collection_json(features: Vec<Value>) -> String {
        json!({"type": "FeatureCollection", "features": features}).to_string()
    }

    pub(crate) fn building(id: u64, props: Map<String, Value>) -> Feature {
        Feature::from_json_value(building_feature_json(id, props)).unwrap()
    }

    #[test]
    fn parses_complete_feature() {
        let feature = building(7, building_properties(500.0, "Residencial"));
        let parsed = BuildingFeature::from_feature(&feature).unwrap();
        assert_eq!(parsed.id, "7");
        assert_eq!(parsed.usage, "Residencial");
        assert!((parsed.roof_area_m2 - 500.0).abs() < f64::EPSILON);
        assert!((parsed.irradiation_kwh_m2[0] - 70.0).abs() < f64::EPSILON);
        assert!((parsed.energy_kwh[11] - 1300.0).abs() < f64::EPSILON);
        assert!((parsed.annual_energy_kwh - 14_950.0).abs() < f64::EPSILON);
    }

    #[test]
    fn missing_month_names_the_field() {
        let mut props = building_properties(500.0, "Residencial");
        props.remove("Energia_KWh_7");
        let err = BuildingFeature::from_feature(&building(3, props)).unwrap_err();
        match err {
            MapError::MissingField { feature, field } => {
                assert_eq!(feature, "3");
                assert_eq!(field, "Energia_KWh_7");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn null_counts_as_missing() {
        let mut props = building_properties(500.0, "Residencial");
        props.insert(FIELD_USAGE.into(), Value::Null);
        let err = BuildingFeature::from_feature(&building(1, props)).unwrap_err();
        assert!(matches!(err, MapError::MissingField { field, .. } if field == FIELD_USAGE));
    }

    #[test]
    fn wrong_type_is_invalid() {
        let mut props = building_properties(500.0, "Residencial");
        props.insert(FIELD_ROOF_AREA.into(), json!("quinientos"));
        let err = BuildingFeature::from_feature(&building(1, props)).unwrap_err();
        assert!(matches!(err, MapError::InvalidField { field, .. } if field == FIELD_ROOF_AREA));
    }

    #[test]
    fn feature_without_id_is_rejected() {
        let mut value = building_feature_json(1, building_properties(10.0, "Residencial"));
        value.as_object_mut().unwrap().remove("id");
        let feature = Feature::from_json_value(value).unwrap();
        let err = BuildingFeature::from_feature(&feature).unwrap_err();
        assert!(matches!(err, MapError::MissingField { field, .. } if field == "id"));
    }

    #[test]
    fn numeric_cadastral_reference_is_stringified() {
        let mut props = building_properties(10.0, "Residencial");
        props.insert(FIELD_CADASTRAL_REF.into(), json!(12345));
        let parsed = BuildingFeature::from_feature(&building(1, props)).unwrap();
        assert_eq!(parsed.cadastral_ref, "12345");
    }

    #[test]
    fn load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_dataset(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, MapError::DatasetNotFound { .. }));
    }

    #[test]
    fn load_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{\"type\": \"FeatureCollection\", \"features\": [").unwrap();
        let err = load_dataset(&path).unwrap_err();
        assert!(matches!(err, MapError::DatasetMalformed { .. }));
    }

    #[test]
    fn load_rejects_bare_geometry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("point.json");
        fs::write(&path, r#"{"type": "Point", "coordinates": [-3.7, 40.3]}"#).unwrap();
        let err = load_dataset(&path).unwrap_err();
        assert!(matches!(err, MapError::DatasetMalformed { .. }));
    }

    #[test]
    fn written_collection_loads_back_unchanged() {
        let features = vec![
            building_feature_json(1, building_properties(12.0, "Residencial")),
            building_feature_json(2, building_properties(640.5, "Industrial")),
            building_feature_json(3, building_properties(1200.0, "Oficinas & comercio")),
        ];
        let original = collection_json(features);
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.json");
        fs::write(&first, &original).unwrap();

        let loaded = load_dataset(&first).unwrap();
        let second = dir.path().join("second.json");
        fs::write(&second, serde_json::to_string(&loaded).unwrap()).unwrap();
        let reloaded = load_dataset(&second).unwrap();

        assert_eq!(reloaded.features.len(), 3);
        for (left, right) in loaded.features.iter().zip(&reloaded.features) {
            assert_eq!(left.properties, right.properties);
            assert_eq!(feature_id(left), feature_id(right));
        }
        let expected: Value = serde_json::from_str(&original).unwrap();
        for (idx, feature) in reloaded.features.iter().enumerate() {
            let props = Value::Object(feature.properties.clone().unwrap());
            assert_eq!(props, expected["features"][idx]["properties"]);
        }
    }
}
