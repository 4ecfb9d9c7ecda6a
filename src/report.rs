//! Сборка интерактивной карты солнечного потенциала крыш.

mod assembler;
mod chart;
mod data;
mod header;
mod page;
mod popup;

use std::fs;
use std::path::Path;

use minify_html::{Cfg, minify};
use tracing::info;

use crate::config::MapConfig;
use crate::dataset::load_dataset;
use crate::error::MapError;

pub use assembler::MapSummary;
pub use header::inject_header;

/// Полный конвейер: датасет → слои и попапы → HTML-документ.
///
/// Файл пишется только после успешной сборки всех попапов.
pub fn generate_map(
    dataset: &Path,
    output_html: &Path,
    config: &MapConfig,
    minify_html: bool,
) -> Result<MapSummary, MapError> {
    let collection = load_dataset(dataset)?;
    info!(
        features = collection.features.len(),
        dataset = %dataset.display(),
        "Loaded dataset"
    );

    let mut assembler = assembler::MapAssembler::build_base_map(config);
    assembler
        .add_background_layers()
        .add_feature_layer(collection)?
        .add_controls()
        .add_legend()
        .add_header();
    assembler.serialize(output_html, minify_html)?;
    Ok(assembler.into_summary())
}

fn minify_page(page: &str) -> Vec<u8> {
    let mut cfg = Cfg::default();
    cfg.minify_css = true;
    cfg.keep_closing_tags = true;
    cfg.keep_html_and_head_opening_tags = true;
    minify(page.as_bytes(), &cfg)
}

fn write_html(page: String, output_html: &Path, minify_html: bool) -> Result<(), MapError> {
    let write_err = |source| MapError::Write {
        path: output_html.to_path_buf(),
        source,
    };
    // Создаём директорию для HTML, если её ещё нет.
    if let Some(parent) = output_html.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(write_err)?;
    }

    let bytes = if minify_html {
        minify_page(&page)
    } else {
        page.into_bytes()
    };
    fs::write(output_html, bytes).map_err(write_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::tests::{building_feature_json, building_properties, collection_json};

    fn write_dataset(dir: &tempfile::TempDir, features: Vec<serde_json::Value>) -> std::path::PathBuf {
        let path = dir.path().join("edificios.json");
        fs::write(&path, collection_json(features)).unwrap();
        path
    }

    /// Свойства фич из JSON, который страница передаёт клиентскому скрипту.
    fn embedded_properties(html: &str) -> Vec<serde_json::Value> {
        let start = html.find("const solarmapConfig = ").unwrap() + "const solarmapConfig = ".len();
        let end = start + html[start..].find(";\n(() =>").unwrap();
        let config: serde_json::Value = serde_json::from_str(&html[start..end]).unwrap();
        config["feature_layer"]["data"]["features"]
            .as_array()
            .unwrap()
            .iter()
            .map(|feature| feature["properties"].clone())
            .collect()
    }

    #[test]
    fn generates_page_for_single_building() {
        let dir = tempfile::tempdir().unwrap();
        let dataset = write_dataset(
            &dir,
            vec![building_feature_json(1, building_properties(500.0, "Residencial"))],
        );
        let output = dir.path().join("public_html").join("index.html");
        let summary = generate_map(&dataset, &output, &MapConfig::default(), false).unwrap();
        assert_eq!(summary.features, 1);
        assert_eq!(summary.per_bucket[3], 1);

        let html = fs::read_to_string(&output).unwrap();
        let properties = embedded_properties(&html);
        assert_eq!(properties.len(), 1);
        assert_eq!(properties[0]["style"]["fillColor"], "#F03B20");
        let popup = properties[0]["popup"].as_str().unwrap();
        assert!(popup.contains("Residencial"));
        assert_eq!(popup.matches("data:image/png;base64,").count(), 2);
        assert_eq!(html.matches(r#"id="header""#).count(), 1);
    }

    #[test]
    fn minified_page_keeps_content() {
        let dir = tempfile::tempdir().unwrap();
        let dataset = write_dataset(
            &dir,
            vec![building_feature_json(3, building_properties(50.0, "Comercial"))],
        );
        let plain = dir.path().join("plain.html");
        let minified = dir.path().join("min.html");
        generate_map(&dataset, &plain, &MapConfig::default(), false).unwrap();
        generate_map(&dataset, &minified, &MapConfig::default(), true).unwrap();
        let minified_html = fs::read_to_string(&minified).unwrap();
        assert!(minified_html.len() <= fs::read_to_string(&plain).unwrap().len());
        let properties = embedded_properties(&minified_html);
        assert_eq!(properties[0]["style"]["fillColor"], "#FECC5C");
        assert!(properties[0]["popup"].as_str().unwrap().contains("Comercial"));
    }

    #[test]
    fn missing_dataset_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("index.html");
        let err = generate_map(
            &dir.path().join("nada.json"),
            &output,
            &MapConfig::default(),
            false,
        )
        .unwrap_err();
        assert!(matches!(err, MapError::DatasetNotFound { .. }));
        assert!(!output.exists());
    }

    #[test]
    fn broken_feature_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut props = building_properties(500.0, "Residencial");
        props.remove("Energia_KWh_7");
        let dataset = write_dataset(&dir, vec![building_feature_json(1, props)]);
        let output = dir.path().join("index.html");
        let err = generate_map(&dataset, &output, &MapConfig::default(), false).unwrap_err();
        assert!(matches!(err, MapError::MissingField { field, .. } if field == "Energia_KWh_7"));
        assert!(!output.exists());
    }

    #[test]
    fn unwritable_output_is_a_write_error() {
        let dir = tempfile::tempdir().unwrap();
        let dataset = write_dataset(
            &dir,
            vec![building_feature_json(1, building_properties(500.0, "Residencial"))],
        );
        let blocker = dir.path().join("public_html");
        fs::write(&blocker, "not a directory").unwrap();
        let output = blocker.join("index.html");
        let err = generate_map(&dataset, &output, &MapConfig::default(), false).unwrap_err();
        assert!(matches!(&err, MapError::Write { path, .. } if path == &output));
        assert!(!output.exists());
        assert_eq!(fs::read_to_string(&blocker).unwrap(), "not a directory");
    }

    #[test]
    fn empty_collection_still_renders_map() {
        let dir = tempfile::tempdir().unwrap();
        let dataset = write_dataset(&dir, Vec::new());
        let output = dir.path().join("index.html");
        let summary = generate_map(&dataset, &output, &MapConfig::default(), false).unwrap();
        assert_eq!(summary, MapSummary::default());
        assert!(fs::read_to_string(&output).unwrap().contains(r#"id="mapa""#));
    }
}
