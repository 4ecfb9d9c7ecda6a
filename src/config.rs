//! Параметры карты из TOML-файла поверх встроенных значений по умолчанию.

use std::fs;
use std::path::Path;

use serde::Deserialize;

pub const DEFAULT_CONFIG_PATH: &str = "config/map.toml";

const DEFAULT_CENTER: [f64; 2] = [40.369_896_547_283_13, -3.715_546_018_233_464];
const DEFAULT_ZOOM: u8 = 15;
const DEFAULT_MIN_ZOOM: u8 = 6;
const DEFAULT_MAX_ZOOM: u8 = 18;
const DEFAULT_WIDTH: &str = "100%";
const DEFAULT_HEIGHT: &str = "92%";
const DEFAULT_GLOBAL_NAME: &str = "mapa_solar";
const BASE_TILES_URL: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";
const BASE_TILES_ATTRIBUTION: &str =
    "&copy; <a href=\"https://www.openstreetmap.org/copyright\">OpenStreetMap</a> contributors";
const SATELLITE_URL: &str = "https://mt1.google.com/vt/lyrs=s&x={x}&y={y}&z={z}";
const SATELLITE_NAME: &str = "Google Satelite";
const IRRADIATION_URL: &str = "http://localhost:8000/datos/teselas_irradiacion_6_20/{z}/{x}/{y}.png";
const IRRADIATION_NAME: &str = "Irradiación solar anual";
const IRRADIATION_ATTRIBUTION: &str = "Irradiación solar CIEMAT";
const HEADER_TITLE: &str = "Comunidad Energética en Orcasitas";
const HEADER_STYLESHEET: &str = "./css/estilos_header.css";
const HEADER_SCRIPT: &str = "./calcular_paneles.js";
const POPUP_STYLESHEET: &str = "./css/estilos_popup.css";
const DEFAULT_LOGOS: [(&str, &str); 3] = [
    ("./logos/ciemat.png", "Logo CIEMAT"),
    ("./logos/politecnica.png", "Logo Universidad politecnica"),
    ("./logos/logo_canaveral.png", "Logo cañaveral"),
];
const TILE_PLACEHOLDERS: [&str; 3] = ["{x}", "{y}", "{z}"];

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct MapConfigFile {
    map: Option<BaseMapFile>,
    satellite: Option<TileLayerFile>,
    irradiation: Option<TileLayerFile>,
    header: Option<HeaderFile>,
    assets: Option<AssetsFile>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct BaseMapFile {
    center: Option<[f64; 2]>,
    zoom: Option<u8>,
    min_zoom: Option<u8>,
    max_zoom: Option<u8>,
    width: Option<String>,
    height: Option<String>,
    global_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TileLayerFile {
    url: Option<String>,
    name: Option<String>,
    attribution: Option<String>,
    show: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct HeaderFile {
    title: Option<String>,
    stylesheet: Option<String>,
    script: Option<String>,
    logos: Option<Vec<LogoConfig>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct AssetsFile {
    popup_stylesheet: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BaseMapConfig {
    pub center: [f64; 2],
    pub zoom: u8,
    pub min_zoom: u8,
    pub max_zoom: u8,
    pub width: String,
    pub height: String,
    /// Имя глобальной JS-переменной с картой (его ждёт `calcular_paneles.js`).
    pub global_name: String,
    pub tiles: TileLayerConfig,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileLayerConfig {
    pub url: String,
    pub name: String,
    pub attribution: String,
    pub show: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogoConfig {
    pub src: String,
    pub alt: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeaderConfig {
    pub title: String,
    pub stylesheet: String,
    pub script: String,
    pub logos: Vec<LogoConfig>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MapConfig {
    pub base: BaseMapConfig,
    pub satellite: TileLayerConfig,
    pub irradiation: TileLayerConfig,
    pub header: HeaderConfig,
    pub popup_stylesheet: String,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            base: BaseMapConfig {
                center: DEFAULT_CENTER,
                zoom: DEFAULT_ZOOM,
                min_zoom: DEFAULT_MIN_ZOOM,
                max_zoom: DEFAULT_MAX_ZOOM,
                width: DEFAULT_WIDTH.to_string(),
                height: DEFAULT_HEIGHT.to_string(),
                global_name: DEFAULT_GLOBAL_NAME.to_string(),
                tiles: TileLayerConfig {
                    url: BASE_TILES_URL.to_string(),
                    name: "OpenStreetMap".to_string(),
                    attribution: BASE_TILES_ATTRIBUTION.to_string(),
                    show: true,
                },
            },
            satellite: TileLayerConfig {
                url: SATELLITE_URL.to_string(),
                name: SATELLITE_NAME.to_string(),
                attribution: SATELLITE_NAME.to_string(),
                show: false,
            },
            irradiation: TileLayerConfig {
                url: IRRADIATION_URL.to_string(),
                name: IRRADIATION_NAME.to_string(),
                attribution: IRRADIATION_ATTRIBUTION.to_string(),
                show: false,
            },
            header: HeaderConfig {
                title: HEADER_TITLE.to_string(),
                stylesheet: HEADER_STYLESHEET.to_string(),
                script: HEADER_SCRIPT.to_string(),
                logos: DEFAULT_LOGOS
                    .iter()
                    .map(|(src, alt)| LogoConfig {
                        src: (*src).to_string(),
                        alt: (*alt).to_string(),
                    })
                    .collect(),
            },
            popup_stylesheet: POPUP_STYLESHEET.to_string(),
        }
    }
}

fn apply_tile_overrides(target: &mut TileLayerConfig, overrides: Option<TileLayerFile>) {
    let Some(overrides) = overrides else {
        return;
    };
    if let Some(url) = overrides.url {
        target.url = url;
    }
    if let Some(name) = overrides.name {
        target.name = name;
    }
    if let Some(attribution) = overrides.attribution {
        target.attribution = attribution;
    }
    if let Some(show) = overrides.show {
        target.show = show;
    }
}

fn resolve_map_config(file: MapConfigFile) -> MapConfig {
    let mut cfg = MapConfig::default();
    if let Some(map) = file.map {
        if let Some(center) = map.center {
            cfg.base.center = center;
        }
        if let Some(zoom) = map.zoom {
            cfg.base.zoom = zoom;
        }
        if let Some(min_zoom) = map.min_zoom {
            cfg.base.min_zoom = min_zoom;
        }
        if let Some(max_zoom) = map.max_zoom {
            cfg.base.max_zoom = max_zoom;
        }
        if let Some(width) = map.width {
            cfg.base.width = width;
        }
        if let Some(height) = map.height {
            cfg.base.height = height;
        }
        if let Some(global_name) = map.global_name {
            cfg.base.global_name = global_name;
        }
    }
    apply_tile_overrides(&mut cfg.satellite, file.satellite);
    apply_tile_overrides(&mut cfg.irradiation, file.irradiation);
    if let Some(header) = file.header {
        if let Some(title) = header.title {
            cfg.header.title = title;
        }
        if let Some(stylesheet) = header.stylesheet {
            cfg.header.stylesheet = stylesheet;
        }
        if let Some(script) = header.script {
            cfg.header.script = script;
        }
        if let Some(logos) = header.logos {
            cfg.header.logos = logos;
        }
    }
    if let Some(popup_stylesheet) = file.assets.and_then(|assets| assets.popup_stylesheet) {
        cfg.popup_stylesheet = popup_stylesheet;
    }
    cfg
}

fn validate_tile_layer(section: &str, layer: &TileLayerConfig) -> Result<(), String> {
    let missing = TILE_PLACEHOLDERS
        .iter()
        .filter(|placeholder| !layer.url.contains(**placeholder))
        .copied()
        .collect::<Vec<_>>();
    if !missing.is_empty() {
        return Err(format!(
            "{section}.url must contain {} placeholders",
            missing.join(", ")
        ));
    }
    Ok(())
}

fn is_js_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|first| first.is_ascii_alphabetic() || first == '_' || first == '$')
        && chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '$')
}

pub fn validate_map_config(cfg: &MapConfig) -> Result<(), String> {
    let [lat, lon] = cfg.base.center;
    if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
        return Err("map.center latitude must be within -90..=90".to_string());
    }
    if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
        return Err("map.center longitude must be within -180..=180".to_string());
    }
    if cfg.base.min_zoom > cfg.base.max_zoom {
        return Err("map.min_zoom must not exceed map.max_zoom".to_string());
    }
    if !(cfg.base.min_zoom..=cfg.base.max_zoom).contains(&cfg.base.zoom) {
        return Err("map.zoom must be within min_zoom..=max_zoom".to_string());
    }
    if !is_js_identifier(&cfg.base.global_name) {
        return Err("map.global_name must be a valid JavaScript identifier".to_string());
    }
    validate_tile_layer("map.tiles", &cfg.base.tiles)?;
    validate_tile_layer("satellite", &cfg.satellite)?;
    validate_tile_layer("irradiation", &cfg.irradiation)?;
    Ok(())
}

/// Загружает конфигурацию; отсутствие файла по умолчанию не считается ошибкой.
pub fn load_map_config(path: &Path) -> Result<MapConfig, String> {
    if !path.exists() {
        if path == Path::new(DEFAULT_CONFIG_PATH) {
            tracing::info!(
                "Map config {} not found, using built-in defaults",
                path.display()
            );
            return Ok(MapConfig::default());
        }
        return Err(format!("Map config {} does not exist", path.display()));
    }

    let raw = fs::read_to_string(path)
        .map_err(|err| format!("Failed to read map config {}: {err}", path.display()))?;
    let file: MapConfigFile = toml::from_str(&raw)
        .map_err(|err| format!("Failed to parse map config {}: {err}", path.display()))?;
    let cfg = resolve_map_config(file);
    validate_map_config(&cfg)
        .map_err(|err| format!("Invalid map config {}: {err}", path.display()))?;
    Ok(cfg)
}
