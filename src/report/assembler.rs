//! Модель документа карты и пошаговая сборка: базовая карта, подложки,
//! слой зданий, элементы управления, легенда и шапка.

use std::path::Path;

use chrono::Utc;
use geojson::FeatureCollection;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::data::IRRADIATION_TIERS;
use super::page::render_map_page;
use super::popup::build_popup_from;
use super::write_html;
use crate::config::{HeaderConfig, MapConfig, TileLayerConfig};
use crate::dataset::{FIELD_ROOF_AREA, feature_id};
use crate::error::MapError;
use crate::style::{AREA_BUCKET_COUNT, AREA_BUCKETS, bucket_index, classify_property};

const MAP_ELEMENT_ID: &str = "mapa";
const FEATURE_LAYER_NAME: &str = "Superficie disponible m² y datos de los edificios CIEMAT";
pub const STYLE_PROPERTY: &str = "style";
pub const POPUP_PROPERTY: &str = "popup";
const POPUP_OFFSET: [i32; 2] = [0, -50];
const POPUP_AUTO_PAN_PADDING: [u32; 2] = [10, 10];
const POPUP_MAX_WIDTH: u32 = 400;
const MINIMAP_SIZE: u32 = 150;

const LEAFLET_MINIMAP_CSS: &str =
    "https://cdnjs.cloudflare.com/ajax/libs/leaflet-minimap/3.6.1/Control.MiniMap.css";
const LEAFLET_MINIMAP_JS: &str =
    "https://cdnjs.cloudflare.com/ajax/libs/leaflet-minimap/3.6.1/Control.MiniMap.js";
const GEOCODER_CSS: &str =
    "https://unpkg.com/leaflet-control-geocoder@2.4.0/dist/Control.Geocoder.css";
const GEOCODER_JS: &str = "https://unpkg.com/leaflet-control-geocoder@2.4.0/dist/Control.Geocoder.js";
const MOUSE_POSITION_CSS: &str =
    "https://cdn.jsdelivr.net/gh/ardhi/Leaflet.MousePosition/src/L.Control.MousePosition.min.css";
const MOUSE_POSITION_JS: &str =
    "https://cdn.jsdelivr.net/gh/ardhi/Leaflet.MousePosition/src/L.Control.MousePosition.min.js";

/// Документ целиком. В JSON для клиентского скрипта попадают только слои и контролы.
#[derive(Debug, Serialize)]
pub struct MapDocument {
    pub base: BaseMap,
    pub tile_layers: Vec<TileLayer>,
    pub feature_layer: Option<FeatureLayer>,
    pub controls: Vec<Control>,
    #[serde(skip)]
    pub legend: Option<Legend>,
    #[serde(skip)]
    pub header: Option<HeaderConfig>,
    #[serde(skip)]
    pub stylesheets: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct BaseMap {
    pub element_id: &'static str,
    pub global_name: String,
    /// `[широта, долгота]`.
    pub center: [f64; 2],
    pub zoom: u8,
    pub min_zoom: u8,
    pub max_zoom: u8,
    pub width: String,
    pub height: String,
    pub tiles: TileLayer,
}

#[derive(Clone, Debug, Serialize)]
pub struct TileLayer {
    pub name: String,
    /// Шаблон URL с `{x}`, `{y}`, `{z}`.
    pub url: String,
    pub attribution: String,
    pub overlay: bool,
    pub control: bool,
    pub show: bool,
}

impl TileLayer {
    fn overlay(config: &TileLayerConfig) -> Self {
        Self {
            name: config.name.clone(),
            url: config.url.clone(),
            attribution: config.attribution.clone(),
            overlay: true,
            control: true,
            show: config.show,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FeatureLayer {
    pub name: &'static str,
    pub show: bool,
    pub control: bool,
    pub style_property: &'static str,
    pub popup: PopupBinding,
    pub data: FeatureCollection,
}

/// Как привязывать попап: HTML берётся из свойства фичи без подписи поля.
#[derive(Debug, Serialize)]
pub struct PopupBinding {
    pub property: &'static str,
    pub labels: bool,
    pub options: PopupOptions,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PopupOptions {
    pub auto_pan: bool,
    pub offset: [i32; 2],
    pub auto_pan_padding: [u32; 2],
    pub max_width: u32,
}

impl Default for PopupOptions {
    fn default() -> Self {
        Self {
            auto_pan: true,
            offset: POPUP_OFFSET,
            auto_pan_padding: POPUP_AUTO_PAN_PADDING,
            max_width: POPUP_MAX_WIDTH,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlPosition {
    TopRight,
    BottomRight,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Control {
    MiniMap {
        position: ControlPosition,
        toggle_display: bool,
        width: u32,
        height: u32,
    },
    Geocoder {
        position: ControlPosition,
        collapsed: bool,
    },
    MousePosition {
        position: ControlPosition,
        separator: &'static str,
        num_digits: u8,
    },
    Layers {
        position: ControlPosition,
        collapsed: bool,
    },
}

impl Control {
    /// Стили плагина, подключаемые в `<head>`.
    pub const fn stylesheets(&self) -> &'static [&'static str] {
        match self {
            Self::MiniMap { .. } => &[LEAFLET_MINIMAP_CSS],
            Self::Geocoder { .. } => &[GEOCODER_CSS],
            Self::MousePosition { .. } => &[MOUSE_POSITION_CSS],
            Self::Layers { .. } => &[],
        }
    }

    pub const fn scripts(&self) -> &'static [&'static str] {
        match self {
            Self::MiniMap { .. } => &[LEAFLET_MINIMAP_JS],
            Self::Geocoder { .. } => &[GEOCODER_JS],
            Self::MousePosition { .. } => &[MOUSE_POSITION_JS],
            Self::Layers { .. } => &[],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LegendEntry {
    pub color: &'static str,
    pub label: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Legend {
    pub irradiation: Vec<LegendEntry>,
    pub area: Vec<LegendEntry>,
}

impl Legend {
    fn standard() -> Self {
        Self {
            irradiation: IRRADIATION_TIERS
                .iter()
                .map(|(color, label)| LegendEntry {
                    color,
                    label: (*label).to_string(),
                })
                .collect(),
            area: AREA_BUCKETS
                .iter()
                .map(|bucket| LegendEntry {
                    color: bucket.style.fill_color,
                    label: bucket.label(),
                })
                .collect(),
        }
    }
}

/// Сколько зданий попало в каждый интервал площади.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MapSummary {
    pub features: usize,
    pub per_bucket: [usize; AREA_BUCKET_COUNT],
    pub unclassified: usize,
}

impl MapSummary {
    fn record(&mut self, bucket: Option<usize>) {
        self.features += 1;
        match bucket {
            Some(idx) => self.per_bucket[idx] += 1,
            None => self.unclassified += 1,
        }
    }
}

#[derive(Debug)]
pub struct MapAssembler {
    document: MapDocument,
    summary: MapSummary,
    config: MapConfig,
}

impl MapAssembler {
    /// Базовая карта: центр, диапазон масштабов и подложка OpenStreetMap.
    pub fn build_base_map(config: &MapConfig) -> Self {
        let base = &config.base;
        let document = MapDocument {
            base: BaseMap {
                element_id: MAP_ELEMENT_ID,
                global_name: base.global_name.clone(),
                center: base.center,
                zoom: base.zoom,
                min_zoom: base.min_zoom,
                max_zoom: base.max_zoom,
                width: base.width.clone(),
                height: base.height.clone(),
                tiles: TileLayer {
                    overlay: false,
                    control: false,
                    show: true,
                    ..TileLayer::overlay(&base.tiles)
                },
            },
            tile_layers: Vec::new(),
            feature_layer: None,
            controls: Vec::new(),
            legend: None,
            header: None,
            stylesheets: vec![config.popup_stylesheet.clone()],
        };
        Self {
            document,
            summary: MapSummary::default(),
            config: config.clone(),
        }
    }

    /// Спутниковая подложка и растр инсоляции; обе скрыты и переключаются в контроле слоёв.
    pub fn add_background_layers(&mut self) -> &mut Self {
        self.document
            .tile_layers
            .push(TileLayer::overlay(&self.config.satellite));
        self.document
            .tile_layers
            .push(TileLayer::overlay(&self.config.irradiation));
        self
    }

    /// Проставляет каждой фиче стиль и HTML попапа.
    ///
    /// Ошибка в любом попапе прерывает сборку целиком.
    pub fn add_feature_layer(
        &mut self,
        mut collection: FeatureCollection,
    ) -> Result<&mut Self, MapError> {
        for feature in &mut collection.features {
            let popup = build_popup_from(feature)?;
            let area = feature.property(FIELD_ROOF_AREA);
            let bucket = bucket_index(area.and_then(Value::as_f64));
            let style = classify_property(area);
            debug!(
                feature = feature_id(feature).unwrap_or_default(),
                fill = style.fill_color,
                "Styled building"
            );
            let style = serde_json::to_value(style).map_err(MapError::Serialize)?;
            feature.set_property(STYLE_PROPERTY, style);
            feature.set_property(POPUP_PROPERTY, popup);
            self.summary.record(bucket);
        }

        self.document.feature_layer = Some(FeatureLayer {
            name: FEATURE_LAYER_NAME,
            show: true,
            control: true,
            style_property: STYLE_PROPERTY,
            popup: PopupBinding {
                property: POPUP_PROPERTY,
                labels: false,
                options: PopupOptions::default(),
            },
            data: collection,
        });
        Ok(self)
    }

    /// Миникарта, поиск адреса, координаты курсора и переключатель слоёв.
    pub fn add_controls(&mut self) -> &mut Self {
        self.document.controls.extend([
            Control::MiniMap {
                position: ControlPosition::BottomRight,
                toggle_display: true,
                width: MINIMAP_SIZE,
                height: MINIMAP_SIZE,
            },
            Control::Geocoder {
                position: ControlPosition::TopRight,
                collapsed: true,
            },
            Control::MousePosition {
                position: ControlPosition::BottomRight,
                separator: " : ",
                num_digits: 5,
            },
            Control::Layers {
                position: ControlPosition::TopRight,
                collapsed: true,
            },
        ]);
        self
    }

    pub fn add_legend(&mut self) -> &mut Self {
        self.document.legend = Some(Legend::standard());
        self
    }

    pub fn add_header(&mut self) -> &mut Self {
        self.document.header = Some(self.config.header.clone());
        self
    }

    pub const fn document(&self) -> &MapDocument {
        &self.document
    }

    pub fn into_summary(self) -> MapSummary {
        self.summary
    }

    /// Рендерит документ и записывает его одним действием.
    pub fn serialize(&self, output_html: &Path, minify_html: bool) -> Result<(), MapError> {
        let page = render_map_page(self.document(), Utc::now())?;
        write_html(page, output_html, minify_html)
    }
}
