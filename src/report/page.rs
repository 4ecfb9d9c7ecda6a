//! Рендер итоговой HTML-страницы с картой Leaflet.

use chrono::{DateTime, Utc};
use itertools::Itertools;
use maud::{DOCTYPE, Markup, PreEscaped, html};

use super::assembler::{Legend, LegendEntry, MapDocument};
use super::data::{LEGEND_AREA_TITLE, LEGEND_IRRADIATION_TITLE, LEGEND_TITLE};
use super::header::header_markup;
use crate::constants::GENERATED_AT_FORMAT;
use crate::error::MapError;

const PAGE_TITLE: &str = "Mapa solar de tejados";
const LEAFLET_CSS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.css";
const LEAFLET_JS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.js";
const CONFIG_VARIABLE: &str = "solarmapConfig";
const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

const PAGE_STYLE: &str = "
html, body { width: 100%; height: 100%; margin: 0; padding: 0; }
.leyenda {
    position: fixed;
    bottom: 50px;
    left: 50px;
    width: 290px;
    z-index: 9999;
    background: rgba(255, 255, 255, 0.9);
    border: 2px solid grey;
    border-radius: 6px;
    padding: 6px 10px;
    font-size: 13px;
}
.leyenda summary { font-weight: 600; cursor: pointer; }
.leyenda ul { list-style: none; margin: 4px 0; padding: 0; }
.leyenda li { display: flex; align-items: center; gap: 8px; margin: 2px 0; }
.leyenda .muestra {
    display: inline-block;
    width: 18px;
    height: 12px;
    border: 1px solid #555;
}
";

const BOOTSTRAP_JS: &str = r"
(() => {
    const cfg = solarmapConfig;
    const base = cfg.base;
    const map = L.map(base.element_id, {
        center: base.center,
        zoom: base.zoom,
        minZoom: base.min_zoom,
        maxZoom: base.max_zoom,
    });
    const baseTiles = L.tileLayer(base.tiles.url, {
        attribution: base.tiles.attribution,
        minZoom: base.min_zoom,
        maxZoom: base.max_zoom,
    }).addTo(map);
    const baseLayers = { [base.tiles.name]: baseTiles };
    const overlays = {};

    cfg.tile_layers.forEach(layer => {
        const tiles = L.tileLayer(layer.url, {
            attribution: layer.attribution,
            maxZoom: base.max_zoom,
        });
        if (layer.show) tiles.addTo(map);
        if (layer.control) overlays[layer.name] = tiles;
    });

    const features = cfg.feature_layer;
    if (features) {
        const geo = L.geoJSON(features.data, {
            style: feature => feature.properties[features.style_property],
            onEachFeature: (feature, layer) => {
                const html = feature.properties[features.popup.property];
                if (html) layer.bindPopup(html, features.popup.options);
            },
        });
        if (features.show) geo.addTo(map);
        if (features.control) overlays[features.name] = geo;
    }

    cfg.controls.forEach(control => {
        switch (control.kind) {
            case 'mini_map':
                new L.Control.MiniMap(
                    L.tileLayer(base.tiles.url, { attribution: base.tiles.attribution }),
                    {
                        position: control.position,
                        toggleDisplay: control.toggle_display,
                        width: control.width,
                        height: control.height,
                    },
                ).addTo(map);
                break;
            case 'geocoder':
                L.Control.geocoder({ position: control.position, collapsed: control.collapsed }).addTo(map);
                break;
            case 'mouse_position':
                L.control.mousePosition({
                    position: control.position,
                    separator: control.separator,
                    numDigits: control.num_digits,
                }).addTo(map);
                break;
            case 'layers':
                L.control.layers(baseLayers, overlays, {
                    position: control.position,
                    collapsed: control.collapsed,
                }).addTo(map);
                break;
        }
    });

    window[base.global_name] = map;
})();
";

/// JSON для `<script>`: `</` экранируется, чтобы HTML попапов не закрыл тег раньше времени.
fn script_json(document: &MapDocument) -> Result<String, MapError> {
    let json = serde_json::to_string(document).map_err(MapError::Serialize)?;
    Ok(json.replace("</", "<\\/"))
}

fn legend_list(entries: &[LegendEntry]) -> Markup {
    html! {
        ul {
            @for entry in entries {
                li {
                    span class="muestra" style=(format!("background: {};", entry.color)) {}
                    (entry.label)
                }
            }
        }
    }
}

fn legend_markup(legend: &Legend) -> Markup {
    html! {
        div class="leyenda" {
            b { (LEGEND_TITLE) }
            details {
                summary { (LEGEND_IRRADIATION_TITLE) }
                (legend_list(&legend.irradiation))
            }
            details {
                summary { (LEGEND_AREA_TITLE) }
                (legend_list(&legend.area))
            }
        }
    }
}

pub(super) fn render_map_page(
    document: &MapDocument,
    generated_at: DateTime<Utc>,
) -> Result<String, MapError> {
    let config_json = script_json(document)?;
    let generated_label = generated_at.format(GENERATED_AT_FORMAT).to_string();
    let plugin_styles = document
        .controls
        .iter()
        .flat_map(|control| control.stylesheets().iter().copied())
        .unique()
        .collect::<Vec<_>>();
    let plugin_scripts = document
        .controls
        .iter()
        .flat_map(|control| control.scripts().iter().copied())
        .unique()
        .collect::<Vec<_>>();
    let map_style = format!(
        "width: {}; height: {};",
        document.base.width, document.base.height
    );

    let page = html! {
        (DOCTYPE)
        html lang="es" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                meta name="generator" content=(format!("solarmap {APP_VERSION}"));
                meta name="generated-at" content=(generated_label);
                title { (PAGE_TITLE) }
                link rel="stylesheet" href=(LEAFLET_CSS);
                script src=(LEAFLET_JS) {}
                @for href in &plugin_styles {
                    link rel="stylesheet" href=(href);
                }
                @for src in &plugin_scripts {
                    script src=(src) {}
                }
                @for href in &document.stylesheets {
                    link rel="stylesheet" href=(href);
                }
                style { (PreEscaped(PAGE_STYLE)) }
            }
            body {
                @if let Some(header) = &document.header {
                    (header_markup(header))
                }
                div id=(document.base.element_id) style=(map_style) {}
                @if let Some(legend) = &document.legend {
                    (legend_markup(legend))
                }
                script {
                    (PreEscaped(format!("const {CONFIG_VARIABLE} = {config_json};")))
                    (PreEscaped(BOOTSTRAP_JS))
                }
            }
        }
    };
    Ok(page.into_string())
}
