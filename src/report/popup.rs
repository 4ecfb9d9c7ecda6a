//! HTML-фрагмент попапа для одного здания.

use geojson::Feature;
use maud::html;

use super::chart::{ChartKind, RenderedChart, render_monthly_chart};
use crate::dataset::BuildingFeature;
use crate::error::MapError;

const POPUP_TITLE: &str = "Información del edificio";
const BANNER_STYLE: &str = "background-color: #194470;";
const BANNER_TITLE_STYLE: &str = "color: white;";
const RESULT_STYLE: &str = "margin-top: 10px;";
const CONSUMPTION_PLACEHOLDER: &str = "Ej. 5000";
/// Мощности панелей (кВт); значения читает клиентский калькулятор.
const PANEL_POWER_OPTIONS: [&str; 3] = ["0.44", "0.49", "0.59"];

/// Разбирает фичу по схеме и собирает попап.
pub fn build_popup_from(feature: &Feature) -> Result<String, MapError> {
    let building = BuildingFeature::from_feature(feature)?;
    build_popup(&building)
}

/// Собирает попап: метаданные, два графика и форму калькулятора.
///
/// Все `id` элементов получают суффикс с идентификатором здания, чтобы
/// несколько открытых попапов не конфликтовали в одном документе.
pub fn build_popup(building: &BuildingFeature) -> Result<String, MapError> {
    let irradiation = render_monthly_chart(ChartKind::Irradiation, &building.irradiation_kwh_m2)?;
    let energy = render_monthly_chart(ChartKind::Energy, &building.energy_kwh)?;
    Ok(render_popup(building, &irradiation, &energy))
}

fn render_popup(
    building: &BuildingFeature,
    irradiation: &RenderedChart,
    energy: &RenderedChart,
) -> String {
    let id = building.id.as_str();
    let dom_id = |name: &str| format!("{name}-{id}");
    let markup = html! {
        div id=(dom_id("pop-up")) class="popup-edificio" data-id=(id) {
            div class="popup-banner" style=(BANNER_STYLE) {
                h4 style=(BANNER_TITLE_STYLE) { (POPUP_TITLE) }
            }
            b { "Referencia catastral: " } (building.cadastral_ref) br;
            b { "Uso: " } (building.usage) br;
            b id=(dom_id("tejado-sup")) { "Tejado disponible:" (building.roof_area_m2.to_string()) } br;
            b { "Radiación kWh m2 Anual: " } (building.annual_irradiation_kwh_m2.to_string()) br;
            b { "Energía KWh Anual: " } (building.annual_energy_kwh.to_string()) br;
            details {
                summary { "Gráfico irradiación kWh m2 mensual" }
                div {
                    img id=(dom_id("grafico-irradiacion"))
                        class="grafico"
                        alt=(ChartKind::Irradiation.title())
                        src=(irradiation.data_uri());
                }
            }
            details {
                summary { "Gráfico energía KWh mensual" }
                div {
                    img id=(dom_id("grafico-energia"))
                        class="grafico"
                        alt=(ChartKind::Energy.title())
                        src=(energy.data_uri());
                }
            }
            details {
                summary { "Calculadora de paneles" }
                div {
                    p { "Introduce los datos para calcular el número de paneles necesarios:" }
                    label for=(dom_id("consumo-anual")) { b { "Consumo Anual (kWh):" } }
                    input type="number"
                        id=(dom_id("consumo-anual"))
                        step="any"
                        placeholder=(CONSUMPTION_PLACEHOLDER);
                    br;
                    b { "Selecciona la potencia del panel:" }
                    select id=(dom_id("potencia-panel")) {
                        @for power in PANEL_POWER_OPTIONS {
                            option value=(power) { (power) " kW" }
                        }
                    }
                    br;
                    button type="button" id=(dom_id("btn-calcular")) { "Calcular" }
                    p { b id=(dom_id("resultado-calculo")) style=(RESULT_STYLE) {} }
                    p { b id=(dom_id("icono-estado")) {} }
                }
            }
        }
    };
    markup.into_string()
}
