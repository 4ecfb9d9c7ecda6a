//! Статические таблицы для легенды.

/// Цвета растрового слоя годовой инсоляции CIEMAT (цвет, подпись), сверху вниз.
pub(super) const IRRADIATION_TIERS: [(&str, &str); 8] = [
    ("#FE230A", "1.750 - 2.020 kWh m²"),
    ("#FF9A0B", "1.500 - 1.750 kWh m²"),
    ("#F8DD1C", "1.250 - 1.500 kWh m²"),
    ("#FFFF73", "1.000 - 1.250 kWh m²"),
    ("#B4FD77", "750 - 1.000 kWh m²"),
    ("#89F0CC", "500 - 750 kWh m²"),
    ("#3ACEFE", "250 - 500 kWh m²"),
    ("#6B73FD", "0 - 250 kWh m²"),
];

pub(super) const LEGEND_TITLE: &str = "Leyendas";
pub(super) const LEGEND_IRRADIATION_TITLE: &str = "Irradiación Solar";
pub(super) const LEGEND_AREA_TITLE: &str = "Superficie Disponible";
