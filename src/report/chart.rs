//! Помесячные столбчатые диаграммы, встраиваемые в попапы как PNG.

use std::error::Error;
use std::io::Cursor;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{ExtendedColorType, ImageFormat};
use plotters::prelude::*;

use crate::constants::{MONTH_COUNT, MONTH_LABELS};
use crate::error::MapError;

const CHART_SIZE: (u32, u32) = (640, 480);
const RGB_CHANNELS: usize = 3;
const PNG_MIME: &str = "image/png";
const FONT_FAMILY: &str = "sans-serif";
const FONT_SIZE_CAPTION: u32 = 22;
const FONT_SIZE_AXIS_DESC: u32 = 16;
const CHART_MARGIN: u32 = 16;
const X_LABEL_AREA: u32 = 36;
const Y_LABEL_AREA: u32 = 64;
const BAR_MARGIN: u32 = 6;
const Y_HEADROOM: f64 = 1.1;
/// Без шрифтового бэкенда plotters падает на любом тексте, поэтому подписи рисуем только с ним.
const TEXT_ENABLED: bool = cfg!(feature = "system-fonts");
const COLOR_BAR: RGBColor = RGBColor(31, 119, 180);
const COLOR_GRID: RGBColor = RGBColor(225, 225, 225);

/// Какой ряд рисуем: от этого зависят заголовок и подпись оси Y.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChartKind {
    Irradiation,
    Energy,
}

impl ChartKind {
    pub const fn title(self) -> &'static str {
        match self {
            Self::Irradiation => "Radiación solar mensual (kWh/m²)",
            Self::Energy => "Producción mensual de energía fotovoltaica (kWh)",
        }
    }

    pub const fn y_label(self) -> &'static str {
        match self {
            Self::Irradiation => "Irradiación (kWh/m²)",
            Self::Energy => "Energía (kWh)",
        }
    }
}

/// Закодированная картинка, готовая к вставке в `src`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedChart {
    pub mime: &'static str,
    pub base64: String,
}

impl RenderedChart {
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime, self.base64)
    }
}

/// Рисует 12 значений (январь..декабрь) и возвращает PNG в base64.
pub fn render_monthly_chart(kind: ChartKind, values: &[f64]) -> Result<RenderedChart, MapError> {
    if values.len() != MONTH_COUNT {
        return Err(MapError::InvalidSeriesLength { len: values.len() });
    }
    let (width, height) = CHART_SIZE;
    let mut pixels = vec![0u8; width as usize * height as usize * RGB_CHANNELS];
    draw_bars(kind, values, &mut pixels).map_err(|err| MapError::ChartRender(err.to_string()))?;

    let mut png = Cursor::new(Vec::new());
    image::write_buffer_with_format(
        &mut png,
        &pixels,
        width,
        height,
        ExtendedColorType::Rgb8,
        ImageFormat::Png,
    )
    .map_err(MapError::Encode)?;

    Ok(RenderedChart {
        mime: PNG_MIME,
        base64: STANDARD.encode(png.into_inner()),
    })
}

// Поверхность рисования живёт только внутри этой функции и отпускает буфер на выходе.
fn draw_bars(kind: ChartKind, values: &[f64], pixels: &mut [u8]) -> Result<(), Box<dyn Error>> {
    let root = BitMapBackend::with_buffer(pixels, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let (y_min, y_max) = value_range(values);
    let mut builder = ChartBuilder::on(&root);
    builder
        .margin(CHART_MARGIN)
        .x_label_area_size(X_LABEL_AREA)
        .y_label_area_size(Y_LABEL_AREA);
    if TEXT_ENABLED {
        builder.caption(kind.title(), (FONT_FAMILY, FONT_SIZE_CAPTION));
    }
    let mut chart =
        builder.build_cartesian_2d((0u32..MONTH_COUNT as u32).into_segmented(), y_min..y_max)?;

    let label_formatter = &month_label;
    let mut mesh = chart.configure_mesh();
    mesh.disable_x_mesh()
        .light_line_style(WHITE)
        .bold_line_style(COLOR_GRID);
    if TEXT_ENABLED {
        mesh.x_labels(MONTH_COUNT)
            .x_label_formatter(label_formatter)
            .y_desc(kind.y_label())
            .axis_desc_style((FONT_FAMILY, FONT_SIZE_AXIS_DESC));
    } else {
        mesh.x_labels(0).y_labels(0);
    }
    mesh.draw()?;

    chart.draw_series(
        Histogram::vertical(&chart)
            .style(COLOR_BAR.filled())
            .margin(BAR_MARGIN)
            .data(
                values
                    .iter()
                    .zip(0u32..)
                    .map(|(value, month)| (month, *value)),
            ),
    )?;

    root.present()?;
    Ok(())
}

fn month_label(value: &SegmentValue<u32>) -> String {
    match value {
        SegmentValue::Exact(idx) | SegmentValue::CenterOf(idx) => MONTH_LABELS
            .get(*idx as usize)
            .map(ToString::to_string)
            .unwrap_or_default(),
        SegmentValue::Last => String::new(),
    }
}

/// Диапазон оси Y: всегда включает ноль и оставляет 10% запаса сверху.
fn value_range(values: &[f64]) -> (f64, f64) {
    let finite = || values.iter().copied().filter(|value| value.is_finite());
    let min = finite().fold(0.0_f64, f64::min);
    let max = finite().fold(0.0_f64, f64::max);
    if (max - min).abs() < f64::EPSILON {
        return (0.0, 1.0);
    }
    (
        (min * Y_HEADROOM).max(f64::MIN),
        (max * Y_HEADROOM).min(f64::MAX),
    )
}
