//! Общие константы, чтобы не дублировать подписи месяцев и форматы.

pub const MONTH_COUNT: usize = 12;
pub const MONTH_LABELS: [&str; MONTH_COUNT] = [
    "Ene", "Feb", "Mar", "Abr", "May", "Jun", "Jul", "Ago", "Sep", "Oct", "Nov", "Dic",
];
pub const GENERATED_AT_FORMAT: &str = "%Y-%m-%d %H:%M UTC";
