//! Шапка страницы: логотипы, заголовок и подключение скрипта калькулятора.

use std::fs;
use std::path::Path;

use maud::{Markup, html};

use crate::config::HeaderConfig;
use crate::error::MapError;

const HEADER_MARKERS: [&str; 2] = [r#"id="header""#, "id=header"];

pub fn header_markup(header: &HeaderConfig) -> Markup {
    html! {
        link rel="stylesheet" href=(header.stylesheet);
        div id="header" {
            div class="logos" {
                @for logo in &header.logos {
                    img class="colaborador-logo" src=(logo.src) alt=(logo.alt);
                }
            }
            h1 class="titulo" { (header.title) }
        }
        script defer src=(header.script) {}
    }
}

/// Позиция сразу после открывающего тега `<body ...>` (без учёта регистра).
fn body_insert_position(html: &str) -> Option<usize> {
    let lower = html.to_ascii_lowercase();
    let mut from = 0;
    while let Some(offset) = lower[from..].find("<body") {
        let start = from + offset;
        let after_name = start + "<body".len();
        let next = lower[after_name..].chars().next();
        if matches!(next, Some('>' | ' ' | '\t' | '\n' | '\r' | '/')) {
            let close = lower[after_name..].find('>')?;
            return Some(after_name + close + 1);
        }
        from = after_name;
    }
    None
}

/// Вставляет шапку в начало `<body>` уже записанного документа.
///
/// Возвращает `false`, если шапка там уже есть и файл не менялся.
pub fn inject_header(path: &Path, header: &HeaderConfig) -> Result<bool, MapError> {
    if !path.exists() {
        return Err(MapError::DocumentNotFound {
            path: path.to_path_buf(),
        });
    }
    let html = fs::read_to_string(path).map_err(|source| MapError::DocumentRead {
        path: path.to_path_buf(),
        source,
    })?;
    if HEADER_MARKERS.iter().any(|marker| html.contains(marker)) {
        return Ok(false);
    }
    let position = body_insert_position(&html).ok_or_else(|| MapError::MissingBody {
        path: path.to_path_buf(),
    })?;

    let markup = header_markup(header).into_string();
    let mut patched = String::with_capacity(html.len() + markup.len());
    patched.push_str(&html[..position]);
    patched.push_str(&markup);
    patched.push_str(&html[position..]);
    fs::write(path, patched).map_err(|source| MapError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(true)
}
