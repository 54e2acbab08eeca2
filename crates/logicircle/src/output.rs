//! Rendering for `--format`.
//!
//! Camera listings go through `tabled` rows, the config view through a
//! hand-written detail block. JSON and YAML serialize the domain types as
//! they are; `plain` prints identifiers only, for piping into `snapshot`.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use crate::cli::{ColorMode, OutputFormat};

// ── Color ────────────────────────────────────────────────────────────

/// `--color auto` colors only an interactive stdout without `NO_COLOR`.
pub fn should_color(mode: &ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

pub fn availability_label(available: bool, color: bool) -> String {
    let label = if available { "available" } else { "unavailable" };
    match (color, available) {
        (false, _) => label.to_owned(),
        (true, true) => label.green().to_string(),
        (true, false) => label.red().to_string(),
    }
}

pub fn muted(text: &str, color: bool) -> String {
    if color {
        text.dimmed().to_string()
    } else {
        text.to_owned()
    }
}

// ── Rendering ────────────────────────────────────────────────────────

/// Render a collection. `to_row` builds the table row, `key` the `plain`
/// line.
pub fn render_list<T, R>(
    format: &OutputFormat,
    items: &[T],
    to_row: impl Fn(&T) -> R,
    key: impl Fn(&T) -> String,
) -> String
where
    T: serde::Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = items.iter().map(to_row).collect();
            Table::new(rows).with(Style::rounded()).to_string()
        }
        OutputFormat::Plain => items.iter().map(key).collect::<Vec<_>>().join("\n"),
        OutputFormat::Json | OutputFormat::JsonCompact | OutputFormat::Yaml => {
            render_structured(format, items)
        }
    }
}

/// Render one record; `detail` is its table view.
pub fn render_single<T>(
    format: &OutputFormat,
    item: &T,
    detail: impl Fn(&T) -> String,
    key: impl Fn(&T) -> String,
) -> String
where
    T: serde::Serialize,
{
    match format {
        OutputFormat::Table => detail(item),
        OutputFormat::Plain => key(item),
        OutputFormat::Json | OutputFormat::JsonCompact | OutputFormat::Yaml => {
            render_structured(format, item)
        }
    }
}

pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

fn render_structured<T: serde::Serialize + ?Sized>(format: &OutputFormat, data: &T) -> String {
    match format {
        OutputFormat::JsonCompact => {
            serde_json::to_string(data).expect("camera data serializes to JSON")
        }
        OutputFormat::Yaml => serde_yaml::to_string(data).expect("camera data serializes to YAML"),
        OutputFormat::Json | OutputFormat::Table | OutputFormat::Plain => {
            serde_json::to_string_pretty(data).expect("camera data serializes to JSON")
        }
    }
}

#[cfg(test)]
mod tests {
    use serde::Serialize;

    use super::*;

    #[derive(Serialize)]
    struct Cam {
        id: &'static str,
    }

    #[derive(Tabled)]
    struct Row {
        #[tabled(rename = "ID")]
        id: &'static str,
    }

    fn cams() -> Vec<Cam> {
        vec![Cam { id: "front-door" }, Cam { id: "backyard" }]
    }

    #[test]
    fn plain_prints_one_key_per_line() {
        let out = render_list(&OutputFormat::Plain, &cams(), |c| Row { id: c.id }, |c| c.id.into());
        assert_eq!(out, "front-door\nbackyard");
    }

    #[test]
    fn compact_json_is_single_line() {
        let out = render_list(
            &OutputFormat::JsonCompact,
            &cams(),
            |c| Row { id: c.id },
            |c| c.id.into(),
        );
        assert_eq!(out, r#"[{"id":"front-door"},{"id":"backyard"}]"#);
    }

    #[test]
    fn uncolored_labels_are_plain_words() {
        assert_eq!(availability_label(true, false), "available");
        assert_eq!(availability_label(false, false), "unavailable");
        assert_eq!(muted("12:00:00", false), "12:00:00");
    }
}
