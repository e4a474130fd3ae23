use std::io::{self, IsTerminal, Write};

use anyhow::anyhow;
use causeway_shared::{NavigationPayload, ScreenName};
use unicode_width::UnicodeWidthStr;

use crate::config::Config;
use crate::model::GroupedCatalog;
use crate::screen::Notice;
use crate::selection::SelectionState;
use crate::submit::SubmitOutcome;

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let color_cfg = cfg.get("color").unwrap_or_else(|| "on".to_string());
        let color = match color_cfg.to_ascii_lowercase().as_str() {
            "on" | "yes" | "true" | "1" => true,
            "off" | "no" | "false" | "0" => false,
            other => return Err(anyhow!("invalid color setting: {other}")),
        };

        Ok(Self { color })
    }

    #[tracing::instrument(skip_all)]
    pub fn print_catalog(
        &mut self,
        catalog: &GroupedCatalog,
        selection: &SelectionState,
    ) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        let rows = self.catalog_rows(catalog, selection);
        write_table(
            &mut out,
            vec!["Group".to_string(), "ID".to_string(), "Cause".to_string(), "Selected".to_string()],
            rows,
        )?;
        writeln!(out)?;
        writeln!(
            out,
            "{} causes in {} groups, {} selected",
            catalog.len(),
            catalog.groups.len(),
            selection.len()
        )?;
        Ok(())
    }

    pub fn print_notice(&mut self, notice: &Notice) -> anyhow::Result<()> {
        let mut out = io::stderr().lock();
        match notice {
            Notice::Alert(message) => writeln!(out, "{}", self.paint(message, "31"))?,
            Notice::Retry(message) => {
                writeln!(out, "{} (run the command again to retry)", self.paint(message, "33"))?
            }
        }
        Ok(())
    }

    pub fn print_outcome(&mut self, outcome: &SubmitOutcome) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        match outcome {
            SubmitOutcome::WentBack => writeln!(out, "saved; returning to previous screen")?,
            SubmitOutcome::Navigated { screen, payload } => {
                writeln!(out, "continuing to {}", screen.as_str())?;
                writeln!(out, "{}", serde_json::to_string_pretty(payload)?)?;
            }
        }
        Ok(())
    }

    fn catalog_rows(&self, catalog: &GroupedCatalog, selection: &SelectionState) -> Vec<Vec<String>> {
        let mut rows = Vec::with_capacity(catalog.len());
        for group in &catalog.groups {
            for (idx, cause) in group.causes.iter().enumerate() {
                let label = if idx == 0 { group.name.clone() } else { String::new() };
                let mark = if selection.is_pressed(&cause.name) {
                    self.paint("[x]", "32")
                } else {
                    "[ ]".to_string()
                };
                rows.push(vec![label, self.paint(&cause.id.to_string(), "33"), cause.name.clone(), mark]);
            }
        }
        rows
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color || !io::stdout().is_terminal() {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

/// Describe a navigation request on one line, for logs and the console host.
pub fn describe_navigation(screen: ScreenName, payload: &NavigationPayload) -> String {
    match payload {
        NavigationPayload::Onboarding(inner) => format!(
            "{} <- onboarding ({} causes, {} draft fields)",
            screen.as_str(),
            inner.categories.len(),
            inner.draft.len()
        ),
        NavigationPayload::PostDraft(inner) => format!(
            "{} <- post draft ({})",
            screen.as_str(),
            inner.category_names.join(", ")
        ),
    }
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for idx in 0..column_count {
        write!(writer, "{:width$} ", headers[idx], width = widths[idx])?;
    }
    writeln!(writer)?;

    for idx in 0..column_count {
        write!(writer, "{:-<width$} ", "", width = widths[idx])?;
    }
    writeln!(writer)?;

    for row in rows {
        for idx in 0..column_count {
            let cell = &row[idx];
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = widths[idx].saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}

#[cfg(test)]
mod tests {
    use causeway_shared::CauseDto;

    use super::*;
    use crate::catalog::group;

    #[test]
    fn table_pads_to_widest_visible_cell() {
        let mut buf = Vec::new();
        write_table(
            &mut buf,
            vec!["ID".to_string(), "Cause".to_string()],
            vec![vec!["\x1b[33m12\x1b[0m".to_string(), "Beach Cleanup".to_string()]],
        )
        .expect("write table");

        let text = String::from_utf8(buf).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "ID Cause         ");
        assert_eq!(lines[1], "-- ------------- ");
        assert!(lines[2].ends_with("Beach Cleanup "));
    }

    #[test]
    fn catalog_rows_label_group_once_and_mark_selection() {
        let catalog = group(&[
            CauseDto::new(1, "Beach Cleanup", Some("Environment")),
            CauseDto::new(3, "Tree Planting", Some("Environment")),
        ]);
        let selection = SelectionState::initialize(&[3], &catalog);
        let renderer = Renderer { color: false };

        let rows = renderer.catalog_rows(&catalog, &selection);
        assert_eq!(rows[0], vec!["Environment", "1", "Beach Cleanup", "[ ]"]);
        assert_eq!(rows[1], vec!["", "3", "Tree Planting", "[x]"]);
    }
}
