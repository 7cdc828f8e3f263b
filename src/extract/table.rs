//! HTML tables as plain rows of text, rendered to markdown for prompts.

use scraper::ElementRef;
use tabled::builder::Builder;
use tabled::settings::Style;

use crate::error::{Result, TippError};

/// Header row plus body rows, every row padded to the same width
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl DataTable {
    /// Read a `<table>` element.
    ///
    /// Header cells come from `<thead>`, or from a leading row made only of
    /// `<th>` cells. Without either, columns are numbered from 0. `colspan`
    /// cells are repeated across the columns they span.
    pub fn from_element(table: ElementRef<'_>) -> Self {
        let mut header_rows: Vec<Vec<String>> = Vec::new();
        let mut body_rows: Vec<Vec<String>> = Vec::new();

        for section in child_elements(table) {
            match section.value().name() {
                "thead" => header_rows.extend(rows_of(section).map(|(cells, _)| cells)),
                "tbody" | "tfoot" => body_rows.extend(rows_of(section).map(|(cells, _)| cells)),
                "tr" => body_rows.push(row_cells(section).0),
                _ => {}
            }
        }

        if header_rows.is_empty() {
            if let Some(first) = first_row(table) {
                let (cells, all_th) = row_cells(first);
                if all_th && !cells.is_empty() && body_rows.first() == Some(&cells) {
                    body_rows.remove(0);
                    header_rows.push(cells);
                }
            }
        }

        let width = header_rows
            .iter()
            .chain(body_rows.iter())
            .map(Vec::len)
            .max()
            .unwrap_or(0);

        let mut headers = header_rows.into_iter().next().unwrap_or_default();
        if headers.is_empty() {
            headers = (0..width).map(|i| i.to_string()).collect();
        }
        headers.resize(width, String::new());

        for row in &mut body_rows {
            row.resize(width, String::new());
        }
        body_rows.retain(|row| row.iter().any(|cell| !cell.is_empty()));

        Self {
            headers,
            rows: body_rows,
        }
    }

    pub fn width(&self) -> usize {
        self.headers.len()
    }

    /// Replace all column names; the count must match
    pub fn rename_columns(&mut self, names: &[&str]) -> Result<()> {
        if names.len() != self.width() {
            return Err(TippError::extraction(format!(
                "Expected {} columns, table has {}",
                names.len(),
                self.width()
            )));
        }
        self.headers = names.iter().map(|n| n.to_string()).collect();
        Ok(())
    }

    /// Replace cells in one column that are exactly a code with its long form
    pub fn substitute_labels(&mut self, column: usize, labels: &[(&str, &str)]) {
        for row in &mut self.rows {
            if let Some(cell) = row.get_mut(column) {
                *cell = substitute_label(cell, labels);
            }
        }
    }

    pub fn to_markdown(&self) -> String {
        let mut builder = Builder::default();
        builder.push_record(self.headers.iter().map(|h| escape_pipe(h)));
        for row in &self.rows {
            builder.push_record(row.iter().map(|c| escape_pipe(c)));
        }

        let mut table = builder.build();
        table.with(Style::markdown());
        table.to_string()
    }
}

/// Whole-cell substitution. Long forms are never codes themselves, so a
/// second pass leaves the text unchanged.
pub fn substitute_label(text: &str, labels: &[(&str, &str)]) -> String {
    let trimmed = text.trim();
    labels
        .iter()
        .find(|(code, _)| *code == trimmed)
        .map(|(_, full)| full.to_string())
        .unwrap_or_else(|| text.to_string())
}

/// Visible text of an element with whitespace collapsed
pub fn element_text(element: ElementRef<'_>) -> String {
    normalize_ws(&element.text().collect::<String>())
}

pub fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn escape_pipe(s: &str) -> String {
    s.replace('|', "\\|")
}

pub(crate) fn child_elements<'a>(element: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    element.children().filter_map(ElementRef::wrap)
}

fn rows_of<'a>(section: ElementRef<'a>) -> impl Iterator<Item = (Vec<String>, bool)> + 'a {
    child_elements(section)
        .filter(|e| e.value().name() == "tr")
        .map(row_cells)
}

fn first_row(table: ElementRef<'_>) -> Option<ElementRef<'_>> {
    child_elements(table).find_map(|section| match section.value().name() {
        "tr" => Some(section),
        "tbody" => child_elements(section).find(|e| e.value().name() == "tr"),
        _ => None,
    })
}

/// Cell texts of one row and whether every cell was a `<th>`
fn row_cells(row: ElementRef<'_>) -> (Vec<String>, bool) {
    let mut cells = Vec::new();
    let mut all_th = true;

    for cell in child_elements(row) {
        let name = cell.value().name();
        if name != "td" && name != "th" {
            continue;
        }
        all_th &= name == "th";

        let span = cell
            .value()
            .attr("colspan")
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(1)
            .max(1);
        let text = element_text(cell);
        cells.extend(std::iter::repeat(text).take(span));
    }

    (cells, all_th)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};

    fn parse(html: &str) -> DataTable {
        let doc = Html::parse_fragment(html);
        let sel = Selector::parse("table").unwrap();
        let table = doc.select(&sel).next().unwrap();
        DataTable::from_element(table)
    }

    #[test]
    fn test_thead_headers() {
        let table = parse(
            r#"<table>
                <thead><tr><th>Gruppe A</th><th>Sp</th><th>Pkt</th></tr></thead>
                <tbody>
                  <tr><td>1. Deutschland</td><td>2</td><td>6</td></tr>
                  <tr><td>2. Schweiz</td><td>2</td><td> 4 </td></tr>
                </tbody>
               </table>"#,
        );
        assert_eq!(table.headers, vec!["Gruppe A", "Sp", "Pkt"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1], vec!["2. Schweiz", "2", "4"]);
    }

    #[test]
    fn test_leading_th_row_is_header() {
        let table = parse("<table><tr><th>A</th><th>B</th></tr><tr><td>1</td><td>2</td></tr></table>");
        assert_eq!(table.headers, vec!["A", "B"]);
        assert_eq!(table.rows, vec![vec!["1".to_string(), "2".to_string()]]);
    }

    #[test]
    fn test_numbered_headers_and_colspan() {
        let table = parse(
            r#"<table><tbody>
                <tr><td>EMQ</td><td colspan="2">Deutschland - Frankreich</td><td>2:0</td></tr>
                <tr><td>NL</td><td>Ungarn</td></tr>
               </tbody></table>"#,
        );
        assert_eq!(table.headers, vec!["0", "1", "2", "3"]);
        assert_eq!(table.rows[0][2], "Deutschland - Frankreich");
        assert_eq!(table.rows[1], vec!["NL", "Ungarn", "", ""]);
    }

    #[test]
    fn test_rename_columns_checks_width() {
        let mut table = parse("<table><tr><td>a</td><td>b</td></tr></table>");
        assert!(table.rename_columns(&["Type", "Home", "Away", "Result"]).is_err());
        table.rename_columns(&["X", "Y"]).unwrap();
        assert_eq!(table.headers, vec!["X", "Y"]);
    }

    #[test]
    fn test_substitute_label_is_whole_cell_and_idempotent() {
        let labels = [
            ("EMQ", "EM 2024 Qualifikation"),
            ("NL", "Nations League"),
            ("WM", "WM 2022"),
            ("WMQ", "WM 2022 Qualifikation"),
        ];
        for (code, full) in labels {
            let once = substitute_label(code, &labels);
            assert_eq!(once, full);
            assert_eq!(substitute_label(&once, &labels), full);
        }
        assert_eq!(substitute_label(" WMQ ", &labels), "WM 2022 Qualifikation");
        assert_eq!(substitute_label("Freundschaft", &labels), "Freundschaft");
        assert_eq!(substitute_label("NL Finale", &labels), "NL Finale");
    }

    #[test]
    fn test_substitute_labels_twice_changes_nothing() {
        let labels = [("WM", "WM 2022"), ("WMQ", "WM 2022 Qualifikation")];
        let mut table = DataTable {
            headers: vec!["Type".to_string()],
            rows: vec![vec!["WM".to_string()], vec!["WMQ".to_string()]],
        };
        table.substitute_labels(0, &labels);
        let once = table.clone();
        table.substitute_labels(0, &labels);
        assert_eq!(table, once);
        assert_eq!(table.rows[1][0], "WM 2022 Qualifikation");
    }

    #[test]
    fn test_markdown_output() {
        let table = DataTable {
            headers: vec!["Type".to_string(), "Result".to_string()],
            rows: vec![vec!["Nations League".to_string(), "1:1".to_string()]],
        };
        let md = table.to_markdown();
        let lines: Vec<&str> = md.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with('|') && lines[0].contains("Type"));
        assert!(lines[1].contains("---"));
        assert!(lines[2].contains("Nations League") && lines[2].contains("1:1"));
    }
}
