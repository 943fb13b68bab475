//! Declarative traversal for the portal's positional tables.
//!
//! The portal carries no semantic markup: every grid is a plain table found
//! by a stable anchor id, with a header row and fixed column offsets. Each
//! scraper declares a `TableSpec` and maps column indices to fields, so the
//! drift tolerance (skip short rows, trim everything) lives in one place.

use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

static TR_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").unwrap());
static TD_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td").unwrap());
static TH_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("th").unwrap());
static OPTION_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("option").unwrap());

/// Shape of one portal grid.
#[derive(Debug, Clone, Copy)]
pub struct TableSpec {
    /// Element id anchoring the table
    pub anchor_id: &'static str,
    /// Leading rows to skip (the portal renders one header row per grid)
    pub header_rows: usize,
    /// Rows with fewer data cells than this are formatting drift; skip them
    pub min_columns: usize,
}

impl TableSpec {
    /// Extracts the data rows as trimmed cell texts.
    ///
    /// `None` means the anchor is absent from the document (a scrape miss the
    /// caller resolves to an empty result); `Some` rows have at least
    /// `min_columns` cells each.
    pub fn rows(&self, document: &Html) -> Option<Vec<Vec<String>>> {
        let table = find_by_id(document, self.anchor_id)?;
        let rows = table
            .select(&TR_SELECTOR)
            .skip(self.header_rows)
            .map(|tr| cell_texts(&tr, &TD_SELECTOR))
            .filter(|cells| cells.len() >= self.min_columns)
            .collect();
        Some(rows)
    }
}

/// Looks up an element by id. `None` is the "table absent" signal.
pub fn find_by_id<'a>(document: &'a Html, id: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(&format!("#{id}")).ok()?;
    document.select(&selector).next()
}

/// Header cell texts of a table's first row.
pub fn header_texts(table: &ElementRef) -> Vec<String> {
    table
        .select(&TR_SELECTOR)
        .next()
        .map(|tr| cell_texts(&tr, &TH_SELECTOR))
        .unwrap_or_default()
}

/// All rows of a table as td texts, header row included, no column minimum.
pub fn raw_rows(table: &ElementRef) -> Vec<Vec<String>> {
    table
        .select(&TR_SELECTOR)
        .map(|tr| cell_texts(&tr, &TD_SELECTOR))
        .collect()
}

/// Trimmed text of an element found by id, or empty when absent.
pub fn text_by_id(document: &Html, id: &str) -> String {
    find_by_id(document, id)
        .map(|el| el.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

/// `value` attribute of an element found by id.
pub fn value_by_id(document: &Html, id: &str) -> Option<String> {
    find_by_id(document, id).and_then(|el| el.value().attr("value").map(str::to_string))
}

/// Option values of a `select` element, in document order.
pub fn option_values(document: &Html, select_id: &str) -> Vec<String> {
    let Some(select) = find_by_id(document, select_id) else {
        return Vec::new();
    };
    select
        .select(&OPTION_SELECTOR)
        .filter_map(|opt| opt.value().attr("value").map(|v| v.trim().to_string()))
        .collect()
}

/// The selected option's value, else the first option's.
pub fn selected_or_first_option(document: &Html, select_id: &str) -> Option<String> {
    let select = find_by_id(document, select_id)?;
    let mut first = None;
    for opt in select.select(&OPTION_SELECTOR) {
        let value = opt.value().attr("value").map(str::to_string);
        if opt.value().attr("selected").is_some() {
            return value;
        }
        if first.is_none() {
            first = value;
        }
    }
    first
}

fn cell_texts(row: &ElementRef, cell_selector: &Selector) -> Vec<String> {
    row.select(cell_selector)
        .map(|cell| cell.text().collect::<String>().trim().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRID: &str = r#"
        <table id="MainContent_GridView9">
            <tr><th>Code</th><th>Name</th><th>Count</th></tr>
            <tr><td>C1</td><td>Alpha</td><td>10</td></tr>
            <tr><td>C2</td><td>Beta</td></tr>
            <tr><td>C3</td><td>Gamma</td><td> 7 </td></tr>
        </table>
    "#;

    #[test]
    fn test_spec_skips_header_and_short_rows() {
        let doc = Html::parse_document(GRID);
        let spec = TableSpec {
            anchor_id: "MainContent_GridView9",
            header_rows: 1,
            min_columns: 3,
        };
        let rows = spec.rows(&doc).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], vec!["C1", "Alpha", "10"]);
        assert_eq!(rows[1][2], "7");
    }

    #[test]
    fn test_missing_table_is_none() {
        let doc = Html::parse_document("<p>no classes</p>");
        let spec = TableSpec {
            anchor_id: "MainContent_GridView9",
            header_rows: 1,
            min_columns: 1,
        };
        assert!(spec.rows(&doc).is_none());
    }

    #[test]
    fn test_header_texts() {
        let doc = Html::parse_document(GRID);
        let table = find_by_id(&doc, "MainContent_GridView9").unwrap();
        assert_eq!(header_texts(&table), vec!["Code", "Name", "Count"]);
    }

    #[test]
    fn test_option_values_and_selection() {
        let html = r#"
            <select id="MainContent_YoPList">
                <option value="0">Select YoR</option>
                <option value="Apr.2025">Apr.2025</option>
                <option value="Nov.2025" selected>Nov.2025</option>
            </select>
        "#;
        let doc = Html::parse_document(html);
        assert_eq!(
            option_values(&doc, "MainContent_YoPList"),
            vec!["0", "Apr.2025", "Nov.2025"]
        );
        assert_eq!(
            selected_or_first_option(&doc, "MainContent_YoPList").as_deref(),
            Some("Nov.2025")
        );
    }
}
