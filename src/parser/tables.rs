use std::sync::LazyLock;

use quick_xml::escape::{resolve_html5_entity, unescape_with};
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::{Captures, Regex};
use tracing::debug;

static ENTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(?:#[0-9]+|#[xX][0-9a-fA-F]+|[A-Za-z][A-Za-z0-9]*);").unwrap()
});

/// Raw cell text, one entry per `td`/`th`.
pub type Row = Vec<String>;
pub type Table = Vec<Row>;

/// Collect every outermost `<table>` in `markup` as rows of cell text.
///
/// Tables nested inside a cell are not reported and their rows never reach
/// the outer table; their text does end up in the enclosing cell. Malformed
/// markup degrades to fewer (or partial) tables, never an error.
///
/// A bare `<` inside text is read as the start of a tag, so the text up to the
/// next `>` is lost. MediaWiki escapes it as `&lt;`.
pub fn extract_tables(markup: &str) -> Vec<Table> {
    let mut reader = Reader::from_str(markup);
    {
        let config = reader.config_mut();
        config.check_end_names = false;
        config.allow_unmatched_ends = true;
    }

    let mut collector = TableCollector::default();
    let mut buf = Vec::new();
    let mut last_error_at = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => collector.open(&e.local_name().as_ref().to_ascii_lowercase()),
            Ok(Event::Empty(e)) => {
                let name = e.local_name().as_ref().to_ascii_lowercase();
                collector.open(&name);
                collector.close(&name);
            }
            Ok(Event::End(e)) => collector.close(&e.local_name().as_ref().to_ascii_lowercase()),
            Ok(Event::Text(e)) => collector.text(&decode_entities(&String::from_utf8_lossy(&e))),
            Ok(Event::CData(e)) => collector.text(&String::from_utf8_lossy(&e)),
            Ok(Event::Eof) => break,
            Err(err) => {
                let pos = reader.buffer_position();
                debug!("markup error at byte {}: {}", pos, err);
                // Keep going as long as the reader moves forward.
                if last_error_at == Some(pos) {
                    break;
                }
                last_error_at = Some(pos);
            }
            _ => {}
        }
        buf.clear();
    }

    collector.finish()
}

/// Decode each character reference on its own; unknown ones stay as written.
fn decode_entities(raw: &str) -> String {
    ENTITY_RE
        .replace_all(raw, |caps: &Captures| {
            let reference = &caps[0];
            unescape_with(reference, resolve_html5_entity)
                .map(|t| t.into_owned())
                .unwrap_or_else(|_| reference.to_string())
        })
        .into_owned()
}

/// Parse state threaded through the event loop.
#[derive(Debug, Default)]
struct TableCollector {
    depth: usize,
    tables: Vec<Table>,
    table: Option<Table>,
    row: Option<Row>,
    cell: Option<Vec<String>>,
}

impl TableCollector {
    fn open(&mut self, tag: &[u8]) {
        match tag {
            b"table" => {
                self.depth += 1;
                if self.depth == 1 {
                    self.table = Some(Vec::new());
                }
            }
            b"tr" if self.depth == 1 => {
                self.end_row();
                self.row = Some(Vec::new());
            }
            b"td" | b"th" if self.depth == 1 && self.row.is_some() => {
                self.end_cell();
                self.cell = Some(Vec::new());
            }
            _ => {}
        }
    }

    fn close(&mut self, tag: &[u8]) {
        match tag {
            b"table" => {
                if self.depth == 1 {
                    self.end_table();
                }
                self.depth = self.depth.saturating_sub(1);
            }
            b"tr" if self.depth == 1 => self.end_row(),
            b"td" | b"th" if self.depth == 1 => self.end_cell(),
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        if let Some(cell) = self.cell.as_mut() {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                cell.push(trimmed.to_string());
            }
        }
    }

    fn end_cell(&mut self) {
        if let Some(fragments) = self.cell.take() {
            if let Some(row) = self.row.as_mut() {
                row.push(fragments.join(" ").trim().to_string());
            }
        }
    }

    fn end_row(&mut self) {
        self.end_cell();
        if let Some(row) = self.row.take() {
            if row.is_empty() {
                return;
            }
            if let Some(table) = self.table.as_mut() {
                table.push(row);
            }
        }
    }

    fn end_table(&mut self) {
        self.end_row();
        if let Some(table) = self.table.take() {
            self.tables.push(table);
        }
    }

    /// Emit a still-open outer table as a partial table.
    fn finish(mut self) -> Vec<Table> {
        if self.table.is_some() {
            self.end_table();
        }
        self.tables
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(table: &Table) -> Vec<Vec<&str>> {
        table
            .iter()
            .map(|r| r.iter().map(String::as_str).collect())
            .collect()
    }

    #[test]
    fn simple_table() {
        let html = "<table><tr><th>Year</th><th>Claim</th></tr>\
                    <tr><td>1999</td><td>The end</td></tr></table>";
        let tables = extract_tables(html);
        assert_eq!(tables.len(), 1);
        assert_eq!(cells(&tables[0]), vec![vec!["Year", "Claim"], vec!["1999", "The end"]]);
    }

    #[test]
    fn fragments_joined_with_single_space() {
        let html = "<table><tr><td>Ravi <a href=\"/wiki/Ravi_Batra\">Batra</a>\n  <sup>[1]</sup></td></tr></table>";
        let tables = extract_tables(html);
        assert_eq!(tables[0][0], vec!["Ravi Batra [1]".to_string()]);
    }

    #[test]
    fn nested_table_rows_excluded() {
        let html = "<table>\
                      <tr><td>1</td><td>outer\
                        <table><tr><td>inner-a</td></tr><tr><td>inner-b</td></tr></table>\
                      </td></tr>\
                      <tr><td>2</td><td>second</td></tr>\
                    </table>";
        let tables = extract_tables(html);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].len(), 2);
        assert_eq!(tables[0][1], vec!["2".to_string(), "second".to_string()]);
        assert!(tables[0].iter().all(|r| r.len() == 2));
        // inner text stays inside the outer cell
        assert_eq!(tables[0][0][1], "outer inner-a inner-b");
    }

    #[test]
    fn sibling_tables_in_order() {
        let html = "<table><tr><td>a</td></tr></table><p>x</p><table><tr><td>b</td></tr></table>";
        let tables = extract_tables(html);
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0][0][0], "a");
        assert_eq!(tables[1][0][0], "b");
    }

    #[test]
    fn empty_rows_discarded_and_empty_table_kept() {
        let html = "<table><tr></tr><tr> </tr></table>";
        let tables = extract_tables(html);
        assert_eq!(tables.len(), 1);
        assert!(tables[0].is_empty());
    }

    #[test]
    fn text_outside_cells_ignored() {
        let html = "<p>intro</p><table><caption>Caption</caption><tr><td>x</td></tr></table>";
        let tables = extract_tables(html);
        assert_eq!(cells(&tables[0]), vec![vec!["x"]]);
    }

    #[test]
    fn unclosed_cells_and_rows_are_closed_implicitly() {
        let html = "<table><tr><td>a<td>b<tr><td>c</table>";
        let tables = extract_tables(html);
        assert_eq!(cells(&tables[0]), vec![vec!["a", "b"], vec!["c"]]);
    }

    #[test]
    fn unclosed_table_yields_partial_table() {
        let html = "<table><tr><td>1999</td><td>partial";
        let tables = extract_tables(html);
        assert_eq!(tables.len(), 1);
        assert_eq!(cells(&tables[0]), vec![vec!["1999", "partial"]]);
    }

    #[test]
    fn stray_closing_tags_do_not_break_later_tables() {
        let html = "</table></tr></td><table><tr><td>ok</td></tr></table>";
        let tables = extract_tables(html);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0][0][0], "ok");
    }

    #[test]
    fn uppercase_tags_and_entities() {
        let html = "<TABLE><TR><TD>Fish&nbsp;&amp;&#32;chips &mdash; ok</TD></TR></TABLE>";
        let tables = extract_tables(html);
        assert_eq!(tables[0][0][0], "Fish\u{a0}& chips \u{2014} ok");
    }

    #[test]
    fn unknown_entity_does_not_block_known_ones() {
        let tables = extract_tables("<table><tr><td>AT&T and &amp; x</td><td>ok &foo; bar &amp;</td></tr></table>");
        assert_eq!(cells(&tables[0]), vec![vec!["AT&T and & x", "ok &foo; bar &"]]);
    }

    #[test]
    fn numeric_references_decoded() {
        assert_eq!(decode_entities("&#65;&#x42;&#X43; &bogus;"), "ABC &bogus;");
    }

    #[test]
    fn bare_less_than_swallows_text_up_to_next_tag_end() {
        let tables = extract_tables("<table><tr><td>x < y</td><td>next</td></tr></table>");
        assert_eq!(cells(&tables[0]), vec![vec!["x", "next"]]);
        let tables = extract_tables("<table><tr><td>x &lt; y</td><td>next</td></tr></table>");
        assert_eq!(cells(&tables[0]), vec![vec!["x < y", "next"]]);
    }

    #[test]
    fn self_closing_cell_is_empty() {
        let html = "<table><tr><td/><td>x</td></tr></table>";
        let tables = extract_tables(html);
        assert_eq!(cells(&tables[0]), vec![vec!["", "x"]]);
    }

    #[test]
    fn no_tables() {
        assert!(extract_tables("").is_empty());
        assert!(extract_tables("just <b>text</b> & stuff").is_empty());
        assert!(extract_tables("<<<>>>").is_empty());
    }

    #[test]
    fn void_elements_inside_cells() {
        let html = "<table><tr><td>line one<br>line two</td><td><img src=\"a.png\"></td></tr></table>";
        let tables = extract_tables(html);
        assert_eq!(cells(&tables[0]), vec![vec!["line one line two", ""]]);
    }

    #[test]
    fn wiki_fixture() {
        let html = std::fs::read_to_string("tests/fixtures/predictions.html").unwrap();
        let tables = extract_tables(&html);
        assert_eq!(tables.len(), 2);
        // header + 5 data rows; the navbox nested in the last row adds none
        assert_eq!(tables[0].len(), 6);
        assert_eq!(tables[0][0], vec!["Date", "Claimant", "Description", "Outcome"]);
        assert_eq!(tables[1].len(), 4);
    }
}
