use std::fmt::Write;

use crate::data::datetime::TABLE_FORMAT;
use crate::data::table::LogTable;

pub const TABLE_CLASS: &str = "dataframe";

pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Preview table of the time column plus `columns` (unknown names left out), no index column.
///
/// With `max_rows > 0` at most that many rows are written, followed by a
/// notice saying how many were left out.
pub fn to_html(table: &LogTable, columns: &[&str], max_rows: usize) -> String {
    let selected: Vec<(&str, usize)> = columns
        .iter()
        .filter_map(|name| table.column_index(name).map(|idx| (*name, idx)))
        .collect();

    let shown = if max_rows > 0 { table.len().min(max_rows) } else { table.len() };

    let mut out = String::new();
    // writing into a String cannot fail
    let _ = write_table(&mut out, table, &selected, shown);
    if shown < table.len() {
        let _ = writeln!(
            out,
            "<p class=\"truncated\">{} rows truncated</p>",
            table.len() - shown
        );
    }
    out
}

fn write_table(
    out: &mut String,
    table: &LogTable,
    selected: &[(&str, usize)],
    shown: usize,
) -> std::fmt::Result {
    writeln!(out, "<table border=\"1\" class=\"{TABLE_CLASS}\">")?;
    writeln!(out, "  <thead>")?;
    writeln!(out, "    <tr style=\"text-align: right;\">")?;
    writeln!(out, "      <th>{}</th>", escape_html(&table.time_column))?;
    for (name, _) in selected {
        writeln!(out, "      <th>{}</th>", escape_html(name))?;
    }
    writeln!(out, "    </tr>")?;
    writeln!(out, "  </thead>")?;
    writeln!(out, "  <tbody>")?;
    for row in table.rows.iter().take(shown) {
        writeln!(out, "    <tr>")?;
        writeln!(out, "      <td>{}</td>", row.time.format(TABLE_FORMAT))?;
        for (_, idx) in selected {
            let cell = row.values.get(*idx).map(|v| v.to_string()).unwrap_or_else(|| "NaN".into());
            writeln!(out, "      <td>{}</td>", escape_html(&cell))?;
        }
        writeln!(out, "    </tr>")?;
    }
    writeln!(out, "  </tbody>")?;
    writeln!(out, "</table>")
}
