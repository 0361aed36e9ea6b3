use std::fmt::Write;

use crate::data::datetime::TABLE_FORMAT;
use crate::processing::statistics::{ColumnSummary, Reading};
use crate::render::table_html::escape_html;

const STYLE: &str = r#"
body { font-family: sans-serif; margin: 2em; }
table.dataframe { border-collapse: collapse; font-size: 0.9em; }
table.dataframe th, table.dataframe td { padding: 2px 8px; }
table.stats td, table.stats th { padding: 2px 10px; text-align: right; }
p.truncated, p.notice { color: #a33; }
img.plot { max-width: 100%; }
"#;

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n<h1>{}</h1>\n{body}\n</body>\n</html>\n",
        escape_html(title),
        escape_html(title)
    )
}

pub fn index() -> String {
    page(
        "Graphical Representation of the Data Logs",
        r#"<form action="/upload" method="post" enctype="multipart/form-data">
  <input type="file" name="file" accept=".csv">
  <button type="submit">Upload</button>
</form>"#,
    )
}

pub fn uploaded() -> String {
    page(
        "File uploaded successfully",
        r#"<p><a href="/dropdown">Choose parameters and time range</a></p>
<p><a href="/">Upload another file</a></p>"#,
    )
}

/// Range picker: three column selectors and two `datetime-local` inputs bounded by the data.
pub fn dropdown(min: &str, max: &str, columns: &[&str]) -> String {
    let mut body = String::new();
    let _ = writeln!(body, "<form action=\"/plot\" method=\"post\">");
    for (i, default) in (1..=3).zip(0..) {
        let _ = writeln!(body, "  <label>Parameter {i}\n    <select name=\"parameters{i}\">");
        for (j, column) in columns.iter().enumerate() {
            let selected = if j == default { " selected" } else { "" };
            let c = escape_html(column);
            let _ = writeln!(body, "      <option value=\"{c}\"{selected}>{c}</option>");
        }
        let _ = writeln!(body, "    </select>\n  </label>");
    }
    let min = escape_html(min);
    let max = escape_html(max);
    let _ = writeln!(
        body,
        "  <label>From <input type=\"datetime-local\" name=\"fromtime\" min=\"{min}\" max=\"{max}\" value=\"{min}\"></label>"
    );
    let _ = writeln!(
        body,
        "  <label>To <input type=\"datetime-local\" name=\"totime\" min=\"{min}\" max=\"{max}\" value=\"{max}\"></label>"
    );
    let _ = writeln!(body, "  <button type=\"submit\">Plot</button>\n</form>");
    page("Select parameters", &body)
}

pub struct PlotPage<'a> {
    /// Base64 PNGs, one `<img>` each.
    pub plots: &'a [String],
    pub stats: &'a [(String, Option<ColumnSummary>)],
    /// Columns that were asked for but not plotted.
    pub skipped: &'a [String],
    pub table: &'a str,
}

pub fn plots(p: &PlotPage<'_>) -> String {
    let mut body = String::new();
    for png in p.plots {
        let _ = writeln!(body, "<img class=\"plot\" src=\"data:image/png;base64,{png}\" alt=\"Line Graph\">");
    }
    if !p.skipped.is_empty() {
        let names: Vec<String> = p.skipped.iter().map(|s| escape_html(s)).collect();
        let _ = writeln!(body, "<p class=\"notice\">Not plotted (unknown column): {}</p>", names.join(", "));
    }
    if !p.stats.is_empty() {
        let _ = writeln!(
            body,
            "<table class=\"stats\">\n<tr><th></th><th>Samples</th><th>Gaps</th><th>Min</th><th>Max</th><th>Mean</th><th>Last</th></tr>"
        );
        for (name, summary) in p.stats {
            let name = escape_html(name);
            match summary {
                Some(s) => {
                    let _ = writeln!(
                        body,
                        "<tr><th>{name}</th><td>{}</td><td>{}</td>{}{}<td>{:.3}</td>{}</tr>",
                        s.samples,
                        s.gaps,
                        reading_cell(&s.low),
                        reading_cell(&s.high),
                        s.mean,
                        reading_cell(&s.latest)
                    );
                }
                None => {
                    let _ = writeln!(body, "<tr><th>{name}</th><td colspan=\"6\">no numeric values</td></tr>");
                }
            }
        }
        let _ = writeln!(body, "</table>");
    }
    body.push_str(p.table);
    body.push_str("\n<p><a href=\"/dropdown\">Change selection</a> | <a href=\"/\">Upload another file</a></p>");
    page("Generated plots", &body)
}

fn reading_cell(r: &Reading) -> String {
    format!(
        "<td title=\"{}\">{:.3}</td>",
        r.time.format(TABLE_FORMAT),
        r.value
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dropdown_preselects_distinct_columns() {
        let html = dropdown("2024-06-01T10:00", "2024-06-01T11:00", &["A", "B", "C"]);
        for i in 1..=3 {
            assert!(html.contains(&format!("name=\"parameters{i}\"")));
        }
        assert!(html.contains("<option value=\"A\" selected>A</option>"));
        assert!(html.contains("<option value=\"B\" selected>B</option>"));
        assert!(html.contains("<option value=\"C\" selected>C</option>"));
        assert!(html.contains("min=\"2024-06-01T10:00\" max=\"2024-06-01T11:00\""));
    }

    #[test]
    fn plot_page_embeds_images_and_table() {
        let plots = vec!["QUJD".to_string()];
        let time = chrono::NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        let low = Reading { time, value: 1.0 };
        let summary = ColumnSummary {
            samples: 2,
            gaps: 1,
            low,
            high: Reading { time, value: 2.0 },
            latest: low,
            mean: 1.5,
        };
        let stats = vec![("A".to_string(), Some(summary)), ("T".to_string(), None)];
        let html = super::plots(&PlotPage {
            plots: &plots,
            stats: &stats,
            skipped: &["Z".to_string()],
            table: "<table class=\"dataframe\"></table>",
        });
        assert!(html.contains("src=\"data:image/png;base64,QUJD\""));
        assert!(html.contains("<table class=\"dataframe\"></table>"));
        assert!(html.contains("Not plotted (unknown column): Z"));
        assert!(html.contains(
            "<th>A</th><td>2</td><td>1</td><td title=\"2024-06-01 10:00:00\">1.000</td>"
        ));
        assert!(html.contains("<th>T</th><td colspan=\"6\">no numeric values</td>"));
    }
}
