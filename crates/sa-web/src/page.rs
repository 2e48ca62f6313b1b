//! HTML rendering of the index page.
//!
//! The page is one self-contained document built with `format!`. Every
//! interpolated value goes through [`html_escape`]. Release builds minify
//! the output.

use chrono::{DateTime, Utc};
use sa_common::wire::{
    CorrelationResponse, FutureResearchResponse, InsightsResponse, LimitationsResponse,
    SummaryResponse,
};
use sa_common::{PageLimits, Record};
use serde_json::{Map, Value};
use tracing::debug;

use crate::client::{Fetch, PageData};
use crate::form;

/// Everything shown on one page view.
#[derive(Debug, Clone, PartialEq)]
pub struct PageContext {
    pub page: PageData,
    /// Hypothesis test result map, when a test was submitted and succeeded.
    pub statistical: Option<Map<String, Value>>,
    pub statistical_error: Option<String>,
    /// URL of the saved chart image.
    pub visualization_image: Option<String>,
    pub visualization_error: Option<String>,
    pub generated_at: DateTime<Utc>,
}

impl PageContext {
    pub fn new(page: PageData) -> Self {
        Self {
            page,
            statistical: None,
            statistical_error: None,
            visualization_image: None,
            visualization_error: None,
            generated_at: Utc::now(),
        }
    }

    /// Column names, taken from the first data row.
    fn column_names(&self) -> Vec<String> {
        self.page
            .data
            .loaded()
            .and_then(|rows| rows.first())
            .map(|r| r.keys().cloned().collect())
            .unwrap_or_default()
    }
}

/// Renders [`PageContext`] into HTML.
#[derive(Debug, Clone)]
pub struct PageRenderer {
    limits: PageLimits,
}

impl PageRenderer {
    pub fn new(limits: PageLimits) -> Self {
        Self { limits }
    }

    pub fn render(&self, ctx: &PageContext) -> String {
        let html = self.generate_html(ctx);

        let output = if cfg!(debug_assertions) {
            html
        } else {
            let cfg = minify_html::Cfg {
                minify_css: true,
                ..Default::default()
            };
            String::from_utf8(minify_html::minify(html.as_bytes(), &cfg)).unwrap_or(html)
        };

        debug!(bytes = output.len(), "page rendered");
        output
    }

    fn generate_html(&self, ctx: &PageContext) -> String {
        let columns = ctx.column_names();
        let page = &ctx.page;

        format!(
            r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Survey Analytics</title>
    <meta name="generator" content="sa-web {version}">
    <style>
        body {{ font-family: system-ui, sans-serif; margin: 0; color: #111827; background: #f9fafb; }}
        header {{ background: #1f2937; color: #fff; padding: 1rem 2rem; }}
        header small {{ color: #9ca3af; }}
        main {{ padding: 1rem 2rem; }}
        section {{ background: #fff; border: 1px solid #e5e7eb; border-radius: 6px; padding: 1rem; margin-bottom: 1rem; }}
        h2 {{ margin-top: 0; font-size: 1.2rem; }}
        .scroll {{ overflow-x: auto; max-height: 30rem; overflow-y: auto; }}
        table {{ border-collapse: collapse; font-size: 0.85rem; }}
        th, td {{ border: 1px solid #e5e7eb; padding: 0.25rem 0.5rem; text-align: left; white-space: nowrap; }}
        th {{ background: #f3f4f6; position: sticky; top: 0; }}
        .notice {{ color: #6b7280; font-size: 0.8rem; }}
        .unavailable {{ color: #b91c1c; }}
        .error {{ color: #b91c1c; font-weight: 600; }}
        form {{ display: flex; gap: 0.5rem; flex-wrap: wrap; align-items: end; }}
        label {{ display: flex; flex-direction: column; font-size: 0.8rem; }}
        img.chart {{ max-width: 100%; }}
    </style>
</head>
<body>
<header>
    <h1>Survey Analytics</h1>
    <small>Generated {generated_at}</small>
</header>
<main>
{forms}
{statistical}
{visualization}
{summary}
{insights}
{patterns}
{preprocess}
{correlation}
{limitations}
{future}
{data}
</main>
</body>
</html>"##,
            version = env!("CARGO_PKG_VERSION"),
            generated_at = html_escape(&ctx.generated_at.format("%Y-%m-%d %H:%M:%S UTC").to_string()),
            forms = self.forms_section(&columns),
            statistical = self.statistical_section(ctx),
            visualization = self.visualization_section(ctx),
            summary = self.fetched("summary", "Summary statistics", &page.summary, |s| {
                self.summary_table(s)
            }),
            insights = self.fetched("insights", "Insights", &page.insights, |i| {
                self.insights_body(i)
            }),
            patterns = self.fetched("patterns", "Patterns (values beyond ±3)", &page.patterns, |rows| {
                self.records_table(rows)
            }),
            preprocess = self.fetched("preprocess", "Preprocessed data", &page.preprocess, |rows| {
                self.records_table(rows)
            }),
            correlation = self.fetched("correlation", "Correlation data", &page.correlation, |c| {
                self.correlation_table(c)
            }),
            limitations = self.fetched("limitations", "Limitations", &page.limitations, |l| {
                self.limitations_body(l)
            }),
            future = self.fetched("future-research", "Future research", &page.future_research, |f| {
                self.future_body(f)
            }),
            data = self.fetched("data", "Dataset", &page.data, |rows| self.records_table(rows)),
        )
    }

    /// A section whose body depends on an upstream call.
    fn fetched<T>(&self, id: &str, title: &str, value: &Fetch<T>, body: impl Fn(&T) -> String) -> String {
        let inner = match value {
            Fetch::Loaded(v) => body(v),
            Fetch::Unavailable { endpoint, reason } => format!(
                r#"<p class="unavailable">{} is unavailable: {}</p>"#,
                html_escape(endpoint),
                html_escape(reason)
            ),
        };
        format!(
            r#"<section id="{}"><h2>{}</h2>{}</section>"#,
            html_escape(id),
            html_escape(title),
            inner
        )
    }

    fn forms_section(&self, columns: &[String]) -> String {
        let datalist: String = columns
            .iter()
            .map(|c| format!(r#"<option value="{}">"#, html_escape(c)))
            .collect();
        format!(
            r##"<section id="forms">
    <h2>Analyse</h2>
    <datalist id="columns">{datalist}</datalist>
    <form method="post" action="/">
        <label>Hypothesis test
            <select name="{stat_type}">
                <option value="chi-square">chi-square</option>
                <option value="t-test">t-test</option>
                <option value="anova">anova</option>
            </select>
        </label>
        <label>Variables (comma separated)
            <input type="text" name="{stat_var}" placeholder="Hours, Age">
        </label>
        <button type="submit">Run test</button>
    </form>
    <form method="post" action="/">
        <label>Chart
            <select name="{vis_type}">
                <option value="histogram">histogram</option>
                <option value="bar">bar</option>
                <option value="scatter">scatter</option>
            </select>
        </label>
        <label>Variable 1 <input type="text" name="{var1}" list="columns"></label>
        <label>Variable 2 <input type="text" name="{var2}" list="columns"></label>
        <button type="submit">Draw</button>
    </form>
</section>"##,
            stat_type = form::STATISTICAL_TEST_TYPE,
            stat_var = form::STATISTICAL_VAR,
            vis_type = form::VISUALIZATION_TYPE,
            var1 = form::VAR1,
            var2 = form::VAR2,
        )
    }

    fn statistical_section(&self, ctx: &PageContext) -> String {
        let body = match (&ctx.statistical, &ctx.statistical_error) {
            (_, Some(err)) => format!(r#"<p class="error">{}</p>"#, html_escape(err)),
            (Some(result), None) => {
                let rows: String = result
                    .iter()
                    .map(|(k, v)| {
                        format!(
                            "<tr><th>{}</th><td>{}</td></tr>",
                            html_escape(k),
                            html_escape(&value_text(v))
                        )
                    })
                    .collect();
                format!("<table>{}</table>", rows)
            }
            (None, None) => return String::new(),
        };
        format!(r#"<section id="statistical"><h2>Test result</h2>{}</section>"#, body)
    }

    fn visualization_section(&self, ctx: &PageContext) -> String {
        let body = match (&ctx.visualization_image, &ctx.visualization_error) {
            (_, Some(err)) => format!(r#"<p class="error">{}</p>"#, html_escape(err)),
            (Some(src), None) => format!(
                r#"<img class="chart" src="{}" alt="visualization">"#,
                html_escape(src)
            ),
            (None, None) => return String::new(),
        };
        format!(r#"<section id="visualization"><h2>Visualization</h2>{}</section>"#, body)
    }

    fn truncation_notice(&self, shown: usize, total: usize) -> String {
        if shown < total {
            format!(r#"<p class="notice">Showing {} of {} rows</p>"#, shown, total)
        } else {
            String::new()
        }
    }

    fn records_table(&self, rows: &[Record]) -> String {
        let Some(first) = rows.first() else {
            return r#"<p class="notice">No rows.</p>"#.to_string();
        };
        let headers: Vec<&String> = first.keys().collect();
        let head: String = headers
            .iter()
            .map(|h| format!("<th>{}</th>", html_escape(h)))
            .collect();

        let shown = rows.len().min(self.limits.max_table_rows);
        let body: String = rows[..shown]
            .iter()
            .map(|row| {
                let cells: String = headers
                    .iter()
                    .map(|h| {
                        let text = row.get(h.as_str()).map(value_text).unwrap_or_default();
                        format!("<td>{}</td>", html_escape(&text))
                    })
                    .collect();
                format!("<tr>{}</tr>", cells)
            })
            .collect();

        format!(
            r#"{}<div class="scroll"><table><thead><tr>{}</tr></thead><tbody>{}</tbody></table></div>"#,
            self.truncation_notice(shown, rows.len()),
            head,
            body
        )
    }

    /// Rows are columns, one column per statistic.
    fn summary_table(&self, summary: &SummaryResponse) -> String {
        let stats: [(&str, &Map<String, Value>); 5] = [
            ("mean", &summary.mean),
            ("median", &summary.median),
            ("mode", &summary.mode),
            ("variance", &summary.variance),
            ("std_dev", &summary.std_dev),
        ];
        let head: String = stats
            .iter()
            .map(|(name, _)| format!("<th>{}</th>", name))
            .collect();
        let body: String = summary
            .mode
            .keys()
            .map(|column| {
                let cells: String = stats
                    .iter()
                    .map(|(_, m)| {
                        let text = m.get(column).map(value_text).unwrap_or_default();
                        format!("<td>{}</td>", html_escape(&text))
                    })
                    .collect();
                format!("<tr><th>{}</th>{}</tr>", html_escape(column), cells)
            })
            .collect();
        format!(
            r#"<div class="scroll"><table><thead><tr><th>column</th>{}</tr></thead><tbody>{}</tbody></table></div>"#,
            head, body
        )
    }

    fn insights_body(&self, insights: &InsightsResponse) -> String {
        format!(
            "<h3>Top earners</h3>{}<h3>Most hours played</h3>{}",
            self.records_table(&insights.top_earners),
            self.records_table(&insights.most_hours)
        )
    }

    /// Column-oriented dump turned back into rows.
    fn correlation_table(&self, correlation: &CorrelationResponse) -> String {
        let matrix = &correlation.correlation_matrix;
        let indices: Vec<String> = matrix
            .values()
            .next()
            .and_then(Value::as_object)
            .map(|col| col.keys().cloned().collect())
            .unwrap_or_default();

        let rows: Vec<Record> = indices
            .iter()
            .map(|idx| {
                matrix
                    .iter()
                    .map(|(name, col)| {
                        let v = col.get(idx.as_str()).cloned().unwrap_or(Value::Null);
                        (name.clone(), v)
                    })
                    .collect()
            })
            .collect();
        self.records_table(&rows)
    }

    fn limitations_body(&self, lim: &LimitationsResponse) -> String {
        let rows: String = lim
            .data_completeness
            .iter()
            .map(|(column, nulls)| {
                format!(
                    "<tr><th>{}</th><td>{}</td></tr>",
                    html_escape(column),
                    html_escape(&value_text(nulls))
                )
            })
            .collect();
        format!(
            r#"<h3>Missing values per column</h3><div class="scroll"><table>{}</table></div><h3>Scope of conclusions</h3><p>{}</p><h3>Further studies</h3><p>{}</p>"#,
            rows,
            html_escape(&lim.scope_of_conclusions),
            html_escape(&lim.future_research)
        )
    }

    fn future_body(&self, future: &FutureResearchResponse) -> String {
        let list = |items: &[String]| -> String {
            items
                .iter()
                .map(|s| format!("<li>{}</li>", html_escape(s)))
                .collect()
        };
        format!(
            "<h3>New research questions</h3><ul>{}</ul><h3>Areas for deeper investigation</h3><ul>{}</ul>",
            list(&future.new_research_questions),
            list(&future.areas_for_deeper_investigation)
        )
    }
}

/// Display text for a JSON value; `null` renders empty.
fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Escape HTML special characters.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(v: Value) -> Record {
        v.as_object().cloned().unwrap()
    }

    fn unavailable<T>(endpoint: &str) -> Fetch<T> {
        Fetch::Unavailable {
            endpoint: endpoint.to_string(),
            reason: "connection refused".to_string(),
        }
    }

    fn empty_page() -> PageData {
        PageData {
            data: unavailable("/api/data"),
            summary: unavailable("/api/summary"),
            future_research: unavailable("/api/future_research"),
            limitations: unavailable("/api/limitations"),
            insights: unavailable("/api/insights"),
            patterns: unavailable("/api/patterns"),
            correlation: unavailable("/api/correlation"),
            preprocess: unavailable("/api/preprocess"),
        }
    }

    #[test]
    fn escapes_special_characters() {
        assert_eq!(
            html_escape(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#x27;Jerry&#x27;&lt;/a&gt;"
        );
    }

    #[test]
    fn unavailable_sections_render_placeholders() {
        let html = PageRenderer::new(PageLimits::default()).render(&PageContext::new(empty_page()));
        assert!(html.contains("/api/summary is unavailable"));
        assert!(html.contains("/api/preprocess is unavailable"));
        assert!(!html.contains("Test result"));
        assert!(!html.contains("<img"));
    }

    #[test]
    fn tables_are_truncated() {
        let rows: Vec<Record> = (0..5).map(|i| record(json!({"i": i}))).collect();
        let renderer = PageRenderer::new(PageLimits { max_table_rows: 2 });
        let html = renderer.records_table(&rows);
        assert!(html.contains("Showing 2 of 5 rows"));
        assert_eq!(html.matches("<tr>").count(), 3);

        let html = PageRenderer::new(PageLimits::default()).records_table(&rows);
        assert!(!html.contains("Showing"));
    }

    #[test]
    fn cell_text_is_escaped() {
        let rows = vec![record(json!({"GAME": "<script>alert(1)</script>", "x": null}))];
        let html = PageRenderer::new(PageLimits::default()).records_table(&rows);
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("<td></td>"));
    }

    #[test]
    fn correlation_dump_becomes_rows() {
        let c = CorrelationResponse {
            correlation_matrix: record(json!({"a": {"0": 1, "1": 2}, "b": {"0": "x", "1": "y"}})),
        };
        let html = PageRenderer::new(PageLimits::default()).correlation_table(&c);
        assert!(html.contains("<tr><td>1</td><td>x</td></tr>"));
        assert!(html.contains("<tr><td>2</td><td>y</td></tr>"));
    }

    #[test]
    fn statistical_error_and_result() {
        let renderer = PageRenderer::new(PageLimits::default());
        let mut ctx = PageContext::new(empty_page());
        ctx.statistical_error = Some("variables are not enough.".into());
        assert!(renderer.render(&ctx).contains("variables are not enough."));

        let mut ctx = PageContext::new(empty_page());
        ctx.statistical = Some(record(json!({"t_statistic": -1.5, "p_value": 0.2})));
        let html = renderer.render(&ctx);
        assert!(html.contains("t_statistic"));
        assert!(html.contains("0.2"));
    }

    #[test]
    fn visualization_image_is_referenced() {
        let mut ctx = PageContext::new(empty_page());
        ctx.visualization_image = Some("/static/images/visualization.jpg".into());
        let html = PageRenderer::new(PageLimits::default()).render(&ctx);
        assert!(html.contains("/static/images/visualization.jpg"));
    }
}
