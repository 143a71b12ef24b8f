use crate::models::{DateCount, ForecastPoint};

/// Renders the forecast result as a table fragment for the browser.
pub fn forecast_table(points: &[ForecastPoint]) -> String {
    table(
        &["plan_dtime", "pv_output"],
        points.iter().map(|p| {
            vec![
                p.plan_dtime.format("%Y-%m-%d %H:%M:%S").to_string(),
                format!("{:.3}", p.pv_output),
            ]
        }),
    )
}

/// Renders per date row counts as a table fragment.
pub fn dates_table(rows: &[DateCount]) -> String {
    table(
        &["business_date", "cnt"],
        rows.iter()
            .map(|r| vec![r.business_date.format("%Y-%m-%d").to_string(), r.cnt.to_string()]),
    )
}

fn table<I>(headers: &[&str], rows: I) -> String
where
    I: Iterator<Item = Vec<String>>,
{
    let mut html = String::from("<table class=\"table table-striped\">\n<thead><tr>");
    for header in headers {
        html.push_str(&format!("<th>{}</th>", escape(header)));
    }
    html.push_str("</tr></thead>\n<tbody>\n");

    for row in rows {
        html.push_str("<tr>");
        for cell in row {
            html.push_str(&format!("<td>{}</td>", escape(&cell)));
        }
        html.push_str("</tr>\n");
    }

    html.push_str("</tbody>\n</table>");
    html
}

fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn forecast_table_contains_formatted_rows() {
        let points = vec![ForecastPoint {
            plan_dtime: NaiveDate::from_ymd_opt(2024, 6, 2)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap(),
            pv_output: 123.4567,
        }];

        let html = forecast_table(&points);
        assert!(html.contains("<th>plan_dtime</th>"));
        assert!(html.contains("<td>2024-06-02 10:00:00</td>"));
        assert!(html.contains("<td>123.457</td>"));
    }

    #[test]
    fn markup_in_cells_is_escaped() {
        let html = table(&["a"], std::iter::once(vec!["<script>".to_string()]));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }
}
