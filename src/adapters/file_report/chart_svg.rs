//! SVG rendering of bucket equity charts.

use crate::domain::report::{ChartSeries, EquityChart};

const CHART_WIDTH: f64 = 800.0;
const CHART_HEIGHT: f64 = 400.0;
const MARGIN_LEFT: f64 = 60.0;
const MARGIN_RIGHT: f64 = 20.0;
const MARGIN_TOP: f64 = 40.0;
const MARGIN_BOTTOM: f64 = 40.0;

/// Smallest value plotted on a log axis.
const LOG_FLOOR: f64 = 1e-6;

const PALETTE: [&str; 4] = ["#2563eb", "#f59e0b", "#10b981", "#ef4444"];

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn axis_value(v: f64, log_scale: bool) -> f64 {
    if log_scale { v.max(LOG_FLOOR).ln() } else { v }
}

pub fn generate_equity_svg(chart: &EquityChart) -> String {
    if chart.dates.is_empty() {
        return String::new();
    }

    let series: Vec<&ChartSeries> = std::iter::once(&chart.portfolio)
        .chain(chart.benchmarks.iter())
        .collect();
    let transformed: Vec<f64> = series
        .iter()
        .flat_map(|s| s.values.iter())
        .map(|v| axis_value(*v, chart.log_scale))
        .collect();
    let min_v = transformed.iter().copied().fold(f64::INFINITY, f64::min);
    let max_v = transformed.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = if max_v > min_v { max_v - min_v } else { 1.0 };

    let plot_width = CHART_WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_height = CHART_HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
    let n = chart.dates.len();

    let x_scale = |i: usize| -> f64 { MARGIN_LEFT + (i as f64 / (n - 1).max(1) as f64) * plot_width };
    let y_scale = |v: f64| -> f64 {
        MARGIN_TOP + plot_height - ((axis_value(v, chart.log_scale) - min_v) / range) * plot_height
    };
    let label_value = |t: f64| -> f64 { if chart.log_scale { t.exp() } else { t } };

    let mut svg = String::new();
    svg.push_str(&format!(
        r##"<svg width="{}" height="{}" viewBox="0 0 {} {}" xmlns="http://www.w3.org/2000/svg">"##,
        CHART_WIDTH, CHART_HEIGHT, CHART_WIDTH, CHART_HEIGHT
    ));
    svg.push_str("\n  <rect width=\"100%\" height=\"100%\" fill=\"white\"/>\n");
    svg.push_str(&format!(
        "  <text x=\"{}\" y=\"18\" font-size=\"14\" fill=\"#333\">{}{}</text>\n",
        MARGIN_LEFT,
        escape(&chart.bucket),
        if chart.log_scale { " (log scale)" } else { "" }
    ));
    svg.push_str(&format!(
        "  <line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"#ccc\" stroke-width=\"1\"/>\n",
        MARGIN_LEFT,
        MARGIN_TOP,
        MARGIN_LEFT,
        CHART_HEIGHT - MARGIN_BOTTOM
    ));
    svg.push_str(&format!(
        "  <line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"#ccc\" stroke-width=\"1\"/>\n",
        MARGIN_LEFT,
        CHART_HEIGHT - MARGIN_BOTTOM,
        CHART_WIDTH - MARGIN_RIGHT,
        CHART_HEIGHT - MARGIN_BOTTOM
    ));
    for (y, t) in [
        (MARGIN_TOP + 5.0, max_v),
        (MARGIN_TOP + plot_height / 2.0, (max_v + min_v) / 2.0),
        (CHART_HEIGHT - MARGIN_BOTTOM - 5.0, min_v),
    ] {
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" text-anchor=\"end\" font-size=\"10\" fill=\"#666\">{:.2}</text>\n",
            MARGIN_LEFT - 5.0,
            y,
            label_value(t)
        ));
    }
    for (x, date) in [
        (MARGIN_LEFT, chart.dates[0]),
        (MARGIN_LEFT + plot_width / 2.0, chart.dates[n / 2]),
        (CHART_WIDTH - MARGIN_RIGHT, chart.dates[n - 1]),
    ] {
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" text-anchor=\"middle\" font-size=\"10\" fill=\"#666\">{}</text>\n",
            x, CHART_HEIGHT - 10.0, date
        ));
    }

    for (i, s) in series.iter().enumerate() {
        let color = PALETTE[i % PALETTE.len()];
        let mut path_data = String::new();
        for (j, v) in s.values.iter().enumerate() {
            let cmd = if j == 0 { "M" } else { " L" };
            path_data.push_str(&format!("{} {:.1} {:.1}", cmd, x_scale(j), y_scale(*v)));
        }
        svg.push_str(&format!(
            "  <path d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{}\"/>\n",
            path_data,
            color,
            if i == 0 { 2 } else { 1 }
        ));
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"11\" fill=\"{}\">{}</text>\n",
            MARGIN_LEFT + 10.0,
            MARGIN_TOP + 14.0 * (i as f64 + 1.0),
            color,
            escape(&s.label)
        ));
    }
    svg.push_str("</svg>");
    svg
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn chart(log_scale: bool) -> EquityChart {
        let dates = vec![
            NaiveDate::from_ymd_opt(2021, 1, 4).unwrap(),
            NaiveDate::from_ymd_opt(2021, 1, 5).unwrap(),
            NaiveDate::from_ymd_opt(2021, 1, 6).unwrap(),
        ];
        EquityChart {
            bucket: "2021-Q1".into(),
            dates,
            portfolio: ChartSeries {
                label: "My Portfolio (+10.00%)".into(),
                values: vec![1.0, 1.05, 1.1],
            },
            benchmarks: vec![ChartSeries {
                label: "SPY (+1.00%)".into(),
                values: vec![1.0, 0.99, 1.01],
            }],
            log_scale,
        }
    }

    #[test]
    fn empty_chart_renders_nothing() {
        let mut c = chart(false);
        c.dates.clear();
        assert!(generate_equity_svg(&c).is_empty());
    }

    #[test]
    fn one_path_per_series_with_legend() {
        let svg = generate_equity_svg(&chart(false));
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert_eq!(svg.matches("<path").count(), 2);
        assert!(svg.contains("My Portfolio (+10.00%)"));
        assert!(svg.contains("SPY (+1.00%)"));
        assert!(svg.contains("2021-01-06"));
        assert!(!svg.contains("log scale"));
    }

    #[test]
    fn log_scale_is_labelled() {
        let svg = generate_equity_svg(&chart(true));
        assert!(svg.contains("2021-Q1 (log scale)"));
        // axis labels are shown in value space
        assert!(svg.contains(">1.10<"));
    }

    #[test]
    fn single_point_chart_renders() {
        let mut c = chart(false);
        c.dates.truncate(1);
        c.portfolio.values.truncate(1);
        c.benchmarks.clear();
        let svg = generate_equity_svg(&c);
        assert!(svg.contains("M 60.0"));
    }
}
