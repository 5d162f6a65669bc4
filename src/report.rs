use std::fmt::Write;

use serde::Serialize;

use crate::dashboard::DashboardView;
use crate::kpi::{change_text, change_tone, ChangeTone};
use crate::models::MetricTone;
use crate::trends::{merge_overlay, ComparisonToggle, TrendChart};

fn tone_mark(tone: MetricTone) -> &'static str {
    match tone {
        MetricTone::Good => "good",
        MetricTone::Warning => "warning",
        MetricTone::Bad => "bad",
    }
}

pub fn build_report(view: &DashboardView) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# 运营 Dashboard");
    let _ = writeln!(
        output,
        "Window {} ({}), last updated {}",
        view.window, view.window_label, view.last_updated
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## 系统健康");
    let _ = writeln!(
        output,
        "**{}** ({:?}): {}",
        view.health.title, view.health.status, view.health.description
    );
    let _ = writeln!(
        output,
        "- 成功率 ring {:.1}% [{}]",
        view.availability.success_rate,
        tone_mark(view.availability.tone)
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## 核心 KPI");
    for card in &view.kpis {
        let change = card
            .change
            .as_ref()
            .and_then(|change| {
                change_text(change).map(|text| match change_tone(change) {
                    ChangeTone::Good => format!("{text} vs 上周期"),
                    ChangeTone::Bad => format!("{text} vs 上周期 (!)"),
                    ChangeTone::Neutral => text,
                })
            })
            .unwrap_or_else(|| "--".to_string());
        let _ = writeln!(
            output,
            "- {}: {} {} [{:?}]",
            card.label, card.value, change, card.status
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## 性能");
    for row in &view.performance {
        let _ = writeln!(
            output,
            "- {}: {} [{}] {:.0}%",
            row.label,
            row.value,
            tone_mark(row.tone),
            row.bar_percent
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## 趋势分析");
    for chart in &view.charts {
        let _ = writeln!(
            output,
            "- {} ({}, {}): current {}, {} series",
            chart.title,
            chart.subtitle,
            chart.unit,
            chart.current_value,
            chart.series.len()
        );
        for line in &chart.thresholds {
            let _ = writeln!(output, "  - threshold {} at {}", line.label, line.value);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## 洞察");
    for item in &view.insights {
        let _ = writeln!(
            output,
            "- [{}] {} ({}: {}) @ {}",
            item.kind.label(),
            item.title,
            item.metric,
            item.change,
            item.timestamp
        );
        let _ = writeln!(output, "  {}", item.context);
        if let Some(action) = &item.action {
            let _ = writeln!(output, "  -> {action}");
        }
    }

    output
}

#[derive(Debug, Serialize)]
struct TrendRow<'a> {
    chart: &'a str,
    series: &'a str,
    ts: i64,
    value: f64,
}

/// Writes every drawn point as `chart,series,ts,value`. The comparison overlay
/// is included only when `include_comparison` is set.
pub fn write_trend_csv<W: std::io::Write>(
    writer: W,
    charts: &[TrendChart],
    include_comparison: bool,
) -> anyhow::Result<usize> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    let mut rows = 0usize;

    for chart in charts {
        let mut toggle = ComparisonToggle::default();
        if include_comparison {
            toggle.toggle();
        }
        for series in merge_overlay(&chart.series, &chart.comparison, toggle.is_shown()) {
            for point in &series.data {
                csv_writer.serialize(TrendRow {
                    chart: chart.title,
                    series: &series.name,
                    ts: point.ts,
                    value: point.value,
                })?;
                rows += 1;
            }
        }
    }

    csv_writer.flush()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::DashboardState;
    use crate::format::from_epoch_millis;
    use crate::models::{
        PerformanceSnapshot, RawSeries, TimeWindow, TrendBundle, TrendPayload, TrendPoint,
    };
    use chrono::FixedOffset;

    fn loaded_state() -> DashboardState {
        let mut state = DashboardState::new(TimeWindow::Last7Days);
        state.loading = false;
        state.last_updated =
            from_epoch_millis(1_792_285_323_000, FixedOffset::east_opt(8 * 3600).unwrap());
        state.performance = Some(PerformanceSnapshot {
            success_rate: Some(99.2),
            error_rate: Some(0.4),
            avg_latency_ms: Some(4100.0),
            p95_latency_ms: Some(7200.0),
            no_doc_rate: Some(26.0),
        });
        state.trends = TrendBundle {
            sessions: Some(TrendPayload {
                series: vec![RawSeries {
                    name: "会话数".to_string(),
                    data: vec![TrendPoint { ts: 10, value: 4.0 }, TrendPoint { ts: 20, value: 6.0 }],
                }],
            }),
            ..TrendBundle::default()
        };
        state
    }

    #[test]
    fn report_lists_every_section() {
        let view = DashboardView::derive(&loaded_state());
        let report = build_report(&view);

        assert!(report.starts_with("# 运营 Dashboard"));
        assert!(report.contains("Window 7d (近 7 天), last updated 10/18 09:02:03"));
        assert!(report.contains("**系统需要关注**"));
        assert!(report.contains("- 活跃用户: - -- [Normal]"));
        assert!(report.contains("- P95 响应: 7.20s [bad] 72%"));
        assert!(report.contains("threshold good<2s at 2000"));
        assert!(report.contains("[建议] 召回质量需优化 (无知识率: 26.0%) @ 09:02:03"));
        assert!(report.contains("-> 排查慢节点与模型并发配置"));
    }

    #[test]
    fn csv_export_optionally_includes_comparison() {
        let view = DashboardView::derive(&loaded_state());

        let mut plain = Vec::new();
        let rows = write_trend_csv(&mut plain, &view.charts, false).unwrap();
        assert_eq!(rows, 2);

        let mut with_compare = Vec::new();
        let rows = write_trend_csv(&mut with_compare, &view.charts, true).unwrap();
        assert_eq!(rows, 4);

        let text = String::from_utf8(with_compare).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "chart,series,ts,value");
        assert_eq!(lines[1], "会话趋势,会话数,10,4.0");
        assert_eq!(lines[3], "会话趋势,会话数(同比),10,4.0");
        assert_eq!(lines[4], "会话趋势,会话数(同比),20,4.0");
    }

    #[test]
    fn csv_export_writes_to_file() {
        let view = DashboardView::derive(&loaded_state());
        let file = tempfile::NamedTempFile::new().unwrap();

        let rows = write_trend_csv(file.reopen().unwrap(), &view.charts, false).unwrap();
        assert_eq!(rows, 2);

        let text = std::fs::read_to_string(file.path()).unwrap();
        assert_eq!(text.lines().count(), 3);
        assert!(text.ends_with("会话趋势,会话数,20,6.0\n"));
    }
}
