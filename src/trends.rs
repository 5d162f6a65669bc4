use serde::Serialize;

use crate::format::{format_value, ValueKind};
use crate::models::{
    LineStyle, MetricTone, Series, SeriesTone, TimeWindow, TrendBundle, TrendPayload, TrendPoint,
};
use crate::status::THRESHOLDS;

/// Series names containing this marker are error metrics.
const ERROR_MARKER: &str = "错误";
const COMPARISON_SUFFIX: &str = "(同比)";

pub fn to_series(payload: Option<&TrendPayload>, tone: SeriesTone) -> Vec<Series> {
    tagged(payload, |_| tone)
}

/// Quality series pick their tone from the series name.
pub fn to_quality_series(payload: Option<&TrendPayload>) -> Vec<Series> {
    tagged(payload, |name| {
        if name.contains(ERROR_MARKER) {
            SeriesTone::Danger
        } else {
            SeriesTone::Info
        }
    })
}

fn tagged(payload: Option<&TrendPayload>, tone_for: impl Fn(&str) -> SeriesTone) -> Vec<Series> {
    let Some(payload) = payload else {
        return Vec::new();
    };
    payload
        .series
        .iter()
        .map(|raw| Series {
            name: raw.name.clone(),
            data: raw.data.clone(),
            tone: tone_for(&raw.name),
            line_style: LineStyle::Solid,
        })
        .collect()
}

/// Lag-1 stand-in for a prior-period line: point `i` keeps its own `ts` and
/// takes the value of point `i - 1`; the first point keeps its own value.
/// No earlier period is fetched, despite the `(同比)` label.
pub fn to_comparison_series(series: &[Series]) -> Vec<Series> {
    series
        .iter()
        .map(|item| {
            let data = item
                .data
                .iter()
                .enumerate()
                .map(|(index, point)| TrendPoint {
                    ts: point.ts,
                    value: item.data[index.saturating_sub(1)].value,
                })
                .collect();
            Series {
                name: format!("{}{COMPARISON_SUFFIX}", item.name),
                data,
                tone: SeriesTone::Neutral,
                line_style: LineStyle::Solid,
            }
        })
        .collect()
}

/// Series actually drawn on a chart.
pub fn merge_overlay(
    series: &[Series],
    comparison: &[Series],
    show_comparison: bool,
) -> Vec<Series> {
    let mut merged = series.to_vec();
    if show_comparison {
        merged.extend(comparison.iter().cloned().map(|item| Series {
            line_style: LineStyle::Dashed,
            ..item
        }));
    }
    merged
}

/// Last value of the first series.
pub fn current_value(series: &[Series]) -> Option<f64> {
    series.first()?.data.last().map(|point| point.value)
}

/// Per-chart comparison overlay switch, off until the operator flips it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ComparisonToggle {
    shown: bool,
}

impl ComparisonToggle {
    pub fn is_shown(self) -> bool {
        self.shown
    }

    pub fn toggle(&mut self) {
        self.shown = !self.shown;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThresholdLine {
    pub value: f64,
    pub label: &'static str,
    pub tone: MetricTone,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendChart {
    pub title: &'static str,
    pub subtitle: &'static str,
    pub unit: &'static str,
    pub value_kind: ValueKind,
    pub x_axis_mode: &'static str,
    pub series: Vec<Series>,
    pub comparison: Vec<Series>,
    pub current_value: String,
    pub thresholds: Vec<ThresholdLine>,
}

struct ChartSpec {
    title: &'static str,
    subtitle: &'static str,
    unit: &'static str,
    value_kind: ValueKind,
    thresholds: Vec<ThresholdLine>,
}

impl ChartSpec {
    fn build(self, series: Vec<Series>, window: TimeWindow) -> TrendChart {
        TrendChart {
            title: self.title,
            subtitle: self.subtitle,
            unit: self.unit,
            value_kind: self.value_kind,
            x_axis_mode: window.x_axis_mode(),
            comparison: to_comparison_series(&series),
            current_value: format_value(current_value(&series), self.value_kind),
            series,
            thresholds: self.thresholds,
        }
    }
}

/// The four trend charts in display order.
pub fn trend_charts(bundle: &TrendBundle, window: TimeWindow) -> Vec<TrendChart> {
    let sessions = ChartSpec {
        title: "会话趋势",
        subtitle: "会话数量变化",
        unit: "单位：次",
        value_kind: ValueKind::Number,
        thresholds: Vec::new(),
    };
    let active_users = ChartSpec {
        title: "活跃用户趋势",
        subtitle: "活跃用户规模变化",
        unit: "单位：人",
        value_kind: ValueKind::Number,
        thresholds: Vec::new(),
    };
    let latency = ChartSpec {
        title: "响应时间趋势",
        subtitle: "AI 响应耗时",
        unit: "单位：毫秒",
        value_kind: ValueKind::Duration,
        thresholds: vec![
            ThresholdLine {
                value: THRESHOLDS.latency.good,
                label: "good<2s",
                tone: MetricTone::Good,
            },
            ThresholdLine {
                value: THRESHOLDS.latency.warning,
                label: "warn>5s",
                tone: MetricTone::Bad,
            },
        ],
    };
    let quality = ChartSpec {
        title: "质量趋势",
        subtitle: "错误率与无知识率",
        unit: "单位：%",
        value_kind: ValueKind::Percent,
        thresholds: vec![
            ThresholdLine {
                value: THRESHOLDS.error_rate.warning,
                label: "error warn",
                tone: MetricTone::Warning,
            },
            ThresholdLine {
                value: THRESHOLDS.no_doc_rate.warning,
                label: "nodoc warn",
                tone: MetricTone::Bad,
            },
        ],
    };

    vec![
        sessions.build(to_series(bundle.sessions.as_ref(), SeriesTone::Primary), window),
        active_users.build(
            to_series(bundle.active_users.as_ref(), SeriesTone::Success),
            window,
        ),
        latency.build(to_series(bundle.latency.as_ref(), SeriesTone::Warning), window),
        quality.build(to_quality_series(bundle.quality.as_ref()), window),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawSeries;

    fn point(ts: i64, value: f64) -> TrendPoint {
        TrendPoint { ts, value }
    }

    fn payload(names: &[&str]) -> TrendPayload {
        TrendPayload {
            series: names
                .iter()
                .map(|name| RawSeries {
                    name: name.to_string(),
                    data: vec![point(1, 5.0), point(2, 9.0), point(3, 7.0)],
                })
                .collect(),
        }
    }

    #[test]
    fn comparison_is_lag_one_with_self_referential_head() {
        let series = to_series(Some(&payload(&["A"])), SeriesTone::Primary);
        let comparison = to_comparison_series(&series);
        assert_eq!(comparison.len(), 1);
        assert_eq!(comparison[0].name, "A(同比)");
        assert_eq!(comparison[0].tone, SeriesTone::Neutral);
        assert_eq!(
            comparison[0].data,
            vec![point(1, 5.0), point(2, 5.0), point(3, 9.0)]
        );
    }

    #[test]
    fn comparison_handles_empty_data() {
        let series = vec![Series {
            name: "A".to_string(),
            data: Vec::new(),
            tone: SeriesTone::Info,
            line_style: LineStyle::Solid,
        }];
        assert!(to_comparison_series(&series)[0].data.is_empty());
        assert!(to_comparison_series(&[]).is_empty());
    }

    #[test]
    fn missing_payload_maps_to_no_series() {
        assert!(to_series(None, SeriesTone::Primary).is_empty());
        assert!(to_quality_series(None).is_empty());
        assert!(to_series(Some(&TrendPayload::default()), SeriesTone::Primary).is_empty());
    }

    #[test]
    fn quality_tone_follows_series_name() {
        let series = to_quality_series(Some(&payload(&["错误率", "无知识率"])));
        assert_eq!(series[0].tone, SeriesTone::Danger);
        assert_eq!(series[1].tone, SeriesTone::Info);
    }

    #[test]
    fn overlay_appends_dashed_comparison_only_when_shown() {
        let series = to_series(Some(&payload(&["A"])), SeriesTone::Success);
        let comparison = to_comparison_series(&series);

        let mut toggle = ComparisonToggle::default();
        assert_eq!(merge_overlay(&series, &comparison, toggle.is_shown()), series);

        toggle.toggle();
        let merged = merge_overlay(&series, &comparison, toggle.is_shown());
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].line_style, LineStyle::Solid);
        assert_eq!(merged[1].line_style, LineStyle::Dashed);
        assert_eq!(merged[1].tone, SeriesTone::Neutral);

        assert_eq!(merge_overlay(&series, &[], true), series);
    }

    #[test]
    fn current_value_reads_last_point_of_first_series() {
        let series = to_series(Some(&payload(&["A", "B"])), SeriesTone::Primary);
        assert_eq!(current_value(&series), Some(7.0));
        assert_eq!(current_value(&[]), None);
    }

    #[test]
    fn charts_cover_all_four_families() {
        let bundle = TrendBundle {
            sessions: Some(payload(&["会话数"])),
            active_users: None,
            latency: Some(TrendPayload {
                series: vec![RawSeries {
                    name: "平均响应".to_string(),
                    data: vec![point(1, 850.0), point(2, 2400.0)],
                }],
            }),
            quality: Some(payload(&["错误率"])),
        };

        let charts = trend_charts(&bundle, TimeWindow::Last24Hours);
        assert_eq!(charts.len(), 4);
        assert_eq!(charts[0].current_value, "7");
        assert_eq!(charts[0].x_axis_mode, "hour");
        assert_eq!(charts[1].current_value, "-");
        assert!(charts[1].comparison.is_empty());
        assert_eq!(charts[2].current_value, "2.40s");
        assert_eq!(charts[2].thresholds[0].value, 2000.0);
        assert_eq!(charts[3].current_value, "7.0%");
        assert_eq!(charts[3].series[0].tone, SeriesTone::Danger);
        assert_eq!(charts[3].thresholds[1].label, "nodoc warn");
    }
}
