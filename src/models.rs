use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TimeWindow {
    #[default]
    #[serde(rename = "24h")]
    Last24Hours,
    #[serde(rename = "7d")]
    Last7Days,
    #[serde(rename = "30d")]
    Last30Days,
}

impl TimeWindow {
    pub fn as_str(self) -> &'static str {
        match self {
            TimeWindow::Last24Hours => "24h",
            TimeWindow::Last7Days => "7d",
            TimeWindow::Last30Days => "30d",
        }
    }

    /// Human label shown next to window-scoped figures and insights.
    pub fn label(self) -> &'static str {
        match self {
            TimeWindow::Last24Hours => "滚动 24h",
            TimeWindow::Last7Days => "近 7 天",
            TimeWindow::Last30Days => "近 30 天",
        }
    }

    pub fn granularity(self) -> Granularity {
        match self {
            TimeWindow::Last24Hours => Granularity::Hour,
            _ => Granularity::Day,
        }
    }

    pub fn x_axis_mode(self) -> &'static str {
        match self {
            TimeWindow::Last24Hours => "hour",
            _ => "date",
        }
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeWindow {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "24h" => Ok(TimeWindow::Last24Hours),
            "7d" => Ok(TimeWindow::Last7Days),
            "30d" => Ok(TimeWindow::Last30Days),
            other => anyhow::bail!("unknown time window '{other}' (expected 24h, 7d or 30d)"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Hour,
    Day,
}

impl Granularity {
    pub fn as_str(self) -> &'static str {
        match self {
            Granularity::Hour => "hour",
            Granularity::Day => "day",
        }
    }
}

/// Metric keys accepted by the trends endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TrendMetric {
    Sessions,
    ActiveUsers,
    AvgLatency,
    Quality,
}

impl TrendMetric {
    pub fn as_str(self) -> &'static str {
        match self {
            TrendMetric::Sessions => "sessions",
            TrendMetric::ActiveUsers => "activeUsers",
            TrendMetric::AvgLatency => "avgLatency",
            TrendMetric::Quality => "quality",
        }
    }
}

/// Performance figures for one time window. A missing field means the backend
/// has not produced the metric yet; it is never the same thing as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceSnapshot {
    #[serde(default)]
    pub success_rate: Option<f64>,
    #[serde(default)]
    pub error_rate: Option<f64>,
    #[serde(default)]
    pub avg_latency_ms: Option<f64>,
    #[serde(default)]
    pub p95_latency_ms: Option<f64>,
    #[serde(default)]
    pub no_doc_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Kpi {
    pub value: f64,
    #[serde(default)]
    pub delta_pct: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewKpis {
    #[serde(default)]
    pub active_users: Option<Kpi>,
    #[serde(default, rename = "sessions24h")]
    pub sessions: Option<Kpi>,
    #[serde(default, rename = "messages24h")]
    pub messages: Option<Kpi>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverviewSnapshot {
    #[serde(default)]
    pub kpis: OverviewKpis,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub ts: i64,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSeries {
    pub name: String,
    #[serde(default)]
    pub data: Vec<TrendPoint>,
}

/// Body of the trends endpoint. Points are expected in ascending `ts` order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrendPayload {
    #[serde(default)]
    pub series: Vec<RawSeries>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrendBundle {
    pub sessions: Option<TrendPayload>,
    pub active_users: Option<TrendPayload>,
    pub latency: Option<TrendPayload>,
    pub quality: Option<TrendPayload>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricTone {
    Good,
    Warning,
    Bad,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Attention,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KpiStatus {
    Normal,
    Warning,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Flat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightType {
    Anomaly,
    Trend,
    Recommendation,
}

impl InsightType {
    pub fn label(self) -> &'static str {
        match self {
            InsightType::Anomaly => "异常",
            InsightType::Trend => "趋势",
            InsightType::Recommendation => "建议",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightSeverity {
    Info,
    Warning,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsightRecord {
    #[serde(rename = "type")]
    pub kind: InsightType,
    pub severity: InsightSeverity,
    pub title: String,
    pub metric: String,
    pub change: String,
    pub context: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    pub timestamp: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesTone {
    Primary,
    Success,
    Warning,
    Danger,
    Info,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LineStyle {
    #[default]
    Solid,
    Dashed,
}

/// A renderable chart series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub name: String,
    pub data: Vec<TrendPoint>,
    pub tone: SeriesTone,
    pub line_style: LineStyle,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_tokens_round_trip_through_from_str() {
        for window in [
            TimeWindow::Last24Hours,
            TimeWindow::Last7Days,
            TimeWindow::Last30Days,
        ] {
            assert_eq!(window.as_str().parse::<TimeWindow>().unwrap(), window);
        }
        assert!("90d".parse::<TimeWindow>().is_err());
    }

    #[test]
    fn window_drives_granularity_and_axis() {
        assert_eq!(TimeWindow::Last24Hours.granularity(), Granularity::Hour);
        assert_eq!(TimeWindow::Last7Days.granularity(), Granularity::Day);
        assert_eq!(TimeWindow::Last30Days.x_axis_mode(), "date");
        assert_eq!(TimeWindow::Last7Days.label(), "近 7 天");
    }

    #[test]
    fn performance_snapshot_keeps_missing_fields_unknown() {
        let snapshot: PerformanceSnapshot =
            serde_json::from_str(r#"{"successRate": 99.5, "errorRate": null}"#).unwrap();
        assert_eq!(snapshot.success_rate, Some(99.5));
        assert_eq!(snapshot.error_rate, None);
        assert_eq!(snapshot.avg_latency_ms, None);
    }

    #[test]
    fn overview_reads_window_scoped_kpi_names() {
        let overview: OverviewSnapshot = serde_json::from_str(
            r#"{"kpis": {"activeUsers": {"value": 12, "deltaPct": -4.5},
                          "sessions24h": {"value": 30, "deltaPct": null}}}"#,
        )
        .unwrap();
        assert_eq!(overview.kpis.active_users.unwrap().delta_pct, Some(-4.5));
        assert_eq!(overview.kpis.sessions.unwrap().delta_pct, None);
        assert!(overview.kpis.messages.is_none());
    }

    #[test]
    fn insight_without_action_omits_the_field() {
        let record = InsightRecord {
            kind: InsightType::Trend,
            severity: InsightSeverity::Info,
            title: "t".to_string(),
            metric: "m".to_string(),
            change: "c".to_string(),
            context: "x".to_string(),
            action: None,
            timestamp: "-".to_string(),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "trend");
        assert!(json.get("action").is_none());
    }
}
