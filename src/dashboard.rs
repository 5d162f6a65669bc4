use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;

use crate::format::{format_duration, format_last_updated, format_percent, from_epoch_millis};
use crate::insights::build_insights;
use crate::kpi::{kpi_cards, KpiCard};
use crate::models::{
    Granularity, InsightRecord, MetricTone, OverviewSnapshot, PerformanceSnapshot, TimeWindow,
    TrendBundle, TrendMetric, TrendPayload,
};
use crate::status::{
    aggregate_health, bar_percent, classify_latency_inclusive, metric_status, ring_tone,
    HealthView, MetricKind, MetricStatusView,
};
use crate::trends::{trend_charts, TrendChart};

pub const LOAD_FAILED_MESSAGE: &str = "数据加载失败";

/// Where dashboard payloads come from. `None` means the backend has nothing
/// for the window yet.
#[async_trait]
pub trait DashboardSource: Sync {
    async fn overview(&self, window: TimeWindow) -> anyhow::Result<Option<OverviewSnapshot>>;

    async fn performance(&self, window: TimeWindow)
        -> anyhow::Result<Option<PerformanceSnapshot>>;

    async fn trends(
        &self,
        metric: TrendMetric,
        window: TimeWindow,
        granularity: Granularity,
    ) -> anyhow::Result<Option<TrendPayload>>;
}

/// Page-level state. Payloads are only ever replaced together.
#[derive(Debug, Clone)]
pub struct DashboardState {
    pub window: TimeWindow,
    pub loading: bool,
    pub error: Option<String>,
    pub last_updated: Option<DateTime<FixedOffset>>,
    pub overview: Option<OverviewSnapshot>,
    pub performance: Option<PerformanceSnapshot>,
    pub trends: TrendBundle,
}

impl DashboardState {
    pub fn new(window: TimeWindow) -> Self {
        Self {
            window,
            loading: true,
            error: None,
            last_updated: None,
            overview: None,
            performance: None,
            trends: TrendBundle::default(),
        }
    }

    /// Fetches every payload for `window` concurrently. Any single failure
    /// leaves the previous payloads in place and records one error message.
    pub async fn load<S>(&mut self, source: &S, window: TimeWindow, offset: FixedOffset)
    where
        S: DashboardSource + ?Sized,
    {
        let now_millis = Utc::now().timestamp_millis();
        self.load_at(source, window, offset, now_millis).await;
    }

    /// [`Self::load`] with the fetch time given in epoch milliseconds.
    pub async fn load_at<S>(
        &mut self,
        source: &S,
        window: TimeWindow,
        offset: FixedOffset,
        now_millis: i64,
    ) where
        S: DashboardSource + ?Sized,
    {
        self.window = window;
        self.loading = true;
        self.error = None;

        let granularity = window.granularity();
        let joined = tokio::try_join!(
            source.overview(window),
            source.performance(window),
            source.trends(TrendMetric::Sessions, window, granularity),
            source.trends(TrendMetric::ActiveUsers, window, granularity),
            source.trends(TrendMetric::AvgLatency, window, granularity),
            source.trends(TrendMetric::Quality, window, granularity),
        );

        match joined {
            Ok((overview, performance, sessions, active_users, latency, quality)) => {
                self.overview = overview;
                self.performance = performance;
                self.trends = TrendBundle {
                    sessions,
                    active_users,
                    latency,
                    quality,
                };
                self.last_updated = from_epoch_millis(now_millis, offset);
                tracing::info!(window = %window, "dashboard data loaded");
            }
            Err(err) => {
                tracing::error!(window = %window, error = ?err, "dashboard load failed");
                self.error = Some(LOAD_FAILED_MESSAGE.to_string());
            }
        }

        self.loading = false;
    }

    pub async fn refresh<S>(&mut self, source: &S, offset: FixedOffset)
    where
        S: DashboardSource + ?Sized,
    {
        self.load(source, self.window, offset).await;
    }

    pub async fn set_window<S>(&mut self, window: TimeWindow, source: &S, offset: FixedOffset)
    where
        S: DashboardSource + ?Sized,
    {
        self.load(source, window, offset).await;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceRow {
    pub label: &'static str,
    pub value: String,
    pub tone: MetricTone,
    pub bar_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AvailabilityRing {
    pub success_rate: f64,
    pub tone: MetricTone,
}

/// Everything the page shows, derived from one state snapshot so the status
/// indicators never disagree with each other.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub window: TimeWindow,
    pub window_label: &'static str,
    pub last_updated: String,
    pub health: HealthView,
    pub metric_status: MetricStatusView,
    pub availability: AvailabilityRing,
    pub performance: Vec<PerformanceRow>,
    pub kpis: Vec<KpiCard>,
    pub charts: Vec<TrendChart>,
    pub insights: Vec<InsightRecord>,
}

impl DashboardView {
    pub fn derive(state: &DashboardState) -> Self {
        let snapshot = state.performance.as_ref();
        let metric_status = metric_status(snapshot);

        Self {
            window: state.window,
            window_label: state.window.label(),
            last_updated: format_last_updated(state.last_updated),
            health: aggregate_health(snapshot),
            metric_status,
            availability: AvailabilityRing {
                success_rate: snapshot.and_then(|s| s.success_rate).unwrap_or(0.0),
                tone: ring_tone(snapshot.and_then(|s| s.success_rate)),
            },
            performance: performance_rows(snapshot, &metric_status),
            kpis: kpi_cards(state.overview.as_ref(), snapshot),
            charts: trend_charts(&state.trends, state.window),
            insights: build_insights(snapshot, state.window.label(), state.last_updated),
        }
    }
}

fn performance_rows(
    snapshot: Option<&PerformanceSnapshot>,
    metric_status: &MetricStatusView,
) -> Vec<PerformanceRow> {
    let avg = snapshot.and_then(|s| s.avg_latency_ms);
    let p95 = snapshot.and_then(|s| s.p95_latency_ms);
    let error = snapshot.and_then(|s| s.error_rate);
    let no_doc = snapshot.and_then(|s| s.no_doc_rate);

    vec![
        PerformanceRow {
            label: "平均响应",
            value: format_duration(avg),
            tone: classify_latency_inclusive(avg),
            bar_percent: bar_percent(MetricKind::Latency, avg),
        },
        PerformanceRow {
            label: "P95 响应",
            value: format_duration(p95),
            tone: classify_latency_inclusive(p95),
            bar_percent: bar_percent(MetricKind::Latency, p95),
        },
        PerformanceRow {
            label: "错误率",
            value: format_percent(error),
            tone: metric_status.error,
            bar_percent: bar_percent(MetricKind::ErrorRate, error),
        },
        PerformanceRow {
            label: "无知识率",
            value: format_percent(no_doc),
            tone: metric_status.no_doc,
            bar_percent: bar_percent(MetricKind::NoDocRate, no_doc),
        },
    ]
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;
    use crate::models::{
        HealthStatus, InsightSeverity, InsightType, Kpi, OverviewKpis, RawSeries, TrendPoint,
    };

    struct FixtureSource {
        performance: PerformanceSnapshot,
        fail_metric: Option<TrendMetric>,
        calls: AtomicUsize,
        seen: Mutex<Vec<(TrendMetric, Granularity)>>,
    }

    impl FixtureSource {
        fn new(performance: PerformanceSnapshot) -> Self {
            Self {
                performance,
                fail_metric: None,
                calls: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl DashboardSource for FixtureSource {
        async fn overview(&self, _window: TimeWindow) -> anyhow::Result<Option<OverviewSnapshot>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Some(OverviewSnapshot {
                kpis: OverviewKpis {
                    active_users: Some(Kpi {
                        value: 42.0,
                        delta_pct: Some(-25.0),
                    }),
                    ..OverviewKpis::default()
                },
            }))
        }

        async fn performance(
            &self,
            _window: TimeWindow,
        ) -> anyhow::Result<Option<PerformanceSnapshot>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Some(self.performance.clone()))
        }

        async fn trends(
            &self,
            metric: TrendMetric,
            _window: TimeWindow,
            granularity: Granularity,
        ) -> anyhow::Result<Option<TrendPayload>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push((metric, granularity));
            if self.fail_metric == Some(metric) {
                anyhow::bail!("trend endpoint unavailable");
            }
            Ok(Some(TrendPayload {
                series: vec![RawSeries {
                    name: metric.as_str().to_string(),
                    data: vec![TrendPoint { ts: 1, value: 3.0 }],
                }],
            }))
        }
    }

    fn offset() -> FixedOffset {
        FixedOffset::east_opt(8 * 3600).unwrap()
    }

    fn degraded() -> PerformanceSnapshot {
        PerformanceSnapshot {
            success_rate: Some(92.0),
            error_rate: Some(8.0),
            avg_latency_ms: Some(3500.0),
            p95_latency_ms: Some(5000.0),
            no_doc_rate: Some(12.0),
        }
    }

    #[tokio::test]
    async fn load_fetches_everything_and_stamps_time() {
        let source = FixtureSource::new(degraded());
        let mut state = DashboardState::new(TimeWindow::Last24Hours);
        assert!(state.loading);

        state.load(&source, TimeWindow::Last7Days, offset()).await;

        assert_eq!(source.calls.load(Ordering::SeqCst), 6);
        assert!(!state.loading);
        assert!(state.error.is_none());
        assert!(state.last_updated.is_some());
        assert_eq!(state.window, TimeWindow::Last7Days);
        assert!(state.trends.quality.is_some());
        let seen = source.seen.lock().unwrap();
        assert!(seen.iter().all(|(_, granularity)| *granularity == Granularity::Day));
    }

    #[tokio::test]
    async fn failed_load_keeps_previous_payloads() {
        let mut source = FixtureSource::new(degraded());
        let mut state = DashboardState::new(TimeWindow::Last24Hours);
        state.load(&source, TimeWindow::Last24Hours, offset()).await;
        let before = state.performance.clone();
        let stamped = state.last_updated;

        source.fail_metric = Some(TrendMetric::Quality);
        source.performance = PerformanceSnapshot::default();
        state.set_window(TimeWindow::Last30Days, &source, offset()).await;

        assert_eq!(state.error.as_deref(), Some(LOAD_FAILED_MESSAGE));
        assert!(!state.loading);
        assert_eq!(state.performance, before);
        assert_eq!(state.last_updated, stamped);
        assert_eq!(state.window, TimeWindow::Last30Days);

        source.fail_metric = None;
        state.refresh(&source, offset()).await;
        assert!(state.error.is_none());
        assert_eq!(state.performance, Some(PerformanceSnapshot::default()));
    }

    #[tokio::test]
    async fn view_is_consistent_across_sections() {
        let source = FixtureSource::new(degraded());
        let mut state = DashboardState::new(TimeWindow::Last24Hours);
        state.load(&source, TimeWindow::Last24Hours, offset()).await;

        let view = DashboardView::derive(&state);
        assert_eq!(view.health.status, HealthStatus::Critical);
        assert_eq!(view.metric_status.error, MetricTone::Bad);
        assert_eq!(view.insights[0].kind, InsightType::Anomaly);
        assert_eq!(view.window_label, "滚动 24h");
        assert_eq!(view.kpis[0].status, crate::models::KpiStatus::Warning);
        assert_eq!(view.availability.tone, MetricTone::Warning);
        assert_eq!(view.performance[0].value, "3.50s");
        assert_eq!(view.performance[0].tone, MetricTone::Warning);
        assert_eq!(view.performance[1].tone, MetricTone::Warning);
        assert_eq!(view.performance[1].bar_percent, 50.0);
        assert_eq!(view.charts.len(), 4);
        assert_eq!(view.charts[0].current_value, "3");
        assert_ne!(view.last_updated, "-");
        assert_eq!(DashboardView::derive(&state), view);
    }

    #[tokio::test]
    async fn load_at_stamps_the_given_fetch_time() {
        let source = FixtureSource::new(degraded());
        let mut state = DashboardState::new(TimeWindow::Last7Days);
        // 2026-10-18T01:02:03Z
        state
            .load_at(&source, TimeWindow::Last7Days, offset(), 1_792_285_323_000)
            .await;

        let view = DashboardView::derive(&state);
        assert_eq!(view.last_updated, "10/18 09:02:03");
        assert!(view.insights.iter().all(|item| item.timestamp == "09:02:03"));
    }

    #[tokio::test]
    async fn unknown_success_rate_is_critical_everywhere() {
        let source = FixtureSource::new(PerformanceSnapshot {
            success_rate: None,
            error_rate: Some(0.5),
            avg_latency_ms: Some(800.0),
            p95_latency_ms: None,
            no_doc_rate: Some(5.0),
        });
        let mut state = DashboardState::new(TimeWindow::Last24Hours);
        state.load(&source, TimeWindow::Last24Hours, offset()).await;

        let view = DashboardView::derive(&state);
        assert_eq!(view.health.status, HealthStatus::Critical);
        assert_eq!(view.insights[0].kind, InsightType::Anomaly);
        assert_eq!(view.insights[0].severity, InsightSeverity::Critical);
        assert_eq!(view.insights[0].change, "- / 0.5%");
        assert_eq!(view.metric_status.success, MetricTone::Warning);
    }

    #[test]
    fn view_before_first_load_awaits_data() {
        let state = DashboardState::new(TimeWindow::Last7Days);
        let view = DashboardView::derive(&state);
        assert_eq!(view.health.status, HealthStatus::Attention);
        assert_eq!(view.insights.len(), 1);
        assert_eq!(view.insights[0].change, "近 7 天");
        assert_eq!(view.last_updated, "-");
        assert!(view.charts.iter().all(|chart| chart.series.is_empty()));
        assert_eq!(view.performance[2].value, "-");
        assert_eq!(view.performance[2].bar_percent, 0.0);
    }
}
