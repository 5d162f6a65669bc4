use serde::Serialize;

use crate::models::{HealthStatus, MetricTone, PerformanceSnapshot};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cutoffs {
    pub good: f64,
    pub warning: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DashboardThresholds {
    pub latency: Cutoffs,
    pub success_rate: Cutoffs,
    pub error_rate: Cutoffs,
    pub no_doc_rate: Cutoffs,
}

pub const THRESHOLDS: DashboardThresholds = DashboardThresholds {
    latency: Cutoffs {
        good: 2000.0,
        warning: 5000.0,
    },
    success_rate: Cutoffs {
        good: 99.0,
        warning: 95.0,
    },
    error_rate: Cutoffs {
        good: 1.0,
        warning: 5.0,
    },
    no_doc_rate: Cutoffs {
        good: 10.0,
        warning: 30.0,
    },
};

/// No-doc rate above which overall health drops to attention. Sits between the
/// metric's good and warning cutoffs.
pub const HEALTH_NO_DOC_ATTENTION: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Latency,
    SuccessRate,
    ErrorRate,
    NoDocRate,
}

/// Missing values classify as `Warning`, never as `Good`.
pub fn classify_metric(kind: MetricKind, value: Option<f64>) -> MetricTone {
    let Some(value) = value else {
        return MetricTone::Warning;
    };

    match kind {
        MetricKind::Latency => {
            let cut = THRESHOLDS.latency;
            if value < cut.good {
                MetricTone::Good
            } else if value < cut.warning {
                MetricTone::Warning
            } else {
                MetricTone::Bad
            }
        }
        MetricKind::SuccessRate => {
            let cut = THRESHOLDS.success_rate;
            if value >= cut.good {
                MetricTone::Good
            } else if value >= cut.warning {
                MetricTone::Warning
            } else {
                MetricTone::Bad
            }
        }
        MetricKind::ErrorRate => at_most(value, THRESHOLDS.error_rate),
        MetricKind::NoDocRate => at_most(value, THRESHOLDS.no_doc_rate),
    }
}

/// Latency rows of the performance panel use inclusive cutoffs, unlike
/// [`classify_metric`].
pub fn classify_latency_inclusive(value: Option<f64>) -> MetricTone {
    match value {
        Some(value) => at_most(value, THRESHOLDS.latency),
        None => MetricTone::Warning,
    }
}

fn at_most(value: f64, cut: Cutoffs) -> MetricTone {
    if value <= cut.good {
        MetricTone::Good
    } else if value <= cut.warning {
        MetricTone::Warning
    } else {
        MetricTone::Bad
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricStatusView {
    pub success: MetricTone,
    pub latency: MetricTone,
    pub error: MetricTone,
    pub no_doc: MetricTone,
}

pub fn metric_status(snapshot: Option<&PerformanceSnapshot>) -> MetricStatusView {
    MetricStatusView {
        success: classify_metric(
            MetricKind::SuccessRate,
            snapshot.and_then(|s| s.success_rate),
        ),
        latency: classify_metric(MetricKind::Latency, snapshot.and_then(|s| s.avg_latency_ms)),
        error: classify_metric(MetricKind::ErrorRate, snapshot.and_then(|s| s.error_rate)),
        no_doc: classify_metric(MetricKind::NoDocRate, snapshot.and_then(|s| s.no_doc_rate)),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthView {
    pub status: HealthStatus,
    pub title: &'static str,
    pub description: &'static str,
}

impl HealthView {
    fn of(status: HealthStatus) -> Self {
        let (title, description) = match status {
            HealthStatus::Critical => ("系统风险偏高", "错误率或成功率触发告警阈值"),
            HealthStatus::Attention => ("系统需要关注", "召回质量或性能波动接近阈值"),
            HealthStatus::Healthy => ("系统运行健康", "核心质量指标保持稳定"),
        };
        Self {
            status,
            title,
            description,
        }
    }
}

/// Whole-system health, first matching rule wins. Missing fields count as 0
/// here, which differs from [`classify_metric`]; the two must stay distinct.
pub fn aggregate_health(snapshot: Option<&PerformanceSnapshot>) -> HealthView {
    let Some(snapshot) = snapshot else {
        return HealthView::of(HealthStatus::Attention);
    };

    let error_rate = snapshot.error_rate.unwrap_or(0.0);
    let success_rate = snapshot.success_rate.unwrap_or(0.0);
    let no_doc_rate = snapshot.no_doc_rate.unwrap_or(0.0);

    let status = if error_rate > THRESHOLDS.error_rate.warning
        || success_rate < THRESHOLDS.success_rate.warning
    {
        HealthStatus::Critical
    } else if no_doc_rate > HEALTH_NO_DOC_ATTENTION {
        HealthStatus::Attention
    } else {
        HealthStatus::Healthy
    };

    HealthView::of(status)
}

/// Tone of the availability ring around the success rate.
pub fn ring_tone(success_rate: Option<f64>) -> MetricTone {
    let clamped = success_rate.unwrap_or(0.0).clamp(0.0, 100.0);
    match clamped {
        v if v >= 95.0 => MetricTone::Good,
        v if v >= 85.0 => MetricTone::Warning,
        _ => MetricTone::Bad,
    }
}

/// Fill percentage for a metric bar. Latency is scaled against a 10s ceiling.
pub fn bar_percent(kind: MetricKind, value: Option<f64>) -> f64 {
    let Some(value) = value else {
        return 0.0;
    };
    match kind {
        MetricKind::Latency => (value / 10_000.0 * 100.0).min(100.0),
        _ => value.min(100.0),
    }
}
