use serde::Serialize;

use crate::format::{format_number, format_percent};
use crate::models::{Kpi, KpiStatus, OverviewSnapshot, PerformanceSnapshot, Trend};
use crate::status::THRESHOLDS;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct KpiChange {
    pub value: f64,
    pub trend: Trend,
    pub is_positive: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DeltaClassification {
    pub change: KpiChange,
    pub status: KpiStatus,
}

/// Period-over-period delta to trend direction and severity. Severity only
/// ever penalizes drops; the classifier has no notion of per-KPI polarity.
pub fn classify_delta(delta_pct: Option<f64>) -> DeltaClassification {
    DeltaClassification {
        change: delta_change(delta_pct),
        status: delta_status(delta_pct),
    }
}

fn delta_change(delta_pct: Option<f64>) -> KpiChange {
    match delta_pct {
        Some(delta) if delta > 0.0 => KpiChange {
            value: delta,
            trend: Trend::Up,
            is_positive: true,
        },
        Some(delta) if delta < 0.0 => KpiChange {
            value: delta,
            trend: Trend::Down,
            is_positive: false,
        },
        _ => KpiChange {
            value: 0.0,
            trend: Trend::Flat,
            is_positive: true,
        },
    }
}

fn delta_status(delta_pct: Option<f64>) -> KpiStatus {
    match delta_pct {
        Some(delta) if delta <= -50.0 => KpiStatus::Critical,
        Some(delta) if delta <= -20.0 => KpiStatus::Warning,
        _ => KpiStatus::Normal,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeTone {
    Good,
    Bad,
    Neutral,
}

/// `None` for flat changes, otherwise the signed delta such as `+12.5%`.
pub fn change_text(change: &KpiChange) -> Option<String> {
    if change.trend == Trend::Flat {
        return None;
    }
    let sign = if change.value > 0.0 { "+" } else { "" };
    Some(format!("{sign}{:.1}%", change.value))
}

pub fn change_tone(change: &KpiChange) -> ChangeTone {
    match (change.trend, change.is_positive) {
        (Trend::Up, true) | (Trend::Down, false) => ChangeTone::Good,
        (Trend::Up, false) | (Trend::Down, true) => ChangeTone::Bad,
        (Trend::Flat, _) => ChangeTone::Neutral,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiCard {
    pub label: &'static str,
    pub value: String,
    pub change: Option<KpiChange>,
    pub status: KpiStatus,
}

fn delta_card(label: &'static str, kpi: Option<&Kpi>) -> KpiCard {
    let delta = kpi.and_then(|kpi| kpi.delta_pct);
    let DeltaClassification { change, status } = classify_delta(delta);
    KpiCard {
        label,
        value: format_number(kpi.map(|kpi| kpi.value)),
        change: Some(change),
        status,
    }
}

fn success_rate_card(performance: Option<&PerformanceSnapshot>) -> KpiCard {
    let success_rate = performance.and_then(|p| p.success_rate);
    let status = match success_rate {
        Some(rate) if rate < THRESHOLDS.success_rate.warning => KpiStatus::Critical,
        Some(rate) if rate < THRESHOLDS.success_rate.good => KpiStatus::Warning,
        _ => KpiStatus::Normal,
    };
    KpiCard {
        label: "成功率",
        value: format_percent(success_rate),
        change: None,
        status,
    }
}

/// Headline cards in display order.
pub fn kpi_cards(
    overview: Option<&OverviewSnapshot>,
    performance: Option<&PerformanceSnapshot>,
) -> Vec<KpiCard> {
    let kpis = overview.map(|overview| &overview.kpis);
    vec![
        delta_card("活跃用户", kpis.and_then(|k| k.active_users.as_ref())),
        delta_card("会话数(窗口)", kpis.and_then(|k| k.sessions.as_ref())),
        delta_card("消息数(窗口)", kpis.and_then(|k| k.messages.as_ref())),
        success_rate_card(performance),
    ]
}
