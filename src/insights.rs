use chrono::{DateTime, FixedOffset};

use crate::format::{format_percent, format_time};
use crate::models::{InsightRecord, InsightSeverity, InsightType, PerformanceSnapshot};
use crate::status::{HEALTH_NO_DOC_ATTENTION, THRESHOLDS};

pub const MAX_INSIGHTS: usize = 3;

/// Average latency above which a latency recommendation is raised.
pub const SLOW_RESPONSE_MS: f64 = 3000.0;

struct Draft {
    kind: InsightType,
    severity: InsightSeverity,
    title: &'static str,
    metric: &'static str,
    change: String,
    context: &'static str,
    action: Option<&'static str>,
}

impl Draft {
    fn stamp(self, timestamp: &str) -> InsightRecord {
        InsightRecord {
            kind: self.kind,
            severity: self.severity,
            title: self.title.to_string(),
            metric: self.metric.to_string(),
            change: self.change,
            context: self.context.to_string(),
            action: self.action.map(str::to_string),
            timestamp: timestamp.to_string(),
        }
    }
}

/// Rule-based annotations for the current snapshot, in priority order and
/// capped at [`MAX_INSIGHTS`]. Every record carries the same fetch time.
///
/// The availability rule reads unknown rates as 0, the same way
/// [`crate::status::aggregate_health`] does, so a snapshot with no success
/// rate raises the stability alert. Other unknown metrics never trigger a rule.
pub fn build_insights(
    snapshot: Option<&PerformanceSnapshot>,
    window_label: &str,
    fetched_at: Option<DateTime<FixedOffset>>,
) -> Vec<InsightRecord> {
    let timestamp = format_time(fetched_at);

    let Some(snapshot) = snapshot else {
        let pending = Draft {
            kind: InsightType::Trend,
            severity: InsightSeverity::Info,
            title: "等待数据回传",
            metric: "Dashboard",
            change: window_label.to_string(),
            context: "当前窗口尚未返回完整性能数据",
            action: None,
        };
        return vec![pending.stamp(&timestamp)];
    };

    let mut drafts = Vec::with_capacity(MAX_INSIGHTS + 1);
    drafts.push(availability_rule(snapshot));
    drafts.extend(retrieval_rule(snapshot));
    drafts.extend(latency_rule(snapshot));

    if drafts.len() < MAX_INSIGHTS {
        drafts.push(Draft {
            kind: InsightType::Recommendation,
            severity: InsightSeverity::Info,
            title: "继续保持当前策略",
            metric: "运营状态",
            change: window_label.to_string(),
            context: "当前窗口内未发现显著异常趋势",
            action: None,
        });
    }

    drafts
        .into_iter()
        .take(MAX_INSIGHTS)
        .map(|draft| draft.stamp(&timestamp))
        .collect()
}

fn exceeds(value: Option<f64>, limit: f64) -> bool {
    value.is_some_and(|value| value > limit)
}

fn availability_rule(snapshot: &PerformanceSnapshot) -> Draft {
    let unstable = snapshot.error_rate.unwrap_or(0.0) > THRESHOLDS.error_rate.warning
        || snapshot.success_rate.unwrap_or(0.0) < THRESHOLDS.success_rate.warning;

    if unstable {
        Draft {
            kind: InsightType::Anomaly,
            severity: InsightSeverity::Critical,
            title: "链路稳定性触发告警",
            metric: "成功率/错误率",
            change: format!(
                "{} / {}",
                format_percent(snapshot.success_rate),
                format_percent(snapshot.error_rate)
            ),
            context: "成功率低于 95% 或错误率高于 5%",
            action: Some("优先查看失败请求分布与超时节点"),
        }
    } else {
        Draft {
            kind: InsightType::Trend,
            severity: InsightSeverity::Info,
            title: "系统可用性稳定",
            metric: "成功率",
            change: format_percent(snapshot.success_rate),
            context: "当前窗口整体可用性处于健康区间",
            action: None,
        }
    }
}

fn retrieval_rule(snapshot: &PerformanceSnapshot) -> Option<Draft> {
    if !exceeds(snapshot.no_doc_rate, HEALTH_NO_DOC_ATTENTION) {
        return None;
    }
    Some(Draft {
        kind: InsightType::Recommendation,
        severity: InsightSeverity::Warning,
        title: "召回质量需优化",
        metric: "无知识率",
        change: format_percent(snapshot.no_doc_rate),
        context: "无知识率超过 20%，用户命中体验存在风险",
        action: Some("优化索引覆盖率与检索重排策略"),
    })
}

fn latency_rule(snapshot: &PerformanceSnapshot) -> Option<Draft> {
    let latency = snapshot.avg_latency_ms.filter(|ms| *ms > SLOW_RESPONSE_MS)?;
    Some(Draft {
        kind: InsightType::Recommendation,
        severity: InsightSeverity::Warning,
        title: "响应性能需要关注",
        metric: "平均响应时间",
        change: format!("{:.2}s", latency / 1000.0),
        context: "平均延迟高于 3s，影响交互体验",
        action: Some("排查慢节点与模型并发配置"),
    })
}
