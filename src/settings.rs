use std::collections::BTreeMap;
use std::fmt::{Display, Write};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemSettings {
    #[serde(default)]
    pub rag: RagSettings,
    #[serde(default)]
    pub ai: AiSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RagSettings {
    #[serde(default, rename = "default")]
    pub defaults: VectorDefaults,
    #[serde(default)]
    pub query_rewrite: QueryRewriteSettings,
    #[serde(default)]
    pub rate_limit: RateLimitSettings,
    #[serde(default)]
    pub memory: MemorySettings,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VectorDefaults {
    pub collection_name: Option<String>,
    pub dimension: Option<u32>,
    pub metric_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRewriteSettings {
    pub enabled: Option<bool>,
    pub max_history_messages: Option<u32>,
    pub max_history_chars: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RateLimitSettings {
    #[serde(default)]
    pub global: GlobalRateLimit,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalRateLimit {
    pub enabled: Option<bool>,
    pub max_concurrent: Option<u32>,
    pub max_wait_seconds: Option<u64>,
    pub lease_seconds: Option<u64>,
    pub poll_interval_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemorySettings {
    pub history_keep_turns: Option<u32>,
    pub summary_start_turns: Option<u32>,
    pub summary_enabled: Option<bool>,
    pub ttl_minutes: Option<u32>,
    pub summary_max_chars: Option<u32>,
    pub title_max_length: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AiSettings {
    #[serde(default)]
    pub providers: BTreeMap<String, ProviderConfig>,
    #[serde(default)]
    pub selection: SelectionSettings,
    #[serde(default)]
    pub stream: StreamSettings,
    #[serde(default)]
    pub chat: ModelGroup,
    #[serde(default)]
    pub embedding: ModelGroup,
    #[serde(default)]
    pub rerank: ModelGroup,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    pub url: Option<String>,
    pub api_key: Option<String>,
    #[serde(default)]
    pub endpoints: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionSettings {
    pub failure_threshold: Option<u32>,
    pub open_duration_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamSettings {
    pub message_chunk_size: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelGroup {
    pub default_model: Option<String>,
    pub deep_thinking_model: Option<String>,
    #[serde(default)]
    pub candidates: Vec<ModelCandidate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelCandidate {
    pub id: String,
    pub provider: String,
    pub model: String,
    pub url: Option<String>,
    pub dimension: Option<u32>,
    pub priority: Option<i32>,
    pub enabled: Option<bool>,
    pub supports_thinking: Option<bool>,
}

fn show<T: Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |value| value.to_string())
}

fn flag(value: Option<bool>) -> &'static str {
    match value {
        Some(true) => "启用",
        Some(false) => "禁用",
        None => "-",
    }
}

/// Keeps the last four characters of a secret.
pub fn mask_secret(secret: Option<&str>) -> String {
    let Some(secret) = secret.filter(|secret| !secret.is_empty()) else {
        return "-".to_string();
    };
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{tail}")
}

/// Plain-text, read-only rendering of the platform settings.
pub fn render_settings(settings: &SystemSettings) -> String {
    let mut output = String::new();
    let rag = &settings.rag;
    let ai = &settings.ai;

    let _ = writeln!(output, "## RAG 默认配置");
    let _ = writeln!(output, "- Collection: {}", show(rag.defaults.collection_name.as_deref()));
    let _ = writeln!(output, "- Dimension: {}", show(rag.defaults.dimension));
    let _ = writeln!(output, "- Metric Type: {}", show(rag.defaults.metric_type.as_deref()));

    let _ = writeln!(output);
    let _ = writeln!(output, "## 查询改写");
    let _ = writeln!(output, "- Enabled: {}", flag(rag.query_rewrite.enabled));
    let _ = writeln!(
        output,
        "- Max History Messages: {}",
        show(rag.query_rewrite.max_history_messages)
    );
    let _ = writeln!(
        output,
        "- Max History Chars: {}",
        show(rag.query_rewrite.max_history_chars)
    );

    let global = &rag.rate_limit.global;
    let _ = writeln!(output);
    let _ = writeln!(output, "## 全局限流");
    let _ = writeln!(output, "- Enabled: {}", flag(global.enabled));
    let _ = writeln!(output, "- Max Concurrent: {}", show(global.max_concurrent));
    let _ = writeln!(output, "- Max Wait Seconds: {}", show(global.max_wait_seconds));
    let _ = writeln!(output, "- Lease Seconds: {}", show(global.lease_seconds));
    let _ = writeln!(output, "- Poll Interval (ms): {}", show(global.poll_interval_ms));

    let memory = &rag.memory;
    let _ = writeln!(output);
    let _ = writeln!(output, "## 记忆管理");
    let _ = writeln!(output, "- History Keep Turns: {}", show(memory.history_keep_turns));
    let _ = writeln!(output, "- Summary Start Turns: {}", show(memory.summary_start_turns));
    let _ = writeln!(output, "- Summary Enabled: {}", flag(memory.summary_enabled));
    let _ = writeln!(output, "- TTL Minutes: {}", show(memory.ttl_minutes));
    let _ = writeln!(output, "- Summary Max Chars: {}", show(memory.summary_max_chars));
    let _ = writeln!(output, "- Title Max Length: {}", show(memory.title_max_length));

    let _ = writeln!(output);
    let _ = writeln!(output, "## 模型服务提供方");
    if ai.providers.is_empty() {
        let _ = writeln!(output, "No providers configured.");
    }
    for (name, provider) in &ai.providers {
        let _ = writeln!(
            output,
            "- {name}: {} (key {})",
            show(provider.url.as_deref()),
            mask_secret(provider.api_key.as_deref())
        );
        for (endpoint, path) in &provider.endpoints {
            let _ = writeln!(output, "  - {endpoint}: {path}");
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## 模型选择策略");
    let _ = writeln!(
        output,
        "- Failure Threshold: {}",
        show(ai.selection.failure_threshold)
    );
    let _ = writeln!(output, "- Open Duration (ms): {}", show(ai.selection.open_duration_ms));
    let _ = writeln!(
        output,
        "- Message Chunk Size: {}",
        show(ai.stream.message_chunk_size)
    );

    for (title, group) in [
        ("Chat 模型", &ai.chat),
        ("Embedding 模型", &ai.embedding),
        ("Rerank 模型", &ai.rerank),
    ] {
        render_group(&mut output, title, group);
    }

    output
}

fn render_group(output: &mut String, title: &str, group: &ModelGroup) {
    let _ = writeln!(output);
    let _ = writeln!(output, "## {title}");
    let _ = writeln!(output, "- Default: {}", show(group.default_model.as_deref()));
    let _ = writeln!(
        output,
        "- Deep Thinking: {}",
        show(group.deep_thinking_model.as_deref())
    );
    for candidate in &group.candidates {
        let _ = writeln!(
            output,
            "- [{}] {} / {} priority {} {}{}",
            candidate.id,
            candidate.provider,
            candidate.model,
            show(candidate.priority),
            flag(candidate.enabled),
            if candidate.supports_thinking == Some(true) {
                " (thinking)"
            } else {
                ""
            }
        );
    }
}
