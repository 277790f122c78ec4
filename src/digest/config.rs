use crate::digest::client::{EndpointConfig, ModelSettings};
use crate::digest::pipeline::PipelineOptions;
use crate::digest::retry::RetryPolicy;
use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorklogEndpointConfig {
    pub url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for WorklogEndpointConfig {
    fn default() -> Self {
        Self {
            url: "https://api.z.ai/api/paas/v4/chat/completions".to_string(),
            model: "glm-4.5-air".to_string(),
            temperature: 0.3,
            max_tokens: 2000,
            timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorklogPipelineConfig {
    pub chunk_chars: usize,
    pub min_content_chars: usize,
    pub pacing_ms: u64,
    pub max_attempts: u32,
    pub backoff_base_secs: u64,
}

impl Default for WorklogPipelineConfig {
    fn default() -> Self {
        Self {
            chunk_chars: 30_000,
            min_content_chars: 50,
            pacing_ms: 1_000,
            max_attempts: 3,
            backoff_base_secs: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorklogNotesConfig {
    pub target_heading: String,
    pub transcript_file_format: String,
    pub note_file_format: String,
}

impl Default for WorklogNotesConfig {
    fn default() -> Self {
        Self {
            target_heading: "## 作業日報".to_string(),
            transcript_file_format: "%Y年%m月%d日.md".to_string(),
            note_file_format: "%Y-%m-%d.md".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WorklogConfig {
    pub endpoint: WorklogEndpointConfig,
    pub pipeline: WorklogPipelineConfig,
    pub notes: WorklogNotesConfig,
    /// Only ever read from the environment.
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl WorklogConfig {
    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            chunk_chars: self.pipeline.chunk_chars,
            pacing: Duration::from_millis(self.pipeline.pacing_ms),
            retry: RetryPolicy {
                max_attempts: self.pipeline.max_attempts,
                base_delay: Duration::from_secs(self.pipeline.backoff_base_secs),
            },
            model: ModelSettings {
                model: self.endpoint.model.clone(),
                temperature: self.endpoint.temperature,
                max_tokens: self.endpoint.max_tokens,
            },
        }
    }

    pub fn endpoint_config(&self) -> Result<EndpointConfig> {
        let api_key = self
            .api_key
            .clone()
            .ok_or_else(|| anyhow!("API key missing: set WORKLOG_API_KEY (or GLM_API_KEY)"))?;
        Ok(EndpointConfig {
            url: self.endpoint.url.clone(),
            api_key,
            timeout: Duration::from_secs(self.endpoint.timeout_secs),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialWorklogConfig {
    endpoint: Option<WorklogEndpointConfig>,
    pipeline: Option<WorklogPipelineConfig>,
    notes: Option<WorklogNotesConfig>,
}

fn env_or_f32(var: &str, fallback: f32) -> f32 {
    match env::var(var) {
        Ok(v) => v.trim().parse::<f32>().ok().unwrap_or(fallback),
        Err(_) => fallback,
    }
}

fn env_or_u64(var: &str, fallback: u64) -> u64 {
    match env::var(var) {
        Ok(v) => v.trim().parse::<u64>().ok().unwrap_or(fallback),
        Err(_) => fallback,
    }
}

fn env_or_u32(var: &str, fallback: u32) -> u32 {
    match env::var(var) {
        Ok(v) => v.trim().parse::<u32>().ok().unwrap_or(fallback),
        Err(_) => fallback,
    }
}

fn env_or_usize(var: &str, fallback: usize) -> usize {
    match env::var(var) {
        Ok(v) => v.trim().parse::<usize>().ok().unwrap_or(fallback),
        Err(_) => fallback,
    }
}

fn env_or_string(var: &str, fallback: &str) -> String {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => fallback.to_string(),
    }
}

fn env_first_string(vars: &[&str]) -> Option<String> {
    vars.iter().find_map(|var| match env::var(var) {
        Ok(v) if !v.trim().is_empty() => Some(v.trim().to_string()),
        _ => None,
    })
}

fn validate(cfg: &WorklogConfig) -> Result<()> {
    let url = cfg.endpoint.url.trim();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(anyhow!("invalid endpoint url `{url}`: must be http(s)"));
    }
    if cfg.endpoint.model.trim().is_empty() {
        return Err(anyhow!("invalid endpoint model: cannot be empty"));
    }
    if !(0.0..=2.0).contains(&cfg.endpoint.temperature) {
        return Err(anyhow!("invalid temperature: require 0.0 <= temperature <= 2.0"));
    }
    if cfg.endpoint.max_tokens == 0 {
        return Err(anyhow!("invalid max tokens: must be >= 1"));
    }
    if cfg.endpoint.timeout_secs == 0 {
        return Err(anyhow!("invalid endpoint timeout: must be >= 1 second"));
    }
    if cfg.pipeline.chunk_chars == 0 {
        return Err(anyhow!("invalid chunk size: must be >= 1 character"));
    }
    if cfg.pipeline.max_attempts == 0 {
        return Err(anyhow!("invalid max attempts: must be >= 1"));
    }
    if !cfg.notes.target_heading.trim_start().starts_with('#') {
        return Err(anyhow!(
            "invalid target heading `{}`: must be a Markdown heading",
            cfg.notes.target_heading
        ));
    }
    if cfg.notes.transcript_file_format.trim().is_empty()
        || cfg.notes.note_file_format.trim().is_empty()
    {
        return Err(anyhow!("invalid file name format: cannot be empty"));
    }
    Ok(())
}

pub fn resolve_config_path(worklog_home: &Path) -> PathBuf {
    match env::var("WORKLOG_CONFIG_PATH") {
        Ok(custom) if !custom.trim().is_empty() => PathBuf::from(custom.trim()),
        _ => worklog_home.join("worklog.toml"),
    }
}

fn merge_file_config(base: &mut WorklogConfig, path: &Path) -> Result<()> {
    if !path.exists() {
        return Ok(());
    }

    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let parsed: PartialWorklogConfig = toml::from_str(&raw)
        .map_err(|err| anyhow!("failed to parse worklog config {}: {err}", path.display()))?;
    if let Some(endpoint) = parsed.endpoint {
        base.endpoint = endpoint;
    }
    if let Some(pipeline) = parsed.pipeline {
        base.pipeline = pipeline;
    }
    if let Some(notes) = parsed.notes {
        base.notes = notes;
    }
    Ok(())
}

pub fn load_config(worklog_home: &Path) -> Result<WorklogConfig> {
    let mut cfg = WorklogConfig::default();
    merge_file_config(&mut cfg, &resolve_config_path(worklog_home))?;

    cfg.endpoint.url = env_or_string("WORKLOG_ENDPOINT", &cfg.endpoint.url);
    cfg.endpoint.model = env_or_string("WORKLOG_MODEL", &cfg.endpoint.model);
    cfg.endpoint.temperature = env_or_f32("WORKLOG_TEMPERATURE", cfg.endpoint.temperature);
    cfg.endpoint.max_tokens = env_or_u32("WORKLOG_MAX_TOKENS", cfg.endpoint.max_tokens);
    cfg.endpoint.timeout_secs = env_or_u64("WORKLOG_TIMEOUT_SECS", cfg.endpoint.timeout_secs);
    cfg.pipeline.chunk_chars = env_or_usize("WORKLOG_CHUNK_CHARS", cfg.pipeline.chunk_chars);
    cfg.pipeline.min_content_chars =
        env_or_usize("WORKLOG_MIN_CONTENT_CHARS", cfg.pipeline.min_content_chars);
    cfg.pipeline.pacing_ms = env_or_u64("WORKLOG_PACING_MS", cfg.pipeline.pacing_ms);
    cfg.pipeline.max_attempts = env_or_u32("WORKLOG_MAX_ATTEMPTS", cfg.pipeline.max_attempts);
    cfg.pipeline.backoff_base_secs =
        env_or_u64("WORKLOG_BACKOFF_BASE_SECS", cfg.pipeline.backoff_base_secs);
    cfg.notes.target_heading = env_or_string("WORKLOG_TARGET_HEADING", &cfg.notes.target_heading);
    cfg.api_key = env_first_string(&["WORKLOG_API_KEY", "GLM_API_KEY"]);

    validate(&cfg)?;
    Ok(cfg)
}
