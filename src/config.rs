//! Configuration management for Pentamind
//!
//! Parses TOML configuration files and provides typed access to settings.

use crate::router::{BackendId, CostTier, Task};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Upper bound for every configurable timeout, in seconds
const MAX_TIMEOUT_SECONDS: u64 = 300;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    pub providers: BTreeMap<String, ProviderConfig>,
    pub backends: Vec<BackendConfig>,
    pub routing: RoutingConfig,
    #[serde(default)]
    pub search: Option<SearchConfig>,
    #[serde(default)]
    pub timeouts: TimeoutsConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Wire protocol spoken by a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// `POST {base_url}/chat/completions` with bearer auth
    OpenaiCompatible,
    /// `POST {base_url}/models/{model}:generateContent`, key in `x-goog-api-key`
    Gemini,
}

/// A provider account: where to send requests and which credential to use
///
/// The credential itself never lives in the config file, only the name of the
/// environment variable holding it.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderConfig {
    kind: ProviderKind,
    base_url: String,
    api_key_env: String,
}

impl ProviderConfig {
    /// Get the wire protocol
    pub fn kind(&self) -> ProviderKind {
        self.kind
    }

    /// Get the base URL (no trailing slash)
    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Get the name of the environment variable holding the API key
    pub fn api_key_env(&self) -> &str {
        &self.api_key_env
    }

    /// Read the API key from the environment
    ///
    /// Returns `None` when the variable is unset or blank.
    pub fn api_key(&self) -> Option<String> {
        read_env_key(&self.api_key_env)
    }
}

/// A routable backend: one model behind one provider
///
/// All fields are private to enforce invariants. Configuration is loaded via
/// deserialization and validated via Config::validate().
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendConfig {
    id: BackendId,
    provider: String,
    model: String,
    cost_tier: CostTier,
    #[serde(default = "default_max_tokens")]
    max_tokens: u32,
    #[serde(default = "default_temperature")]
    temperature: f64,
    /// Long-context backends get the longer dispatch timeout
    #[serde(default)]
    long_context: bool,
    /// Human-readable strength shown on the scoreboard
    #[serde(default)]
    note: String,
}

impl BackendConfig {
    /// Get the backend identifier
    pub fn id(&self) -> &BackendId {
        &self.id
    }

    /// Get the name of the provider hosting this backend
    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// Get the provider-side model identifier
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Get the static cost tier
    pub fn cost_tier(&self) -> CostTier {
        self.cost_tier
    }

    /// Get the generation token limit
    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    /// Get the sampling temperature
    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Whether this backend is a long-context model
    pub fn is_long_context(&self) -> bool {
        self.long_context
    }

    /// Get the scoreboard note
    pub fn note(&self) -> &str {
        &self.note
    }
}

fn default_max_tokens() -> u32 {
    2000
}

fn default_temperature() -> f64 {
    0.3
}

/// One step of the input-length to model-size heuristic for long-context routing
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LongContextTier {
    pub min_chars: usize,
    pub model: String,
}

/// Routing configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RoutingConfig {
    /// Fast, cheap backend used by the Classifier
    pub classifier: BackendId,
    /// Designated reliable backend for substitution and Fallback
    pub fallback: BackendId,
    /// Reasoning backend that writes prose from search results
    pub synthesis: BackendId,
    /// Inputs longer than this (in characters) count as long-context
    #[serde(default = "default_long_context_threshold")]
    pub long_context_threshold_chars: usize,
    /// Model tiers for the long-context backend, chosen by input length
    #[serde(default)]
    pub long_context_tiers: Vec<LongContextTier>,
    /// One specialized backend per task type
    pub tasks: BTreeMap<Task, BackendId>,
}

fn default_long_context_threshold() -> usize {
    10_000
}

/// Web search provider configuration (optional)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchConfig {
    #[serde(default = "default_search_base_url")]
    base_url: String,
    #[serde(default = "default_search_key_env")]
    api_key_env: String,
    #[serde(default = "default_max_results")]
    max_results: usize,
}

impl SearchConfig {
    /// Get the base URL (no trailing slash)
    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Get the name of the environment variable holding the API key
    pub fn api_key_env(&self) -> &str {
        &self.api_key_env
    }

    /// Read the API key from the environment
    pub fn api_key(&self) -> Option<String> {
        read_env_key(&self.api_key_env)
    }

    /// Get the number of search results requested per query
    pub fn max_results(&self) -> usize {
        self.max_results
    }
}

fn default_search_base_url() -> String {
    "https://api.perplexity.ai".to_string()
}

fn default_search_key_env() -> String {
    "PERPLEXITY_API_KEY".to_string()
}

fn default_max_results() -> usize {
    5
}

fn read_env_key(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Observability configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Per-call timeouts in seconds
///
/// # Custom Deserialization
///
/// This type implements custom `Deserialize` to enforce validation at parse time.
/// All timeout values must be in range (0, 300] seconds. Invalid values are rejected
/// during TOML parsing, not later during `Config::validate()`.
#[derive(Debug, Clone, Serialize)]
pub struct TimeoutsConfig {
    /// Dispatch timeout for standard backends
    standard: u64,
    /// Dispatch timeout for long-context backends
    long_context: u64,
    /// Timeout for the Classifier call
    classifier: u64,
    /// Timeout for the search provider call
    search: u64,
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            standard: 60,
            long_context: 90,
            classifier: 30,
            search: 20,
        }
    }
}

impl TimeoutsConfig {
    /// Create a new TimeoutsConfig, falling back to defaults for unset values
    ///
    /// # Errors
    ///
    /// Returns an error if any timeout is zero or exceeds 300 seconds.
    pub fn new(
        standard: Option<u64>,
        long_context: Option<u64>,
        classifier: Option<u64>,
        search: Option<u64>,
    ) -> crate::error::AppResult<Self> {
        for (name, timeout_opt) in [
            ("standard", standard),
            ("long_context", long_context),
            ("classifier", classifier),
            ("search", search),
        ] {
            if let Some(timeout) = timeout_opt {
                if timeout == 0 {
                    return Err(crate::error::AppError::Config(format!(
                        "timeouts.{} must be greater than 0, got {}",
                        name, timeout
                    )));
                }
                if timeout > MAX_TIMEOUT_SECONDS {
                    return Err(crate::error::AppError::Config(format!(
                        "timeouts.{} cannot exceed {} seconds, got {}",
                        name, MAX_TIMEOUT_SECONDS, timeout
                    )));
                }
            }
        }

        let defaults = Self::default();
        Ok(Self {
            standard: standard.unwrap_or(defaults.standard),
            long_context: long_context.unwrap_or(defaults.long_context),
            classifier: classifier.unwrap_or(defaults.classifier),
            search: search.unwrap_or(defaults.search),
        })
    }

    /// Get the standard dispatch timeout
    pub fn standard(&self) -> Duration {
        Duration::from_secs(self.standard)
    }

    /// Get the long-context dispatch timeout
    pub fn long_context(&self) -> Duration {
        Duration::from_secs(self.long_context)
    }

    /// Get the classifier timeout
    pub fn classifier(&self) -> Duration {
        Duration::from_secs(self.classifier)
    }

    /// Get the search timeout
    pub fn search(&self) -> Duration {
        Duration::from_secs(self.search)
    }

    /// Get the dispatch timeout for a backend
    pub fn for_backend(&self, backend: &BackendConfig) -> Duration {
        if backend.is_long_context() {
            tracing::debug!(
                backend = %backend.id(),
                timeout_seconds = self.long_context,
                "Using long-context timeout"
            );
            self.long_context()
        } else {
            self.standard()
        }
    }
}

impl<'de> Deserialize<'de> for TimeoutsConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::{self, MapAccess, Visitor};
        use std::fmt;

        #[derive(Deserialize)]
        #[serde(field_identifier, rename_all = "snake_case")]
        enum Field {
            Standard,
            LongContext,
            Classifier,
            Search,
        }

        struct TimeoutsConfigVisitor;

        impl<'de> Visitor<'de> for TimeoutsConfigVisitor {
            type Value = TimeoutsConfig;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str(
                    "a struct with optional timeout fields (standard, long_context, classifier, search)",
                )
            }

            fn visit_map<V>(self, mut map: V) -> Result<TimeoutsConfig, V::Error>
            where
                V: MapAccess<'de>,
            {
                let mut standard = None;
                let mut long_context = None;
                let mut classifier = None;
                let mut search = None;

                while let Some(key) = map.next_key()? {
                    let (slot, name) = match key {
                        Field::Standard => (&mut standard, "standard"),
                        Field::LongContext => (&mut long_context, "long_context"),
                        Field::Classifier => (&mut classifier, "classifier"),
                        Field::Search => (&mut search, "search"),
                    };
                    if slot.is_some() {
                        return Err(de::Error::duplicate_field(name));
                    }
                    *slot = Some(map.next_value()?);
                }

                TimeoutsConfig::new(standard, long_context, classifier, search)
                    .map_err(|e| de::Error::custom(format!("Invalid timeout configuration: {}", e)))
            }
        }

        deserializer.deserialize_struct(
            "TimeoutsConfig",
            &["standard", "long_context", "classifier", "search"],
            TimeoutsConfigVisitor,
        )
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::error::AppResult<Self> {
        let path_display = path.as_ref().display().to_string();

        let content = std::fs::read_to_string(path.as_ref()).map_err(|source| {
            crate::error::AppError::ConfigFileRead {
                path: path_display.clone(),
                source,
            }
        })?;

        let config: Self = toml::from_str(&content).map_err(|source| {
            crate::error::AppError::ConfigParseFailed {
                path: path_display.clone(),
                source,
            }
        })?;

        config
            .validate()
            .map_err(|e| crate::error::AppError::ConfigValidationFailed {
                path: path_display,
                reason: e.to_string(),
            })?;

        Ok(config)
    }

    /// Look up a backend by identifier
    pub fn backend(&self, id: &BackendId) -> Option<&BackendConfig> {
        self.backends.iter().find(|b| b.id() == id)
    }

    /// Providers whose credentials are required before any run can start
    ///
    /// These host the classifier and fallback backends: without them the
    /// pipeline cannot guarantee a best-effort answer.
    pub fn required_providers(&self) -> BTreeSet<&str> {
        [&self.routing.classifier, &self.routing.fallback]
            .into_iter()
            .filter_map(|id| self.backend(id))
            .map(|b| b.provider())
            .collect()
    }

    /// Validate configuration after parsing
    ///
    /// This is called automatically by `from_file()`, but can also be called
    /// explicitly when constructing Config via other means (e.g., in tests).
    pub fn validate(&self) -> crate::error::AppResult<()> {
        use crate::error::AppError;

        // Providers
        if self.providers.is_empty() {
            return Err(AppError::Config(
                "Configuration error: no [providers] configured".to_string(),
            ));
        }
        for (name, provider) in &self.providers {
            if !provider.base_url.starts_with("http://")
                && !provider.base_url.starts_with("https://")
            {
                return Err(AppError::Config(format!(
                    "Configuration error: Provider '{}' has invalid base_url '{}'. \
                    base_url must start with 'http://' or 'https://'.",
                    name, provider.base_url
                )));
            }
            if provider.api_key_env.trim().is_empty() {
                return Err(AppError::Config(format!(
                    "Configuration error: Provider '{}' has an empty api_key_env",
                    name
                )));
            }
        }

        // Backends
        if self.backends.is_empty() {
            return Err(AppError::Config(
                "Configuration error: no [[backends]] configured".to_string(),
            ));
        }
        let mut seen = BTreeSet::new();
        for backend in &self.backends {
            if !seen.insert(backend.id.as_str()) {
                return Err(AppError::Config(format!(
                    "Configuration error: duplicate backend id '{}'",
                    backend.id
                )));
            }
            if !self.providers.contains_key(&backend.provider) {
                return Err(AppError::Config(format!(
                    "Configuration error: Backend '{}' references unknown provider '{}'. \
                    Known providers: {}",
                    backend.id,
                    backend.provider,
                    self.providers.keys().cloned().collect::<Vec<_>>().join(", ")
                )));
            }
            if backend.model.trim().is_empty() {
                return Err(AppError::Config(format!(
                    "Configuration error: Backend '{}' has an empty model",
                    backend.id
                )));
            }
            if backend.max_tokens == 0 {
                return Err(AppError::Config(format!(
                    "Configuration error: Backend '{}' has max_tokens=0. \
                    max_tokens must be greater than 0.",
                    backend.id
                )));
            }
            if !backend.temperature.is_finite()
                || backend.temperature < 0.0
                || backend.temperature > 2.0
            {
                return Err(AppError::Config(format!(
                    "Configuration error: Backend '{}' has invalid temperature {}. \
                    temperature must be a finite number between 0.0 and 2.0.",
                    backend.id, backend.temperature
                )));
            }
        }

        // Routing references
        for (role, id) in [
            ("routing.classifier", &self.routing.classifier),
            ("routing.fallback", &self.routing.fallback),
            ("routing.synthesis", &self.routing.synthesis),
        ] {
            if self.backend(id).is_none() {
                return Err(AppError::Config(format!(
                    "Configuration error: {} references unknown backend '{}'",
                    role, id
                )));
            }
        }
        for (task, id) in &self.routing.tasks {
            if self.backend(id).is_none() {
                return Err(AppError::Config(format!(
                    "Configuration error: routing.tasks.{} references unknown backend '{}'",
                    task, id
                )));
            }
        }
        for tier in &self.routing.long_context_tiers {
            if tier.model.trim().is_empty() {
                return Err(AppError::Config(format!(
                    "Configuration error: long_context_tiers entry at min_chars={} has an empty model",
                    tier.min_chars
                )));
            }
        }

        if let Some(search) = &self.search {
            if !search.base_url.starts_with("http://") && !search.base_url.starts_with("https://")
            {
                return Err(AppError::Config(format!(
                    "Configuration error: search.base_url '{}' must start with 'http://' or 'https://'",
                    search.base_url
                )));
            }
            if search.max_results == 0 || search.max_results > 20 {
                return Err(AppError::Config(format!(
                    "Configuration error: search.max_results must be between 1 and 20, got {}",
                    search.max_results
                )));
            }
        }

        Ok(())
    }
}

impl FromStr for Config {
    type Err = crate::error::AppError;

    fn from_str(toml_str: &str) -> Result<Self, Self::Err> {
        let config: Config = toml::from_str(toml_str).map_err(|source| {
            crate::error::AppError::ConfigParseFailed {
                path: "<string>".to_string(),
                source,
            }
        })?;

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_CONFIG: &str = r#"
[server]
host = "0.0.0.0"
port = 8000

[providers.digitalocean]
kind = "openai_compatible"
base_url = "https://inference.do-ai.run/v1"
api_key_env = "PENTAMIND_TEST_UNSET_DO_KEY"

[providers.gemini]
kind = "gemini"
base_url = "https://generativelanguage.googleapis.com/v1beta/"
api_key_env = "PENTAMIND_TEST_UNSET_GEMINI_KEY"

[[backends]]
id = "llama3-8b-instruct"
provider = "digitalocean"
model = "llama3-8b-instruct"
cost_tier = "low"
max_tokens = 200
temperature = 0.1

[[backends]]
id = "llama3.3-70b-instruct"
provider = "digitalocean"
model = "llama3.3-70b-instruct"
cost_tier = "high"
note = "General purpose fallback"

[[backends]]
id = "deepseek-r1-distill-llama-70b"
provider = "digitalocean"
model = "deepseek-r1-distill-llama-70b"
cost_tier = "med"

[[backends]]
id = "gemini"
provider = "gemini"
model = "gemini-2.5-flash"
cost_tier = "low"
max_tokens = 8000
long_context = true

[routing]
classifier = "llama3-8b-instruct"
fallback = "llama3.3-70b-instruct"
synthesis = "deepseek-r1-distill-llama-70b"

[[routing.long_context_tiers]]
min_chars = 0
model = "gemini-2.5-flash"

[[routing.long_context_tiers]]
min_chars = 40000
model = "gemini-2.5-pro"

[routing.tasks]
summarize = "gemini"
solve = "deepseek-r1-distill-llama-70b"
code = "llama3.3-70b-instruct"
rewrite = "llama3.3-70b-instruct"
research = "deepseek-r1-distill-llama-70b"
"#;

    fn with_replacement(from: &str, to: &str) -> String {
        assert!(TEST_CONFIG.contains(from), "fixture must contain {from:?}");
        TEST_CONFIG.replacen(from, to, 1)
    }

    #[test]
    fn test_config_from_str_parses_successfully() {
        let config = Config::from_str(TEST_CONFIG).expect("should parse config");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.backends.len(), 4);
        assert_eq!(config.routing.tasks.len(), 5);
        assert_eq!(config.routing.long_context_threshold_chars, 10_000);
    }

    #[test]
    fn test_backend_defaults_applied() {
        let config = Config::from_str(TEST_CONFIG).unwrap();
        let fallback = config
            .backend(&BackendId::from("llama3.3-70b-instruct"))
            .unwrap();
        assert_eq!(fallback.max_tokens(), 2000);
        assert_eq!(fallback.temperature(), 0.3);
        assert!(!fallback.is_long_context());
        assert_eq!(fallback.note(), "General purpose fallback");
        assert_eq!(fallback.cost_tier(), CostTier::High);
    }

    #[test]
    fn test_provider_base_url_trailing_slash_trimmed() {
        let config = Config::from_str(TEST_CONFIG).unwrap();
        assert_eq!(
            config.providers["gemini"].base_url(),
            "https://generativelanguage.googleapis.com/v1beta"
        );
        assert_eq!(config.providers["gemini"].kind(), ProviderKind::Gemini);
    }

    #[test]
    fn test_unset_api_key_reads_as_none() {
        let config = Config::from_str(TEST_CONFIG).unwrap();
        assert!(config.providers["digitalocean"].api_key().is_none());
    }

    #[test]
    fn test_optional_sections_default() {
        let config = Config::from_str(TEST_CONFIG).unwrap();
        assert!(config.search.is_none());
        assert_eq!(config.observability.log_level, "info");
        assert_eq!(config.timeouts.standard(), Duration::from_secs(60));
        assert_eq!(config.timeouts.long_context(), Duration::from_secs(90));
        assert_eq!(config.timeouts.classifier(), Duration::from_secs(30));
        assert_eq!(config.timeouts.search(), Duration::from_secs(20));
    }

    #[test]
    fn test_timeout_for_backend_uses_long_context_timeout() {
        let config = Config::from_str(TEST_CONFIG).unwrap();
        let gemini = config.backend(&BackendId::from("gemini")).unwrap();
        let llama = config
            .backend(&BackendId::from("llama3.3-70b-instruct"))
            .unwrap();
        assert_eq!(config.timeouts.for_backend(gemini), Duration::from_secs(90));
        assert_eq!(config.timeouts.for_backend(llama), Duration::from_secs(60));
    }

    #[test]
    fn test_required_providers_cover_classifier_and_fallback() {
        let config = Config::from_str(TEST_CONFIG).unwrap();
        let required = config.required_providers();
        assert_eq!(required.len(), 1);
        assert!(required.contains("digitalocean"));
    }

    #[test]
    fn test_search_section_defaults() {
        let toml = format!("{}\n[search]\n", TEST_CONFIG);
        let config = Config::from_str(&toml).unwrap();
        let search = config.search.expect("search section present");
        assert_eq!(search.base_url(), "https://api.perplexity.ai");
        assert_eq!(search.api_key_env(), "PERPLEXITY_API_KEY");
        assert_eq!(search.max_results(), 5);
    }

    #[test]
    fn test_search_max_results_out_of_range_fails() {
        let toml = format!("{}\n[search]\nmax_results = 0\n", TEST_CONFIG);
        assert!(Config::from_str(&toml).is_err());
    }

    #[test]
    fn test_unknown_provider_reference_fails() {
        let toml = with_replacement(
            "provider = \"gemini\"",
            "provider = \"anthropic\"",
        );
        let err = Config::from_str(&toml).unwrap_err();
        assert!(err.to_string().contains("unknown provider 'anthropic'"));
    }

    #[test]
    fn test_unknown_fallback_backend_fails() {
        let toml = with_replacement(
            "fallback = \"llama3.3-70b-instruct\"",
            "fallback = \"gpt-5\"",
        );
        let err = Config::from_str(&toml).unwrap_err();
        assert!(err.to_string().contains("routing.fallback"));
    }

    #[test]
    fn test_unknown_task_backend_fails() {
        let toml = with_replacement("summarize = \"gemini\"", "summarize = \"claude\"");
        let err = Config::from_str(&toml).unwrap_err();
        assert!(err.to_string().contains("routing.tasks.summarize"));
    }

    #[test]
    fn test_unknown_task_key_fails_to_parse() {
        let toml = with_replacement("summarize = \"gemini\"", "translate = \"gemini\"");
        assert!(Config::from_str(&toml).is_err());
    }

    #[test]
    fn test_duplicate_backend_id_fails() {
        let toml = with_replacement("id = \"gemini\"", "id = \"llama3-8b-instruct\"");
        let err = Config::from_str(&toml).unwrap_err();
        assert!(err.to_string().contains("duplicate backend id"));
    }

    #[test]
    fn test_invalid_temperature_fails() {
        let toml = with_replacement("temperature = 0.1", "temperature = 2.5");
        assert!(Config::from_str(&toml).is_err());
    }

    #[test]
    fn test_zero_max_tokens_fails() {
        let toml = with_replacement("max_tokens = 200", "max_tokens = 0");
        assert!(Config::from_str(&toml).is_err());
    }

    #[test]
    fn test_invalid_base_url_fails() {
        let toml = with_replacement(
            "base_url = \"https://inference.do-ai.run/v1\"",
            "base_url = \"inference.do-ai.run/v1\"",
        );
        let err = Config::from_str(&toml).unwrap_err();
        assert!(err.to_string().contains("digitalocean"));
    }

    #[test]
    fn test_timeouts_parse_with_partial_overrides() {
        let toml = format!("{}\n[timeouts]\nstandard = 45\n", TEST_CONFIG);
        let config = Config::from_str(&toml).unwrap();
        assert_eq!(config.timeouts.standard(), Duration::from_secs(45));
        assert_eq!(config.timeouts.long_context(), Duration::from_secs(90));
    }

    #[test]
    fn test_timeouts_deserialization_rejects_zero() {
        let toml = format!("{}\n[timeouts]\nclassifier = 0\n", TEST_CONFIG);
        let err = Config::from_str(&toml).unwrap_err();
        assert!(err.to_string().contains("timeouts.classifier"));
    }

    #[test]
    fn test_timeouts_deserialization_rejects_too_high() {
        let toml = format!("{}\n[timeouts]\nlong_context = 301\n", TEST_CONFIG);
        assert!(Config::from_str(&toml).is_err());
    }

    #[test]
    fn test_timeouts_accept_boundary_values() {
        let toml = format!(
            "{}\n[timeouts]\nstandard = 1\nlong_context = 300\n",
            TEST_CONFIG
        );
        let config = Config::from_str(&toml).unwrap();
        assert_eq!(config.timeouts.standard(), Duration::from_secs(1));
        assert_eq!(config.timeouts.long_context(), Duration::from_secs(300));
    }
}
