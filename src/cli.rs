//! Command-line interface for Pentamind
//!
//! Provides argument parsing and subcommand handling for the Pentamind binary.

use crate::router::{RunMode, Task};
use clap::{Parser, Subcommand};

/// Task router for specialized LLM backends
#[derive(Parser)]
#[command(name = "pentamind")]
#[command(version)]
#[command(about = "Task router for specialized LLM backends")]
#[command(
    long_about = "Pentamind classifies a task, routes it to a specialized backend, executes it, \
    verifies the output format and retries once against a reliable fallback backend."
)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml", global = true)]
    pub config: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the HTTP server (default when no subcommand is given)
    Serve,

    /// Run the pipeline once and print the report as JSON
    Run {
        /// Task type
        #[arg(short, long, value_enum)]
        task: Task,

        /// Task input text
        #[arg(short, long)]
        input: String,

        /// Quality/speed/cost preference (recorded, does not change routing)
        #[arg(short, long, value_enum, default_value_t = RunMode::Best)]
        mode: RunMode,
    },

    /// Generate a template configuration file
    Config {
        /// Output file path (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<String>,
    },
}

/// Generate template configuration content
pub fn generate_config_template() -> &'static str {
    r#"# Pentamind Configuration
# ========================
#
# This file configures the HTTP server, provider accounts, backends, routing
# table, web search and observability settings for Pentamind.
#
# API keys never live in this file: each provider names the environment
# variable that holds its key.

# ─────────────────────────────────────────────────────────────────────────────
# SERVER CONFIGURATION
# ─────────────────────────────────────────────────────────────────────────────

[server]
# IP address to bind to (0.0.0.0 for all interfaces, 127.0.0.1 for localhost only)
host = "0.0.0.0"

# Port to listen on
port = 8000

# ─────────────────────────────────────────────────────────────────────────────
# PROVIDERS
# ─────────────────────────────────────────────────────────────────────────────
#
# kind:
#   - "openai_compatible": POST {base_url}/chat/completions with bearer auth
#   - "gemini": POST {base_url}/models/{model}:generateContent (x-goog-api-key header)

[providers.digitalocean]
kind = "openai_compatible"
base_url = "https://inference.do-ai.run/v1"
api_key_env = "MODEL_ACCESS_KEY"

[providers.gemini]
kind = "gemini"
base_url = "https://generativelanguage.googleapis.com/v1beta"
api_key_env = "GEMINI_API_KEY"

[providers.perplexity]
kind = "openai_compatible"
base_url = "https://api.perplexity.ai"
api_key_env = "PERPLEXITY_API_KEY"

# ─────────────────────────────────────────────────────────────────────────────
# BACKENDS
# ─────────────────────────────────────────────────────────────────────────────
#
# Every backend appears on the run scoreboard, in this order.
#
# Fields:
#   - id: Identifier used by [routing] and in traces
#   - provider: Key of a [providers.*] section
#   - model: Provider-side model name
#   - cost_tier: "high", "med" or "low"
#   - max_tokens: Generation limit (default 2000)
#   - temperature: Sampling temperature 0.0-2.0 (default 0.3)
#   - long_context: Use the long-context timeout (default false)
#   - note: Shown on the scoreboard

[[backends]]
id = "llama3-8b-instruct"
provider = "digitalocean"
model = "llama3-8b-instruct"
cost_tier = "low"
max_tokens = 200
temperature = 0.1
note = "Fast classifier"

[[backends]]
id = "llama3.3-70b-instruct"
provider = "digitalocean"
model = "llama3.3-70b-instruct"
cost_tier = "high"
note = "Coding and editing, reliable fallback"

[[backends]]
id = "deepseek-r1-distill-llama-70b"
provider = "digitalocean"
model = "deepseek-r1-distill-llama-70b"
cost_tier = "med"
note = "Step-by-step reasoning"

[[backends]]
id = "gemini"
provider = "gemini"
model = "gemini-2.5-flash"
cost_tier = "low"
max_tokens = 8000
long_context = true
note = "Long-context summarization"

[[backends]]
id = "perplexity-sonar"
provider = "perplexity"
model = "sonar"
cost_tier = "med"
note = "Web-grounded research"

# ─────────────────────────────────────────────────────────────────────────────
# ROUTING
# ─────────────────────────────────────────────────────────────────────────────

[routing]
# Backend used to classify intent and output format
classifier = "llama3-8b-instruct"

# Reliable backend used when the chosen one fails or its output fails verification
fallback = "llama3.3-70b-instruct"

# Reasoning backend that writes the answer once search results are available
synthesis = "deepseek-r1-distill-llama-70b"

# Summaries longer than this many characters go to the long-context backend
long_context_threshold_chars = 10000

# Model tier by input length: the largest min_chars not above the input length wins
[[routing.long_context_tiers]]
min_chars = 0
model = "gemini-2.5-flash"

[[routing.long_context_tiers]]
min_chars = 40000
model = "gemini-2.5-pro"

# One backend per task type. A task left out here uses the fallback backend.
[routing.tasks]
summarize = "gemini"
research = "perplexity-sonar"
solve = "deepseek-r1-distill-llama-70b"
code = "llama3.3-70b-instruct"
rewrite = "llama3.3-70b-instruct"

# ─────────────────────────────────────────────────────────────────────────────
# WEB SEARCH (Optional)
# ─────────────────────────────────────────────────────────────────────────────
#
# Research runs are augmented with search results when this section is
# present and the key is set. Without it they run unaugmented.

[search]
base_url = "https://api.perplexity.ai"
api_key_env = "PERPLEXITY_API_KEY"
max_results = 5

# ─────────────────────────────────────────────────────────────────────────────
# TIMEOUTS (Optional)
# ─────────────────────────────────────────────────────────────────────────────
#
# Seconds, each in (0, 300].

[timeouts]
standard = 60       # Regular backends
long_context = 90   # Backends with long_context = true
classifier = 30     # Classifier call
search = 20         # Search provider call

# ─────────────────────────────────────────────────────────────────────────────
# OBSERVABILITY
# ─────────────────────────────────────────────────────────────────────────────

[observability]
# Log level: "trace", "debug", "info", "warn", "error" (RUST_LOG overrides)
log_level = "info"

# Prometheus metrics are always available at /metrics on the server port
"#
}
