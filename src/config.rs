use std::env;
use std::path::PathBuf;
use thiserror::Error;

/// Default window size, in characters, used when splitting documents.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;
/// Default number of characters shared by consecutive windows.
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;
/// Default similarity score at which a chunk counts as template boilerplate.
pub const DEFAULT_TEMPLATE_THRESHOLD: f64 = 0.9;
/// Default location of the persisted template store.
pub const DEFAULT_TEMPLATE_DB: &str = "template_db.json";
/// Default Ollama endpoint.
pub const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";
const DEFAULT_LLM_MODEL: &str = "llama3";
const DEFAULT_CATEGORIES: &[&str] = &[
    "SOW", "POC", "Legal", "Finance", "Purchase", "Orders", "Other",
];

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for doctriage.
///
/// Loaded once by the binary and handed to each operation; nothing here is global.
#[derive(Debug, Clone)]
pub struct Config {
    /// Window size, in characters, for the chunker.
    pub chunk_size: usize,
    /// Characters shared by consecutive windows.
    pub chunk_overlap: usize,
    /// Path of the persisted template store.
    pub template_db: PathBuf,
    /// Similarity score at which a chunk counts as a template match.
    pub template_threshold: f64,
    /// Whether the similarity metric ignores very frequent characters when seeding matches.
    pub template_autojunk: bool,
    /// Categories the classifier may assign.
    pub categories: Vec<String>,
    /// Completion backend used for classification.
    pub llm_provider: LlmProvider,
    /// Model identifier passed to the completion backend.
    pub llm_model: String,
    /// Base URL of the Ollama runtime.
    pub ollama_url: String,
}

/// Supported completion backends for classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LlmProvider {
    /// Classification disabled.
    None,
    /// Local Ollama runtime.
    Ollama,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            template_db: PathBuf::from(DEFAULT_TEMPLATE_DB),
            template_threshold: DEFAULT_TEMPLATE_THRESHOLD,
            template_autojunk: true,
            categories: DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect(),
            llm_provider: LlmProvider::None,
            llm_model: DEFAULT_LLM_MODEL.to_string(),
            ollama_url: DEFAULT_OLLAMA_URL.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    ///
    /// Every variable is optional; unset or blank variables keep their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// `lookup` returns the raw value of a variable, or `None` when it is unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = EnvSource { lookup };
        let defaults = Self::default();
        Ok(Self {
            chunk_size: vars
                .parse_optional("DOCTRIAGE_CHUNK_SIZE")?
                .unwrap_or(defaults.chunk_size),
            chunk_overlap: vars
                .parse_optional("DOCTRIAGE_CHUNK_OVERLAP")?
                .unwrap_or(defaults.chunk_overlap),
            template_db: vars
                .load_optional("DOCTRIAGE_TEMPLATE_DB")
                .map(PathBuf::from)
                .unwrap_or(defaults.template_db),
            template_threshold: vars
                .parse_optional::<f64>("DOCTRIAGE_TEMPLATE_THRESHOLD")?
                .map(|value| {
                    if (0.0..=1.0).contains(&value) {
                        Ok(value)
                    } else {
                        Err(ConfigError::InvalidValue(
                            "DOCTRIAGE_TEMPLATE_THRESHOLD".to_string(),
                        ))
                    }
                })
                .transpose()?
                .unwrap_or(defaults.template_threshold),
            template_autojunk: vars
                .load_optional("DOCTRIAGE_TEMPLATE_AUTOJUNK")
                .map(|value| {
                    parse_bool(&value).ok_or_else(|| {
                        ConfigError::InvalidValue("DOCTRIAGE_TEMPLATE_AUTOJUNK".to_string())
                    })
                })
                .transpose()?
                .unwrap_or(defaults.template_autojunk),
            categories: vars
                .load_optional("DOCTRIAGE_CATEGORIES")
                .map(|value| parse_categories(&value))
                .transpose()?
                .unwrap_or(defaults.categories),
            llm_provider: vars
                .load_optional("LLM_PROVIDER")
                .map(|value| {
                    value
                        .parse()
                        .map_err(|()| ConfigError::InvalidValue("LLM_PROVIDER".to_string()))
                })
                .transpose()?
                .unwrap_or(defaults.llm_provider),
            llm_model: vars.load_optional("LLM_MODEL").unwrap_or(defaults.llm_model),
            ollama_url: vars
                .load_optional("OLLAMA_URL")
                .unwrap_or(defaults.ollama_url),
        })
    }

    /// Fetch the model name, failing when the provider needs one and none is usable.
    pub fn require_llm_model(&self) -> Result<&str, ConfigError> {
        let model = self.llm_model.trim();
        if model.is_empty() {
            Err(ConfigError::MissingVariable("LLM_MODEL".to_string()))
        } else {
            Ok(model)
        }
    }
}

struct EnvSource<F> {
    lookup: F,
}

impl<F> EnvSource<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn load_optional(&self, key: &str) -> Option<String> {
        (self.lookup)(key).filter(|value| !value.trim().is_empty())
    }

    fn parse_optional<T: std::str::FromStr>(&self, key: &str) -> Result<Option<T>, ConfigError> {
        self.load_optional(key)
            .map(|value| {
                value
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue(key.to_string()))
            })
            .transpose()
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_categories(value: &str) -> Result<Vec<String>, ConfigError> {
    let categories: Vec<String> = value
        .split(',')
        .map(str::trim)
        .filter(|category| !category.is_empty())
        .map(str::to_string)
        .collect();
    if categories.is_empty() {
        Err(ConfigError::InvalidValue("DOCTRIAGE_CATEGORIES".to_string()))
    } else {
        Ok(categories)
    }
}

impl std::str::FromStr for LlmProvider {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" | "off" => Ok(Self::None),
            "ollama" => Ok(Self::Ollama),
            _ => Err(()),
        }
    }
}

/// Load `.env` (if present) and build the configuration from the environment.
pub fn load() -> Result<Config, ConfigError> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    tracing::debug!(
        chunk_size = config.chunk_size,
        chunk_overlap = config.chunk_overlap,
        template_db = %config.template_db.display(),
        template_threshold = config.template_threshold,
        llm_provider = ?config.llm_provider,
        "Loaded configuration"
    );
    Ok(config)
}
