use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub processing: ProcessingConfig,
    #[serde(default)]
    pub debug: DebugConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    /// When false, 500 responses carry a generic detail instead of the error text.
    #[serde(default = "default_true")]
    pub expose_error_details: bool,
    #[serde(default = "default_cors_allow_origins")]
    pub cors_allow_origins: Vec<String>,
    #[serde(default)]
    pub logs: LogsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogsConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_model_name")]
    pub name: String,
    /// Explicit path to the `.onnx` file; takes precedence over `dir`.
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub dir: Option<PathBuf>,
    #[serde(default)]
    pub intra_threads: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingConfig {
    #[serde(default)]
    pub alpha_matting: bool,
    #[serde(default = "default_foreground_threshold")]
    pub foreground_threshold: u8,
    #[serde(default = "default_background_threshold")]
    pub background_threshold: u8,
    #[serde(default = "default_erode_size")]
    pub erode_size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebugConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_debug_output_dir")]
    pub output_dir: PathBuf,
}

impl ModelConfig {
    /// Location of the model weights: `path` if set, otherwise `<dir>/<name>.onnx`
    /// with `dir` defaulting to `$HOME/.u2net`.
    pub fn resolve_path(&self) -> Option<PathBuf> {
        if let Some(ref path) = self.path {
            return Some(path.clone());
        }
        let dir = self
            .dir
            .clone()
            .or_else(|| dirs::home_dir().map(|home| home.join(".u2net")))?;
        Some(dir.join(format!("{}.onnx", self.name)))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_bytes: default_max_upload_bytes(),
            expose_error_details: true,
            cors_allow_origins: default_cors_allow_origins(),
            logs: LogsConfig::default(),
        }
    }
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: default_model_name(),
            path: None,
            dir: None,
            intra_threads: None,
        }
    }
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            alpha_matting: false,
            foreground_threshold: default_foreground_threshold(),
            background_threshold: default_background_threshold(),
            erode_size: default_erode_size(),
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            output_dir: default_debug_output_dir(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_max_upload_bytes() -> usize {
    20 * 1024 * 1024
}

fn default_cors_allow_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_model_name() -> String {
    "u2net".to_string()
}

fn default_foreground_threshold() -> u8 {
    240
}

fn default_background_threshold() -> u8 {
    10
}

fn default_erode_size() -> u32 {
    10
}

fn default_debug_output_dir() -> PathBuf {
    PathBuf::from("debug")
}
