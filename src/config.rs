//! 配置模块
//!
//! 支持从 JSON 文件加载系统配置

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,
    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
    /// 工作线程数（0 表示使用 CPU 核心数）
    #[serde(default)]
    pub workers: usize,
}

/// API 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// API Key（为空则不启用认证）
    #[serde(default)]
    pub api_key: String,
    /// 请求超时时间（秒）
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// 日志级别: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// 数据文件配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// 标的映射工作簿路径
    #[serde(default = "default_symbols_path")]
    pub symbols_path: String,
    /// 日线历史存储路径
    #[serde(default = "default_history_path")]
    pub history_path: String,
    /// Kite 访问令牌文件路径
    #[serde(default = "default_token_path")]
    pub token_path: String,
}

/// 成交量 PCR 收敛区间
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PcrBand {
    pub min: f64,
    pub max: f64,
}

/// 分析参数配置
///
/// 这些阈值为经验值，校准过程不在本服务范围内，
/// 因此全部暴露为配置项而非硬编码常量
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// RSI 周期
    #[serde(default = "default_rsi_period")]
    pub rsi_period: usize,
    /// 开盘时段的成交量 PCR 收敛区间
    #[serde(default = "default_open_band")]
    pub volume_pcr_open_band: PcrBand,
    /// 闭市时段的成交量 PCR 收敛区间（盘后成交稀薄，区间放宽）
    #[serde(default = "default_closed_band")]
    pub volume_pcr_closed_band: PcrBand,
    /// 情绪放大阈值：当日量超过均量该百分比时放大得分
    #[serde(default = "default_amplify_pct")]
    pub volume_amplify_pct: f64,
    /// 情绪衰减阈值：当日量低于均量该百分比时向中性收敛
    #[serde(default = "default_dampen_pct")]
    pub volume_dampen_pct: f64,
    /// 持仓比价位无候选时，是否回退到最近虚值行权价
    #[serde(default = "default_otm_fallback")]
    pub otm_fallback_levels: bool,
}

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,
    /// API 配置
    #[serde(default)]
    pub api: ApiConfig,
    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
    /// 数据文件配置
    #[serde(default)]
    pub data: DataConfig,
    /// 分析参数配置
    #[serde(default)]
    pub analytics: AnalyticsConfig,
}

// 默认值函数
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_timeout() -> u64 { 30 }
fn default_log_level() -> String { "info".to_string() }
fn default_symbols_path() -> String { "data/symbols.xlsx".to_string() }
fn default_history_path() -> String { "data/volume_history.json".to_string() }
fn default_token_path() -> String { "kite_token.json".to_string() }
fn default_rsi_period() -> usize { 14 }
fn default_open_band() -> PcrBand { PcrBand { min: 0.2, max: 5.0 } }
fn default_closed_band() -> PcrBand { PcrBand { min: 0.1, max: 10.0 } }
fn default_amplify_pct() -> f64 { 150.0 }
fn default_dampen_pct() -> f64 { 70.0 }
fn default_otm_fallback() -> bool { true }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: 0,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            timeout_secs: default_timeout(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            symbols_path: default_symbols_path(),
            history_path: default_history_path(),
            token_path: default_token_path(),
        }
    }
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            rsi_period: default_rsi_period(),
            volume_pcr_open_band: default_open_band(),
            volume_pcr_closed_band: default_closed_band(),
            volume_amplify_pct: default_amplify_pct(),
            volume_dampen_pct: default_dampen_pct(),
            otm_fallback_levels: default_otm_fallback(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            api: ApiConfig::default(),
            log: LogConfig::default(),
            data: DataConfig::default(),
            analytics: AnalyticsConfig::default(),
        }
    }
}

impl AppConfig {
    /// 从 JSON 文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// 加载配置，优先从文件，失败则使用默认值
    pub fn load() -> Self {
        let config_paths = ["config.json", "config/config.json"];

        for path in config_paths {
            if Path::new(path).exists() {
                match Self::from_file(path) {
                    Ok(config) => {
                        log::info!("从 {} 加载配置成功", path);
                        return config;
                    }
                    Err(e) => {
                        log::warn!("加载配置文件 {} 失败: {}", path, e);
                    }
                }
            }
        }

        log::info!("使用默认配置");
        Self::default()
    }

    /// 获取服务器绑定地址
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
