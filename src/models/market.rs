//! 市场数据模型
//!
//! 定义行情相关的数据结构，包括：
//! - 标的日线数据（滚动历史窗口）
//! - 期权合约报价
//! - 合约信息（来自 Kite 合约主表）
//! - 标的映射信息

#![allow(dead_code)]

use serde::{Deserialize, Serialize};

/// 标的日线数据
///
/// 每个交易日由外部定时任务追加一条，核心计算只读；
/// 每个标的保留最近约 20 个自然日的滚动窗口
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DailyBar {
    /// 日期（YYYY-MM-DD，单标的内唯一）
    pub date: String,
    /// 当日累计成交量
    pub total_volume: u64,
    /// 最新价（旧数据可能缺少 OHLC，仅有此字段）
    pub last_price: Option<f64>,
    /// 写入时间戳（毫秒）
    pub timestamp: i64,
    /// 最高价
    #[serde(skip_serializing_if = "Option::is_none")]
    pub high: Option<f64>,
    /// 最低价
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low: Option<f64>,
    /// 收盘价
    #[serde(skip_serializing_if = "Option::is_none")]
    pub close: Option<f64>,
}

impl DailyBar {
    /// 可用收盘价：优先用 close，缺失时退回 last_price
    pub fn closing_price(&self) -> Option<f64> {
        self.close.or(self.last_price).filter(|p| *p > 0.0)
    }
}

/// 当日盘中 OHLCV 采样
///
/// 由标的实时行情构造，供资金流向模块计算当日信号
#[derive(Debug, Serialize, Deserialize, Clone, Copy)]
pub struct TodayOhlcv {
    /// 当日最高价
    pub high: f64,
    /// 当日最低价
    pub low: f64,
    /// 当前价（视为当日收盘）
    pub close: f64,
    /// 当日累计成交量
    pub volume: u64,
}

/// 期权类型
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum OptionType {
    /// 认购（CE）
    #[serde(rename = "CE")]
    Call,
    /// 认沽（PE）
    #[serde(rename = "PE")]
    Put,
}

/// 单腿期权报价
///
/// 每次分析请求从实时行情构造，核心不持久化
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StrikeQuote {
    /// 行权价
    pub strike: f64,
    /// 期权类型
    pub option_type: OptionType,
    /// 持仓量（行情缺失按 0 处理）
    pub open_interest: u64,
    /// 成交量（行情缺失按 0 处理）
    pub volume: u64,
    /// 最新价
    pub last_price: f64,
}

/// Kite 实时行情（单个合约）
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct KiteQuote {
    /// 合约 token
    pub instrument_token: u64,
    /// 最新价
    pub last_price: f64,
    /// 持仓量
    #[serde(default)]
    pub oi: Option<u64>,
    /// 成交量
    #[serde(default)]
    pub volume: Option<u64>,
    /// 当日 OHLC
    #[serde(default)]
    pub ohlc: Option<KiteOhlc>,
}

/// Kite 行情 OHLC 块
#[derive(Debug, Serialize, Deserialize, Clone, Copy)]
pub struct KiteOhlc {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    /// 昨收盘价
    pub close: f64,
}

/// 合约主表中的一行（Kite instruments dump）
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Instrument {
    /// 合约 token
    pub instrument_token: u64,
    /// 交易代码（如 NIFTY25AUG24000CE）
    pub tradingsymbol: String,
    /// 标的名称
    pub name: String,
    /// 到期日（YYYY-MM-DD，非衍生品为空）
    pub expiry: Option<String>,
    /// 行权价
    pub strike: f64,
    /// 合约类型：CE / PE / FUT / EQ
    pub instrument_type: String,
    /// 交易所：NSE / NFO
    pub exchange: String,
}

/// 标的映射信息
///
/// 来自标的映射工作簿 stocks 表：展示名 → 行情代码 → 标的 token
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SymbolMapping {
    /// 展示名（如 NIFTY、RELIANCE）
    pub name: String,
    /// 行情查询用交易代码
    pub tradingsymbol: String,
    /// 标的合约 token
    pub instrument_token: u64,
}

impl SymbolMapping {
    /// 标的行情查询用交易所：指数走 NFO，个股走 NSE
    pub fn quote_exchange(&self) -> &'static str {
        if self.name == "NIFTY" || self.name == "BANKNIFTY" {
            "NFO"
        } else {
            "NSE"
        }
    }

    /// "交易所:代码" 形式的行情键
    pub fn quote_key(&self) -> String {
        format!("{}:{}", self.quote_exchange(), self.tradingsymbol)
    }
}

/// 分析请求参数
#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    /// 标的展示名
    pub symbol: String,
}

/// 历史更新任务结果
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct HistoryUpdateSummary {
    /// 成功更新的标的数
    pub updated: usize,
    /// 映射表中的标的总数
    pub total: usize,
}

/// Kite 访问令牌状态
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TokenStatus {
    /// 令牌是否存在
    pub present: bool,
    /// 令牌生成时间（ISO 8601，存在时有值）
    pub generated_at: Option<String>,
}
