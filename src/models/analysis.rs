//! 衍生指标数据模型
//!
//! 定义分析管线各阶段的输出结构，包括：
//! - 期权链聚合结果（PCR、最大痛点）
//! - 支撑/阻力位
//! - 市场情绪评分
//! - 资金流向（A/D）分析
//! - RSI 指标
//! - 成交量指标
//!
//! 所有结构均为单次分析请求内的临时数据，响应组装后即丢弃

#![allow(dead_code)]

use serde::{Deserialize, Serialize};

// ==================== 期权链聚合 ====================

/// 单一行权价上的认购/认沽持仓聚合
#[derive(Debug, Serialize, Deserialize, Clone, Copy)]
pub struct StrikeAggregate {
    /// 行权价
    pub strike: f64,
    /// 认购持仓量
    pub call_oi: u64,
    /// 认沽持仓量
    pub put_oi: u64,
    /// 认购成交量
    pub call_volume: u64,
    /// 认沽成交量
    pub put_volume: u64,
}

/// 期权链聚合结果
///
/// 由当前到期日的全部期权报价折叠而来
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChainAggregate {
    /// 认购总持仓
    pub total_call_oi: u64,
    /// 认沽总持仓
    pub total_put_oi: u64,
    /// 认购总成交量
    pub total_call_volume: u64,
    /// 认沽总成交量
    pub total_put_volume: u64,
    /// 按行权价升序的聚合列表
    pub strikes: Vec<StrikeAggregate>,
    /// 虚值侧认购最大持仓量（行权价高于现价）
    pub highest_otm_call_oi: u64,
    /// 虚值侧认购最大持仓对应行权价
    pub highest_otm_call_strike: Option<f64>,
    /// 虚值侧认沽最大持仓量（行权价低于现价）
    pub highest_otm_put_oi: u64,
    /// 虚值侧认沽最大持仓对应行权价
    pub highest_otm_put_strike: Option<f64>,
    /// 持仓 PCR（认沽/认购，含零保护哨兵值）
    pub pcr: f64,
    /// 成交量 PCR（已按交易时段收敛到合理区间）
    pub volume_pcr: f64,
    /// 最大痛点行权价
    pub max_pain: f64,
}

// ==================== 支撑/阻力位 ====================

/// 价位类型
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum LevelKind {
    /// 支撑位
    Support,
    /// 阻力位
    Resistance,
}

/// 价位强度
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "UPPERCASE")]
pub enum LevelStrength {
    /// 占位级（仅虚值回退价位使用）
    None,
    Weak,
    Medium,
    Strong,
}

/// 支撑/阻力价位
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Level {
    /// 价位
    pub price: f64,
    /// 类型
    pub kind: LevelKind,
    /// 强度
    pub strength: LevelStrength,
    /// 来源说明（持仓比数据 / Historical Volume Level / Psychological Level）
    pub rationale: String,
}

// ==================== 市场情绪 ====================

/// 市场情绪评分结果
///
/// 四个独立因子求和，映射到 7 档标签
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SentimentResult {
    /// 标签：Strongly Bearish ～ Strongly Bullish
    pub label: String,
    /// 总分（构造上约束在 [-7, +7] 附近）
    pub score: i32,
    /// 各因子贡献明细（含原始比率，供审计）
    pub breakdown: Vec<String>,
}

// ==================== 资金流向（A/D） ====================

/// 当日资金流向信号
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum AdSignal {
    /// 吸筹
    Accumulation,
    /// 派发
    Distribution,
    Neutral,
}

/// 资金流向强度
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdStrength {
    VeryStrong,
    Strong,
    Moderate,
    Weak,
}

/// A/D 线趋势方向
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum AdTrend {
    Bullish,
    Bearish,
    Sideways,
}

/// 置信度
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

/// A/D 线明细
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AdBreakdown {
    /// 含当日的 A/D 线
    pub current_ad_line: f64,
    /// 不含当日的 A/D 线
    pub previous_ad_line: f64,
    /// 变化量
    pub change: f64,
    /// 变化百分比
    pub change_percent: f64,
}

/// 成交量确认明细
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AdVolumeAnalysis {
    /// 当日成交量
    pub today_volume: u64,
    /// 当日成交量 / 窗口均量
    pub volume_vs_average: f64,
    /// 成交量确认：当日量高于均量为 YES
    pub volume_confirmation: String,
}

/// 资金流向（累积/派发）分析结果
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AdAnalysis {
    /// 当日信号
    pub today_signal: AdSignal,
    /// 当日强度
    pub today_strength: AdStrength,
    /// 当日资金流量（有符号）
    pub today_money_flow: f64,
    /// 20 日平均资金流量
    pub twenty_day_average: f64,
    /// 趋势方向
    pub trend: AdTrend,
    /// 趋势置信度
    pub confidence: Confidence,
    /// A/D 线明细
    pub breakdown: AdBreakdown,
    /// 成交量确认明细
    pub volume_analysis: AdVolumeAnalysis,
    /// 人类可读解释（历史不足时为原因说明）
    pub interpretation: String,
}

// ==================== RSI ====================

/// RSI 信号分类
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum RsiSignal {
    /// 超买（RSI ≥ 70）
    Overbought,
    /// 超卖（RSI ≤ 30）
    Oversold,
    Bullish,
    Bearish,
    Neutral,
}

/// RSI 信号强度
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum RsiStrength {
    Strong,
    Moderate,
    Weak,
    /// 50-70 / 30-50 区间的常规状态
    Neutral,
    /// 历史不足时的缺省强度
    Low,
}

/// RSI 指标结果
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RsiAnalysis {
    /// RSI 值，[0, 100]，保留 2 位小数
    pub value: f64,
    /// 信号分类
    pub signal: RsiSignal,
    /// 信号强度
    pub strength: RsiStrength,
}

// ==================== 成交量指标 ====================

/// 标的成交量指标
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct VolumeMetrics {
    /// 20 日平均成交量（不含当日）
    pub avg_20day_volume: u64,
    /// 当日成交量占均量百分比
    pub today_volume_percentage: f64,
    /// 按交易时段进度折算的全日成交量估计
    pub estimated_today_volume: u64,
}

// ==================== 总输出 ====================

/// 完整分析结果
///
/// analyze 管线的唯一出口，序列化后无损保留所有字段
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AnalysisResult {
    /// 标的展示名（大写）
    pub symbol: String,
    /// 标的现价
    pub ltp: f64,
    /// 相对昨收的涨跌幅（百分比）
    pub change_percent: f64,
    /// 持仓 PCR
    pub pcr: f64,
    /// 成交量 PCR
    pub volume_pcr: f64,
    /// 最大痛点行权价
    pub max_pain: f64,
    /// 期权到期日（dd-Mon-yyyy）
    pub expiry_date: String,
    /// 支撑位（最多 2 个，按距现价由近到远）
    pub support_levels: Vec<Level>,
    /// 阻力位（最多 2 个，按距现价由近到远）
    pub resistance_levels: Vec<Level>,
    /// 市场情绪
    pub sentiment: SentimentResult,
    /// 资金流向分析
    pub ad_analysis: AdAnalysis,
    /// RSI 指标
    pub rsi: RsiAnalysis,
    /// 成交量指标
    pub volume_metrics: VolumeMetrics,
    /// 数据刷新时间（IST）
    pub last_refreshed: String,
}
