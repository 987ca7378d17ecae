//! 分析管线编排
//!
//! 核心的唯一入口：给定标的、实时快照与日线历史，
//! 按固定顺序调用各纯函数模块并组装最终结果
//!
//! 顺序：期权链聚合 → 成交量指标 → RSI → 资金流向 → 价位检测 → 情绪评分
//! （后级依赖前级的完整输出，核心内部无并发）

use chrono::DateTime;
use chrono_tz::Tz;

use crate::config::AnalyticsConfig;
use crate::models::{AnalysisResult, DailyBar, StrikeQuote, TodayOhlcv};
use crate::services::analytics::levels::{detect_levels, PsychLevelTable};
use crate::services::analytics::money_flow::generate_ad_analysis;
use crate::services::analytics::options_chain::aggregate_chain;
use crate::services::analytics::rsi::calculate_rsi;
use crate::services::analytics::sentiment::score_sentiment;
use crate::services::analytics::volume::calculate_volume_metrics;

/// 单次分析请求的输入
///
/// 全部字段由调用方（HTTP 处理器、批处理任务等）准备好后传入，
/// 核心不访问网络、不读取进程时钟、不修改任何输入集合
#[derive(Debug, Clone)]
pub struct AnalysisInput<'a> {
    /// 标的展示名
    pub symbol: &'a str,
    /// 标的现价
    pub ltp: f64,
    /// 相对昨收涨跌幅（百分比）
    pub change_percent: f64,
    /// 期权到期日（dd-Mon-yyyy）
    pub expiry_date: String,
    /// 当前到期日的期权报价快照
    pub quotes: &'a [StrikeQuote],
    /// 按日期升序的日线历史（可能含当日条目）
    pub bars: &'a [DailyBar],
    /// 当日盘中 OHLCV（可缺）
    pub today: Option<TodayOhlcv>,
    /// 求值时刻（IST）
    pub now: DateTime<Tz>,
}

/// 运行完整分析管线
pub fn analyze(
    input: &AnalysisInput<'_>,
    config: &AnalyticsConfig,
    psych_table: &PsychLevelTable,
) -> AnalysisResult {
    let today_date = input.now.format("%Y-%m-%d").to_string();
    // 指标历史不含当日条目，当日数据单独经 today 传入
    let historical: Vec<DailyBar> = input
        .bars
        .iter()
        .filter(|b| b.date != today_date)
        .cloned()
        .collect();

    let chain = aggregate_chain(input.quotes, input.ltp, &input.now, config);

    let today_volume = input.today.map(|t| t.volume).unwrap_or(0);
    let volume_metrics = calculate_volume_metrics(&historical, today_volume, &input.now);

    let rsi = calculate_rsi(&historical, config.rsi_period);

    let ad_analysis = generate_ad_analysis(&historical, input.today);

    let levels = detect_levels(
        input.symbol,
        &chain.strikes,
        &historical,
        input.ltp,
        psych_table,
        config.otm_fallback_levels,
    );

    let sentiment = score_sentiment(&chain, &volume_metrics, config);

    AnalysisResult {
        symbol: input.symbol.to_uppercase(),
        ltp: input.ltp,
        change_percent: (input.change_percent * 100.0).round() / 100.0,
        pcr: chain.pcr,
        volume_pcr: chain.volume_pcr,
        max_pain: chain.max_pain,
        expiry_date: input.expiry_date.clone(),
        support_levels: levels.supports,
        resistance_levels: levels.resistances,
        sentiment,
        ad_analysis,
        rsi,
        volume_metrics,
        last_refreshed: input.now.format("%I:%M %p").to_string(),
    }
}
