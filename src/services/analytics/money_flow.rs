//! 资金流向（累积/派发）分析
//!
//! Chaikin 式资金流量：单日乘数 `((close-low)-(high-close))/(high-low)`，
//! 乘以当日成交量得到资金流量，窗口内求和即 A/D 线
//!
//! ## 主要功能
//! - 当日吸筹/派发信号及强度
//! - 最近 5 日对前 5 日的 A/D 线趋势
//! - 成交量确认
//!
//! 历史为空时返回带原因说明的中性结果，绝不报错

use crate::models::{
    AdAnalysis, AdBreakdown, AdSignal, AdStrength, AdTrend, AdVolumeAnalysis, Confidence,
    DailyBar, TodayOhlcv,
};

/// 20 日均值视为可用的最小绝对值，低于此按"无历史均值"处理
const NEGLIGIBLE_AVERAGE: f64 = 0.001;

/// 单日资金流乘数
///
/// high == low（一字板）时定义为 0，避免除零
pub fn money_flow_multiplier(high: f64, low: f64, close: f64) -> f64 {
    if high == low {
        return 0.0;
    }
    ((close - low) - (high - close)) / (high - low)
}

/// 单日资金流量 = 乘数 × 成交量
pub fn money_flow_volume(multiplier: f64, volume: u64) -> f64 {
    multiplier * volume as f64
}

/// 计算窗口内的 A/D 线（资金流量之和）
///
/// 缺少 OHLC 的旧数据以 last_price 代替高低收，
/// 乘数退化为 0，该日不贡献资金流——这是上游数据的真实精度损失
pub fn calculate_ad_line(bars: &[DailyBar]) -> f64 {
    bars.iter().fold(0.0, |ad_line, day| {
        let high = day.high.or(day.last_price).unwrap_or(0.0);
        let low = day.low.or(day.last_price).unwrap_or(0.0);
        let close = day.close.or(day.last_price).unwrap_or(0.0);

        if high > 0.0 && low > 0.0 && close > 0.0 && day.total_volume > 0 {
            let multiplier = money_flow_multiplier(high, low, close);
            ad_line + money_flow_volume(multiplier, day.total_volume)
        } else {
            ad_line
        }
    })
}

/// 最近 5 日对前 5 日的 A/D 线趋势
///
/// 不足 10 日或前段 A/D 线接近 0 时给出 SIDEWAYS/LOW；
/// 变化超过 10% 为高置信趋势，超过 5% 为中置信
pub fn analyze_ad_trend(bars: &[DailyBar]) -> (AdTrend, Confidence) {
    if bars.len() < 10 {
        return (AdTrend::Sideways, Confidence::Low);
    }

    let recent_ad = calculate_ad_line(&bars[bars.len() - 5..]);
    let previous_ad = calculate_ad_line(&bars[bars.len() - 10..bars.len() - 5]);

    if previous_ad.abs() < NEGLIGIBLE_AVERAGE {
        return (AdTrend::Sideways, Confidence::Low);
    }

    let change = recent_ad - previous_ad;
    let change_percent = change / previous_ad.abs() * 100.0;

    if change_percent.abs() > 10.0 {
        let trend = if change > 0.0 { AdTrend::Bullish } else { AdTrend::Bearish };
        (trend, Confidence::High)
    } else if change_percent.abs() > 5.0 {
        let trend = if change > 0.0 { AdTrend::Bullish } else { AdTrend::Bearish };
        (trend, Confidence::Medium)
    } else {
        (AdTrend::Sideways, Confidence::Low)
    }
}

/// 生成完整资金流向分析
///
/// # 参数
/// - bars: 按日期升序的日线历史（取最近 ≤20 日作窗口）
/// - today: 当日盘中 OHLCV（可缺）
pub fn generate_ad_analysis(bars: &[DailyBar], today: Option<TodayOhlcv>) -> AdAnalysis {
    let window_start = bars.len().saturating_sub(20);
    let window = &bars[window_start..];

    if window.is_empty() {
        return neutral_analysis("Insufficient historical data");
    }

    let twenty_day_ad = calculate_ad_line(window);
    let twenty_day_average = twenty_day_ad / window.len() as f64;

    let mut today_money_flow = 0.0;
    let mut today_signal = AdSignal::Neutral;
    let mut today_strength = AdStrength::Weak;

    if let Some(t) = today {
        let multiplier = money_flow_multiplier(t.high, t.low, t.close);
        today_money_flow = money_flow_volume(multiplier, t.volume);

        if twenty_day_average.abs() > NEGLIGIBLE_AVERAGE {
            // 有历史均值：按当日流量与均值之比定强度
            let strength_ratio = today_money_flow.abs() / twenty_day_average.abs();
            if today_money_flow > 0.0 {
                today_signal = AdSignal::Accumulation;
            } else if today_money_flow < 0.0 {
                today_signal = AdSignal::Distribution;
            }
            if today_signal != AdSignal::Neutral {
                today_strength = if strength_ratio > 2.0 {
                    AdStrength::VeryStrong
                } else if strength_ratio > 1.0 {
                    AdStrength::Strong
                } else if strength_ratio > 0.5 {
                    AdStrength::Moderate
                } else {
                    AdStrength::Weak
                };
            }
        } else if today_money_flow.abs() > 0.0 {
            // 无历史均值：退回绝对量级阈值，避免薄历史下的虚假强信号
            today_signal = if today_money_flow > 0.0 {
                AdSignal::Accumulation
            } else {
                AdSignal::Distribution
            };
            let magnitude = today_money_flow.abs();
            today_strength = if magnitude > 1_000_000.0 {
                AdStrength::Strong
            } else if magnitude > 100_000.0 {
                AdStrength::Moderate
            } else {
                AdStrength::Weak
            };
        }
    }

    let (trend, confidence) = analyze_ad_trend(bars);

    // 含当日与不含当日的 A/D 线对比
    let previous_ad_line = calculate_ad_line(window);
    let current_ad_line = previous_ad_line + today_money_flow;
    let change = current_ad_line - previous_ad_line;
    let change_percent = if previous_ad_line.abs() > NEGLIGIBLE_AVERAGE {
        change / previous_ad_line.abs() * 100.0
    } else {
        0.0
    };

    let avg_volume =
        window.iter().map(|d| d.total_volume as f64).sum::<f64>() / window.len() as f64;
    let today_volume = today.map(|t| t.volume).unwrap_or(0);
    let volume_vs_average = if today.is_some() && avg_volume > 0.0 {
        today_volume as f64 / avg_volume
    } else {
        0.0
    };
    let volume_confirmation = if today.is_some() && today_volume as f64 > avg_volume {
        "YES"
    } else {
        "NO"
    };

    AdAnalysis {
        today_signal,
        today_strength,
        today_money_flow,
        twenty_day_average,
        trend,
        confidence,
        breakdown: AdBreakdown {
            current_ad_line,
            previous_ad_line,
            change,
            change_percent,
        },
        volume_analysis: AdVolumeAnalysis {
            today_volume,
            volume_vs_average,
            volume_confirmation: volume_confirmation.to_string(),
        },
        interpretation: interpretation(today_signal, today_strength),
    }
}

/// 历史为空时的中性结果
fn neutral_analysis(reason: &str) -> AdAnalysis {
    AdAnalysis {
        today_signal: AdSignal::Neutral,
        today_strength: AdStrength::Weak,
        today_money_flow: 0.0,
        twenty_day_average: 0.0,
        trend: AdTrend::Sideways,
        confidence: Confidence::Low,
        breakdown: AdBreakdown {
            current_ad_line: 0.0,
            previous_ad_line: 0.0,
            change: 0.0,
            change_percent: 0.0,
        },
        volume_analysis: AdVolumeAnalysis {
            today_volume: 0,
            volume_vs_average: 0.0,
            volume_confirmation: "NO".to_string(),
        },
        interpretation: reason.to_string(),
    }
}

/// 生成人类可读解释
fn interpretation(signal: AdSignal, strength: AdStrength) -> String {
    let text = match signal {
        AdSignal::Accumulation => match strength {
            AdStrength::VeryStrong => "Very strong institutional buying detected with high conviction",
            AdStrength::Strong => "Strong accumulation pattern suggesting smart money entry",
            AdStrength::Moderate => "Moderate buying interest, watch for trend confirmation",
            AdStrength::Weak => "Weak accumulation signal detected",
        },
        AdSignal::Distribution => match strength {
            AdStrength::VeryStrong => "Heavy distribution indicating strong selling pressure",
            AdStrength::Strong => "Significant selling activity, consider caution",
            AdStrength::Moderate => "Moderate selling pressure detected",
            AdStrength::Weak => "Weak distribution signal detected",
        },
        AdSignal::Neutral => "Neutral money flow, waiting for clearer direction",
    };
    text.to_string()
}
