//! 市场情绪评分
//!
//! 四个独立因子各自有界，求和后映射到 7 档标签：
//! 1. 持仓 PCR 因子
//! 2. 虚值持仓强弱因子（认沽/认购虚值最大持仓对比）
//! 3. 成交量 PCR 因子（反向：低成交量 PCR 偏多）
//! 4. 成交量活跃度调节（放量放大，缩量向中性收敛）
//!
//! 明细记录每个因子的带符号贡献和原始比率，供审计

use crate::config::AnalyticsConfig;
use crate::models::{ChainAggregate, SentimentResult, VolumeMetrics};

/// 计算市场情绪
///
/// # 参数
/// - chain: 期权链聚合结果
/// - volume_metrics: 标的成交量指标
/// - config: 分析参数（成交量活跃度阈值来自配置）
pub fn score_sentiment(
    chain: &ChainAggregate,
    volume_metrics: &VolumeMetrics,
    config: &AnalyticsConfig,
) -> SentimentResult {
    let mut breakdown = Vec::new();

    // 因子 1：持仓 PCR
    let pcr = chain.pcr;
    let pcr_factor = if pcr > 1.3 {
        2
    } else if pcr > 1.1 {
        1
    } else if pcr >= 0.9 {
        0
    } else if pcr < 0.7 {
        -2
    } else {
        -1
    };
    breakdown.push(format!("OI PCR {:.2} -> {:+}", pcr, pcr_factor));

    // 因子 2：虚值持仓强弱
    let put_oi = chain.highest_otm_put_oi as f64;
    let call_oi = chain.highest_otm_call_oi as f64;
    let oi_factor = if put_oi > call_oi * 2.0 {
        2
    } else if put_oi > call_oi * 1.2 {
        1
    } else if call_oi > put_oi * 2.0 {
        -2
    } else if call_oi > put_oi * 1.2 {
        -1
    } else {
        0
    };
    breakdown.push(format!(
        "OTM Put OI {} vs Call OI {} -> {:+}",
        chain.highest_otm_put_oi, chain.highest_otm_call_oi, oi_factor
    ));

    // 因子 3：成交量 PCR（反向）
    let volume_pcr = chain.volume_pcr;
    let volume_pcr_factor = if volume_pcr < 0.7 {
        2
    } else if volume_pcr < 0.9 {
        1
    } else if volume_pcr <= 1.1 {
        0
    } else if volume_pcr > 1.3 {
        -2
    } else {
        -1
    };
    breakdown.push(format!(
        "Volume PCR {:.2} -> {:+}",
        volume_pcr, volume_pcr_factor
    ));

    // 因子 4：成交量活跃度调节
    let subtotal: i32 = pcr_factor + oi_factor + volume_pcr_factor;
    let activity_pct = volume_metrics.today_volume_percentage;
    let activity_factor = if activity_pct > config.volume_amplify_pct {
        // 放量：沿现有方向放大
        subtotal.signum()
    } else if activity_pct > 0.0
        && activity_pct < config.volume_dampen_pct
        && subtotal.abs() >= 2
    {
        // 缩量下的信号不可信，向中性收敛一档
        -subtotal.signum()
    } else {
        0
    };
    breakdown.push(format!(
        "Volume activity {:.1}% of 20-day avg -> {:+}",
        activity_pct, activity_factor
    ));

    let score = subtotal + activity_factor;
    SentimentResult {
        label: label_for(score).to_string(),
        score,
        breakdown,
    }
}

/// 总分到 7 档标签的映射
fn label_for(score: i32) -> &'static str {
    if score >= 5 {
        "Strongly Bullish"
    } else if score >= 3 {
        "Bullish"
    } else if score >= 1 {
        "Slightly Bullish"
    } else if score >= -1 {
        "Neutral"
    } else if score >= -3 {
        "Slightly Bearish"
    } else if score >= -5 {
        "Bearish"
    } else {
        "Strongly Bearish"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StrikeAggregate;

    fn chain(pcr: f64, volume_pcr: f64, otm_put_oi: u64, otm_call_oi: u64) -> ChainAggregate {
        ChainAggregate {
            total_call_oi: 0,
            total_put_oi: 0,
            total_call_volume: 0,
            total_put_volume: 0,
            strikes: Vec::<StrikeAggregate>::new(),
            highest_otm_call_oi: otm_call_oi,
            highest_otm_call_strike: None,
            highest_otm_put_oi: otm_put_oi,
            highest_otm_put_strike: None,
            pcr,
            volume_pcr,
            max_pain: 0.0,
        }
    }

    fn metrics(pct: f64) -> VolumeMetrics {
        VolumeMetrics {
            avg_20day_volume: 100_000,
            today_volume_percentage: pct,
            estimated_today_volume: 100_000,
        }
    }

    /// 测试单调性：其余因子不变时，提高 PCR 不会降低总分
    #[test]
    fn test_sentiment_monotonic_in_pcr() {
        println!("\n========== 测试情绪单调性 ==========");
        let config = AnalyticsConfig::default();
        let low = score_sentiment(&chain(0.8, 1.0, 50_000, 50_000), &metrics(100.0), &config);
        let high = score_sentiment(&chain(1.4, 1.0, 50_000, 50_000), &metrics(100.0), &config);
        println!("  PCR 0.8 得分 {}, PCR 1.4 得分 {}", low.score, high.score);
        assert!(high.score >= low.score);
        println!("✅ 单调性测试通过！");
    }

    /// 测试多头合成：高 PCR + 认沽虚值占优 + 低成交量 PCR + 放量
    #[test]
    fn test_strongly_bullish() {
        println!("\n========== 测试强多头合成 ==========");
        let config = AnalyticsConfig::default();
        let result = score_sentiment(
            &chain(1.5, 0.6, 200_000, 50_000),
            &metrics(180.0),
            &config,
        );
        // +2 +2 +2 放大 +1 = 7
        assert_eq!(result.score, 7);
        assert_eq!(result.label, "Strongly Bullish");
        assert_eq!(result.breakdown.len(), 4);
        println!("✅ 强多头测试通过！");
    }

    /// 测试缩量收敛：|小计|≥2 且当日量低于阈值时向中性拉回一档
    #[test]
    fn test_low_volume_dampening() {
        println!("\n========== 测试缩量收敛 ==========");
        let config = AnalyticsConfig::default();
        // 小计 = -2 - 0 + 0 = -2，缩量 -> +1
        let result = score_sentiment(&chain(0.6, 1.0, 50_000, 50_000), &metrics(50.0), &config);
        assert_eq!(result.score, -1);

        // 无成交量历史（百分比为 0）不触发收敛
        let result = score_sentiment(&chain(0.6, 1.0, 50_000, 50_000), &metrics(0.0), &config);
        assert_eq!(result.score, -2);
        println!("✅ 缩量收敛测试通过！");
    }

    /// 测试标签阶梯
    #[test]
    fn test_label_ladder() {
        println!("\n========== 测试标签阶梯 ==========");
        let cases = vec![
            (6, "Strongly Bullish"),
            (4, "Bullish"),
            (1, "Slightly Bullish"),
            (0, "Neutral"),
            (-2, "Slightly Bearish"),
            (-4, "Bearish"),
            (-6, "Strongly Bearish"),
        ];
        for (score, expected) in cases {
            assert_eq!(label_for(score), expected, "得分 {} 标签错误", score);
        }
        println!("✅ 标签阶梯测试通过！");
    }

    /// 测试明细可审计：每个因子都有带比率的记录
    #[test]
    fn test_breakdown_auditable() {
        println!("\n========== 测试明细记录 ==========");
        let config = AnalyticsConfig::default();
        let result = score_sentiment(&chain(0.88, 1.0, 35_000, 40_000), &metrics(100.0), &config);
        assert!(result.breakdown[0].contains("0.88"));
        assert!(result.breakdown[0].contains("-1"));
        assert!(result.breakdown[1].contains("35000"));
        assert!(result.breakdown[3].contains("100.0%"));
        println!("✅ 明细记录测试通过！");
    }
}
