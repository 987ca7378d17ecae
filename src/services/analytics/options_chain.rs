//! 期权链聚合
//!
//! 将单一到期日的全部期权报价折叠为：
//! - 认购/认沽持仓与成交量总计
//! - 按行权价升序的聚合表
//! - 虚值侧最大持仓（供情绪评分使用，区别于全链最大持仓）
//! - 持仓 PCR、成交量 PCR（按交易时段收敛）
//! - 最大痛点行权价

use std::collections::BTreeMap;

use chrono::DateTime;
use chrono_tz::Tz;

use crate::config::AnalyticsConfig;
use crate::models::{ChainAggregate, OptionType, StrikeAggregate, StrikeQuote};
use crate::services::kite::common::is_market_open;

/// 认购总持仓为 0 而认沽持仓为正时的 PCR 哨兵值
///
/// 此时按定义式输出 0 会被误读为认购极端占优，
/// 故给出一个明确的"极大"值；绝不输出 Infinity
pub const OI_PCR_SENTINEL: f64 = 999.0;

/// 行权价转整数键（×100 取整），保证 BTreeMap 内唯一且升序迭代
fn strike_key(strike: f64) -> i64 {
    (strike * 100.0).round() as i64
}

/// 聚合期权链
///
/// # 参数
/// - quotes: 当前到期日的全部期权报价（输入只读，不被修改）
/// - current_price: 标的现价
/// - now: 求值时刻（IST，显式传入）
/// - config: 分析参数
pub fn aggregate_chain(
    quotes: &[StrikeQuote],
    current_price: f64,
    now: &DateTime<Tz>,
    config: &AnalyticsConfig,
) -> ChainAggregate {
    let mut total_call_oi: u64 = 0;
    let mut total_put_oi: u64 = 0;
    let mut total_call_volume: u64 = 0;
    let mut total_put_volume: u64 = 0;
    let mut highest_otm_call_oi: u64 = 0;
    let mut highest_otm_call_strike: Option<f64> = None;
    let mut highest_otm_put_oi: u64 = 0;
    let mut highest_otm_put_strike: Option<f64> = None;

    let mut by_strike: BTreeMap<i64, StrikeAggregate> = BTreeMap::new();

    for quote in quotes {
        let entry = by_strike
            .entry(strike_key(quote.strike))
            .or_insert(StrikeAggregate {
                strike: quote.strike,
                call_oi: 0,
                put_oi: 0,
                call_volume: 0,
                put_volume: 0,
            });

        match quote.option_type {
            OptionType::Call => {
                total_call_oi += quote.open_interest;
                total_call_volume += quote.volume;
                entry.call_oi += quote.open_interest;
                entry.call_volume += quote.volume;
                if quote.strike > current_price && quote.open_interest > highest_otm_call_oi {
                    highest_otm_call_oi = quote.open_interest;
                    highest_otm_call_strike = Some(quote.strike);
                }
            }
            OptionType::Put => {
                total_put_oi += quote.open_interest;
                total_put_volume += quote.volume;
                entry.put_oi += quote.open_interest;
                entry.put_volume += quote.volume;
                if quote.strike < current_price && quote.open_interest > highest_otm_put_oi {
                    highest_otm_put_oi = quote.open_interest;
                    highest_otm_put_strike = Some(quote.strike);
                }
            }
        }
    }

    let strikes: Vec<StrikeAggregate> = by_strike.into_values().collect();

    let pcr = oi_pcr(total_put_oi, total_call_oi);
    let volume_pcr = volume_pcr(total_put_volume, total_call_volume, now, config);
    let max_pain = max_pain(&strikes);

    ChainAggregate {
        total_call_oi,
        total_put_oi,
        total_call_volume,
        total_put_volume,
        strikes,
        highest_otm_call_oi,
        highest_otm_call_strike,
        highest_otm_put_oi,
        highest_otm_put_strike,
        pcr,
        volume_pcr,
        max_pain,
    }
}

/// 持仓 PCR = 认沽总持仓 / 认购总持仓
///
/// 认购为 0 且认沽为正时输出哨兵值，两者都为 0 时输出 0
pub fn oi_pcr(total_put_oi: u64, total_call_oi: u64) -> f64 {
    if total_call_oi == 0 {
        if total_put_oi > 0 {
            return OI_PCR_SENTINEL;
        }
        return 0.0;
    }
    let pcr = total_put_oi as f64 / total_call_oi as f64;
    (pcr * 100.0).round() / 100.0
}

/// 成交量 PCR，收敛到交易时段对应的合理区间
///
/// 盘后成交稀薄时比值噪音极大，闭市区间放得更宽；
/// 两侧成交量均为 0 时输出 0，不做收敛
pub fn volume_pcr(
    total_put_volume: u64,
    total_call_volume: u64,
    now: &DateTime<Tz>,
    config: &AnalyticsConfig,
) -> f64 {
    if total_call_volume == 0 && total_put_volume == 0 {
        return 0.0;
    }

    let raw = if total_call_volume == 0 {
        OI_PCR_SENTINEL
    } else {
        total_put_volume as f64 / total_call_volume as f64
    };

    let band = if is_market_open(now) {
        config.volume_pcr_open_band
    } else {
        config.volume_pcr_closed_band
    };
    let clamped = raw.clamp(band.min, band.max);
    (clamped * 100.0).round() / 100.0
}

/// 最大痛点
///
/// 对每个候选到期价 E，计算期权卖方总损失：
/// Σ putOI(S)×(E−S) (S<E) + Σ callOI(S)×(S−E) (S>E)；
/// 取损失最小的 E。并列时取行权价升序中先出现者
pub fn max_pain(strikes: &[StrikeAggregate]) -> f64 {
    let mut min_loss = f64::INFINITY;
    let mut max_pain = 0.0;

    for candidate in strikes {
        let expiry_price = candidate.strike;
        let mut total_loss = 0.0;
        for other in strikes {
            if other.put_oi > 0 && expiry_price > other.strike {
                total_loss += (expiry_price - other.strike) * other.put_oi as f64;
            }
            if other.call_oi > 0 && expiry_price < other.strike {
                total_loss += (other.strike - expiry_price) * other.call_oi as f64;
            }
        }
        if total_loss < min_loss {
            min_loss = total_loss;
            max_pain = expiry_price;
        }
    }

    max_pain
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::Asia::Kolkata;

    fn quote(strike: f64, option_type: OptionType, oi: u64, volume: u64) -> StrikeQuote {
        StrikeQuote {
            strike,
            option_type,
            open_interest: oi,
            volume,
            last_price: 10.0,
        }
    }

    fn agg(strike: f64, call_oi: u64, put_oi: u64) -> StrikeAggregate {
        StrikeAggregate {
            strike,
            call_oi,
            put_oi,
            call_volume: 0,
            put_volume: 0,
        }
    }

    fn market_open_time() -> DateTime<Tz> {
        Kolkata.with_ymd_and_hms(2025, 8, 6, 11, 0, 0).unwrap()
    }

    fn market_closed_time() -> DateTime<Tz> {
        Kolkata.with_ymd_and_hms(2025, 8, 6, 20, 0, 0).unwrap()
    }

    /// 测试 PCR 零保护：认购为 0 输出哨兵值而非 0 或 Infinity
    #[test]
    fn test_pcr_zero_guard() {
        println!("\n========== 测试 PCR 零保护 ==========");
        assert_eq!(oi_pcr(500, 0), OI_PCR_SENTINEL);
        assert_eq!(oi_pcr(0, 0), 0.0);
        assert_eq!(oi_pcr(35_000, 40_000), 0.88);
        assert!(oi_pcr(500, 0).is_finite());
        println!("✅ PCR 零保护测试通过！");
    }

    /// 测试成交量 PCR 按时段收敛
    #[test]
    fn test_volume_pcr_clamp_band() {
        println!("\n========== 测试成交量 PCR 收敛 ==========");
        let config = AnalyticsConfig::default();

        // 开盘时段收敛到 [0.2, 5.0]
        let open = volume_pcr(80_000, 1_000, &market_open_time(), &config);
        assert_eq!(open, 5.0);
        // 闭市时段区间放宽到 [0.1, 10.0]
        let closed = volume_pcr(80_000, 1_000, &market_closed_time(), &config);
        assert_eq!(closed, 10.0);
        // 区间内的值原样保留
        let normal = volume_pcr(9_000, 10_000, &market_open_time(), &config);
        assert_eq!(normal, 0.9);
        // 两侧均为 0 不做收敛
        assert_eq!(volume_pcr(0, 0, &market_open_time(), &config), 0.0);
        println!("✅ 成交量 PCR 收敛测试通过！");
    }

    /// 测试最大痛点：对称持仓分布时为中心行权价
    #[test]
    fn test_max_pain_symmetric() {
        println!("\n========== 测试最大痛点对称分布 ==========");
        let strikes = vec![
            agg(95.0, 20_000, 20_000),
            agg(100.0, 30_000, 30_000),
            agg(105.0, 20_000, 20_000),
        ];
        assert_eq!(max_pain(&strikes), 100.0);
        println!("✅ 最大痛点对称测试通过！");
    }

    /// 测试最大痛点并列时取升序先出现者
    #[test]
    fn test_max_pain_tie_break() {
        println!("\n========== 测试最大痛点并列 ==========");
        // 无任何持仓时所有候选损失都为 0，应取最低行权价
        let strikes = vec![agg(95.0, 0, 0), agg(100.0, 0, 0), agg(105.0, 0, 0)];
        assert_eq!(max_pain(&strikes), 95.0);
        println!("✅ 最大痛点并列测试通过！");
    }

    /// 测试聚合：总计、虚值峰值、按行权价升序
    #[test]
    fn test_aggregate_chain() {
        println!("\n========== 测试期权链聚合 ==========");
        let quotes = vec![
            quote(105.0, OptionType::Call, 40_000, 5_000),
            quote(105.0, OptionType::Put, 0, 1_000),
            quote(95.0, OptionType::Call, 0, 500),
            quote(95.0, OptionType::Put, 35_000, 4_000),
        ];
        let config = AnalyticsConfig::default();
        let result = aggregate_chain(&quotes, 100.0, &market_open_time(), &config);

        assert_eq!(result.total_call_oi, 40_000);
        assert_eq!(result.total_put_oi, 35_000);
        assert_eq!(result.pcr, 0.88);
        assert_eq!(result.highest_otm_call_oi, 40_000);
        assert_eq!(result.highest_otm_call_strike, Some(105.0));
        assert_eq!(result.highest_otm_put_oi, 35_000);
        assert_eq!(result.highest_otm_put_strike, Some(95.0));
        // 行权价唯一且升序
        assert_eq!(result.strikes.len(), 2);
        assert_eq!(result.strikes[0].strike, 95.0);
        assert_eq!(result.strikes[1].strike, 105.0);
        // E=95 损失 40,000×10，E=105 损失 35,000×10，取 105
        assert_eq!(result.max_pain, 105.0);
        println!("✅ 期权链聚合测试通过！");
    }
}
