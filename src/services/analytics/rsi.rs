//! RSI（相对强弱指标）计算
//!
//! 基于日线收盘价序列，采用 Wilder 平滑法：
//! 前 N 个涨跌取简单均值作种子，之后按 `avg = (avg*(N-1) + new)/N` 递推
//!
//! 历史不足属于预期情况，返回中性缺省值而非报错

use crate::models::{DailyBar, RsiAnalysis, RsiSignal, RsiStrength};

/// 历史不足时的中性缺省结果
fn neutral_default() -> RsiAnalysis {
    RsiAnalysis {
        value: 50.0,
        signal: RsiSignal::Neutral,
        strength: RsiStrength::Low,
    }
}

/// 计算 RSI 指标
///
/// # 参数
/// - bars: 按日期升序的日线数据
/// - period: RSI 周期（通常为 14）
///
/// 可用收盘价少于 period+1 个时返回中性缺省值；
/// 价格完全无波动时同样返回中性缺省值（避免 0/0）
pub fn calculate_rsi(bars: &[DailyBar], period: usize) -> RsiAnalysis {
    if period == 0 {
        return neutral_default();
    }

    // 只保留有可用收盘价的日线
    let closes: Vec<f64> = bars.iter().filter_map(|b| b.closing_price()).collect();
    if closes.len() < period + 1 {
        return neutral_default();
    }

    // 逐日涨跌
    let changes: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();

    // 种子：前 period 个涨跌的简单均值
    let (mut avg_gain, mut avg_loss) =
        changes
            .iter()
            .take(period)
            .fold((0.0_f64, 0.0_f64), |(g, l), &change| {
                if change > 0.0 {
                    (g + change, l)
                } else {
                    (g, l - change)
                }
            });
    avg_gain /= period as f64;
    avg_loss /= period as f64;

    // Wilder 平滑递推剩余部分
    for &change in changes.iter().skip(period) {
        let (gain, loss) = if change > 0.0 {
            (change, 0.0)
        } else {
            (0.0, -change)
        };
        avg_gain = (avg_gain * (period as f64 - 1.0) + gain) / period as f64;
        avg_loss = (avg_loss * (period as f64 - 1.0) + loss) / period as f64;
    }

    // 亏损均值为 0 时显式给定结果，绝不放任除零产生 NaN/Infinity
    let value = if avg_loss == 0.0 {
        if avg_gain > 0.0 {
            100.0
        } else {
            // 完全无波动，等价于历史不足
            return neutral_default();
        }
    } else {
        let rs = avg_gain / avg_loss;
        let rsi = 100.0 - 100.0 / (1.0 + rs);
        (rsi * 100.0).round() / 100.0
    };

    let (signal, strength) = classify(value);
    RsiAnalysis {
        value,
        signal,
        strength,
    }
}

/// RSI 区间分类
///
/// - ≥70 超买（≥80 强 / ≥75 中 / 其余弱）
/// - ≤30 超卖（≤20 强 / ≤25 中 / 其余弱）
/// - 50~70 偏多，30~50 偏空，强度均为常规
fn classify(value: f64) -> (RsiSignal, RsiStrength) {
    if value >= 70.0 {
        let strength = if value >= 80.0 {
            RsiStrength::Strong
        } else if value >= 75.0 {
            RsiStrength::Moderate
        } else {
            RsiStrength::Weak
        };
        (RsiSignal::Overbought, strength)
    } else if value <= 30.0 {
        let strength = if value <= 20.0 {
            RsiStrength::Strong
        } else if value <= 25.0 {
            RsiStrength::Moderate
        } else {
            RsiStrength::Weak
        };
        (RsiSignal::Oversold, strength)
    } else if value > 50.0 {
        (RsiSignal::Bullish, RsiStrength::Neutral)
    } else {
        (RsiSignal::Bearish, RsiStrength::Neutral)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 构造收盘价序列对应的日线
    fn bars_from_closes(closes: &[f64]) -> Vec<DailyBar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| DailyBar {
                date: format!("2025-07-{:02}", i + 1),
                total_volume: 100_000,
                last_price: Some(close),
                timestamp: 0,
                high: None,
                low: None,
                close: Some(close),
            })
            .collect()
    }

    /// 测试历史不足返回中性缺省值
    #[test]
    fn test_rsi_insufficient_history() {
        println!("\n========== 测试 RSI 历史不足 ==========");
        let bars = bars_from_closes(&[100.0, 101.0, 102.0]);
        let result = calculate_rsi(&bars, 14);
        assert_eq!(result.value, 50.0);
        assert_eq!(result.signal, RsiSignal::Neutral);
        assert_eq!(result.strength, RsiStrength::Low);
        println!("✅ 历史不足测试通过！");
    }

    /// 测试平盘序列：涨跌全为零，返回中性而非 NaN
    #[test]
    fn test_rsi_flat_series() {
        println!("\n========== 测试 RSI 平盘序列 ==========");
        let bars = bars_from_closes(&[100.0; 21]);
        let result = calculate_rsi(&bars, 14);
        println!("  平盘 RSI = {}", result.value);
        assert_eq!(result.value, 50.0);
        assert_eq!(result.signal, RsiSignal::Neutral);
        assert!(result.value.is_finite());
        println!("✅ 平盘序列测试通过！");
    }

    /// 测试单边上涨：亏损均值为 0 时 RSI 定义为 100
    #[test]
    fn test_rsi_all_gains() {
        println!("\n========== 测试 RSI 单边上涨 ==========");
        let closes: Vec<f64> = (1..=20).map(|i| 100.0 + i as f64).collect();
        let bars = bars_from_closes(&closes);
        let result = calculate_rsi(&bars, 14);
        println!("  单边上涨 RSI = {}", result.value);
        assert_eq!(result.value, 100.0);
        assert_eq!(result.signal, RsiSignal::Overbought);
        assert_eq!(result.strength, RsiStrength::Strong);
        println!("✅ 单边上涨测试通过！");
    }

    /// 测试 Wilder 平滑计算值（period=3 手算用例）
    #[test]
    fn test_rsi_wilder_smoothing() {
        println!("\n========== 测试 Wilder 平滑 ==========");
        // 涨跌序列 +1, +1, -1, +1
        // 种子: avg_gain=2/3, avg_loss=1/3
        // 递推一步: avg_gain=7/9, avg_loss=2/9 -> RS=3.5 -> RSI=77.78
        let bars = bars_from_closes(&[10.0, 11.0, 12.0, 11.0, 12.0]);
        let result = calculate_rsi(&bars, 3);
        println!("  计算值 = {}", result.value);
        assert!((result.value - 77.78).abs() < 1e-9);
        assert_eq!(result.signal, RsiSignal::Overbought);
        assert_eq!(result.strength, RsiStrength::Moderate);
        println!("✅ Wilder 平滑测试通过！");
    }

    /// 测试 RSI 值域：任意输入都应落在 [0, 100]
    #[test]
    fn test_rsi_bounds() {
        println!("\n========== 测试 RSI 值域 ==========");
        let cases: Vec<Vec<f64>> = vec![
            (1..=30).map(|i| 100.0 + (i % 7) as f64 * 3.0).collect(),
            (1..=30).map(|i| 500.0 - i as f64 * 2.0).collect(),
            (1..=30).map(|i| 250.0 + ((i * 13) % 11) as f64).collect(),
        ];
        for closes in &cases {
            let result = calculate_rsi(&bars_from_closes(closes), 14);
            println!("  RSI = {}", result.value);
            assert!(result.value >= 0.0 && result.value <= 100.0);
        }
        println!("✅ 值域测试通过！");
    }

    /// 测试区间分类阈值
    #[test]
    fn test_rsi_classification() {
        println!("\n========== 测试 RSI 区间分类 ==========");
        let cases = vec![
            (85.0, RsiSignal::Overbought, RsiStrength::Strong),
            (76.0, RsiSignal::Overbought, RsiStrength::Moderate),
            (71.0, RsiSignal::Overbought, RsiStrength::Weak),
            (60.0, RsiSignal::Bullish, RsiStrength::Neutral),
            (40.0, RsiSignal::Bearish, RsiStrength::Neutral),
            (28.0, RsiSignal::Oversold, RsiStrength::Weak),
            (24.0, RsiSignal::Oversold, RsiStrength::Moderate),
            (15.0, RsiSignal::Oversold, RsiStrength::Strong),
        ];
        for (value, signal, strength) in cases {
            let (s, st) = classify(value);
            assert_eq!(s, signal, "RSI {} 信号分类错误", value);
            assert_eq!(st, strength, "RSI {} 强度分类错误", value);
        }
        println!("✅ 区间分类测试通过！");
    }
}
