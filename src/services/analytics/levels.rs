//! 支撑/阻力位检测
//!
//! 三个独立生成器 + 一步合并：
//! - 持仓比价位：行权价上认购/认沽持仓量的失衡
//! - 历史量价位：历史收盘价按 5 元档位聚合成交量
//! - 心理价位：整数关口（常见标的查表，其余按规则生成）
//!
//! 合并后按距现价由近到远各保留 2 个支撑/阻力

use std::collections::HashMap;

use crate::models::{Level, LevelKind, LevelStrength, StrikeAggregate, DailyBar};

/// 持仓比价位的主侧持仓量门槛
const OI_DOMINANT_FLOOR: u64 = 30_000;
/// 持仓比价位的对侧持仓量门槛
const OI_OPPOSITE_FLOOR: u64 = 1_000;
/// 持仓比最低值
const OI_RATIO_FLOOR: f64 = 1.3;
/// 每侧最多保留的持仓比候选数
const MAX_OI_CANDIDATES: usize = 5;
/// 历史量价位的档位宽度
const PRICE_BIN_WIDTH: f64 = 5.0;
/// 各生成器统一的现价距离上限（百分比）
const MAX_DISTANCE_PCT: f64 = 20.0;
/// 最终每侧保留的价位数
const MAX_LEVELS_PER_SIDE: usize = 2;

/// 心理价位表
///
/// 常见标的的整数关口为静态配置，可注入替换；
/// 未收录标的按现价 ±20% 区间生成整数关口
#[derive(Debug, Clone)]
pub struct PsychLevelTable {
    levels: HashMap<String, Vec<f64>>,
}

impl Default for PsychLevelTable {
    fn default() -> Self {
        let mut levels = HashMap::new();
        levels.insert("LAURUSLABS".to_string(), vec![800.0, 850.0, 860.0, 900.0, 950.0, 1000.0]);
        levels.insert(
            "RELIANCE".to_string(),
            vec![2400.0, 2500.0, 2600.0, 2700.0, 2800.0, 2900.0, 3000.0],
        );
        levels.insert("INFY".to_string(), vec![1400.0, 1500.0, 1600.0, 1700.0, 1800.0]);
        levels.insert("TATASTEEL".to_string(), vec![120.0, 130.0, 140.0, 150.0, 160.0]);
        levels.insert(
            "NIFTY".to_string(),
            vec![24000.0, 24500.0, 25000.0, 25500.0, 26000.0],
        );
        levels.insert(
            "BANKNIFTY".to_string(),
            vec![52000.0, 53000.0, 54000.0, 55000.0, 56000.0],
        );
        Self { levels }
    }
}

impl PsychLevelTable {
    /// 查询标的的整数关口（大小写不敏感）
    pub fn lookup(&self, symbol: &str) -> Option<&[f64]> {
        self.levels.get(&symbol.to_uppercase()).map(|v| v.as_slice())
    }
}

/// 检测结果：每侧最多 2 个价位
#[derive(Debug, Clone)]
pub struct DetectedLevels {
    pub supports: Vec<Level>,
    pub resistances: Vec<Level>,
}

/// 主入口：运行三个生成器并合并
///
/// # 参数
/// - symbol: 标的展示名（用于心理价位查表）
/// - strikes: 按行权价升序的持仓聚合
/// - bars: 日线历史
/// - current_price: 现价
/// - table: 心理价位表
/// - otm_fallback: 持仓比无候选时是否回退到最近虚值行权价
pub fn detect_levels(
    symbol: &str,
    strikes: &[StrikeAggregate],
    bars: &[DailyBar],
    current_price: f64,
    table: &PsychLevelTable,
    otm_fallback: bool,
) -> DetectedLevels {
    let (oi_supports, oi_resistances) = oi_ratio_levels(strikes, current_price, otm_fallback);
    let historical = historical_volume_levels(bars, current_price);
    let psychological = psychological_levels(symbol, current_price, table);

    let side = |kind: LevelKind, oi: &[Level]| -> Vec<Level> {
        // 并集顺序决定去重时谁先占位：持仓比 > 历史量 > 心理位
        let mut union: Vec<Level> = oi.to_vec();
        union.extend(historical.iter().filter(|l| l.kind == kind).cloned());
        union.extend(psychological.iter().filter(|l| l.kind == kind).cloned());
        merge_levels(union, current_price)
    };

    DetectedLevels {
        supports: side(LevelKind::Support, &oi_supports),
        resistances: side(LevelKind::Resistance, &oi_resistances),
    }
}

// ==================== 持仓比价位 ====================

/// 持仓比价位检测
///
/// 阻力：现价上方、认购持仓 ≥30,000、认沽持仓 ≥1,000、比值 ≥1.3 的行权价；
/// 支撑为镜像条件。对侧持仓为 0 时比值视为无穷大，仅按主侧门槛判定。
/// 每侧按主侧持仓量降序取前 5 个，再按价格升序输出。
pub fn oi_ratio_levels(
    strikes: &[StrikeAggregate],
    current_price: f64,
    otm_fallback: bool,
) -> (Vec<Level>, Vec<Level>) {
    let mut resistances: Vec<(u64, Level)> = Vec::new();
    let mut supports: Vec<(u64, Level)> = Vec::new();

    for agg in strikes {
        if agg.strike > current_price {
            if let Some(level) = classify_oi_level(
                agg.strike,
                agg.call_oi,
                agg.put_oi,
                LevelKind::Resistance,
            ) {
                resistances.push((agg.call_oi, level));
            }
        } else if agg.strike < current_price {
            if let Some(level) =
                classify_oi_level(agg.strike, agg.put_oi, agg.call_oi, LevelKind::Support)
            {
                supports.push((agg.put_oi, level));
            }
        }
    }

    let finalize = |mut side: Vec<(u64, Level)>| -> Vec<Level> {
        // 先按主侧持仓量降序截断，再按价格升序呈现
        side.sort_by(|a, b| b.0.cmp(&a.0));
        side.truncate(MAX_OI_CANDIDATES);
        let mut levels: Vec<Level> = side.into_iter().map(|(_, l)| l).collect();
        levels.sort_by(|a, b| a.price.partial_cmp(&b.price).unwrap());
        levels
    };

    let mut resistances = finalize(resistances);
    let mut supports = finalize(supports);

    // 无候选时回退到最近虚值行权价作占位
    if otm_fallback {
        if resistances.is_empty() {
            if let Some(agg) = strikes.iter().find(|a| a.strike > current_price) {
                resistances.push(fallback_level(agg.strike, LevelKind::Resistance));
            }
        }
        if supports.is_empty() {
            if let Some(agg) = strikes.iter().rev().find(|a| a.strike < current_price) {
                supports.push(fallback_level(agg.strike, LevelKind::Support));
            }
        }
    }

    (supports, resistances)
}

/// 单个行权价的持仓比判定
///
/// dominant 为该侧主持仓（阻力=认购，支撑=认沽），opposite 为对侧
fn classify_oi_level(
    strike: f64,
    dominant: u64,
    opposite: u64,
    kind: LevelKind,
) -> Option<Level> {
    if dominant < OI_DOMINANT_FLOOR {
        return None;
    }

    let ratio = if opposite == 0 {
        f64::INFINITY
    } else {
        dominant as f64 / opposite as f64
    };

    // 对侧持仓在 (0, 1000) 区间的行权价不参与，避免小持仓制造畸高比值
    if opposite > 0 && (opposite < OI_OPPOSITE_FLOOR || ratio < OI_RATIO_FLOOR) {
        return None;
    }

    let strength = if (ratio >= 3.0 && dominant > 1_000_000)
        || ratio >= 4.0
        || dominant > 2_000_000
    {
        LevelStrength::Strong
    } else if ratio >= 1.8 {
        LevelStrength::Medium
    } else {
        LevelStrength::Weak
    };

    let (dominant_name, opposite_name) = match kind {
        LevelKind::Resistance => ("Call", "Put"),
        LevelKind::Support => ("Put", "Call"),
    };
    let rationale = if opposite == 0 {
        format!("{} OI {} vs {} OI 0", dominant_name, dominant, opposite_name)
    } else {
        format!(
            "{} OI {} vs {} OI {} (ratio {:.1})",
            dominant_name, dominant, opposite_name, opposite, ratio
        )
    };

    Some(Level {
        price: strike,
        kind,
        strength,
        rationale,
    })
}

/// 最近虚值行权价的零强度占位价位
fn fallback_level(strike: f64, kind: LevelKind) -> Level {
    Level {
        price: strike,
        kind,
        strength: LevelStrength::None,
        rationale: "Nearest OTM strike".to_string(),
    }
}

// ==================== 历史量价位 ====================

/// 历史量价位检测
///
/// 历史收盘价取整到最近的 5 元档位，按档位累计成交量；
/// 仅保留距现价 20% 以内的档位，按量取前 15 个，
/// 再按强度施加最小距离过滤（强 0.5% / 中 1% / 弱 5%），最多 10 个
pub fn historical_volume_levels(bars: &[DailyBar], current_price: f64) -> Vec<Level> {
    if bars.is_empty() || current_price <= 0.0 {
        return Vec::new();
    }

    let mut bins: HashMap<i64, f64> = HashMap::new();
    for day in bars {
        if let Some(price) = day.closing_price() {
            let bin = (price / PRICE_BIN_WIDTH).round() as i64;
            *bins.entry(bin).or_insert(0.0) += day.total_volume as f64;
        }
    }

    let mut binned: Vec<(f64, f64)> = bins
        .into_iter()
        .map(|(bin, volume)| (bin as f64 * PRICE_BIN_WIDTH, volume))
        .filter(|(price, _)| {
            (price - current_price).abs() / current_price * 100.0 <= MAX_DISTANCE_PCT
        })
        .collect();

    // 按档位成交量降序取前 15
    binned.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap());
    binned.truncate(15);

    let mut levels = Vec::new();
    for (price, volume) in binned {
        let strength = if volume > current_price * 5000.0 {
            LevelStrength::Strong
        } else if volume > current_price * 1000.0 {
            LevelStrength::Medium
        } else {
            LevelStrength::Weak
        };

        // 弱价位离现价太近只会制造噪音，按强度设最小距离
        let min_distance_pct = match strength {
            LevelStrength::Strong => 0.5,
            LevelStrength::Medium => 1.0,
            _ => 5.0,
        };
        let distance_pct = (price - current_price).abs() / current_price * 100.0;
        if distance_pct < min_distance_pct {
            continue;
        }

        let kind = if price < current_price {
            LevelKind::Support
        } else {
            LevelKind::Resistance
        };
        levels.push(Level {
            price,
            kind,
            strength,
            rationale: "Historical Volume Level".to_string(),
        });
        if levels.len() >= 10 {
            break;
        }
    }

    levels
}

// ==================== 心理价位 ====================

/// 心理价位检测
///
/// 收录标的用静态表，其余按现价 ±20% 生成整数关口
/// （低价标的步长 50，其余 100），并剔除距现价最近的一档
pub fn psychological_levels(
    symbol: &str,
    current_price: f64,
    table: &PsychLevelTable,
) -> Vec<Level> {
    if current_price <= 0.0 {
        return Vec::new();
    }

    let candidates: Vec<f64> = match table.lookup(symbol) {
        Some(rows) => rows.to_vec(),
        None => generate_round_levels(current_price),
    };

    candidates
        .into_iter()
        .filter(|price| (price - current_price).abs() / current_price * 100.0 <= MAX_DISTANCE_PCT)
        .filter(|price| *price != current_price)
        .map(|price| Level {
            price,
            kind: if price < current_price {
                LevelKind::Support
            } else {
                LevelKind::Resistance
            },
            strength: LevelStrength::Medium,
            rationale: "Psychological Level".to_string(),
        })
        .collect()
}

/// 未收录标的的整数关口生成
fn generate_round_levels(current_price: f64) -> Vec<f64> {
    let step = if current_price < 1000.0 { 50.0 } else { 100.0 };
    let low = current_price * (1.0 - MAX_DISTANCE_PCT / 100.0);
    let high = current_price * (1.0 + MAX_DISTANCE_PCT / 100.0);

    // 距现价最近的一档不算关口
    let nearest = (current_price / step).round() * step;

    let mut levels = Vec::new();
    let mut price = (low / step).ceil() * step;
    while price <= high {
        if price != nearest {
            levels.push(price);
        }
        price += step;
    }
    levels
}

// ==================== 合并 ====================

/// 合并一侧的全部候选：精确价位去重（保留首个），
/// 按距现价由近到远排序，截断为最终数量
fn merge_levels(candidates: Vec<Level>, current_price: f64) -> Vec<Level> {
    let mut seen: Vec<f64> = Vec::new();
    let mut unique: Vec<Level> = Vec::new();

    for level in candidates {
        let rounded = (level.price * 100.0).round() / 100.0;
        if seen.contains(&rounded) {
            continue;
        }
        seen.push(rounded);
        unique.push(level);
    }

    unique.sort_by(|a, b| {
        let da = (a.price - current_price).abs();
        let db = (b.price - current_price).abs();
        da.partial_cmp(&db).unwrap()
    });
    unique.truncate(MAX_LEVELS_PER_SIDE);
    unique
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agg(strike: f64, call_oi: u64, put_oi: u64) -> StrikeAggregate {
        StrikeAggregate {
            strike,
            call_oi,
            put_oi,
            call_volume: 0,
            put_volume: 0,
        }
    }

    fn bar(close: f64, volume: u64) -> DailyBar {
        DailyBar {
            date: "2025-07-01".to_string(),
            total_volume: volume,
            last_price: Some(close),
            timestamp: 0,
            high: None,
            low: None,
            close: Some(close),
        }
    }

    /// 测试持仓比阻力位判定与强度
    #[test]
    fn test_oi_resistance_classification() {
        println!("\n========== 测试持仓比阻力位 ==========");
        let strikes = vec![
            agg(95.0, 2_000, 40_000),
            agg(100.0, 10_000, 10_000),
            agg(105.0, 60_000, 30_000),  // 比值 2.0 -> MEDIUM
            agg(110.0, 2_500_000, 50_000), // 比值 50 -> STRONG
            agg(115.0, 20_000, 1_000),   // 主侧不足 30,000，不入选
        ];
        let (supports, resistances) = oi_ratio_levels(&strikes, 100.0, false);

        assert_eq!(resistances.len(), 2);
        assert_eq!(resistances[0].price, 105.0);
        assert_eq!(resistances[0].strength, LevelStrength::Medium);
        assert_eq!(resistances[1].price, 110.0);
        assert_eq!(resistances[1].strength, LevelStrength::Strong);

        assert_eq!(supports.len(), 1);
        assert_eq!(supports[0].price, 95.0);
        // 比值 20 >= 4 -> STRONG
        assert_eq!(supports[0].strength, LevelStrength::Strong);
        println!("✅ 持仓比阻力位测试通过！");
    }

    /// 测试对侧持仓为 0：比值视为无穷大，按主侧门槛入选并给强级
    #[test]
    fn test_oi_zero_opposite_guard() {
        println!("\n========== 测试对侧零持仓保护 ==========");
        let strikes = vec![agg(95.0, 0, 35_000), agg(105.0, 40_000, 0)];
        let (supports, resistances) = oi_ratio_levels(&strikes, 100.0, false);
        assert_eq!(resistances.len(), 1);
        assert_eq!(resistances[0].price, 105.0);
        assert_eq!(resistances[0].strength, LevelStrength::Strong);
        assert_eq!(supports.len(), 1);
        assert_eq!(supports[0].price, 95.0);
        assert_eq!(supports[0].strength, LevelStrength::Strong);
        println!("✅ 零持仓保护测试通过！");
    }

    /// 测试无候选时回退到最近虚值行权价
    #[test]
    fn test_otm_fallback() {
        println!("\n========== 测试虚值回退 ==========");
        let strikes = vec![agg(90.0, 100, 200), agg(110.0, 100, 200)];
        let (supports, resistances) = oi_ratio_levels(&strikes, 100.0, true);
        assert_eq!(resistances.len(), 1);
        assert_eq!(resistances[0].price, 110.0);
        assert_eq!(resistances[0].strength, LevelStrength::None);
        assert_eq!(supports[0].price, 90.0);

        // 关闭回退后两侧都为空
        let (supports, resistances) = oi_ratio_levels(&strikes, 100.0, false);
        assert!(supports.is_empty() && resistances.is_empty());
        println!("✅ 虚值回退测试通过！");
    }

    /// 测试历史量价位的档位聚合与距离过滤
    #[test]
    fn test_historical_volume_levels() {
        println!("\n========== 测试历史量价位 ==========");
        let mut bars = Vec::new();
        // 95 档聚合大量成交（97 取整到 95）
        for _ in 0..10 {
            bars.push(bar(95.0, 600_000));
            bars.push(bar(97.0, 600_000));
        }
        // 远离现价 20% 以上的档位应被剔除
        bars.push(bar(200.0, 9_999_999));
        let levels = historical_volume_levels(&bars, 100.0);

        assert_eq!(levels.len(), 1);
        assert_eq!(levels[0].price, 95.0);
        // 12,000,000 > 100 × 5,000 × ... 实际阈值 500,000 -> STRONG
        assert_eq!(levels[0].strength, LevelStrength::Strong);
        assert!(levels.iter().all(|l| l.price != 200.0));
        println!("✅ 历史量价位测试通过！");
    }

    /// 测试弱价位的最小距离过滤
    #[test]
    fn test_weak_level_distance_filter() {
        println!("\n========== 测试弱价位距离过滤 ==========");
        // 100 档成交量很小 -> WEAK，距现价 0% < 5%，应被滤掉
        let bars = vec![bar(100.0, 1_000)];
        let levels = historical_volume_levels(&bars, 100.0);
        assert!(levels.is_empty());
        println!("✅ 距离过滤测试通过！");
    }

    /// 测试心理价位查表与生成
    #[test]
    fn test_psychological_levels() {
        println!("\n========== 测试心理价位 ==========");
        let table = PsychLevelTable::default();

        // 收录标的查表，且只保留 ±20% 内
        let levels = psychological_levels("NIFTY", 24_800.0, &table);
        assert!(levels.iter().any(|l| l.price == 25_000.0));
        assert!(levels.iter().all(|l| l.strength == LevelStrength::Medium));

        // 未收录标的生成整数关口，剔除最近一档
        let levels = psychological_levels("UNKNOWN", 2_000.0, &table);
        assert!(!levels.is_empty());
        assert!(levels.iter().all(|l| l.price % 100.0 == 0.0));
        assert!(levels.iter().all(|l| l.price != 2_000.0));

        // 低价标的步长 50
        let levels = psychological_levels("SMALLCAP", 400.0, &table);
        assert!(levels.iter().any(|l| l.price % 100.0 != 0.0));
        println!("✅ 心理价位测试通过！");
    }

    /// 测试生成器确定性：同一输入两次结果一致
    #[test]
    fn test_generator_deterministic() {
        println!("\n========== 测试生成确定性 ==========");
        let a = generate_round_levels(1_234.0);
        let b = generate_round_levels(1_234.0);
        assert_eq!(a, b);
        println!("✅ 确定性测试通过！");
    }

    /// 测试合并去重：不同生成器同价位只保留一个
    #[test]
    fn test_merge_dedupe() {
        println!("\n========== 测试合并去重 ==========");
        let table = PsychLevelTable::default();
        // 行权价 24,500 的持仓比支撑与 NIFTY 心理价位 24,500 重叠
        let strikes = vec![agg(24_500.0, 2_000, 80_000)];
        let bars: Vec<DailyBar> = Vec::new();
        let detected = detect_levels("NIFTY", &strikes, &bars, 24_800.0, &table, false);

        let count = detected
            .supports
            .iter()
            .filter(|l| l.price == 24_500.0)
            .count();
        assert_eq!(count, 1);
        // 首个占位的是持仓比价位，保留其来源说明
        let kept = detected.supports.iter().find(|l| l.price == 24_500.0).unwrap();
        assert!(kept.rationale.contains("Put OI"));
        println!("✅ 合并去重测试通过！");
    }

    /// 测试每侧最多 2 个且按距现价由近到远
    #[test]
    fn test_merge_truncation_and_order() {
        println!("\n========== 测试合并截断与排序 ==========");
        let table = PsychLevelTable::default();
        let strikes = vec![
            agg(24_000.0, 2_000, 90_000),
            agg(24_300.0, 2_000, 80_000),
            agg(24_500.0, 2_000, 70_000),
        ];
        let detected = detect_levels("NIFTY", &strikes, &[], 24_800.0, &table, false);
        assert_eq!(detected.supports.len(), 2);
        assert_eq!(detected.supports[0].price, 24_500.0);
        assert_eq!(detected.supports[1].price, 24_300.0);
        println!("✅ 截断与排序测试通过！");
    }
}
