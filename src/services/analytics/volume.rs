//! 标的成交量指标
//!
//! 基于滚动日线窗口计算：
//! - 20 日平均成交量（不含当日）
//! - 当日成交量占均量百分比
//! - 按交易时段进度折算的全日成交量估计

use chrono::DateTime;
use chrono_tz::Tz;

use crate::models::{DailyBar, VolumeMetrics};
use crate::services::kite::common::session_progress;

/// 计算成交量指标
///
/// # 参数
/// - bars: 日线历史（可能含当日条目，按日期剔除）
/// - today_volume: 当日累计成交量
/// - now: 求值时刻（IST，显式传入）
pub fn calculate_volume_metrics(
    bars: &[DailyBar],
    today_volume: u64,
    now: &DateTime<Tz>,
) -> VolumeMetrics {
    let today = now.format("%Y-%m-%d").to_string();
    let historical: Vec<&DailyBar> = bars.iter().filter(|b| b.date != today).collect();

    let avg_20day_volume = if historical.is_empty() {
        0.0
    } else {
        historical.iter().map(|b| b.total_volume as f64).sum::<f64>() / historical.len() as f64
    };

    let today_volume_percentage = if avg_20day_volume > 0.0 {
        let pct = today_volume as f64 / avg_20day_volume * 100.0;
        (pct * 10.0).round() / 10.0
    } else {
        0.0
    };

    // 按已过交易时段占比折算全日量；开盘前不折算
    let progress = session_progress(now);
    let estimated_today_volume = if progress > 0.0 {
        (today_volume as f64 / progress).round() as u64
    } else {
        today_volume
    };

    VolumeMetrics {
        avg_20day_volume: avg_20day_volume.round() as u64,
        today_volume_percentage,
        estimated_today_volume,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::Asia::Kolkata;

    fn bar(date: &str, volume: u64) -> DailyBar {
        DailyBar {
            date: date.to_string(),
            total_volume: volume,
            last_price: Some(100.0),
            timestamp: 0,
            high: None,
            low: None,
            close: None,
        }
    }

    /// 测试均量排除当日条目
    #[test]
    fn test_average_excludes_today() {
        println!("\n========== 测试均量排除当日 ==========");
        let now = Kolkata.with_ymd_and_hms(2025, 8, 6, 15, 30, 0).unwrap();
        let bars = vec![
            bar("2025-08-04", 100_000),
            bar("2025-08-05", 200_000),
            bar("2025-08-06", 9_999_999), // 当日条目，不计入均量
        ];
        let metrics = calculate_volume_metrics(&bars, 300_000, &now);
        assert_eq!(metrics.avg_20day_volume, 150_000);
        assert_eq!(metrics.today_volume_percentage, 200.0);
        // 收盘时刻进度为 1，估计值等于当日量
        assert_eq!(metrics.estimated_today_volume, 300_000);
        println!("✅ 均量排除当日测试通过！");
    }

    /// 测试无历史时的缺省值
    #[test]
    fn test_no_history() {
        println!("\n========== 测试无历史成交量 ==========");
        let now = Kolkata.with_ymd_and_hms(2025, 8, 6, 12, 0, 0).unwrap();
        let metrics = calculate_volume_metrics(&[], 100_000, &now);
        assert_eq!(metrics.avg_20day_volume, 0);
        assert_eq!(metrics.today_volume_percentage, 0.0);
        println!("✅ 无历史测试通过！");
    }

    /// 测试半场折算：进度约 0.5 时估计值约为当日量两倍
    #[test]
    fn test_session_extrapolation() {
        println!("\n========== 测试时段折算 ==========");
        let now = Kolkata.with_ymd_and_hms(2025, 8, 6, 12, 22, 30).unwrap();
        let metrics = calculate_volume_metrics(&[], 100_000, &now);
        println!("  估计全日量 = {}", metrics.estimated_today_volume);
        assert!(metrics.estimated_today_volume > 190_000);
        assert!(metrics.estimated_today_volume < 210_000);
        println!("✅ 时段折算测试通过！");
    }
}
