//! 公共常量和辅助函数

use chrono::{DateTime, Timelike, Utc};
use chrono_tz::Asia::Kolkata;
use chrono_tz::Tz;

// ==================== Kite API 常量 ====================

/// Kite 实时行情 API
pub const KITE_QUOTE_API: &str = "https://api.kite.trade/quote";
/// Kite 合约主表（CSV 全量下载）
pub const KITE_INSTRUMENTS_API: &str = "https://api.kite.trade/instruments";
/// Kite API 版本头
pub const KITE_API_VERSION: &str = "3";
/// 单次行情请求的合约数上限
pub const KITE_QUOTE_BATCH: usize = 500;

// ==================== 交易时段 ====================

/// NSE 开盘时间（分钟数，09:15）
const MARKET_OPEN_MINUTES: u32 = 9 * 60 + 15;
/// NSE 收盘时间（分钟数，15:30）
const MARKET_CLOSE_MINUTES: u32 = 15 * 60 + 30;

/// 获取印度标准时间
pub fn get_ist_time() -> DateTime<Tz> {
    Utc::now().with_timezone(&Kolkata)
}

/// 判断给定时刻是否处于 NSE 交易时段（09:15 - 15:30 IST）
///
/// 时刻由调用方显式传入，核心计算不读取进程时钟
pub fn is_market_open(now: &DateTime<Tz>) -> bool {
    let minutes = now.hour() * 60 + now.minute();
    minutes >= MARKET_OPEN_MINUTES && minutes <= MARKET_CLOSE_MINUTES
}

/// 交易时段进度，[0, 1]
///
/// 开盘前为 0，收盘后为 1
pub fn session_progress(now: &DateTime<Tz>) -> f64 {
    let minutes = now.hour() * 60 + now.minute();
    let passed = minutes.saturating_sub(MARKET_OPEN_MINUTES) as f64;
    let total = (MARKET_CLOSE_MINUTES - MARKET_OPEN_MINUTES) as f64;
    (passed / total).min(1.0)
}
