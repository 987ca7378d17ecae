//! 日线历史存储
//!
//! 以 JSON 文件做按标的键控的滚动历史：
//! { "NIFTY": [ {date, total_volume, ...}, ... ], ... }
//!
//! 每个交易日由更新任务写入一条完整 OHLCV，
//! 超过保留窗口（20 个自然日）的旧条目在写入时裁剪；
//! 核心计算只读取，不负责窗口维护

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};

use crate::models::DailyBar;

/// 滚动窗口保留时长（毫秒，20 个自然日）
const RETENTION_MS: i64 = 20 * 24 * 60 * 60 * 1000;

/// 按标的键控的历史映射
pub type HistoryMap = HashMap<String, Vec<DailyBar>>;

/// 日线历史存储
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    /// 创建存储实例（文件可以尚不存在）
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// 读取全部历史
    ///
    /// 文件缺失或损坏时返回空映射——历史不足是预期情况，
    /// 不应让一次分析请求因此失败
    pub fn load(&self) -> HistoryMap {
        match fs::read_to_string(&self.path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(map) => map,
                Err(e) => {
                    log::warn!("历史文件解析失败，按空历史处理: {}", e);
                    HistoryMap::new()
                }
            },
            Err(_) => HistoryMap::new(),
        }
    }

    /// 读取单个标的的历史，按日期升序
    pub fn bars_for(&self, symbol: &str) -> Vec<DailyBar> {
        let map = self.load();
        let mut bars = map.get(&symbol.to_uppercase()).cloned().unwrap_or_default();
        bars.sort_by(|a, b| a.date.cmp(&b.date));
        bars
    }

    /// 写入/覆盖某标的的当日条目并裁剪过期数据
    ///
    /// # 参数
    /// - bar: 当日条目（date 字段决定覆盖哪一天）
    /// - now_ms: 当前时间戳（毫秒，显式传入）
    pub fn upsert_today(&self, symbol: &str, bar: DailyBar, now_ms: i64) -> Result<()> {
        let mut map = self.load();
        let entry = map.entry(symbol.to_uppercase()).or_default();

        entry.retain(|b| b.date != bar.date);
        entry.push(bar);

        let cutoff = now_ms - RETENTION_MS;
        entry.retain(|b| b.timestamp > cutoff);
        entry.sort_by(|a, b| a.date.cmp(&b.date));

        self.save(&map)
    }

    /// 全量写回
    fn save(&self, map: &HistoryMap) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(map)
            .map_err(|e| anyhow!("序列化历史失败: {}", e))?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}
