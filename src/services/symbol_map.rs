//! 标的映射表
//!
//! 从本地工作簿（stocks 表）读取标的映射：
//! 展示名 → 行情交易代码 → 标的合约 token
//!
//! 首次加载后缓存在服务实例内，表可整体替换而不触及算法

use anyhow::{anyhow, Result};
use calamine::{open_workbook_auto, Data, Reader};
use std::path::Path;

use crate::models::SymbolMapping;

/// 标的映射服务
#[derive(Debug, Clone)]
pub struct SymbolMap {
    mappings: Vec<SymbolMapping>,
}

impl SymbolMap {
    /// 从工作簿加载映射表
    ///
    /// 列顺序：A 展示名、B 交易代码、C 标的 token；
    /// token 无法解析的行（含表头）直接跳过
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut workbook = open_workbook_auto(&path)
            .map_err(|e| anyhow!("打开映射工作簿失败: {}", e))?;
        let range = workbook
            .worksheet_range("stocks")
            .map_err(|e| anyhow!("读取 stocks 表失败: {}", e))?;

        let mut mappings = Vec::new();
        for row in range.rows() {
            let name = cell_string(row.get(0));
            let tradingsymbol = cell_string(row.get(1));
            let instrument_token = cell_u64(row.get(2));

            if name.is_empty() || tradingsymbol.is_empty() || instrument_token == 0 {
                continue;
            }
            mappings.push(SymbolMapping {
                name: name.to_uppercase(),
                tradingsymbol,
                instrument_token,
            });
        }

        if mappings.is_empty() {
            return Err(anyhow!("映射工作簿为空"));
        }
        log::info!("加载标的映射 {} 条", mappings.len());
        Ok(Self { mappings })
    }

    /// 按展示名查找（大小写不敏感）
    pub fn find(&self, symbol: &str) -> Option<&SymbolMapping> {
        let upper = symbol.to_uppercase();
        self.mappings.iter().find(|m| m.name == upper)
    }

    /// 全部映射
    pub fn all(&self) -> &[SymbolMapping] {
        &self.mappings
    }
}

/// 单元格转字符串
fn cell_string(cell: Option<&Data>) -> String {
    match cell {
        Some(Data::String(s)) => s.trim().to_string(),
        Some(Data::Float(f)) => format!("{}", f),
        Some(Data::Int(i)) => format!("{}", i),
        _ => String::new(),
    }
}

/// 单元格转 token（数值或数字字符串）
fn cell_u64(cell: Option<&Data>) -> u64 {
    match cell {
        Some(Data::Float(f)) if *f >= 0.0 => *f as u64,
        Some(Data::Int(i)) if *i >= 0 => *i as u64,
        Some(Data::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}
