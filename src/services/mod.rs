//! 业务逻辑服务模块
//!
//! 封装数据获取和分析计算逻辑

pub mod analytics;      // 期权分析核心（纯计算）
pub mod history_store;  // 日线历史存储
pub mod kite;           // Kite 经纪商数据适配
pub mod symbol_map;     // 标的映射表
