//! Kite 经纪商数据适配层
//!
//! 封装 Kite Connect 数据接口的获取逻辑
//!
//! ## 数据来源
//! - /quote：标的与期权实时行情（含持仓量、成交量、OHLC）
//! - /instruments：合约主表 CSV 全量下载
//!
//! 纯 I/O 薄层：不做任何指标计算，分析逻辑全部在 analytics 模块

pub mod common;
mod instruments;
mod quotes;
mod token;

pub use instruments::{select_option_chain, KiteService};
pub use quotes::get_quotes;
pub use token::{load_token, token_status, TokenData};
