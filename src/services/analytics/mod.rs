//! 期权分析核心
//!
//! 纯计算管线：把单一到期日的期权快照与滚动日线历史
//! 变换为交易决策指标
//!
//! ## 模块
//! - options_chain: 期权链聚合（PCR、最大痛点、虚值峰值）
//! - levels: 支撑/阻力位检测（持仓比 / 历史量 / 心理位）
//! - sentiment: 多因子市场情绪评分
//! - money_flow: 资金流向（累积/派发）分析
//! - rsi: RSI 指标
//! - volume: 标的成交量指标
//! - pipeline: 管线编排（核心唯一入口）
//!
//! 所有函数都是输入的确定性函数：不访问网络、不读进程时钟、
//! 不修改输入集合，同一标的的并发分析互不影响

pub mod levels;
pub mod money_flow;
pub mod options_chain;
pub mod pipeline;
pub mod rsi;
pub mod sentiment;
pub mod volume;

pub use levels::PsychLevelTable;
pub use pipeline::{analyze, AnalysisInput};
