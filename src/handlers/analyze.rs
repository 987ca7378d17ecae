//! 期权分析接口处理器
//!
//! 提供分析管线的 HTTP API 端点
//!
//! ## API 列表
//! - POST /analyze - 对单个标的运行完整分析管线
//!
//! 处理器只负责编排外部读取（行情、合约主表、历史存储）
//! 和响应整形，全部指标计算在 services::analytics 中完成

use actix_web::{web, HttpResponse, Result};
use chrono::NaiveDate;

use crate::config::AppConfig;
use crate::models::{
    AnalyzeRequest, AnalysisResult, ApiResponse, DailyBar, OptionType, StrikeQuote, TodayOhlcv,
};
use crate::services::analytics::{analyze, AnalysisInput, PsychLevelTable};
use crate::services::history_store::HistoryStore;
use crate::services::kite::common::get_ist_time;
use crate::services::kite::{load_token, select_option_chain, KiteService};
use crate::services::symbol_map::SymbolMap;

/// 到期日展示格式（dd-Mon-yyyy）
fn format_expiry(date: NaiveDate) -> String {
    date.format("%d-%b-%Y").to_string()
}

/// 对单个标的运行完整分析管线
///
/// POST /api/v1/analyze
///
/// # 参数
/// - symbol: 标的展示名（如 NIFTY、RELIANCE）
///
/// 唯一的致命失败是拿不到可用现价——所有衍生指标都以现价为基准；
/// 历史不足、个别合约缺行情等情况按各模块的降级策略继续
pub async fn analyze_symbol(
    config: web::Data<AppConfig>,
    body: web::Json<AnalyzeRequest>,
) -> Result<HttpResponse> {
    let symbol = body.symbol.trim();
    if symbol.is_empty() {
        let response = ApiResponse::<AnalysisResult>::error("Symbol is required".to_string());
        return Ok(HttpResponse::BadRequest().json(response));
    }

    let api_key = match std::env::var("KITE_API_KEY") {
        Ok(key) if !key.is_empty() => key,
        _ => {
            log::error!("未设置 KITE_API_KEY 环境变量");
            let response =
                ApiResponse::<AnalysisResult>::error("Server configuration error.".to_string());
            return Ok(HttpResponse::InternalServerError().json(response));
        }
    };

    // 标的映射
    let symbol_map = match SymbolMap::load(&config.data.symbols_path) {
        Ok(map) => map,
        Err(e) => {
            let response = ApiResponse::<AnalysisResult>::error(e.to_string());
            return Ok(HttpResponse::InternalServerError().json(response));
        }
    };
    let mapping = match symbol_map.find(symbol) {
        Some(mapping) => mapping.clone(),
        None => {
            let response = ApiResponse::<AnalysisResult>::error(format!(
                "Incomplete data for '{}' in symbol workbook.",
                symbol
            ));
            return Ok(HttpResponse::NotFound().json(response));
        }
    };

    // 访问令牌
    let token = match load_token(&config.data.token_path) {
        Ok(token) => token,
        Err(e) => {
            let response = ApiResponse::<AnalysisResult>::error(e.to_string());
            return Ok(HttpResponse::Unauthorized().json(response));
        }
    };

    let mut kite = KiteService::new(api_key, token.access_token);
    let now = get_ist_time();
    let today = now.date_naive();

    // 合约主表与最近到期日期权链
    let instruments = match kite.get_instruments().await {
        Ok(instruments) => instruments,
        Err(e) => return Ok(upstream_error(e)),
    };
    let (expiry, chain) = match select_option_chain(&instruments, &mapping.name, today) {
        Ok(selected) => selected,
        Err(e) => {
            let response = ApiResponse::<AnalysisResult>::error(e.to_string());
            return Ok(HttpResponse::NotFound().json(response));
        }
    };

    // 标的现价：唯一的致命前置条件
    let underlying_key = mapping.quote_key();
    let underlying_quotes = match kite.get_quotes(&[underlying_key.clone()]).await {
        Ok(quotes) => quotes,
        Err(e) => return Ok(upstream_error(e)),
    };
    let underlying = underlying_quotes.get(&underlying_key);
    let ltp = underlying.map(|q| q.last_price).unwrap_or(0.0);
    if ltp == 0.0 {
        let response = ApiResponse::<AnalysisResult>::error(format!(
            "Could not fetch live price for '{}'.",
            mapping.tradingsymbol
        ));
        return Ok(HttpResponse::NotFound().json(response));
    }
    let underlying_volume = underlying.and_then(|q| q.volume).unwrap_or(0);
    let ohlc = underlying.and_then(|q| q.ohlc);

    // 相对昨收涨跌幅
    let change_percent = match ohlc {
        Some(o) if o.close > 0.0 => (ltp - o.close) / o.close * 100.0,
        _ => 0.0,
    };

    // 期权行情与日线历史相互独立，并发读取
    let option_keys: Vec<String> = chain
        .iter()
        .map(|inst| format!("NFO:{}", inst.tradingsymbol))
        .collect();
    let store = HistoryStore::new(&config.data.history_path);
    let (quote_result, bars) = futures::join!(kite.get_quotes(&option_keys), async {
        store.bars_for(&mapping.name)
    });
    let quote_data = match quote_result {
        Ok(quotes) => quotes,
        Err(e) => return Ok(upstream_error(e)),
    };

    // 构造每腿报价：个别合约缺持仓/成交量按 0 处理，不拖垮整次分析
    let quotes: Vec<StrikeQuote> = chain
        .iter()
        .filter_map(|inst| {
            let option_type = match inst.instrument_type.as_str() {
                "CE" => OptionType::Call,
                "PE" => OptionType::Put,
                _ => return None,
            };
            let quote = quote_data.get(&format!("NFO:{}", inst.tradingsymbol));
            Some(StrikeQuote {
                strike: inst.strike,
                option_type,
                open_interest: quote.and_then(|q| q.oi).unwrap_or(0),
                volume: quote.and_then(|q| q.volume).unwrap_or(0),
                last_price: quote.map(|q| q.last_price).unwrap_or(0.0),
            })
        })
        .collect();

    if quotes.iter().map(|q| q.open_interest).sum::<u64>() == 0 {
        let response = ApiResponse::<AnalysisResult>::error(format!(
            "Found options but no OI data for {}.",
            mapping.name
        ));
        return Ok(HttpResponse::NotFound().json(response));
    }

    // 当日盘中采样
    let today_data = ohlc.map(|o| TodayOhlcv {
        high: o.high,
        low: o.low,
        close: ltp,
        volume: underlying_volume,
    });

    // 写入当日历史条目（失败降级为告警，不影响本次分析）
    let now_ms = now.timestamp_millis();
    let today_bar = DailyBar {
        date: now.format("%Y-%m-%d").to_string(),
        total_volume: underlying_volume,
        last_price: Some(ltp),
        timestamp: now_ms,
        high: ohlc.map(|o| o.high),
        low: ohlc.map(|o| o.low),
        close: Some(ltp),
    };
    if let Err(e) = store.upsert_today(&mapping.name, today_bar, now_ms) {
        log::warn!("更新 {} 当日历史失败: {}", mapping.name, e);
    }

    // 纯计算管线
    let input = AnalysisInput {
        symbol: &mapping.name,
        ltp,
        change_percent,
        expiry_date: format_expiry(expiry),
        quotes: &quotes,
        bars: &bars,
        today: today_data,
        now,
    };
    let result = analyze(&input, &config.analytics, &PsychLevelTable::default());

    Ok(HttpResponse::Ok().json(ApiResponse::success(result)))
}

/// 上游失败映射：令牌过期走 401，其余走 500
fn upstream_error(e: anyhow::Error) -> HttpResponse {
    let message = e.to_string();
    if message.contains("TokenException") {
        let response = ApiResponse::<AnalysisResult>::error(
            "Kite token has expired. Please run the login script again.".to_string(),
        );
        return HttpResponse::Unauthorized().json(response);
    }
    HttpResponse::InternalServerError().json(ApiResponse::<AnalysisResult>::error(message))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/analyze", web::post().to(analyze_symbol));
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 测试到期日展示格式
    #[test]
    fn test_format_expiry() {
        println!("\n========== 测试到期日格式 ==========");
        let date = NaiveDate::from_ymd_opt(2025, 8, 28).unwrap();
        assert_eq!(format_expiry(date), "28-Aug-2025");
        println!("✅ 到期日格式测试通过！");
    }
}
