//! 日线历史接口处理器
//!
//! ## API 列表
//! - GET  /history/{symbol} - 读取单个标的的滚动日线历史
//! - POST /history/update - 为映射表中全部标的写入当日条目
//!
//! 更新端点由外部定时任务在收盘后调用，走同一套 Bearer 认证

use actix_web::{web, HttpResponse, Result};

use crate::config::AppConfig;
use crate::models::{ApiResponse, DailyBar, HistoryUpdateSummary};
use crate::services::history_store::HistoryStore;
use crate::services::kite::common::get_ist_time;
use crate::services::kite::{load_token, KiteService};
use crate::services::symbol_map::SymbolMap;

/// 读取单个标的的日线历史
///
/// GET /api/v1/history/{symbol}
pub async fn get_history(
    config: web::Data<AppConfig>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let symbol = path.into_inner();
    let store = HistoryStore::new(&config.data.history_path);
    let bars = store.bars_for(&symbol);
    Ok(HttpResponse::Ok().json(ApiResponse::success(bars)))
}

/// 为映射表中全部标的写入当日历史条目
///
/// POST /api/v1/history/update
///
/// 单个标的失败只记录告警并继续，返回成功/总数统计
pub async fn update_history(config: web::Data<AppConfig>) -> Result<HttpResponse> {
    let api_key = match std::env::var("KITE_API_KEY") {
        Ok(key) if !key.is_empty() => key,
        _ => {
            let response =
                ApiResponse::<HistoryUpdateSummary>::error("Server configuration error.".to_string());
            return Ok(HttpResponse::InternalServerError().json(response));
        }
    };
    let symbol_map = match SymbolMap::load(&config.data.symbols_path) {
        Ok(map) => map,
        Err(e) => {
            let response = ApiResponse::<HistoryUpdateSummary>::error(e.to_string());
            return Ok(HttpResponse::InternalServerError().json(response));
        }
    };
    let token = match load_token(&config.data.token_path) {
        Ok(token) => token,
        Err(e) => {
            let response = ApiResponse::<HistoryUpdateSummary>::error(e.to_string());
            return Ok(HttpResponse::Unauthorized().json(response));
        }
    };

    let kite = KiteService::new(api_key, token.access_token);
    let keys: Vec<String> = symbol_map.all().iter().map(|m| m.quote_key()).collect();
    let quotes = match kite.get_quotes(&keys).await {
        Ok(quotes) => quotes,
        Err(e) => {
            let response = ApiResponse::<HistoryUpdateSummary>::error(e.to_string());
            return Ok(HttpResponse::InternalServerError().json(response));
        }
    };

    let store = HistoryStore::new(&config.data.history_path);
    let now = get_ist_time();
    let now_ms = now.timestamp_millis();
    let today = now.format("%Y-%m-%d").to_string();

    let mut updated = 0;
    for mapping in symbol_map.all() {
        let quote = match quotes.get(&mapping.quote_key()) {
            Some(quote) => quote,
            None => {
                log::warn!("{} 无行情，跳过历史更新", mapping.name);
                continue;
            }
        };
        let volume = match quote.volume {
            Some(volume) => volume,
            None => {
                log::warn!("{} 行情缺成交量，跳过历史更新", mapping.name);
                continue;
            }
        };

        let bar = DailyBar {
            date: today.clone(),
            total_volume: volume,
            last_price: Some(quote.last_price),
            timestamp: now_ms,
            high: quote.ohlc.map(|o| o.high),
            low: quote.ohlc.map(|o| o.low),
            close: Some(quote.last_price),
        };
        match store.upsert_today(&mapping.name, bar, now_ms) {
            Ok(()) => updated += 1,
            Err(e) => log::warn!("更新 {} 历史失败: {}", mapping.name, e),
        }
    }

    log::info!("历史更新完成: {}/{}", updated, symbol_map.all().len());
    let summary = HistoryUpdateSummary {
        updated,
        total: symbol_map.all().len(),
    };
    Ok(HttpResponse::Ok().json(ApiResponse::success(summary)))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/history/update", web::post().to(update_history));
    cfg.route("/history/{symbol}", web::get().to(get_history));
}
