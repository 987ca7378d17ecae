//! 标的与令牌状态接口处理器
//!
//! ## API 列表
//! - GET /symbols - 获取标的映射表
//! - GET /token/status - 查询 Kite 访问令牌状态

use actix_web::{web, HttpResponse, Result};

use crate::config::AppConfig;
use crate::models::{ApiResponse, SymbolMapping};
use crate::services::kite::token_status;
use crate::services::symbol_map::SymbolMap;

/// 获取标的映射表
///
/// GET /api/v1/symbols
pub async fn list_symbols(config: web::Data<AppConfig>) -> Result<HttpResponse> {
    match SymbolMap::load(&config.data.symbols_path) {
        Ok(map) => {
            let symbols: Vec<SymbolMapping> = map.all().to_vec();
            Ok(HttpResponse::Ok().json(ApiResponse::success(symbols)))
        }
        Err(e) => {
            let response = ApiResponse::<Vec<SymbolMapping>>::error(e.to_string());
            Ok(HttpResponse::InternalServerError().json(response))
        }
    }
}

/// 查询 Kite 访问令牌状态
///
/// GET /api/v1/token/status
pub async fn get_token_status(config: web::Data<AppConfig>) -> Result<HttpResponse> {
    let status = token_status(&config.data.token_path);
    Ok(HttpResponse::Ok().json(ApiResponse::success(status)))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/symbols", web::get().to(list_symbols));
    cfg.route("/token/status", web::get().to(get_token_status));
}
