//! 期权链分析后端服务
//!
//! 提供 NSE/NFO 期权链衍生指标的 RESTful API 服务
//! 指标：PCR、最大痛点、支撑/阻力位、市场情绪、资金流向、RSI
//! 数据来源：Kite Connect 行情接口

mod config;     // 配置加载
mod handlers;   // HTTP 请求处理器
mod middleware; // 中间件
mod models;     // 数据模型定义
mod services;   // 业务逻辑服务

use actix_web::{web, App, HttpServer, middleware::Logger};
use env_logger::Env;
use std::env;

use crate::config::AppConfig;
use crate::middleware::ApiKeyMiddleware;

/// 应用程序入口
///
/// 加载配置并启动 HTTP 服务器
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let config = AppConfig::load();

    // 初始化日志系统，级别来自配置
    env_logger::init_from_env(Env::default().default_filter_or(config.log.level.clone()));

    // 环境变量优先于配置文件中的 API Key
    let api_key = env::var("API_KEY").unwrap_or_else(|_| {
        if config.api.api_key.is_empty() {
            log::warn!("未配置 API Key，接口不启用认证");
        }
        config.api.api_key.clone()
    });

    let bind_addr = config.bind_addr();
    let workers = config.server.workers;
    log::info!("启动期权链分析服务，监听 {}", bind_addr);

    // 创建并启动 HTTP 服务器
    let mut server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(config.clone()))
            .wrap(Logger::default())  // 添加请求日志中间件
            .wrap(ApiKeyMiddleware::new(api_key.clone()))  // Bearer Token 认证
            .configure(handlers::config)  // 配置路由
    });

    if workers > 0 {
        server = server.workers(workers);
    }

    server.bind(bind_addr)?.run().await
}
