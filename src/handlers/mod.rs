pub mod analyze;
pub mod health;
pub mod history;
pub mod symbols;

use actix_web::web;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(health::config)
            .configure(analyze::config)
            .configure(history::config)
            .configure(symbols::config)
    );
}
