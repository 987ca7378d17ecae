//! Kite 实时行情获取
//!
//! 对应 Kite Connect 的 /quote 接口，一次可查多个合约；
//! 行情中缺失的持仓量/成交量字段由调用方按 0 处理

use std::collections::HashMap;

use anyhow::{anyhow, Result};
use reqwest::Client;
use url::Url;

use crate::models::KiteQuote;
use super::common::{KITE_API_VERSION, KITE_QUOTE_API, KITE_QUOTE_BATCH};

/// 批量获取实时行情
///
/// # 参数
/// - instruments: "交易所:代码" 形式的合约标识（如 NSE:RELIANCE、NFO:NIFTY25AUG24000CE）
///
/// 超过单次上限时自动分批；部分合约无行情属正常情况，
/// 返回的 map 中直接缺失对应键
pub async fn get_quotes(
    client: &Client,
    api_key: &str,
    access_token: &str,
    instruments: &[String],
) -> Result<HashMap<String, KiteQuote>> {
    let mut quotes = HashMap::new();

    for batch in instruments.chunks(KITE_QUOTE_BATCH) {
        let mut url = Url::parse(KITE_QUOTE_API)?;
        {
            let mut pairs = url.query_pairs_mut();
            for instrument in batch {
                pairs.append_pair("i", instrument);
            }
        }
        println!("📡 请求实时行情，合约数: {}", batch.len());

        let response = client
            .get(url)
            .header("X-Kite-Version", KITE_API_VERSION)
            .header(
                "Authorization",
                format!("token {}:{}", api_key, access_token),
            )
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::FORBIDDEN {
            return Err(anyhow!("TokenException: Kite token has expired"));
        }
        if !response.status().is_success() {
            return Err(anyhow!("获取行情失败: {}", response.status()));
        }

        let body: serde_json::Value = response.json().await?;
        if body["status"].as_str() != Some("success") {
            let error_type = body["error_type"].as_str().unwrap_or("UnknownError");
            return Err(anyhow!("{}: {}", error_type, body["message"]));
        }

        if let Some(data) = body["data"].as_object() {
            println!("📥 返回行情 {} 条", data.len());
            for (key, value) in data {
                match serde_json::from_value::<KiteQuote>(value.clone()) {
                    Ok(quote) => {
                        quotes.insert(key.clone(), quote);
                    }
                    Err(e) => {
                        log::warn!("解析 {} 行情失败: {}", key, e);
                    }
                }
            }
        }
    }

    Ok(quotes)
}
