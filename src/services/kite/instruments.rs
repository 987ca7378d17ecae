//! Kite 合约主表与期权链选择
//!
//! 合约主表为 CSV 全量下载（NSE/NFO 合计数十万行），
//! 服务实例内缓存，避免一次请求内重复下载

use std::collections::HashMap;

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use reqwest::Client;

use crate::models::{Instrument, KiteQuote};
use super::common::{KITE_API_VERSION, KITE_INSTRUMENTS_API};
use super::quotes::get_quotes;

/// Kite 数据服务
///
/// 封装行情与合约主表的获取逻辑
///
/// ## 功能
/// - 合约主表：CSV 全量下载并缓存
/// - 期权链选择：筛选标的最近到期日的全部 CE/PE
/// - 实时行情：单个或批量合约
pub struct KiteService {
    /// HTTP 客户端
    client: Client,
    /// API Key
    api_key: String,
    /// 访问令牌
    access_token: String,
    /// 合约主表缓存
    instruments_cache: Option<Vec<Instrument>>,
}

impl KiteService {
    /// 创建新的 Kite 服务实例
    pub fn new(api_key: String, access_token: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            access_token,
            instruments_cache: None,
        }
    }

    /// 批量获取实时行情
    pub async fn get_quotes(
        &self,
        instruments: &[String],
    ) -> Result<HashMap<String, KiteQuote>> {
        get_quotes(&self.client, &self.api_key, &self.access_token, instruments).await
    }

    /// 获取合约主表（带缓存）
    pub async fn get_instruments(&mut self) -> Result<Vec<Instrument>> {
        if let Some(ref cache) = self.instruments_cache {
            return Ok(cache.clone());
        }

        println!("📡 下载合约主表: {}", KITE_INSTRUMENTS_API);
        let response = self
            .client
            .get(KITE_INSTRUMENTS_API)
            .header("X-Kite-Version", KITE_API_VERSION)
            .header(
                "Authorization",
                format!("token {}:{}", self.api_key, self.access_token),
            )
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!("下载合约主表失败: {}", response.status()));
        }

        let text = response.text().await?;
        let instruments = parse_instruments_csv(&text);
        println!("📥 解析到 {} 条 NSE/NFO 合约", instruments.len());

        self.instruments_cache = Some(instruments.clone());
        Ok(instruments)
    }
}

/// 解析合约主表 CSV
///
/// 列顺序：instrument_token, exchange_token, tradingsymbol, name,
/// last_price, expiry, strike, tick_size, lot_size, instrument_type,
/// segment, exchange
///
/// 只保留 NSE/NFO 两个交易所的行；单行解析失败跳过，不中断整表
fn parse_instruments_csv(text: &str) -> Vec<Instrument> {
    let mut instruments = Vec::new();

    for line in text.lines().skip(1) {
        let fields = split_csv_line(line);
        if fields.len() < 12 {
            continue;
        }

        let exchange = fields[11].as_str();
        if exchange != "NSE" && exchange != "NFO" {
            continue;
        }

        let instrument_token = match fields[0].parse::<u64>() {
            Ok(token) => token,
            Err(_) => continue,
        };
        let expiry = if fields[5].is_empty() {
            None
        } else {
            Some(fields[5].clone())
        };

        instruments.push(Instrument {
            instrument_token,
            tradingsymbol: fields[2].clone(),
            name: fields[3].clone(),
            expiry,
            strike: fields[6].parse().unwrap_or(0.0),
            instrument_type: fields[9].clone(),
            exchange: exchange.to_string(),
        });
    }

    instruments
}

/// 拆分单行 CSV（name 列可能带引号包裹逗号）
fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in line.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(current.clone());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}

/// 选择标的最近到期日的期权链
///
/// # 参数
/// - instruments: 合约主表
/// - underlying_name: 标的名称（主表 name 列）
/// - today: 当日日期（已到期的合约剔除）
///
/// 返回最近到期日与该到期日按行权价升序的全部 CE/PE
pub fn select_option_chain(
    instruments: &[Instrument],
    underlying_name: &str,
    today: NaiveDate,
) -> Result<(NaiveDate, Vec<Instrument>)> {
    let name_upper = underlying_name.to_uppercase();

    let mut options: Vec<(NaiveDate, &Instrument)> = instruments
        .iter()
        .filter(|inst| {
            (inst.instrument_type == "CE" || inst.instrument_type == "PE")
                && inst.name.to_uppercase() == name_upper
        })
        .filter_map(|inst| {
            let expiry = inst.expiry.as_deref()?;
            let date = NaiveDate::parse_from_str(expiry, "%Y-%m-%d").ok()?;
            (date >= today).then_some((date, inst))
        })
        .collect();

    if options.is_empty() {
        return Err(anyhow!("未找到 {} 的期权合约", underlying_name));
    }

    let nearest_expiry = options.iter().map(|(date, _)| *date).min().unwrap();
    options.retain(|(date, _)| *date == nearest_expiry);

    let mut chain: Vec<Instrument> = options.into_iter().map(|(_, inst)| inst.clone()).collect();
    chain.sort_by(|a, b| a.strike.partial_cmp(&b.strike).unwrap());

    Ok((nearest_expiry, chain))
}
