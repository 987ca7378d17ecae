//! Kite 访问令牌管理
//!
//! 令牌由外部登录脚本写入 kite_token.json，本服务只读；
//! 环境变量 KITE_ACCESS_TOKEN 可覆盖文件

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

use crate::models::TokenStatus;

/// 令牌文件内容
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TokenData {
    /// 访问令牌
    pub access_token: String,
    /// 生成时间（ISO 8601）
    #[serde(default)]
    pub generated_at: Option<String>,
}

/// 加载访问令牌
///
/// 优先级：环境变量 > 令牌文件。两者都缺失时报错，
/// 调用方应将此错误映射为 401
pub fn load_token<P: AsRef<Path>>(path: P) -> Result<TokenData> {
    if let Ok(token) = env::var("KITE_ACCESS_TOKEN") {
        if !token.is_empty() {
            return Ok(TokenData {
                access_token: token,
                generated_at: None,
            });
        }
    }

    let content = fs::read_to_string(&path)
        .map_err(|_| anyhow!("Kite token not found. Please authenticate first."))?;
    let token: TokenData = serde_json::from_str(&content)
        .map_err(|e| anyhow!("令牌文件格式错误: {}", e))?;

    if token.access_token.is_empty() {
        return Err(anyhow!("Kite token not found. Please authenticate first."));
    }
    Ok(token)
}

/// 查询令牌状态（不泄露令牌本身）
pub fn token_status<P: AsRef<Path>>(path: P) -> TokenStatus {
    match load_token(path) {
        Ok(token) => TokenStatus {
            present: true,
            generated_at: token.generated_at,
        },
        Err(_) => TokenStatus {
            present: false,
            generated_at: None,
        },
    }
}
