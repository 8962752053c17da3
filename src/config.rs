use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// 기본 User-Agent. 网易云音乐 API는 데스크톱 브라우저 요청만 받는다.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HttpConfig {
    pub user_agent: String,
    pub timeout_secs: u64,
    /// QQ 音乐 검색에만 쓰는 User-Agent. 없으면 모바일 기본값.
    pub qqmusic_user_agent: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 15,
            qqmusic_user_agent: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SearchConfig {
    pub page_size: u32,
    /// 소스를 지정하지 않았을 때 쓰는 소스 이름.
    pub source: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            page_size: 10,
            source: "cloudmusic".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ExportConfig {
    /// 태그 종류. 없으면 파일 확장자로 정한다.
    pub kind: Option<String>,
}

pub fn config_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home)
        .join(".config")
        .join("tagfind")
        .join("config.toml")
}

pub fn load_config() -> Config {
    load_from(&config_path())
}

/// 파일이 없거나 읽을 수 없으면 기본 설정을 쓴다.
pub fn load_from(path: &Path) -> Config {
    if !path.exists() {
        return Config::default();
    }
    match std::fs::read_to_string(path) {
        Ok(content) => toml::from_str(&content).unwrap_or_else(|e| {
            log::warn!("설정 파일 해석 실패 ({}): {}", path.display(), e);
            Config::default()
        }),
        Err(e) => {
            log::warn!("설정 파일 읽기 실패 ({}): {}", path.display(), e);
            Config::default()
        }
    }
}

pub fn save_config(config: &Config) -> Result<()> {
    save_to(config, &config_path())
}

pub fn save_to(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("설정 디렉터리 생성 실패: {}", parent.display()))?;
    }
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)
        .with_context(|| format!("설정 파일 저장 실패: {}", path.display()))?;
    Ok(())
}
