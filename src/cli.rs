use std::path::Path;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use comfy_table::{Cell, Table};
use dialoguer::{Input, Select};

use crate::config::{self, Config};
use crate::core::encoder::{self, TagKind};
use crate::core::{parser, writer};
use crate::models::{Provider, TrackInfo, PROPERTY_SEP};
use crate::sources::{self, MusicSource, SearchResult};

#[derive(Parser)]
#[command(name = "tagfind", about = "网易云音乐 / QQ 音乐 메타데이터 검색 및 태그 기록 도구")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// 디버그 로그 출력
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 지원하는 검색 소스 목록
    Sources,
    /// 키워드로 곡 검색
    Search {
        /// 검색 소스 (cloudmusic, qqmusic)
        source: String,
        /// 검색 키워드
        #[arg(required = true)]
        keywords: Vec<String>,
        /// 페이지 번호 (0부터)
        #[arg(long, default_value_t = 0)]
        page: u32,
        /// 페이지 크기. 없으면 설정 파일 값
        #[arg(long)]
        size: Option<u32>,
        /// 첫 번째 결과만 자세히 출력
        #[arg(long)]
        first: bool,
    },
    /// 곡 상세 정보 조회
    Detail {
        /// 검색 소스 (cloudmusic, qqmusic)
        source: String,
        /// 곡 ID (cloudmusic) 또는 mid (qqmusic)
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// 검색 결과를 골라 파일에 태그 기록
    Export {
        /// 태그를 기록할 오디오 파일
        file: PathBuf,
        /// 검색 소스. 없으면 설정 파일 값
        #[arg(long)]
        source: Option<String>,
        /// 태그 형식 (ape, flac, id3, vorbis). 없으면 확장자로 결정
        #[arg(long)]
        kind: Option<String>,
        /// 검색 키워드. 없으면 파일명에서 추출
        keywords: Vec<String>,
    },
    /// 설정 편집
    Config,
}

pub fn run(cli: Cli) -> Result<()> {
    let cfg = config::load_config();

    match cli.command {
        Some(Commands::Sources) => cmd_sources(),
        Some(Commands::Search {
            source,
            keywords,
            page,
            size,
            first,
        }) => {
            let size = size.unwrap_or(cfg.search.page_size);
            cmd_search(&cfg, &source, &keywords, page, size, first)
        }
        Some(Commands::Detail { source, ids }) => cmd_detail(&cfg, &source, &ids),
        Some(Commands::Export {
            file,
            source,
            kind,
            keywords,
        }) => cmd_export(&cfg, &file, source, kind, keywords),
        Some(Commands::Config) => cmd_config(cfg),
        None => {
            println!("사용법: tagfind <명령어>");
            println!("자세한 정보는 tagfind --help를 실행하세요.");
            Ok(())
        }
    }
}

fn open_source(cfg: &Config, name: &str) -> Result<Box<dyn MusicSource>> {
    let provider: Provider = name.parse()?;
    let source = sources::open(provider, cfg)
        .with_context(|| format!("{} 소스를 열 수 없습니다", provider))?;
    Ok(source)
}

fn as_refs(values: &[String]) -> Vec<&str> {
    values.iter().map(String::as_str).collect()
}

/// 필드 하나를 표 칸으로 바꾼다. 읽기 실패는 그 칸에만 표시한다.
fn cell_text<T>(value: crate::error::Result<T>, show: impl FnOnce(T) -> String) -> String {
    match value {
        Ok(v) => show(v),
        Err(e) => format!("(오류: {})", e),
    }
}

fn or_unknown(value: Option<String>) -> String {
    value.unwrap_or_else(|| "알 수 없음".to_string())
}

fn join_or_unknown(values: Vec<String>) -> String {
    if values.is_empty() {
        "알 수 없음".to_string()
    } else {
        values.join(PROPERTY_SEP)
    }
}

/// 검색 결과 표의 한 줄: 제목, 아티스트, 앨범, 발매일, ID.
fn result_row(result: &dyn SearchResult) -> [String; 5] {
    [
        cell_text(result.song_name(), or_unknown),
        cell_text(result.artists(), join_or_unknown),
        cell_text(result.album(), or_unknown),
        cell_text(result.publish_time(), |t| {
            t.map(|t| t.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "-".to_string())
        }),
        cell_text(result.detail_key(), |k| k.unwrap_or_else(|| "-".to_string())),
    ]
}

/// 선택 목록에 보이는 한 줄 요약.
fn result_label(result: &dyn SearchResult) -> String {
    let [title, artist, album, _, _] = result_row(result);
    format!("{} - {} [{}]", artist, title, album)
}

fn cmd_sources() -> Result<()> {
    let mut table = Table::new();
    table.set_header(vec!["이름", "설명"]);
    for provider in Provider::ALL {
        table.add_row(vec![
            Cell::new(provider.name()),
            Cell::new(provider.description()),
        ]);
    }
    println!("{table}");
    Ok(())
}

fn cmd_search(
    cfg: &Config,
    source: &str,
    keywords: &[String],
    page: u32,
    size: u32,
    first: bool,
) -> Result<()> {
    let client = open_source(cfg, source)?;
    let results = client
        .search(&as_refs(keywords), page, size)
        .context("검색에 실패했습니다")?;

    if results.is_empty() {
        println!("검색 결과가 없습니다.");
        return Ok(());
    }

    if first {
        println!("{}", TrackInfo::from_result(results[0].as_ref())?);
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["#", "제목", "아티스트", "앨범", "발매일", "ID"]);

    for (i, result) in results.iter().enumerate() {
        let mut row = vec![Cell::new(i + 1)];
        row.extend(result_row(result.as_ref()).into_iter().map(Cell::new));
        table.add_row(row);
    }

    println!("{table}");
    println!("\n총 {}건 ({} 페이지 {})", results.len(), client.provider(), page);
    Ok(())
}

fn cmd_detail(cfg: &Config, source: &str, ids: &[String]) -> Result<()> {
    let client = open_source(cfg, source)?;
    let details = client
        .details(&as_refs(ids))
        .context("상세 정보 조회에 실패했습니다")?;

    if details.is_empty() {
        println!("결과가 없습니다.");
        return Ok(());
    }
    for detail in &details {
        println!("{}", TrackInfo::from_detail(detail.as_ref())?);
    }
    Ok(())
}

fn cmd_export(
    cfg: &Config,
    file: &Path,
    source: Option<String>,
    kind: Option<String>,
    keywords: Vec<String>,
) -> Result<()> {
    if !file.is_file() {
        bail!("파일을 찾을 수 없습니다: {}", file.display());
    }

    let kind = match kind.or_else(|| cfg.export.kind.clone()) {
        Some(name) => name.parse::<TagKind>()?,
        None => TagKind::from_path(file)?,
    };
    let keywords = if keywords.is_empty() {
        parser::keywords_from_path(file)
    } else {
        keywords
    };
    if keywords.is_empty() {
        bail!("파일명에서 검색어를 만들 수 없습니다. 키워드를 직접 입력하세요.");
    }

    let source = source.unwrap_or_else(|| cfg.search.source.clone());
    let client = open_source(cfg, &source)?;

    println!("검색 중: {}", keywords.join(" "));
    let results = client
        .search(&as_refs(&keywords), 0, cfg.search.page_size)
        .context("검색에 실패했습니다")?;
    if results.is_empty() {
        println!("검색 결과가 없습니다.");
        return Ok(());
    }

    let mut items: Vec<String> = results.iter().map(|r| result_label(r.as_ref())).collect();
    items.push("취소".to_string());

    let selection = Select::new()
        .with_prompt("트랙을 선택하세요")
        .items(&items)
        .default(0)
        .interact()?;
    if selection >= results.len() {
        println!("취소했습니다.");
        return Ok(());
    }

    let chosen = results[selection].as_ref();
    let record = match client
        .get_detail(chosen)
        .context("상세 정보 조회에 실패했습니다")?
    {
        Some(detail) => TrackInfo::from_detail(detail.as_ref())?,
        None => TrackInfo::from_result(chosen)?,
    };

    let cover = match record.cover_url {
        Some(_) => match client.fetch_cover(&record) {
            Ok(data) => {
                println!("커버 이미지를 다운로드했습니다.");
                Some(data)
            }
            Err(e) => {
                println!("커버 이미지 다운로드 실패: {}", e);
                None
            }
        },
        None => None,
    };

    let container = encoder::encode(&record, kind, cover.as_deref())?;
    writer::write_tags(file, &container)
        .with_context(|| format!("태그를 기록할 수 없습니다: {}", file.display()))?;

    println!("{} 태그가 적용되었습니다: {}", kind, file.display());
    println!("  {}", record.summary());
    Ok(())
}

fn cmd_config(mut cfg: Config) -> Result<()> {
    println!("tagfind 설정 ({})\n", config::config_path().display());

    cfg.http.user_agent = Input::new()
        .with_prompt("User-Agent")
        .with_initial_text(cfg.http.user_agent.clone())
        .interact_text()?;

    cfg.http.timeout_secs = Input::new()
        .with_prompt("요청 제한 시간 (초)")
        .default(cfg.http.timeout_secs)
        .interact_text()?;

    cfg.search.page_size = Input::new()
        .with_prompt("검색 결과 수")
        .default(cfg.search.page_size)
        .interact_text()?;

    let names: Vec<&str> = Provider::ALL.iter().map(|p| p.name()).collect();
    let current = names
        .iter()
        .position(|n| *n == cfg.search.source)
        .unwrap_or(0);
    let selection = Select::new()
        .with_prompt("기본 검색 소스")
        .items(&names)
        .default(current)
        .interact()?;
    cfg.search.source = names[selection].to_string();

    let kind: String = Input::new()
        .with_prompt("기본 태그 형식 (비우면 확장자로 결정)")
        .with_initial_text(cfg.export.kind.clone().unwrap_or_default())
        .allow_empty(true)
        .interact_text()?;
    cfg.export.kind = match kind.trim() {
        "" => None,
        name => Some(name.parse::<TagKind>()?.name().to_string()),
    };

    config::save_config(&cfg)?;
    println!("\n설정이 저장되었습니다!");
    Ok(())
}
