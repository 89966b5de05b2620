use crate::core::error::{AnalysisError, AnalysisResult};
use crate::report::model::SectionKey;
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct Configuration {
    pub storage: StorageConfig,
    pub report: ReportConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    pub capture_dir: PathBuf,
    pub report_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportConfig {
    // 空ならすべてのセクション
    pub sections: Vec<SectionKey>,
    pub statistics_scope: StatisticsScope,
    pub filter_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: LevelFilter,
    pub file: Option<PathBuf>,
}

// 統計とグラフの集計対象
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatisticsScope {
    #[default]
    Capture,
    Filtered,
}

impl FromStr for StatisticsScope {
    type Err = AnalysisError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "capture" => Ok(StatisticsScope::Capture),
            "filtered" => Ok(StatisticsScope::Filtered),
            other => Err(AnalysisError::Config(format!(
                "無効な統計対象: {} (capture または filtered)",
                other
            ))),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            capture_dir: PathBuf::from("json_files"),
            report_dir: PathBuf::from("reports"),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            sections: Vec::new(),
            statistics_scope: StatisticsScope::Capture,
            filter_file: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LevelFilter::Info,
            file: Some(PathBuf::from("application.log")),
        }
    }
}

impl Configuration {
    pub fn from_env() -> AnalysisResult<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> AnalysisResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let storage_defaults = StorageConfig::default();
        let logging_defaults = LoggingConfig::default();

        Ok(Configuration {
            storage: StorageConfig {
                capture_dir: lookup("PCAP_JSON_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(storage_defaults.capture_dir),
                report_dir: lookup("PCAP_REPORT_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(storage_defaults.report_dir),
            },
            report: ReportConfig {
                sections: match lookup("REPORT_SECTIONS") {
                    Some(list) => parse_section_list(&list)?,
                    None => Vec::new(),
                },
                statistics_scope: lookup("REPORT_STATISTICS_SCOPE")
                    .map(|scope| scope.parse::<StatisticsScope>())
                    .transpose()?
                    .unwrap_or_default(),
                filter_file: lookup("PCAP_FILTER_FILE")
                    .filter(|path| !path.trim().is_empty())
                    .map(PathBuf::from),
            },
            logging: LoggingConfig {
                level: match lookup("LOG_LEVEL") {
                    Some(level) => level.trim().parse::<LevelFilter>().map_err(|_| {
                        AnalysisError::Config(format!("無効なログレベル: {}", level))
                    })?,
                    None => logging_defaults.level,
                },
                // 空文字ならファイル出力なし
                file: match lookup("LOG_FILE") {
                    Some(path) if path.trim().is_empty() => None,
                    Some(path) => Some(PathBuf::from(path)),
                    None => logging_defaults.file,
                },
            },
        })
    }
}

fn parse_section_list(list: &str) -> AnalysisResult<Vec<SectionKey>> {
    list.split(',')
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(|key| {
            key.parse::<SectionKey>().map_err(|_| {
                AnalysisError::Config(format!("REPORT_SECTIONS に不明なセクションがあります: {}", key))
            })
        })
        .collect()
}
