use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("ロガーのセットアップに失敗しました: {0}")]
    Logger(String),

    #[error("フィルタ値が不正です ({field}): {value}")]
    InvalidFilterValue { field: &'static str, value: String },

    #[error("不明なレポートセクションです: {0}")]
    UnknownSection(String),

    #[error("キャプチャが見つかりません: {0}")]
    CaptureNotFound(String),

    #[error("不正なキャプチャ名です: {0}")]
    InvalidCaptureName(String),

    #[error("入出力エラー: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSONエラー: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSVエラー: {0}")]
    Csv(#[from] csv::Error),

    #[error("タスク実行エラー: {0}")]
    Task(String),
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;

// 集計の一部の観点からだけ除外されたレコード
// 集計全体は中断しない
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("パケット #{packet_number} を {view} の集計から除外しました: {reason}")]
pub struct MalformedRecord {
    pub packet_number: u64,
    pub view: &'static str,
    pub reason: String,
}

impl MalformedRecord {
    pub fn new(packet_number: u64, view: &'static str, reason: impl Into<String>) -> Self {
        Self {
            packet_number,
            view,
            reason: reason.into(),
        }
    }
}

impl AnalysisError {
    pub fn invalid_filter(field: &'static str, value: &str) -> Self {
        AnalysisError::InvalidFilterValue {
            field,
            value: value.to_string(),
        }
    }
}
