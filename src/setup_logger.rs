use crate::core::config::LoggingConfig;
use crate::core::error::{AnalysisError, AnalysisResult};
use env_logger::{Builder, Target};
use std::fs::File;
use std::io::Write;

pub fn setup_logger(config: &LoggingConfig) -> AnalysisResult<()> {
    let mut builder = Builder::new();
    builder
        .filter_level(config.level)
        // タイムスタンプ付きのフォーマット
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] {} - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.target(),
                record.args()
            )
        });

    // ファイル指定がなければ標準出力
    match &config.file {
        Some(path) => {
            let file = File::create(path).map_err(|e| {
                AnalysisError::Logger(format!("{} を開けません: {}", path.display(), e))
            })?;
            builder.target(Target::Pipe(Box::new(file)));
        }
        None => {
            builder.target(Target::Stdout);
        }
    }

    builder
        .try_init()
        .map_err(|e| AnalysisError::Logger(e.to_string()))
}
