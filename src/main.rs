use log::{info, warn};
use pcap_insight::core::config::Configuration;
use pcap_insight::core::error::{AnalysisError, AnalysisResult};
use pcap_insight::core::pipeline::{analyze_captures, AnalysisPipeline};
use pcap_insight::filter::FilterRequest;
use pcap_insight::setup_logger::setup_logger;
use pcap_insight::storage::{CaptureRepository, JsonFileRepository};
use std::path::Path;
use std::sync::Arc;

#[tokio::main]
async fn main() -> AnalysisResult<()> {
    let config = Configuration::from_env()?;
    setup_logger(&config.logging)?;

    // フィルタ条件の読み込み (未指定なら全パケット)
    let request = match &config.report.filter_file {
        Some(path) => load_filter_request(path).await?,
        None => FilterRequest::default(),
    };
    let pipeline = Arc::new(AnalysisPipeline::new(&request, &config.report)?);
    let repository: Arc<dyn CaptureRepository> = Arc::new(JsonFileRepository::new(&config.storage));

    // 引数でキャプチャ名が指定されなければディレクトリ内のすべてを対象にする
    let mut names: Vec<String> = std::env::args().skip(1).collect();
    if names.is_empty() {
        names = repository.list_captures().await?;
    }
    if names.is_empty() {
        warn!(
            "解析対象のキャプチャがありません: {}",
            config.storage.capture_dir.display()
        );
        return Ok(());
    }
    info!("{} 件のキャプチャを解析します", names.len());

    let results = analyze_captures(repository, pipeline, names).await;

    let mut failures = 0;
    for (name, result) in &results {
        match result {
            Ok(outcome) => println!(
                "{}: {} / {} パケット -> {}, {}",
                name,
                outcome.filtered,
                outcome.packets,
                outcome.report_path.display(),
                outcome.csv_path.display()
            ),
            Err(e) => {
                failures += 1;
                println!("{}: 解析に失敗しました: {}", name, e);
            }
        }
    }

    if failures > 0 {
        return Err(AnalysisError::Task(format!(
            "{} 件中 {} 件のキャプチャで解析に失敗しました",
            results.len(),
            failures
        )));
    }
    Ok(())
}

async fn load_filter_request(path: &Path) -> AnalysisResult<FilterRequest> {
    let contents = tokio::fs::read_to_string(path).await?;
    let request: FilterRequest = serde_json::from_str(&contents)?;
    info!("フィルタ条件を読み込みました: {}", path.display());
    Ok(request)
}
