use crate::core::config::StorageConfig;
use crate::core::error::{AnalysisError, AnalysisResult};
use crate::network::packet::PacketRecord;
use crate::report::csv_export::to_csv_string;
use crate::report::model::ReportModel;
use async_trait::async_trait;
use log::{debug, info, warn};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

const CAPTURE_EXTENSION: &str = ".json";

#[async_trait]
pub trait CaptureRepository: Send + Sync {
    async fn list_captures(&self) -> AnalysisResult<Vec<String>>;
    async fn load_capture(&self, name: &str) -> AnalysisResult<Vec<PacketRecord>>;
    async fn store_capture(&self, name: &str, records: &[PacketRecord]) -> AnalysisResult<()>;
    async fn store_report(&self, name: &str, report: &ReportModel) -> AnalysisResult<PathBuf>;
    async fn store_csv(&self, name: &str, records: &[PacketRecord]) -> AnalysisResult<PathBuf>;
}

// キャプチャは JSON 配列のファイル、レポートは別ディレクトリに出力
pub struct JsonFileRepository {
    capture_dir: PathBuf,
    report_dir: PathBuf,
}

impl JsonFileRepository {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            capture_dir: config.capture_dir.clone(),
            report_dir: config.report_dir.clone(),
        }
    }

    pub fn capture_dir(&self) -> &Path {
        &self.capture_dir
    }

    pub fn report_dir(&self) -> &Path {
        &self.report_dir
    }

    fn capture_path(&self, name: &str) -> AnalysisResult<PathBuf> {
        validate_capture_name(name)?;
        Ok(self.capture_dir.join(name))
    }

    async fn write_output(&self, file_name: String, contents: &[u8]) -> AnalysisResult<PathBuf> {
        fs::create_dir_all(&self.report_dir).await?;
        let path = self.report_dir.join(file_name);
        fs::write(&path, contents).await?;
        debug!("出力を書き込みました: {}", path.display());
        Ok(path)
    }
}

#[async_trait]
impl CaptureRepository for JsonFileRepository {
    async fn list_captures(&self) -> AnalysisResult<Vec<String>> {
        let mut entries = match fs::read_dir(&self.capture_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("キャプチャディレクトリがありません: {}", self.capture_dir.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if validate_capture_name(name).is_ok() {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    async fn load_capture(&self, name: &str) -> AnalysisResult<Vec<PacketRecord>> {
        let path = self.capture_path(name)?;
        let contents = match fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(AnalysisError::CaptureNotFound(name.to_string()))
            }
            Err(e) => return Err(e.into()),
        };

        let records: Vec<PacketRecord> = serde_json::from_str(&contents)?;
        if !has_dense_numbering(&records) {
            warn!("{}: packet_number が 1 からの連番になっていません", name);
        }
        info!("キャプチャを読み込みました: {} ({} パケット)", name, records.len());
        Ok(records)
    }

    async fn store_capture(&self, name: &str, records: &[PacketRecord]) -> AnalysisResult<()> {
        let path = self.capture_path(name)?;
        fs::create_dir_all(&self.capture_dir).await?;
        let json = serde_json::to_vec_pretty(records)?;
        fs::write(&path, json).await?;
        info!("キャプチャを保存しました: {} ({} パケット)", name, records.len());
        Ok(())
    }

    async fn store_report(&self, name: &str, report: &ReportModel) -> AnalysisResult<PathBuf> {
        let stem = validate_capture_name(name)?;
        let json = serde_json::to_vec_pretty(report)?;
        self.write_output(format!("{}_report.json", stem), &json).await
    }

    async fn store_csv(&self, name: &str, records: &[PacketRecord]) -> AnalysisResult<PathBuf> {
        let stem = validate_capture_name(name)?;
        let csv = to_csv_string(records)?;
        self.write_output(format!("{}_filtered.csv", stem), csv.as_bytes())
            .await
    }
}

// キャプチャディレクトリの外を指し得る名前は拒否する
pub fn validate_capture_name(name: &str) -> AnalysisResult<&str> {
    let stem = name
        .strip_suffix(CAPTURE_EXTENSION)
        .filter(|stem| !stem.is_empty())
        .ok_or_else(|| AnalysisError::InvalidCaptureName(name.to_string()))?;

    let safe = !stem.starts_with('.')
        && stem
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if !safe {
        return Err(AnalysisError::InvalidCaptureName(name.to_string()));
    }
    Ok(stem)
}

fn has_dense_numbering(records: &[PacketRecord]) -> bool {
    records
        .iter()
        .zip(1u64..)
        .all(|(record, expected)| record.packet_number == expected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::packet::{LinkLayer, NetworkLayer, Payload, TcpSegment, Transport};
    use crate::report::model::SectionKey;

    fn scratch_dir(test: &str) -> PathBuf {
        std::env::temp_dir().join(format!("pcap-insight-{}-{}", test, std::process::id()))
    }

    fn repository(root: &Path) -> JsonFileRepository {
        JsonFileRepository::new(&StorageConfig {
            capture_dir: root.join("captures"),
            report_dir: root.join("reports"),
        })
    }

    fn sample() -> Vec<PacketRecord> {
        vec![
            PacketRecord::new(1, "2024-05-01 10:00:00.250000", 74)
                .with_link(LinkLayer::new("3c:5a:b4:00:00:01", "b8:27:eb:00:00:02"))
                .with_network(
                    NetworkLayer::new("192.168.1.2".parse().unwrap(), "2001:db8::1".parse().unwrap(), 6, 64)
                        .with_transport(Transport::Tcp(TcpSegment::new(40000, 443, "S", 100, 0))),
                )
                .with_payload(Payload::Hex("deadbeef".to_string())),
            PacketRecord::new(2, "2024-05-01 10:00:01", 60),
        ]
    }

    #[test]
    fn capture_names_must_be_plain_json_files() {
        assert_eq!(validate_capture_name("capture_01.json").unwrap(), "capture_01");
        assert_eq!(validate_capture_name("lab.v2.json").unwrap(), "lab.v2");
        for name in ["", ".json", "capture.pcap", "../etc.json", "a/b.json", ".hidden.json", "sp ace.json"] {
            assert!(
                matches!(validate_capture_name(name), Err(AnalysisError::InvalidCaptureName(_))),
                "受理されてはいけない名前: {:?}",
                name
            );
        }
    }

    #[test]
    fn dense_numbering_check() {
        assert!(has_dense_numbering(&sample()));
        assert!(has_dense_numbering(&[]));
        assert!(!has_dense_numbering(&[PacketRecord::new(2, "", 0)]));
    }

    #[tokio::test]
    async fn capture_round_trips_through_the_store() {
        let root = scratch_dir("round-trip");
        let repo = repository(&root);
        let records = sample();

        repo.store_capture("lab.json", &records).await.unwrap();
        assert_eq!(repo.list_captures().await.unwrap(), ["lab.json"]);
        assert_eq!(repo.load_capture("lab.json").await.unwrap(), records);

        // 省略されたセクションは null ではなくキーごと出力されない
        let raw = std::fs::read_to_string(repo.capture_dir().join("lab.json")).unwrap();
        assert!(!raw.contains("null"));

        std::fs::remove_dir_all(&root).ok();
    }

    #[tokio::test]
    async fn missing_capture_and_directory() {
        let root = scratch_dir("missing");
        let repo = repository(&root);

        assert!(repo.list_captures().await.unwrap().is_empty());
        assert!(matches!(
            repo.load_capture("absent.json").await,
            Err(AnalysisError::CaptureNotFound(name)) if name == "absent.json"
        ));
        assert!(matches!(
            repo.load_capture("../absent.json").await,
            Err(AnalysisError::InvalidCaptureName(_))
        ));
    }

    #[tokio::test]
    async fn outputs_are_named_after_the_capture() {
        let root = scratch_dir("outputs");
        let repo = repository(&root);
        let report = ReportModel { sections: Vec::new() };

        let report_path = repo.store_report("lab.json", &report).await.unwrap();
        let csv_path = repo.store_csv("lab.json", &sample()).await.unwrap();

        assert_eq!(report_path, repo.report_dir().join("lab_report.json"));
        assert_eq!(csv_path, repo.report_dir().join("lab_filtered.csv"));
        let csv = std::fs::read_to_string(&csv_path).unwrap();
        assert_eq!(csv.lines().count(), 3);
        let report_json = std::fs::read_to_string(&report_path).unwrap();
        assert!(report_json.contains("\"sections\""));
        assert!(!report_json.contains(SectionKey::Summary.as_str()));

        std::fs::remove_dir_all(&root).ok();
    }
}
