use crate::analysis::graph::{build_graphs, Graphs};
use crate::analysis::statistics::{aggregate, Statistics};
use crate::core::config::{ReportConfig, StatisticsScope};
use crate::core::error::{AnalysisError, AnalysisResult};
use crate::filter::request::FilterRequest;
use crate::filter::rules::{filter, PredicateSet};
use crate::network::packet::PacketRecord;
use crate::report::assembly::assemble;
use crate::report::model::{ReportModel, SectionKey};
use crate::storage::repository::CaptureRepository;
use futures::future::join_all;
use log::{error, info};
use std::path::PathBuf;
use std::sync::Arc;

// フィルタ条件はキャプチャを読む前に解釈しておく
#[derive(Debug, Clone)]
pub struct AnalysisPipeline {
    predicates: PredicateSet,
    sections: Vec<SectionKey>,
    scope: StatisticsScope,
}

#[derive(Debug, Clone)]
pub struct AnalysisOutput {
    pub statistics: Statistics,
    pub graphs: Graphs,
    pub filtered: Vec<PacketRecord>,
    pub report: ReportModel,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaptureOutcome {
    pub name: String,
    pub packets: usize,
    pub filtered: usize,
    pub sections: usize,
    pub report_path: PathBuf,
    pub csv_path: PathBuf,
}

impl AnalysisPipeline {
    pub fn new(request: &FilterRequest, config: &ReportConfig) -> AnalysisResult<Self> {
        Ok(Self {
            predicates: PredicateSet::from_request(request)?,
            sections: config.sections.clone(),
            scope: config.statistics_scope,
        })
    }

    pub fn from_parts(predicates: PredicateSet, sections: Vec<SectionKey>, scope: StatisticsScope) -> Self {
        Self {
            predicates,
            sections,
            scope,
        }
    }

    pub fn predicates(&self) -> &PredicateSet {
        &self.predicates
    }

    pub fn run(&self, records: &[PacketRecord]) -> AnalysisOutput {
        let filtered = filter(records, &self.predicates);
        let basis: &[PacketRecord] = match self.scope {
            StatisticsScope::Capture => records,
            StatisticsScope::Filtered => &filtered,
        };

        let statistics = aggregate(basis);
        let graphs = build_graphs(basis);
        let report = assemble(&statistics, &graphs, &filtered, &self.sections);

        info!(
            "解析完了: {} パケット中 {} パケットを抽出, セクション数={}",
            records.len(),
            filtered.len(),
            report.sections.len()
        );

        AnalysisOutput {
            statistics,
            graphs,
            filtered,
            report,
        }
    }
}

// 解析本体はブロッキングスレッドで実行
pub async fn analyze_capture(
    repository: Arc<dyn CaptureRepository>,
    pipeline: Arc<AnalysisPipeline>,
    name: String,
) -> AnalysisResult<CaptureOutcome> {
    let records = repository.load_capture(&name).await?;
    let packets = records.len();

    let output = tokio::task::spawn_blocking(move || pipeline.run(&records))
        .await
        .map_err(|e| AnalysisError::Task(format!("{}: {}", name, e)))?;

    let report_path = repository.store_report(&name, &output.report).await?;
    let csv_path = repository.store_csv(&name, &output.filtered).await?;

    Ok(CaptureOutcome {
        name,
        packets,
        filtered: output.filtered.len(),
        sections: output.report.sections.len(),
        report_path,
        csv_path,
    })
}

// 1件の失敗で他を止めない。結果は names の順
pub async fn analyze_captures(
    repository: Arc<dyn CaptureRepository>,
    pipeline: Arc<AnalysisPipeline>,
    names: Vec<String>,
) -> Vec<(String, AnalysisResult<CaptureOutcome>)> {
    let tasks = names.into_iter().map(|name| {
        let repository = Arc::clone(&repository);
        let pipeline = Arc::clone(&pipeline);
        async move {
            let result = analyze_capture(repository, pipeline, name.clone()).await;
            if let Err(e) = &result {
                error!("{} の解析に失敗しました: {}", name, e);
            }
            (name, result)
        }
    });

    join_all(tasks).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::StorageConfig;
    use crate::network::packet::{LinkLayer, NetworkLayer, TcpSegment, Transport, UdpDatagram};
    use crate::report::model::SectionContent;
    use crate::storage::repository::JsonFileRepository;

    fn capture() -> Vec<PacketRecord> {
        vec![
            PacketRecord::new(1, "2024-05-01 10:00:00", 40)
                .with_link(LinkLayer::new("3c:5a:b4:00:00:01", "b8:27:eb:00:00:02"))
                .with_network(
                    NetworkLayer::new("10.0.0.1".parse().unwrap(), "10.0.0.2".parse().unwrap(), 6, 64)
                        .with_transport(Transport::Tcp(TcpSegment::new(40000, 80, "S", 0, 0))),
                ),
            PacketRecord::new(2, "2024-05-01 10:00:01", 1600)
                .with_link(LinkLayer::new("b8:27:eb:00:00:02", "3c:5a:b4:00:00:01"))
                .with_network(
                    NetworkLayer::new("10.0.0.2".parse().unwrap(), "10.0.0.9".parse().unwrap(), 17, 64)
                        .with_transport(Transport::Udp(UdpDatagram::new(5353, 53, 1500))),
                ),
        ]
    }

    fn tcp_only(scope: StatisticsScope) -> AnalysisPipeline {
        let request = FilterRequest {
            protocol: Some("TCP".to_string()),
            ..Default::default()
        };
        let config = ReportConfig {
            statistics_scope: scope,
            ..Default::default()
        };
        AnalysisPipeline::new(&request, &config).unwrap()
    }

    #[test]
    fn invalid_filter_fails_before_any_work() {
        let request = FilterRequest {
            length_min: Some("short".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            AnalysisPipeline::new(&request, &ReportConfig::default()),
            Err(AnalysisError::InvalidFilterValue { field: "lengthMin", .. })
        ));
    }

    #[test]
    fn capture_scope_keeps_whole_capture_statistics() {
        let output = tcp_only(StatisticsScope::Capture).run(&capture());

        assert_eq!(output.filtered.len(), 1);
        assert_eq!(output.filtered[0].packet_number, 1);
        assert_eq!(output.statistics.protocols["TCP"], 1);
        assert_eq!(output.statistics.protocols["UDP"], 1);
        assert_eq!(output.graphs.ip.nodes.len(), 3);

        let Some(SectionContent::Packets(rows)) =
            output.report.section(SectionKey::Packets).map(|s| &s.content)
        else {
            panic!("パケット一覧がありません");
        };
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn filtered_scope_restricts_statistics_and_graphs() {
        let output = tcp_only(StatisticsScope::Filtered).run(&capture());

        assert_eq!(output.statistics.total_packets, 1);
        assert!(!output.statistics.protocols.contains_key("UDP"));
        assert_eq!(output.graphs.ip.edges.len(), 1);
        assert!(output.graphs.ip.edge("10.0.0.1", "10.0.0.2").is_some());
    }

    #[test]
    fn empty_capture_gives_empty_report() {
        let output = tcp_only(StatisticsScope::Capture).run(&[]);
        assert!(output.statistics.is_empty());
        assert!(output.report.sections.is_empty());
    }

    #[tokio::test]
    async fn analyzes_stored_captures_concurrently() {
        let root = std::env::temp_dir().join(format!("pcap-insight-pipeline-{}", std::process::id()));
        let repository = Arc::new(JsonFileRepository::new(&StorageConfig {
            capture_dir: root.join("captures"),
            report_dir: root.join("reports"),
        }));
        repository.store_capture("a.json", &capture()).await.unwrap();
        repository.store_capture("b.json", &capture()[..1]).await.unwrap();

        let results = analyze_captures(
            repository.clone(),
            Arc::new(tcp_only(StatisticsScope::Capture)),
            vec!["a.json".to_string(), "missing.json".to_string(), "b.json".to_string()],
        )
        .await;

        let names: Vec<&str> = results.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, ["a.json", "missing.json", "b.json"]);

        let a = results[0].1.as_ref().unwrap();
        assert_eq!((a.packets, a.filtered), (2, 1));
        assert!(a.report_path.ends_with("a_report.json"));
        assert!(a.csv_path.exists());
        assert!(matches!(results[1].1, Err(AnalysisError::CaptureNotFound(_))));
        assert_eq!(results[2].1.as_ref().unwrap().packets, 1);

        std::fs::remove_dir_all(&root).ok();
    }
}
