use super::model::{
    CountRow, CountTable, GeoLocation, PacketRow, ProtocolPayloadRow, ReportModel, ReportSection,
    SectionContent, SectionKey, Summary,
};
use crate::analysis::graph::{CommunicationGraph, Graphs};
use crate::analysis::histogram::ChartSeries;
use crate::analysis::ranking::{CountEntry, CHART_TOP_N, TABLE_TOP_N};
use crate::analysis::statistics::Statistics;
use crate::core::error::AnalysisResult;
use crate::network::packet::PacketRecord;
use crate::network::vendor::resolve_vendor;
use log::debug;

// 不明なキーが一つでもあればエラー
pub fn parse_sections<S: AsRef<str>>(keys: &[S]) -> AnalysisResult<Vec<SectionKey>> {
    keys.iter()
        .map(|key| key.as_ref())
        .filter(|key| !key.trim().is_empty())
        .map(str::parse)
        .collect()
}

// 未指定ならすべてのセクションを既定の順で出す
// 重複キーは最初の位置だけ残し、データのないセクションは省略
pub fn assemble(
    statistics: &Statistics,
    graphs: &Graphs,
    filtered: &[PacketRecord],
    sections: &[SectionKey],
) -> ReportModel {
    let requested: &[SectionKey] = if sections.is_empty() {
        &SectionKey::ALL
    } else {
        sections
    };

    let mut model = ReportModel { sections: Vec::new() };
    for key in requested {
        if model.section(*key).is_some() {
            continue;
        }
        match section_content(*key, statistics, graphs, filtered) {
            Some(content) => model.sections.push(ReportSection {
                key: *key,
                title: key.title().to_string(),
                content,
            }),
            None => debug!("セクション {} はデータがないため省略", key.as_str()),
        }
    }
    model
}

fn section_content(
    key: SectionKey,
    statistics: &Statistics,
    graphs: &Graphs,
    filtered: &[PacketRecord],
) -> Option<SectionContent> {
    match key {
        SectionKey::Summary => {
            (!statistics.is_empty()).then(|| SectionContent::Summary(summary(statistics, filtered)))
        }
        SectionKey::Protocols => non_empty_table(count_table(
            statistics.top_protocols(TABLE_TOP_N),
            statistics.top_protocols(CHART_TOP_N),
            |_| None,
        )),
        SectionKey::Ports => non_empty_table(count_table(
            statistics.top_ports(TABLE_TOP_N),
            statistics.top_ports(CHART_TOP_N),
            |_| None,
        )),
        SectionKey::MacAddresses => non_empty_table(count_table(
            statistics.top_macs(TABLE_TOP_N),
            statistics.top_macs(CHART_TOP_N),
            |mac| Some(resolve_vendor(mac).to_string()),
        )),
        SectionKey::MacVendors => non_empty_table(count_table(
            statistics.top_vendors(TABLE_TOP_N),
            statistics.top_vendors(CHART_TOP_N),
            |_| None,
        )),
        SectionKey::TopIps => non_empty_table(count_table(
            statistics.top_ips(TABLE_TOP_N),
            statistics.top_ips(CHART_TOP_N),
            |_| None,
        )),
        SectionKey::Time => non_empty_chart(statistics.time_distribution()),
        SectionKey::PacketSize => non_empty_chart(statistics.packet_size_distribution()),
        SectionKey::Network => non_empty_graph(&graphs.ip),
        SectionKey::MacNetwork => non_empty_graph(&graphs.mac),
        SectionKey::Payload => (statistics.payload.packets_with_payload > 0)
            .then(|| SectionContent::Payload(statistics.payload.clone())),
        SectionKey::ProtocolPayload => {
            let rows = protocol_payload_rows(statistics);
            (!rows.is_empty()).then_some(SectionContent::ProtocolPayload(rows))
        }
        SectionKey::Throughput => (!statistics.timeline.is_empty())
            .then(|| SectionContent::Throughput(statistics.throughput())),
        SectionKey::NetworkLoad => {
            (!statistics.is_empty()).then(|| SectionContent::NetworkLoad(statistics.network_load()))
        }
        SectionKey::Packets => (!filtered.is_empty()).then(|| {
            SectionContent::Packets(filtered.iter().map(PacketRow::from_record).collect())
        }),
        SectionKey::Geo => {
            let locations = geo_locations(statistics);
            (!locations.is_empty()).then_some(SectionContent::Geo(locations))
        }
    }
}

fn summary(statistics: &Statistics, filtered: &[PacketRecord]) -> Summary {
    Summary {
        total_packets: statistics.total_packets,
        filtered_packets: filtered.len() as u64,
        total_bytes: statistics.total_bytes,
        first_seen: statistics.first_seen,
        last_seen: statistics.last_seen,
        duration_secs: statistics.duration_secs(),
        unique_ips: statistics.ip_addresses.len(),
        unique_macs: statistics.mac_addresses.len(),
        unique_ports: statistics.ports.len(),
        protocol_count: statistics.protocols.len(),
        malformed_records: statistics.malformed.len(),
    }
}

fn count_table<F>(rows: Vec<CountEntry>, chart: Vec<CountEntry>, detail: F) -> CountTable
where
    F: Fn(&str) -> Option<String>,
{
    CountTable {
        rows: rows
            .into_iter()
            .map(|entry| CountRow {
                detail: detail(&entry.label),
                label: entry.label,
                count: entry.count,
            })
            .collect(),
        chart: ChartSeries {
            labels: chart.iter().map(|entry| entry.label.clone()).collect(),
            values: chart.iter().map(|entry| entry.count).collect(),
        },
    }
}

fn non_empty_table(table: CountTable) -> Option<SectionContent> {
    (!table.rows.is_empty()).then_some(SectionContent::Counts(table))
}

fn non_empty_chart(series: ChartSeries<u64>) -> Option<SectionContent> {
    (!series.is_empty()).then_some(SectionContent::Chart(series))
}

fn non_empty_graph(graph: &CommunicationGraph) -> Option<SectionContent> {
    (!graph.is_empty()).then(|| SectionContent::Graph(graph.clone()))
}

// 合計の多い順、同数はプロトコル名順
fn protocol_payload_rows(statistics: &Statistics) -> Vec<ProtocolPayloadRow> {
    let mut rows: Vec<ProtocolPayloadRow> = statistics
        .protocol_payload
        .iter()
        .map(|(protocol, payload)| ProtocolPayloadRow {
            protocol: protocol.clone(),
            total: payload.total,
            packets: payload.packets,
            average: if payload.packets > 0 {
                payload.total as f64 / payload.packets as f64
            } else {
                0.0
            },
        })
        .collect();
    rows.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.protocol.cmp(&b.protocol)));
    rows
}

// 外部の位置情報データベースを持たないため常に空
fn geo_locations(_statistics: &Statistics) -> Vec<GeoLocation> {
    Vec::new()
}
