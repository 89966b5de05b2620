use crate::analysis::graph::CommunicationGraph;
use crate::analysis::histogram::ChartSeries;
use crate::analysis::statistics::{NetworkLoad, PayloadStats, ThroughputStats};
use crate::core::error::AnalysisError;
use crate::network::packet::{PacketRecord, Transport};
use crate::network::vendor::resolve_vendor;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

const PAYLOAD_PREVIEW_CHARS: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKey {
    Summary,
    Protocols,
    Ports,
    MacAddresses,
    MacVendors,
    Time,
    PacketSize,
    Network,
    MacNetwork,
    TopIps,
    Payload,
    ProtocolPayload,
    Throughput,
    NetworkLoad,
    Packets,
    Geo,
}

impl SectionKey {
    // セクション未指定時の並び順
    pub const ALL: [SectionKey; 16] = [
        SectionKey::Summary,
        SectionKey::Protocols,
        SectionKey::Ports,
        SectionKey::MacAddresses,
        SectionKey::MacVendors,
        SectionKey::Time,
        SectionKey::PacketSize,
        SectionKey::Network,
        SectionKey::MacNetwork,
        SectionKey::TopIps,
        SectionKey::Payload,
        SectionKey::ProtocolPayload,
        SectionKey::Throughput,
        SectionKey::NetworkLoad,
        SectionKey::Packets,
        SectionKey::Geo,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SectionKey::Summary => "summary",
            SectionKey::Protocols => "protocols",
            SectionKey::Ports => "ports",
            SectionKey::MacAddresses => "mac_addresses",
            SectionKey::MacVendors => "mac_vendors",
            SectionKey::Time => "time",
            SectionKey::PacketSize => "packet_size",
            SectionKey::Network => "network",
            SectionKey::MacNetwork => "mac_network",
            SectionKey::TopIps => "top_ips",
            SectionKey::Payload => "payload",
            SectionKey::ProtocolPayload => "protocol_payload",
            SectionKey::Throughput => "throughput",
            SectionKey::NetworkLoad => "network_load",
            SectionKey::Packets => "packets",
            SectionKey::Geo => "geo",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            SectionKey::Summary => "Summary",
            SectionKey::Protocols => "Protocol distribution",
            SectionKey::Ports => "Most active ports",
            SectionKey::MacAddresses => "Most active MAC addresses",
            SectionKey::MacVendors => "Device vendors",
            SectionKey::Time => "Traffic over time",
            SectionKey::PacketSize => "Packet size distribution",
            SectionKey::Network => "IP communication graph",
            SectionKey::MacNetwork => "MAC communication graph",
            SectionKey::TopIps => "Most active IP addresses",
            SectionKey::Payload => "Payload statistics",
            SectionKey::ProtocolPayload => "Payload by protocol",
            SectionKey::Throughput => "Throughput over time",
            SectionKey::NetworkLoad => "Network efficiency",
            SectionKey::Packets => "Packets",
            SectionKey::Geo => "IP geolocation",
        }
    }
}

impl FromStr for SectionKey {
    type Err = AnalysisError;

    fn from_str(key: &str) -> Result<Self, Self::Err> {
        let key = key.trim();
        SectionKey::ALL
            .into_iter()
            .find(|section| section.as_str() == key)
            .ok_or_else(|| AnalysisError::UnknownSection(key.to_string()))
    }
}

// 描画側に渡すレポート (表示順)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportModel {
    pub sections: Vec<ReportSection>,
}

impl ReportModel {
    pub fn section(&self, key: SectionKey) -> Option<&ReportSection> {
        self.sections.iter().find(|section| section.key == key)
    }

    pub fn keys(&self) -> Vec<SectionKey> {
        self.sections.iter().map(|section| section.key).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSection {
    pub key: SectionKey,
    pub title: String,
    pub content: SectionContent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum SectionContent {
    Summary(Summary),
    Counts(CountTable),
    Chart(ChartSeries<u64>),
    Graph(CommunicationGraph),
    Payload(PayloadStats),
    ProtocolPayload(Vec<ProtocolPayloadRow>),
    Throughput(ThroughputStats),
    NetworkLoad(NetworkLoad),
    Packets(Vec<PacketRow>),
    Geo(Vec<GeoLocation>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total_packets: u64,
    pub filtered_packets: u64,
    pub total_bytes: u64,
    pub first_seen: Option<NaiveDateTime>,
    pub last_seen: Option<NaiveDateTime>,
    pub duration_secs: f64,
    pub unique_ips: usize,
    pub unique_macs: usize,
    pub unique_ports: usize,
    pub protocol_count: usize,
    pub malformed_records: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountTable {
    pub rows: Vec<CountRow>,
    pub chart: ChartSeries<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountRow {
    pub label: String,
    pub count: u64,
    // MACアドレスの行ではベンダー名
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProtocolPayloadRow {
    pub protocol: String,
    pub total: u64,
    pub packets: u64,
    pub average: f64,
}

// 位置情報は未対応 (常に空)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoLocation {
    pub ip: String,
    pub country: String,
    pub city: String,
    pub lat: f64,
    pub lon: f64,
    pub packets: u64,
}

// 1パケット分の表示用の行 (CSV の列構成と同じ)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PacketRow {
    pub packet_number: u64,
    pub time: String,
    pub src_mac: Option<String>,
    pub src_vendor: Option<String>,
    pub dst_mac: Option<String>,
    pub dst_vendor: Option<String>,
    pub src_ip: Option<String>,
    pub dst_ip: Option<String>,
    pub protocol: Option<String>,
    pub src_port: Option<u16>,
    pub dst_port: Option<u16>,
    pub length: u64,
    pub ttl: Option<u8>,
    pub tcp_flags: Option<String>,
    pub payload: Option<String>,
}

impl PacketRow {
    pub const HEADERS: [&'static str; 15] = [
        "packet_number",
        "time",
        "src_mac",
        "src_vendor",
        "dst_mac",
        "dst_vendor",
        "src_ip",
        "dst_ip",
        "protocol",
        "src_port",
        "dst_port",
        "length",
        "ttl",
        "tcp_flags",
        "payload",
    ];

    pub fn from_record(record: &PacketRecord) -> Self {
        let link = record.link.as_ref();
        let network = record.network.as_ref();
        let ports = record.ports();

        Self {
            packet_number: record.packet_number,
            time: record.time.clone(),
            src_mac: link.map(|link| link.src_mac.clone()),
            src_vendor: link.map(|link| resolve_vendor(&link.src_mac).to_string()),
            dst_mac: link.map(|link| link.dst_mac.clone()),
            dst_vendor: link.map(|link| resolve_vendor(&link.dst_mac).to_string()),
            src_ip: network.map(|network| network.src_ip.to_string()),
            dst_ip: network.map(|network| network.dst_ip.to_string()),
            protocol: record.protocol_label(),
            src_port: ports.map(|(sport, _)| sport),
            dst_port: ports.map(|(_, dport)| dport),
            length: record.length,
            ttl: network.map(|network| network.ttl),
            tcp_flags: match record.transport() {
                Some(Transport::Tcp(segment)) => Some(segment.flags.clone()),
                _ => None,
            },
            payload: record
                .payload
                .as_ref()
                .map(|payload| payload.preview(PAYLOAD_PREVIEW_CHARS)),
        }
    }
}
