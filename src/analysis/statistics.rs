use crate::analysis::histogram::{bucket_timeline, ChartSeries, SizeHistogram, TimeBucket};
use crate::analysis::ranking::{top_n, CountEntry};
use crate::core::error::MalformedRecord;
use crate::network::packet::PacketRecord;
use crate::network::vendor::{canonical_mac, resolve_vendor};
use chrono::NaiveDateTime;
use log::{debug, warn};
use serde::Serialize;
use std::collections::HashMap;

// アドレスとポートは送信元と宛先の両方で数える
#[derive(Debug, Clone, Default, Serialize)]
pub struct Statistics {
    pub total_packets: u64,
    pub total_bytes: u64,
    pub protocols: HashMap<String, u64>,
    pub ip_addresses: HashMap<String, u64>,
    pub ports: HashMap<u16, u64>,
    pub mac_addresses: HashMap<String, u64>,
    pub vendors: HashMap<String, u64>,
    pub packet_sizes: SizeHistogram,
    pub timeline: Vec<TimeBucket>,
    pub first_seen: Option<NaiveDateTime>,
    pub last_seen: Option<NaiveDateTime>,
    pub payload: PayloadStats,
    pub protocol_payload: HashMap<String, ProtocolPayload>,
    pub malformed: Vec<MalformedRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PayloadStats {
    pub total_payload_bytes: u64,
    pub packets_with_payload: u64,
    pub avg_payload_per_packet: f64,
    pub max_payload_size: u64,
    pub min_payload_size: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProtocolPayload {
    pub total: u64,
    pub packets: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ThroughputStats {
    pub time_labels: Vec<String>,
    pub bytes_per_second: Vec<f64>,
    pub packets_per_second: Vec<f64>,
    pub avg_throughput: f64,
    pub peak_throughput: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NetworkLoad {
    pub total_bytes: u64,
    pub header_overhead: u64,
    pub payload_efficiency: f64,
}

// 1回の走査で集計する
// 一部の観点に使えないレコードはその観点からだけ除外して malformed に記録
pub fn aggregate(records: &[PacketRecord]) -> Statistics {
    let mut stats = Statistics::default();
    let mut time_samples = Vec::with_capacity(records.len());
    let mut min_payload: Option<u64> = None;

    for record in records {
        stats.total_packets += 1;
        stats.total_bytes += record.length;
        stats.packet_sizes.record(record.length);

        let protocol = record.protocol_label();
        let payload_len = record.payload_len();

        if let Some(protocol) = &protocol {
            *stats.protocols.entry(protocol.clone()).or_insert(0) += 1;
            let entry = stats.protocol_payload.entry(protocol.clone()).or_default();
            entry.total += payload_len;
            entry.packets += 1;
        }

        if let Some(network) = &record.network {
            *stats.ip_addresses.entry(network.src_ip.to_string()).or_insert(0) += 1;
            *stats.ip_addresses.entry(network.dst_ip.to_string()).or_insert(0) += 1;
        }

        if let Some((sport, dport)) = record.ports() {
            *stats.ports.entry(sport).or_insert(0) += 1;
            *stats.ports.entry(dport).or_insert(0) += 1;
        }

        if let Some(link) = &record.link {
            for mac in [&link.src_mac, &link.dst_mac] {
                *stats.mac_addresses.entry(canonical_mac(mac)).or_insert(0) += 1;
                *stats.vendors.entry(resolve_vendor(mac).to_string()).or_insert(0) += 1;
            }
        }

        if record.payload.as_ref().is_some_and(|payload| !payload.is_empty()) {
            stats.payload.total_payload_bytes += payload_len;
            stats.payload.packets_with_payload += 1;
            stats.payload.max_payload_size = stats.payload.max_payload_size.max(payload_len);
            min_payload = Some(min_payload.map_or(payload_len, |min| min.min(payload_len)));
        }

        match record.timestamp() {
            Some(time) => {
                stats.first_seen = Some(stats.first_seen.map_or(time, |first| first.min(time)));
                stats.last_seen = Some(stats.last_seen.map_or(time, |last| last.max(time)));
                time_samples.push((time, record.length));
            }
            None => {
                let malformed = MalformedRecord::new(
                    record.packet_number,
                    "time",
                    format!("タイムスタンプを解釈できません: {:?}", record.time),
                );
                warn!("{}", malformed);
                stats.malformed.push(malformed);
            }
        }
    }

    stats.timeline = bucket_timeline(&time_samples);
    stats.payload.min_payload_size = min_payload.unwrap_or(0);
    if stats.total_packets > 0 {
        stats.payload.avg_payload_per_packet =
            stats.payload.total_payload_bytes as f64 / stats.total_packets as f64;
    }

    debug!(
        "集計完了: パケット数={}, IPアドレス={}, ポート={}, MACアドレス={}, 除外={}",
        stats.total_packets,
        stats.ip_addresses.len(),
        stats.ports.len(),
        stats.mac_addresses.len(),
        stats.malformed.len()
    );

    stats
}

impl Statistics {
    pub fn is_empty(&self) -> bool {
        self.total_packets == 0
    }

    pub fn duration_secs(&self) -> f64 {
        match (self.first_seen, self.last_seen) {
            (Some(first), Some(last)) => {
                (last - first).num_microseconds().unwrap_or(0) as f64 / 1_000_000.0
            }
            _ => 0.0,
        }
    }

    pub fn top_protocols(&self, n: usize) -> Vec<CountEntry> {
        top_n(&self.protocols, n)
    }

    pub fn top_ips(&self, n: usize) -> Vec<CountEntry> {
        top_n(&self.ip_addresses, n)
    }

    pub fn top_ports(&self, n: usize) -> Vec<CountEntry> {
        top_n(&self.ports, n)
    }

    pub fn top_macs(&self, n: usize) -> Vec<CountEntry> {
        top_n(&self.mac_addresses, n)
    }

    pub fn top_vendors(&self, n: usize) -> Vec<CountEntry> {
        top_n(&self.vendors, n)
    }

    pub fn time_distribution(&self) -> ChartSeries<u64> {
        ChartSeries {
            labels: self.timeline.iter().map(TimeBucket::label).collect(),
            values: self.timeline.iter().map(|bucket| bucket.packets).collect(),
        }
    }

    pub fn packet_size_distribution(&self) -> ChartSeries<u64> {
        self.packet_sizes.series()
    }

    // 時間分布と同じグリッドで計算 (長さ0のキャプチャは1秒とみなす)
    pub fn throughput(&self) -> ThroughputStats {
        let mut throughput = ThroughputStats::default();
        for bucket in &self.timeline {
            let width = if bucket.width_secs > 0.0 { bucket.width_secs } else { 1.0 };
            throughput.time_labels.push(bucket.label());
            throughput.bytes_per_second.push(bucket.bytes as f64 / width);
            throughput.packets_per_second.push(bucket.packets as f64 / width);
        }

        let duration = self.duration_secs();
        throughput.avg_throughput = if duration > 0.0 {
            self.total_bytes as f64 / duration
        } else {
            self.total_bytes as f64
        };
        throughput.peak_throughput = throughput
            .bytes_per_second
            .iter()
            .copied()
            .fold(0.0, f64::max);
        throughput
    }

    pub fn network_load(&self) -> NetworkLoad {
        let payload = self.payload.total_payload_bytes;
        NetworkLoad {
            total_bytes: self.total_bytes,
            header_overhead: self.total_bytes.saturating_sub(payload),
            payload_efficiency: if self.total_bytes > 0 {
                payload.min(self.total_bytes) as f64 * 100.0 / self.total_bytes as f64
            } else {
                0.0
            },
        }
    }
}
