pub mod ethernet;
pub mod ip;
pub mod tcp;
pub mod udp;

pub use ethernet::LinkLayer;
pub use ip::{NetworkLayer, Transport};
pub use tcp::TcpSegment;
pub use udp::UdpDatagram;

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};

// タイムスタンプとして受け付ける表記
// デコーダー出力 ("2024-05-01 10:00:00.123456") とブラウザの datetime-local ("2024-05-01T10:00") の両方
const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

// デコーダーが出力した1フレーム
// packet_number はキャプチャ内の1始まりの位置で、フィルタ後も変わらない
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacketRecord {
    pub packet_number: u64,
    pub time: String,
    pub length: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<LinkLayer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<NetworkLayer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Payload>,
}

// テキストとして読めなかったバイト列は16進文字列
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Payload {
    Text(String),
    Hex(String),
}

impl PacketRecord {
    pub fn new(packet_number: u64, time: impl Into<String>, length: u64) -> Self {
        Self {
            packet_number,
            time: time.into(),
            length,
            link: None,
            network: None,
            payload: None,
        }
    }

    pub fn with_link(mut self, link: LinkLayer) -> Self {
        self.link = Some(link);
        self
    }

    pub fn with_network(mut self, network: NetworkLayer) -> Self {
        self.network = Some(network);
        self
    }

    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn transport(&self) -> Option<&Transport> {
        self.network.as_ref().and_then(|network| network.transport.as_ref())
    }

    pub fn ports(&self) -> Option<(u16, u16)> {
        self.transport().map(Transport::ports)
    }

    pub fn timestamp(&self) -> Option<NaiveDateTime> {
        parse_timestamp(&self.time)
    }

    // TCP/UDP を優先し、それ以外は IP プロトコル番号
    // ネットワーク層がなければラベルなし
    pub fn protocol_label(&self) -> Option<String> {
        let network = self.network.as_ref()?;
        match &network.transport {
            Some(transport) => Some(transport.label().to_string()),
            None => Some(format!("Protocol {}", network.proto_number)),
        }
    }

    pub fn payload_len(&self) -> u64 {
        self.payload.as_ref().map_or(0, Payload::byte_len)
    }
}

impl Payload {
    pub fn byte_len(&self) -> u64 {
        match self {
            Payload::Text(text) => text.len() as u64,
            Payload::Hex(hex) => (hex.len() / 2) as u64,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Payload::Text(text) => text.is_empty(),
            Payload::Hex(hex) => hex.is_empty(),
        }
    }

    // 表示用に先頭だけを切り出す (文字単位)
    pub fn preview(&self, max_chars: usize) -> String {
        let text = match self {
            Payload::Text(text) => text,
            Payload::Hex(hex) => hex,
        };
        if text.chars().count() <= max_chars {
            return text.clone();
        }
        let mut preview: String = text.chars().take(max_chars).collect();
        preview.push('…');
        preview
    }
}

pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| DateTime::parse_from_rfc3339(text).ok().map(|t| t.naive_utc()))
}
