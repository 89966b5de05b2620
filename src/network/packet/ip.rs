use super::tcp::TcpSegment;
use super::udp::UdpDatagram;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

// ネットワーク層 (IPv4 / IPv6)
// トランスポート層はネットワーク層が存在するときだけ保持できる
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkLayer {
    pub src_ip: IpAddr,
    pub dst_ip: IpAddr,
    pub proto_number: u8,
    #[serde(default)]
    pub ttl: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transport: Option<Transport>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    Tcp(TcpSegment),
    Udp(UdpDatagram),
}

impl NetworkLayer {
    pub fn new(src_ip: IpAddr, dst_ip: IpAddr, proto_number: u8, ttl: u8) -> Self {
        Self {
            src_ip,
            dst_ip,
            proto_number,
            ttl,
            transport: None,
        }
    }

    pub fn with_transport(mut self, transport: Transport) -> Self {
        self.transport = Some(transport);
        self
    }
}

impl Transport {
    pub fn ports(&self) -> (u16, u16) {
        match self {
            Transport::Tcp(segment) => (segment.sport, segment.dport),
            Transport::Udp(datagram) => (datagram.sport, datagram.dport),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Transport::Tcp(_) => "TCP",
            Transport::Udp(_) => "UDP",
        }
    }
}
