use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UdpDatagram {
    pub sport: u16,
    pub dport: u16,
    #[serde(default)]
    pub len: u16,
}

impl UdpDatagram {
    pub fn new(sport: u16, dport: u16, len: u16) -> Self {
        Self { sport, dport, len }
    }
}
