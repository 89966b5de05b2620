use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TcpSegment {
    pub sport: u16,
    pub dport: u16,
    // デコーダーのフラグ表記 (例: "SA", "PA")
    #[serde(default)]
    pub flags: String,
    #[serde(default)]
    pub seq: u32,
    #[serde(default)]
    pub ack: u32,
}

impl TcpSegment {
    pub fn new(sport: u16, dport: u16, flags: impl Into<String>, seq: u32, ack: u32) -> Self {
        Self {
            sport,
            dport,
            flags: flags.into(),
            seq,
            ack,
        }
    }
}
