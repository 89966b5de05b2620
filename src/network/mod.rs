pub mod packet;
pub mod vendor;

pub use packet::{LinkLayer, NetworkLayer, PacketRecord, Payload, TcpSegment, Transport, UdpDatagram};
pub use vendor::{canonical_mac, normalize_mac, resolve_vendor, UNKNOWN_VENDOR};
