use crate::network::packet::PacketRecord;
use crate::network::vendor::{canonical_mac, resolve_vendor};
use log::debug;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

const UNKNOWN_PROTOCOL: &str = "Unknown";
const UNKNOWN_COLOR: &str = "#DDA0DD";

// 主要プロトコルごとのノード色 (Unknown は末尾に置くこと)
const PROTOCOL_COLORS: [(&str, &str); 5] = [
    ("TCP", "#FF6B6B"),
    ("UDP", "#4ECDC4"),
    ("Protocol 1", "#45B7D1"),
    ("Protocol 58", "#45B7D1"),
    (UNKNOWN_PROTOCOL, UNKNOWN_COLOR),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressDomain {
    Ip,
    Mac,
}

impl AddressDomain {
    pub fn endpoints(self, record: &PacketRecord) -> Option<(String, String)> {
        match self {
            AddressDomain::Ip => record
                .network
                .as_ref()
                .map(|network| (network.src_ip.to_string(), network.dst_ip.to_string())),
            AddressDomain::Mac => record
                .link
                .as_ref()
                .map(|link| (canonical_mac(&link.src_mac), canonical_mac(&link.dst_mac))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    // ノードに関わったパケット数 (送信側と受信側の合計)
    pub value: u64,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
    pub color: String,
    pub protocol_stats: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphEdge {
    pub from: String,
    pub to: String,
    pub value: u64,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommunicationGraph {
    pub domain: AddressDomain,
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Graphs {
    pub ip: CommunicationGraph,
    pub mac: CommunicationGraph,
}

impl CommunicationGraph {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn edge(&self, from: &str, to: &str) -> Option<&GraphEdge> {
        self.edges.iter().find(|edge| edge.from == from && edge.to == to)
    }
}

// ノードは id、エッジは (src, dst) の組で引く
pub struct GraphBuilder {
    domain: AddressDomain,
    nodes: Vec<GraphNode>,
    node_index: HashMap<String, usize>,
    edges: Vec<GraphEdge>,
    edge_index: HashMap<(String, String), usize>,
}

impl GraphBuilder {
    pub fn new(domain: AddressDomain) -> Self {
        Self {
            domain,
            nodes: Vec::new(),
            node_index: HashMap::new(),
            edges: Vec::new(),
            edge_index: HashMap::new(),
        }
    }

    pub fn observe(&mut self, src: &str, dst: &str, protocol: Option<&str>) {
        let protocol = protocol.unwrap_or(UNKNOWN_PROTOCOL);
        self.touch_node(src, protocol);
        self.touch_node(dst, protocol);

        let key = (src.to_string(), dst.to_string());
        match self.edge_index.get(&key) {
            Some(&index) => self.edges[index].value += 1,
            None => {
                self.edge_index.insert(key, self.edges.len());
                self.edges.push(GraphEdge {
                    from: src.to_string(),
                    to: dst.to_string(),
                    value: 1,
                    title: String::new(),
                });
            }
        }
    }

    fn touch_node(&mut self, id: &str, protocol: &str) {
        let index = match self.node_index.get(id) {
            Some(&index) => index,
            None => {
                let vendor = match self.domain {
                    AddressDomain::Mac => Some(resolve_vendor(id).to_string()),
                    AddressDomain::Ip => None,
                };
                self.node_index.insert(id.to_string(), self.nodes.len());
                self.nodes.push(GraphNode {
                    id: id.to_string(),
                    label: id.to_string(),
                    value: 0,
                    title: String::new(),
                    vendor,
                    color: String::new(),
                    protocol_stats: BTreeMap::new(),
                });
                self.nodes.len() - 1
            }
        };

        let node = &mut self.nodes[index];
        node.value += 1;
        *node.protocol_stats.entry(protocol.to_string()).or_insert(0) += 1;
    }

    // 表示用のラベルと色を最終的な重みから確定させる
    pub fn finish(mut self) -> CommunicationGraph {
        for node in &mut self.nodes {
            node.title = match &node.vendor {
                Some(vendor) => format!("{} ({})\n{} packets", node.id, vendor, node.value),
                None => format!("{}\n{} packets", node.id, node.value),
            };
            node.color = protocol_color(dominant_protocol(&node.protocol_stats)).to_string();
        }
        for edge in &mut self.edges {
            edge.title = format!("{} → {}: {} packets", edge.from, edge.to, edge.value);
        }

        debug!(
            "グラフ構築完了 ({:?}): ノード={}, エッジ={}",
            self.domain,
            self.nodes.len(),
            self.edges.len()
        );

        CommunicationGraph {
            domain: self.domain,
            nodes: self.nodes,
            edges: self.edges,
        }
    }
}

pub fn build_graph_with<F>(records: &[PacketRecord], domain: AddressDomain, extract: F) -> CommunicationGraph
where
    F: Fn(&PacketRecord) -> Option<(String, String)>,
{
    let mut builder = GraphBuilder::new(domain);
    for record in records {
        if let Some((src, dst)) = extract(record) {
            builder.observe(&src, &dst, record.protocol_label().as_deref());
        }
    }
    builder.finish()
}

pub fn build_graph(records: &[PacketRecord], domain: AddressDomain) -> CommunicationGraph {
    build_graph_with(records, domain, |record| domain.endpoints(record))
}

// IP と MAC のグラフを1回の走査で作る
pub fn build_graphs(records: &[PacketRecord]) -> Graphs {
    let mut ip = GraphBuilder::new(AddressDomain::Ip);
    let mut mac = GraphBuilder::new(AddressDomain::Mac);

    for record in records {
        let protocol = record.protocol_label();
        if let Some((src, dst)) = AddressDomain::Ip.endpoints(record) {
            ip.observe(&src, &dst, protocol.as_deref());
        }
        if let Some((src, dst)) = AddressDomain::Mac.endpoints(record) {
            mac.observe(&src, &dst, protocol.as_deref());
        }
    }

    Graphs {
        ip: ip.finish(),
        mac: mac.finish(),
    }
}

fn dominant_protocol(stats: &BTreeMap<String, u64>) -> &str {
    // BTreeMap の昇順で走査し、同数なら先に出たものを残す
    stats
        .iter()
        .fold(None, |best: Option<(&String, u64)>, (protocol, count)| match best {
            Some((_, best_count)) if best_count >= *count => best,
            _ => Some((protocol, *count)),
        })
        .map_or(UNKNOWN_PROTOCOL, |(protocol, _)| protocol.as_str())
}

fn protocol_color(protocol: &str) -> &'static str {
    PROTOCOL_COLORS
        .iter()
        .find(|(name, _)| *name == protocol || *name == UNKNOWN_PROTOCOL)
        .map_or(UNKNOWN_COLOR, |(_, color)| *color)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::packet::{LinkLayer, NetworkLayer, TcpSegment, Transport, UdpDatagram};
    use std::net::IpAddr;

    fn record(n: u64, src: &str, dst: &str) -> PacketRecord {
        let src_ip: IpAddr = src.parse().unwrap();
        let dst_ip: IpAddr = dst.parse().unwrap();
        PacketRecord::new(n, "2024-05-01 10:00:00", 60).with_network(
            NetworkLayer::new(src_ip, dst_ip, 6, 64)
                .with_transport(Transport::Tcp(TcpSegment::new(1000, 80, "S", 0, 0))),
        )
    }

    #[test]
    fn direction_is_preserved_and_weights_accumulate() {
        let records = vec![
            record(1, "10.0.0.1", "10.0.0.2"),
            record(2, "10.0.0.1", "10.0.0.2"),
            record(3, "10.0.0.2", "10.0.0.1"),
        ];
        let graph = build_graph(&records, AddressDomain::Ip);

        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.edges.len(), 2);
        assert_eq!(graph.edge("10.0.0.1", "10.0.0.2").unwrap().value, 2);
        assert_eq!(graph.edge("10.0.0.2", "10.0.0.1").unwrap().value, 1);
        assert_eq!(graph.edge("10.0.0.1", "10.0.0.2").unwrap().title, "10.0.0.1 → 10.0.0.2: 2 packets");
        assert_eq!(graph.node("10.0.0.1").unwrap().value, 3);
        assert_eq!(graph.edges.iter().map(|e| e.value).sum::<u64>(), records.len() as u64);
    }

    #[test]
    fn self_loops_are_ordinary_edges() {
        let graph = build_graph(&[record(1, "10.0.0.7", "10.0.0.7")], AddressDomain::Ip);

        assert_eq!(graph.nodes.len(), 1);
        assert_eq!(graph.edge("10.0.0.7", "10.0.0.7").unwrap().value, 1);
        assert_eq!(graph.nodes[0].value, 2);
    }

    #[test]
    fn mac_nodes_carry_vendor_and_protocol_colour() {
        let udp = PacketRecord::new(2, "2024-05-01 10:00:01", 80)
            .with_link(LinkLayer::new("3c:5a:b4:00:00:01", "00:00:00:00:00:01"))
            .with_network(
                NetworkLayer::new("10.0.0.1".parse().unwrap(), "10.0.0.2".parse().unwrap(), 17, 64)
                    .with_transport(Transport::Udp(UdpDatagram::new(1, 2, 8))),
            );
        let arp = PacketRecord::new(1, "2024-05-01 10:00:00", 42)
            .with_link(LinkLayer::new("3c:5a:b4:00:00:01", "ff:ff:ff:ff:ff:ff"));
        let graphs = build_graphs(&[arp, udp.clone(), udp]);

        let node = graphs.mac.node("3c:5a:b4:00:00:01").unwrap();
        assert_eq!(node.vendor.as_deref(), Some("Google"));
        assert_eq!(node.value, 3);
        assert_eq!(node.protocol_stats["UDP"], 2);
        assert_eq!(node.protocol_stats[UNKNOWN_PROTOCOL], 1);
        assert_eq!(node.color, "#4ECDC4");
        assert_eq!(node.protocol_stats.values().sum::<u64>(), node.value);

        let broadcast = graphs.mac.node("ff:ff:ff:ff:ff:ff").unwrap();
        assert_eq!(broadcast.vendor.as_deref(), Some("Unknown"));
        assert_eq!(broadcast.color, "#DDA0DD");

        // ARP は IP グラフに現れない
        assert_eq!(graphs.ip.edges.iter().map(|e| e.value).sum::<u64>(), 2);
        assert!(graphs.ip.nodes.iter().all(|node| node.vendor.is_none()));
    }

    #[test]
    fn mac_notations_upsert_the_same_node() {
        let records = vec![
            PacketRecord::new(1, "2024-05-01 10:00:00", 60)
                .with_link(LinkLayer::new("3C:5A:B4:00:00:01", "ff:ff:ff:ff:ff:ff")),
            PacketRecord::new(2, "2024-05-01 10:00:01", 60)
                .with_link(LinkLayer::new("3c-5a-b4-00-00-01", "ff:ff:ff:ff:ff:ff")),
        ];
        let graph = build_graph(&records, AddressDomain::Mac);

        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.edge("3c:5a:b4:00:00:01", "ff:ff:ff:ff:ff:ff").unwrap().value, 2);
        assert_eq!(graph.node("3c:5a:b4:00:00:01").unwrap().vendor.as_deref(), Some("Google"));
    }

    #[test]
    fn custom_extractor_skips_records_without_endpoints() {
        let records = vec![record(1, "10.0.0.1", "10.0.0.2"), record(2, "10.0.0.3", "10.0.0.4")];
        let graph = build_graph_with(&records, AddressDomain::Ip, |record| {
            (record.packet_number == 2)
                .then(|| AddressDomain::Ip.endpoints(record))
                .flatten()
        });

        assert_eq!(graph.nodes.len(), 2);
        assert!(graph.node("10.0.0.1").is_none());
    }

    #[test]
    fn empty_input_builds_empty_graphs() {
        let graphs = build_graphs(&[]);
        assert!(graphs.ip.is_empty());
        assert!(graphs.mac.edges.is_empty());
    }
}
