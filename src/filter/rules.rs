use super::request::{supplied, FilterRequest};
use crate::core::error::{AnalysisError, AnalysisResult};
use crate::network::packet::{parse_timestamp, PacketRecord};
use chrono::NaiveDateTime;
use log::debug;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum FilterCondition {
    // アドレス系は小文字化した部分一致
    SourceMac(String),
    DestinationMac(String),
    SourceIp(String),
    DestinationIp(String),
    // プロトコルは集計と同じラベルとの完全一致
    Protocol(String),
    Port(u16),
    Length(RangeCondition<u64>),
    Time(RangeCondition<NaiveDateTime>),
}

// 両端を含む。None の側は制限なし
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangeCondition<T> {
    pub min: Option<T>,
    pub max: Option<T>,
}

impl<T: PartialOrd> RangeCondition<T> {
    pub fn contains(&self, value: &T) -> bool {
        match (&self.min, &self.max) {
            (Some(min), Some(max)) => value >= min && value <= max,
            (Some(min), None) => value >= min,
            (None, Some(max)) => value <= max,
            (None, None) => true,
        }
    }
}

impl FilterCondition {
    pub fn matches(&self, record: &PacketRecord) -> bool {
        match self {
            FilterCondition::SourceMac(needle) => record
                .link
                .as_ref()
                .is_some_and(|link| contains_ignore_case(&link.src_mac, needle)),
            FilterCondition::DestinationMac(needle) => record
                .link
                .as_ref()
                .is_some_and(|link| contains_ignore_case(&link.dst_mac, needle)),
            FilterCondition::SourceIp(needle) => record
                .network
                .as_ref()
                .is_some_and(|network| contains_ignore_case(&network.src_ip.to_string(), needle)),
            FilterCondition::DestinationIp(needle) => record
                .network
                .as_ref()
                .is_some_and(|network| contains_ignore_case(&network.dst_ip.to_string(), needle)),
            FilterCondition::Protocol(protocol) => {
                record.protocol_label().as_deref() == Some(protocol.as_str())
            }
            FilterCondition::Port(port) => record
                .ports()
                .is_some_and(|(sport, dport)| sport == *port || dport == *port),
            FilterCondition::Length(range) => range.contains(&record.length),
            // タイムスタンプを解釈できないレコードは時間条件があれば除外
            FilterCondition::Time(range) => record
                .timestamp()
                .is_some_and(|time| range.contains(&time)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PredicateSet {
    conditions: Vec<FilterCondition>,
}

impl PredicateSet {
    pub fn new(conditions: Vec<FilterCondition>) -> Self {
        Self { conditions }
    }

    // 型の合わない値があれば InvalidFilterValue
    pub fn from_request(request: &FilterRequest) -> AnalysisResult<Self> {
        let mut conditions = Vec::new();

        if let Some(mac) = supplied(&request.src_mac) {
            conditions.push(FilterCondition::SourceMac(mac.to_lowercase()));
        }
        if let Some(mac) = supplied(&request.dst_mac) {
            conditions.push(FilterCondition::DestinationMac(mac.to_lowercase()));
        }
        if let Some(ip) = supplied(&request.src_ip) {
            conditions.push(FilterCondition::SourceIp(ip.to_lowercase()));
        }
        if let Some(ip) = supplied(&request.dst_ip) {
            conditions.push(FilterCondition::DestinationIp(ip.to_lowercase()));
        }
        if let Some(protocol) = supplied(&request.protocol) {
            conditions.push(FilterCondition::Protocol(protocol.to_string()));
        }
        if let Some(port) = supplied(&request.port) {
            let port = port
                .parse::<u16>()
                .map_err(|_| AnalysisError::invalid_filter("port", port))?;
            conditions.push(FilterCondition::Port(port));
        }

        let length = RangeCondition {
            min: parse_length("lengthMin", &request.length_min)?,
            max: parse_length("lengthMax", &request.length_max)?,
        };
        if length.min.is_some() || length.max.is_some() {
            conditions.push(FilterCondition::Length(length));
        }

        let time = RangeCondition {
            min: parse_time("timeStart", &request.time_start)?,
            max: parse_time("timeEnd", &request.time_end)?,
        };
        if time.min.is_some() || time.max.is_some() {
            conditions.push(FilterCondition::Time(time));
        }

        Ok(Self { conditions })
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn conditions(&self) -> &[FilterCondition] {
        &self.conditions
    }

    pub fn matches(&self, record: &PacketRecord) -> bool {
        self.conditions.iter().all(|condition| condition.matches(record))
    }
}

impl TryFrom<&FilterRequest> for PredicateSet {
    type Error = AnalysisError;

    fn try_from(request: &FilterRequest) -> AnalysisResult<Self> {
        Self::from_request(request)
    }
}

pub fn filter(records: &[PacketRecord], predicates: &PredicateSet) -> Vec<PacketRecord> {
    let selected: Vec<PacketRecord> = records
        .iter()
        .filter(|record| predicates.matches(record))
        .cloned()
        .collect();

    debug!(
        "フィルタ適用: 条件={}, {} / {} パケットを選択",
        predicates.conditions.len(),
        selected.len(),
        records.len()
    );
    selected
}

fn contains_ignore_case(haystack: &str, lowercase_needle: &str) -> bool {
    haystack.to_lowercase().contains(lowercase_needle)
}

fn parse_length(field: &'static str, value: &Option<String>) -> AnalysisResult<Option<u64>> {
    supplied(value)
        .map(|text| {
            text.parse::<u64>()
                .map_err(|_| AnalysisError::invalid_filter(field, text))
        })
        .transpose()
}

fn parse_time(field: &'static str, value: &Option<String>) -> AnalysisResult<Option<NaiveDateTime>> {
    supplied(value)
        .map(|text| parse_timestamp(text).ok_or_else(|| AnalysisError::invalid_filter(field, text)))
        .transpose()
}
