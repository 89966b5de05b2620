use chrono::{Duration, NaiveDateTime};
use serde::Serialize;

// パケットサイズのビン境界 (バイト)
// 最後のビンは 1500 以上すべて
pub const SIZE_BIN_EDGES: [u64; 7] = [0, 64, 128, 256, 512, 1024, 1500];
pub const SIZE_BIN_LABELS: [&str; 7] = [
    "0-64",
    "64-128",
    "128-256",
    "256-512",
    "512-1024",
    "1024-1500",
    "1500+",
];

// キャプチャ時間に関係なく固定の分割数
pub const TIME_BUCKETS: usize = 60;

const TIME_LABEL_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartSeries<V> {
    pub labels: Vec<String>,
    pub values: Vec<V>,
}

impl<V> ChartSeries<V> {
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SizeHistogram {
    counts: [u64; SIZE_BIN_EDGES.len()],
    total: u64,
}

impl SizeHistogram {
    pub fn record(&mut self, length: u64) {
        self.counts[size_bin(length)] += 1;
        self.total += 1;
    }

    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    // データがなければラベルも空にする
    pub fn series(&self) -> ChartSeries<u64> {
        if self.total == 0 {
            return ChartSeries::default();
        }
        ChartSeries {
            labels: SIZE_BIN_LABELS.iter().map(|label| label.to_string()).collect(),
            values: self.counts.to_vec(),
        }
    }
}

pub fn size_bin(length: u64) -> usize {
    SIZE_BIN_EDGES
        .iter()
        .rposition(|edge| length >= *edge)
        .unwrap_or(0)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeBucket {
    pub start: NaiveDateTime,
    // バケット幅 (秒)。単一時刻のキャプチャでは 0
    pub width_secs: f64,
    pub packets: u64,
    pub bytes: u64,
}

impl TimeBucket {
    pub fn label(&self) -> String {
        self.start.format(TIME_LABEL_FORMAT).to_string()
    }
}

// [min, max] を TIME_BUCKETS 個の等幅バケットに分割 (空のバケットも残す)
// サンプルは (タイムスタンプ, フレーム長)
pub fn bucket_timeline(samples: &[(NaiveDateTime, u64)]) -> Vec<TimeBucket> {
    let (Some(min), Some(max)) = (
        samples.iter().map(|(time, _)| *time).min(),
        samples.iter().map(|(time, _)| *time).max(),
    ) else {
        return Vec::new();
    };

    let span_us = micros_between(min, max);
    if span_us == 0 {
        return vec![TimeBucket {
            start: min,
            width_secs: 0.0,
            packets: samples.len() as u64,
            bytes: samples.iter().map(|(_, length)| *length).sum(),
        }];
    }

    let width_us = span_us as f64 / TIME_BUCKETS as f64;
    let mut buckets: Vec<TimeBucket> = (0..TIME_BUCKETS)
        .map(|index| TimeBucket {
            start: min + Duration::microseconds((width_us * index as f64).round() as i64),
            width_secs: width_us / 1_000_000.0,
            packets: 0,
            bytes: 0,
        })
        .collect();

    for (time, length) in samples {
        let offset = micros_between(min, *time) as f64;
        // 浮動小数点の誤差で max が範囲外に出るのを最後のバケットに寄せる
        let index = ((offset / width_us).floor() as usize).min(TIME_BUCKETS - 1);
        buckets[index].packets += 1;
        buckets[index].bytes += length;
    }

    buckets
}

fn micros_between(from: NaiveDateTime, to: NaiveDateTime) -> i64 {
    (to - from).num_microseconds().unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::packet::parse_timestamp;

    fn at(text: &str) -> NaiveDateTime {
        parse_timestamp(text).unwrap()
    }

    #[test]
    fn bins_cover_every_length() {
        assert_eq!(size_bin(0), 0);
        assert_eq!(size_bin(63), 0);
        assert_eq!(size_bin(64), 1);
        assert_eq!(size_bin(1499), 5);
        assert_eq!(size_bin(1500), 6);
        assert_eq!(size_bin(65_535), 6);
    }

    #[test]
    fn empty_histogram_has_no_labels() {
        let histogram = SizeHistogram::default();
        assert!(histogram.series().is_empty());
        assert!(histogram.series().values.is_empty());
    }

    #[test]
    fn histogram_keeps_zero_bins_once_data_exists() {
        let mut histogram = SizeHistogram::default();
        histogram.record(40);
        histogram.record(1600);

        let series = histogram.series();
        assert_eq!(series.labels, SIZE_BIN_LABELS.map(String::from).to_vec());
        assert_eq!(series.values, vec![1, 0, 0, 0, 0, 0, 1]);
        assert_eq!(series.values.iter().sum::<u64>(), histogram.total());
    }

    #[test]
    fn zero_duration_capture_is_one_bucket() {
        let time = at("2024-05-01 10:00:00");
        let samples = vec![(time, 60), (time, 100), (time, 40)];
        let timeline = bucket_timeline(&samples);

        assert_eq!(timeline.len(), 1);
        assert_eq!(timeline[0].start, time);
        assert_eq!(timeline[0].packets, 3);
        assert_eq!(timeline[0].bytes, 200);
    }

    #[test]
    fn spread_capture_uses_sixty_buckets_including_empty_ones() {
        let samples = vec![
            (at("2024-05-01 10:00:00"), 60),
            (at("2024-05-01 10:00:30"), 60),
            (at("2024-05-01 10:01:00"), 60),
        ];
        let timeline = bucket_timeline(&samples);

        assert_eq!(timeline.len(), TIME_BUCKETS);
        assert_eq!(timeline[0].packets, 1);
        assert_eq!(timeline[30].packets, 1);
        // 終端のパケットは最後のバケットに入る
        assert_eq!(timeline[TIME_BUCKETS - 1].packets, 1);
        assert_eq!(timeline.iter().map(|b| b.packets).sum::<u64>(), 3);
        assert_eq!(timeline[1].label(), "2024-05-01 10:00:01.000");
        assert!(timeline.windows(2).all(|pair| pair[0].start < pair[1].start));
    }

    #[test]
    fn no_samples_no_buckets() {
        assert!(bucket_timeline(&[]).is_empty());
    }
}
