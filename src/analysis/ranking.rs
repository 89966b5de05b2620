use serde::Serialize;
use std::collections::HashMap;
use std::fmt::Display;

// 表は上位10件、グラフ系列は上位5件
pub const TABLE_TOP_N: usize = 10;
pub const CHART_TOP_N: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountEntry {
    pub label: String,
    pub count: u64,
}

// 件数の降順、同数ならキーの昇順
pub fn ranked<K>(counts: &HashMap<K, u64>) -> Vec<CountEntry>
where
    K: Ord + Display,
{
    let mut entries: Vec<(&K, u64)> = counts.iter().map(|(key, count)| (key, *count)).collect();
    entries.sort_by(|(a_key, a_count), (b_key, b_count)| {
        b_count.cmp(a_count).then_with(|| a_key.cmp(b_key))
    });

    entries
        .into_iter()
        .map(|(key, count)| CountEntry {
            label: key.to_string(),
            count,
        })
        .collect()
}

pub fn top_n<K>(counts: &HashMap<K, u64>, n: usize) -> Vec<CountEntry>
where
    K: Ord + Display,
{
    let mut entries = ranked(counts);
    entries.truncate(n);
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ties_are_broken_by_key() {
        let counts: HashMap<String, u64> = [("10.0.0.9", 3), ("10.0.0.1", 3), ("10.0.0.5", 7)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();

        let labels: Vec<String> = ranked(&counts).into_iter().map(|e| e.label).collect();
        assert_eq!(labels, ["10.0.0.5", "10.0.0.1", "10.0.0.9"]);
    }

    #[test]
    fn numeric_keys_tie_break_numerically() {
        let counts: HashMap<u16, u64> = [(443, 2), (80, 2), (8080, 2)].into_iter().collect();
        let labels: Vec<String> = top_n(&counts, 2).into_iter().map(|e| e.label).collect();
        assert_eq!(labels, ["80", "443"]);
    }

    #[test]
    fn top_n_of_empty_map_is_empty() {
        let counts: HashMap<u16, u64> = HashMap::new();
        assert!(top_n(&counts, TABLE_TOP_N).is_empty());
    }
}
