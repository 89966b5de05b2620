use serde::{Deserialize, Deserializer, Serialize};

// フロントエンドのフィルタフォーム
// 数値項目は JSON の数値でもフォームの文字列でも受け付ける
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterRequest {
    #[serde(deserialize_with = "text_or_number")]
    pub src_mac: Option<String>,
    #[serde(deserialize_with = "text_or_number")]
    pub dst_mac: Option<String>,
    #[serde(deserialize_with = "text_or_number")]
    pub src_ip: Option<String>,
    #[serde(deserialize_with = "text_or_number")]
    pub dst_ip: Option<String>,
    #[serde(deserialize_with = "text_or_number")]
    pub protocol: Option<String>,
    #[serde(deserialize_with = "text_or_number")]
    pub port: Option<String>,
    #[serde(deserialize_with = "text_or_number")]
    pub length_min: Option<String>,
    #[serde(deserialize_with = "text_or_number")]
    pub length_max: Option<String>,
    #[serde(deserialize_with = "text_or_number")]
    pub time_start: Option<String>,
    #[serde(deserialize_with = "text_or_number")]
    pub time_end: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawValue {
    Text(String),
    Integer(i64),
    Float(f64),
}

fn text_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawValue>::deserialize(deserializer)?;
    Ok(raw.map(|value| match value {
        RawValue::Text(text) => text,
        RawValue::Integer(number) => number.to_string(),
        RawValue::Float(number) => number.to_string(),
    }))
}

// 空白だけの値は未指定として扱う
pub(crate) fn supplied(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}
