use serde::{Deserialize, Serialize};

// リンク層 (イーサネット) のアドレス
// デコーダーが出力した表記 (コロン / ハイフン / ドット区切り) をそのまま保持する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkLayer {
    pub src_mac: String,
    pub dst_mac: String,
}

impl LinkLayer {
    pub fn new(src_mac: impl Into<String>, dst_mac: impl Into<String>) -> Self {
        Self {
            src_mac: src_mac.into(),
            dst_mac: dst_mac.into(),
        }
    }
}
