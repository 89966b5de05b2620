use std::collections::HashMap;

pub const UNKNOWN_VENDOR: &str = "Unknown";

// OUI (MACアドレス先頭24ビット) → ベンダー名
// 読み取り専用のプロセス全体の定数
lazy_static::lazy_static! {
    static ref OUI_TABLE: HashMap<&'static str, &'static str> = {
        let entries: &[(&str, &str)] = &[
            // 仮想化
            ("000C29", "VMware"),
            ("000569", "VMware"),
            ("001C14", "VMware"),
            ("005056", "VMware"),
            ("080027", "VirtualBox"),
            ("525400", "QEMU"),
            ("00155D", "Microsoft"),
            ("00163E", "Xensource"),
            // 端末・サーバー
            ("000393", "Apple"),
            ("0017F2", "Apple"),
            ("001B63", "Apple"),
            ("002332", "Apple"),
            ("28CFE9", "Apple"),
            ("3C0754", "Apple"),
            ("A4B197", "Apple"),
            ("7CD1C3", "Apple"),
            ("0000F0", "Samsung"),
            ("001247", "Samsung"),
            ("002339", "Samsung"),
            ("001B21", "Intel"),
            ("0013E8", "Intel"),
            ("3C970E", "Intel"),
            ("A0369F", "Intel"),
            ("001422", "Dell"),
            ("14FEB5", "Dell"),
            ("F8BC12", "Dell"),
            ("B8AC6F", "Dell"),
            ("001083", "HP"),
            ("3C4A92", "HP"),
            ("009C02", "HP"),
            ("3C5AB4", "Google"),
            ("F4F5D8", "Google"),
            ("F4F5E8", "Google"),
            ("001A11", "Google"),
            ("0C47C9", "Amazon"),
            ("747548", "Amazon"),
            ("F0272D", "Amazon"),
            ("286C07", "Xiaomi"),
            ("640980", "Xiaomi"),
            ("F8A45F", "Xiaomi"),
            ("00E0FC", "Huawei"),
            ("001882", "Huawei"),
            ("286ED4", "Huawei"),
            ("0009BF", "Nintendo"),
            ("001656", "Nintendo"),
            // 組み込み
            ("B827EB", "Raspberry Pi"),
            ("DCA632", "Raspberry Pi"),
            ("E45F01", "Raspberry Pi"),
            ("240AC4", "Espressif"),
            ("30AEA4", "Espressif"),
            ("A4CF12", "Espressif"),
            ("00E04C", "Realtek"),
            // ネットワーク機器
            ("00000C", "Cisco"),
            ("000142", "Cisco"),
            ("000585", "Juniper"),
            ("000B86", "Aruba"),
            ("50C7BF", "TP-Link"),
            ("F4F26D", "TP-Link"),
            ("C46E1F", "TP-Link"),
            ("14CC20", "TP-Link"),
            ("00095B", "Netgear"),
            ("204E7F", "Netgear"),
            ("A040A0", "Netgear"),
            ("001195", "D-Link"),
            ("00179A", "D-Link"),
            ("1CAFF7", "D-Link"),
            ("001FC6", "ASUSTek"),
            ("1C872C", "ASUSTek"),
            ("3085A9", "ASUSTek"),
            ("0418D6", "Ubiquiti"),
            ("24A43C", "Ubiquiti"),
            ("802AA8", "Ubiquiti"),
        ];
        entries.iter().copied().collect()
    };
}

// 区切り文字 (: - .) を除いて大文字化
pub fn normalize_mac(mac: &str) -> String {
    mac.trim()
        .chars()
        .filter(|c| !matches!(c, ':' | '-' | '.'))
        .flat_map(char::to_uppercase)
        .collect()
}

// 集計とグラフのキー用。表記ゆれを小文字のコロン区切りにそろえる
// 12桁の16進でなければ区切りを除いた小文字のまま返す
pub fn canonical_mac(mac: &str) -> String {
    let hex = normalize_mac(mac).to_lowercase();
    if hex.len() != 12 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return hex;
    }
    hex.as_bytes()
        .chunks(2)
        .map(|pair| String::from_utf8_lossy(pair).into_owned())
        .collect::<Vec<_>>()
        .join(":")
}

pub fn resolve_vendor(mac: &str) -> &'static str {
    let normalized = normalize_mac(mac);
    normalized
        .get(..6)
        .and_then(|oui| OUI_TABLE.get(oui).copied())
        .unwrap_or(UNKNOWN_VENDOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_oui_in_every_notation() {
        assert_eq!(resolve_vendor("3C:5A:B4:11:22:33"), "Google");
        assert_eq!(resolve_vendor("3c-5a-b4-11-22-33"), "Google");
        assert_eq!(resolve_vendor("3c5a.b411.2233"), "Google");
        assert_eq!(resolve_vendor("b8:27:eb:00:00:01"), "Raspberry Pi");
    }

    #[test]
    fn unknown_or_short_addresses_resolve_to_unknown() {
        assert_eq!(resolve_vendor("FF:FF:FF:00:00:00"), UNKNOWN_VENDOR);
        assert_eq!(resolve_vendor("3C:5A"), UNKNOWN_VENDOR);
        assert_eq!(resolve_vendor(""), UNKNOWN_VENDOR);
        assert_eq!(resolve_vendor("zażółć"), UNKNOWN_VENDOR);
    }

    #[test]
    fn normalization_drops_separators() {
        assert_eq!(normalize_mac(" 00:1a-2B.3c "), "001A2B3C");
    }

    #[test]
    fn canonical_form_is_shared_by_every_notation() {
        for mac in ["3C:5A:B4:00:00:01", "3c-5a-b4-00-00-01", "3c5a.b400.0001", "3C5AB4000001"] {
            assert_eq!(canonical_mac(mac), "3c:5a:b4:00:00:01");
        }
        assert_eq!(canonical_mac("3C:5A"), "3c5a");
    }
}
