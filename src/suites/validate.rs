//! Allow-lists and format checks for HAL output strings

pub const SECURITY_MODES: &[&str] = &[
    "None",
    "WEP-64",
    "WEP-128",
    "WPA-Personal",
    "WPA2-Personal",
    "WPA3-Personal",
    "WPA-WPA2-Personal",
    "WPA2-WPA3-Personal",
    "WPA-Enterprise",
    "WPA2-Enterprise",
    "WPA3-Enterprise",
    "WPA-WPA2-Enterprise",
    "WPA2-WPA3-Enterprise",
    "WPA3-Personal-Transition",
    "OWE",
    "WEP",
    "WPA",
    "WPA2",
    "WPA-WPA2",
    "WPA3",
];

pub const ENCRYPTION_MODES: &[&str] = &["None", "TKIP", "AES", "TKIP+AES", "AES+TKIP", "CCMP", "GCMP", "WEP"];

pub const FREQUENCY_BANDS: &[&str] = &["2.4GHz", "5GHz", "6GHz"];

pub const STANDARDS: &[&str] = &["a", "b", "g", "n", "ac", "ax", "be"];

pub const CHANNEL_BANDWIDTHS: &[&str] = &["20MHz", "40MHz", "80MHz", "160MHz", "320MHz", "Auto"];

pub const GUARD_INTERVALS: &[&str] = &["400nsec", "800nsec", "Auto"];

pub const EXT_CHANNELS: &[&str] = &["AboveControlChannel", "BelowControlChannel", "Auto"];

pub const NEIGHBOR_MODES: &[&str] = &["AdHoc", "Infrastructure"];

fn list_items(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim)
}

/// Comma-separated list whose every item is in `allowed`
pub fn is_list_of(value: &str, allowed: &[&str]) -> bool {
    !value.trim().is_empty() && list_items(value).all(|item| allowed.contains(&item))
}

pub fn is_frequency_band(value: &str) -> bool {
    FREQUENCY_BANDS.contains(&value)
}

pub fn is_standard(value: &str) -> bool {
    STANDARDS.contains(&value)
}

pub fn is_channel_bandwidth(value: &str) -> bool {
    CHANNEL_BANDWIDTHS.contains(&value)
}

pub fn is_guard_interval(value: &str) -> bool {
    GUARD_INTERVALS.contains(&value)
}

pub fn is_ext_channel(value: &str) -> bool {
    EXT_CHANNELS.contains(&value)
}

pub fn is_band_list(value: &str) -> bool {
    is_list_of(value, FREQUENCY_BANDS)
}

pub fn is_standard_list(value: &str) -> bool {
    is_list_of(value, STANDARDS)
}

/// `xx:xx:xx:xx:xx:xx`, hex digits in either case
pub fn is_mac_address(value: &str) -> bool {
    let octets: Vec<&str> = value.split(':').collect();
    octets.len() == 6
        && octets
            .iter()
            .all(|o| o.len() == 2 && o.chars().all(|c| c.is_ascii_hexdigit()))
}

/// ISO country code plus an optional environment character (`' '`, `O`, `I`)
pub fn is_regulatory_domain(value: &str) -> bool {
    let chars: Vec<char> = value.chars().collect();
    let country_ok = chars.len() >= 2 && chars[..2].iter().all(|c| c.is_ascii_uppercase());
    match chars.len() {
        2 => country_ok,
        3 => country_ok && matches!(chars[2], ' ' | 'O' | 'I'),
        _ => false,
    }
}

fn is_channel(value: &str) -> bool {
    value.parse::<u32>().map(|c| (1..=233).contains(&c)).unwrap_or(false)
}

/// Comma-separated channel numbers or `low-high` ranges
pub fn is_channel_list(value: &str) -> bool {
    !value.trim().is_empty()
        && list_items(value).all(|item| match item.split_once('-') {
            Some((low, high)) => {
                is_channel(low)
                    && is_channel(high)
                    && low.parse::<u32>().ok() <= high.parse::<u32>().ok()
            }
            None => is_channel(item),
        })
}

/// Comma-separated percentages in `0..=100`
pub fn is_transmit_power_list(value: &str) -> bool {
    !value.trim().is_empty()
        && list_items(value).all(|item| item.parse::<u32>().map(|p| p <= 100).unwrap_or(false))
}

/// `major.minor`
pub fn is_hal_version(value: &str) -> bool {
    match value.trim().split_once('.') {
        Some((major, minor)) => {
            !major.is_empty()
                && !minor.is_empty()
                && major.chars().all(|c| c.is_ascii_digit())
                && minor.chars().all(|c| c.is_ascii_digit())
        }
        None => false,
    }
}

/// `<number> Mb/s`, `<number> Gb/s`, or `Auto`
pub fn is_bit_rate(value: &str) -> bool {
    let value = value.trim();
    if value == "Auto" {
        return true;
    }
    let number = value
        .strip_suffix("Mb/s")
        .or_else(|| value.strip_suffix("Gb/s"))
        .map(str::trim);
    matches!(number, Some(n) if n.parse::<f64>().map(|r| r > 0.0).unwrap_or(false))
}

/// Interface names are `char[64]` in the HAL structs
pub fn is_interface_name(value: &str) -> bool {
    !value.is_empty() && value.len() < 64 && !value.contains(char::is_whitespace)
}

/// SSIDs are at most 32 octets
pub fn is_ssid(value: &str) -> bool {
    value.len() <= 32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_security_modes_complete() {
        assert_eq!(SECURITY_MODES.len(), 20);
        assert!(SECURITY_MODES.contains(&"WPA3-Personal-Transition"));
        assert!(!SECURITY_MODES.contains(&"WPA9-Personal"));
        assert!(!SECURITY_MODES.contains(&"wpa2-personal"));
    }

    #[test]
    fn test_list_of() {
        assert!(is_band_list("2.4GHz,5GHz"));
        assert!(is_band_list("6GHz"));
        assert!(!is_band_list("2.4GHz,60GHz"));
        assert!(!is_band_list(""));
        assert!(is_standard_list("b,g,n,ax"));
        assert!(!is_standard_list("b,g,x"));
    }

    #[test]
    fn test_mac_address() {
        assert!(is_mac_address("a0:b1:c2:d3:e4:f5"));
        assert!(is_mac_address("A0:B1:C2:D3:E4:F5"));
        assert!(!is_mac_address("a0:b1:c2:d3:e4"));
        assert!(!is_mac_address("a0-b1-c2-d3-e4-f5"));
        assert!(!is_mac_address("a0:b1:c2:d3:e4:g5"));
    }

    #[test]
    fn test_regulatory_domain() {
        assert!(is_regulatory_domain("US"));
        assert!(is_regulatory_domain("US "));
        assert!(is_regulatory_domain("GBI"));
        assert!(is_regulatory_domain("DEO"));
        assert!(!is_regulatory_domain("USX"));
        assert!(!is_regulatory_domain("us"));
        assert!(!is_regulatory_domain("U"));
    }

    #[test]
    fn test_channel_list() {
        assert!(is_channel_list("1-11"));
        assert!(is_channel_list("1,6,11"));
        assert!(is_channel_list("36,40,44,48,149-165"));
        assert!(!is_channel_list("11-1"));
        assert!(!is_channel_list("0"));
        assert!(!is_channel_list("1,,6"));
    }

    #[test]
    fn test_transmit_power_list() {
        assert!(is_transmit_power_list("0,25,50,75,100"));
        assert!(!is_transmit_power_list("0,101"));
        assert!(!is_transmit_power_list("-1"));
    }

    #[test]
    fn test_hal_version() {
        assert!(is_hal_version("3.0"));
        assert!(is_hal_version("2.15"));
        assert!(!is_hal_version("3"));
        assert!(!is_hal_version("3.0.1"));
        assert!(!is_hal_version("v3.0"));
    }

    #[test]
    fn test_bit_rate() {
        assert!(is_bit_rate("300 Mb/s"));
        assert!(is_bit_rate("1.3 Gb/s"));
        assert!(is_bit_rate("Auto"));
        assert!(!is_bit_rate("300"));
        assert!(!is_bit_rate("fast Mb/s"));
    }

    #[test]
    fn test_interface_and_ssid() {
        assert!(is_interface_name("wlan0"));
        assert!(!is_interface_name(""));
        assert!(!is_interface_name("wlan 0"));
        assert!(is_ssid("l1-test-ap"));
        assert!(!is_ssid(&"x".repeat(33)));
    }
}
