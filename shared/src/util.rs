/// 获取当前 UTC 时间戳（毫秒）
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Generate a Snowflake-style string key for use as a sub-resource ID.
///
/// Layout (53 bits, fits in JavaScript's Number.MAX_SAFE_INTEGER):
///   - 41 bits: milliseconds since 2024-01-01 UTC (~69 years)
///   - 12 bits: random (4096 values per ms)
///
/// Rendered as lowercase hex so the last characters stay useful as a short
/// human-facing suffix (receipt numbers).
pub fn snowflake_key() -> String {
    use rand::Rng;
    // Custom epoch: 2024-01-01 00:00:00 UTC
    const EPOCH_MS: i64 = 1_704_067_200_000;
    let now = now_millis();
    let ts = (now - EPOCH_MS) & 0x1FF_FFFF_FFFF; // 41 bits
    let rand_bits: i64 = rand::thread_rng().gen_range(0..0x1000); // 12 bits
    format!("{:014x}", (ts << 12) | rand_bits)
}

/// Last `n` characters of an id, for short human-facing references.
pub fn short_suffix(id: &str, n: usize) -> &str {
    let start = id.len().saturating_sub(n);
    // Ids here are ASCII (hex keys / record ids), so byte slicing is safe
    &id[start..]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snowflake_key_is_hex_and_sized() {
        let key = snowflake_key();
        assert_eq!(key.len(), 14);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_short_suffix() {
        assert_eq!(short_suffix("abcdef123456", 6), "123456");
        assert_eq!(short_suffix("abc", 6), "abc");
    }
}
