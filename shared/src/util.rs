use chrono::{DateTime, Utc};
use rand::Rng;

/// 获取当前 UTC 时间戳（毫秒）
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

const ORDER_SUFFIX_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Human-readable order number: `ORD-YYYYMMDD-XXXXXX`
///
/// The suffix is random; uniqueness is enforced by the `orders.order_number`
/// index and callers regenerate on collision.
pub fn order_number(at: DateTime<Utc>) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..6)
        .map(|_| ORDER_SUFFIX_ALPHABET[rng.gen_range(0..ORDER_SUFFIX_ALPHABET.len())] as char)
        .collect();
    format!("ORD-{}-{}", at.format("%Y%m%d"), suffix)
}
