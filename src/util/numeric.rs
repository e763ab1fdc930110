//! Order-preserving encodings for numeric and datetime values.
//!
//! Numbers are indexed as terms, so the term encoding must sort
//! lexicographically in the same order as the values it encodes. A float is
//! first mapped onto a sortable `i64` (flipping the magnitude bits of negative
//! values), and the `i64` is rendered as fixed-width hex after moving it into
//! unsigned space.
//!
//! Datetimes are indexed from their nanosecond timestamp. To let a date range
//! reuse the numeric range machinery, the timestamp is carried as the float
//! whose sortable encoding is that timestamp ([`int64_to_float64`]), which
//! makes the round trip exact.

/// Map an `f64` onto an `i64` that sorts in the same order.
pub fn float64_to_int64(value: f64) -> i64 {
    let bits = value.to_bits() as i64;
    if bits < 0 {
        bits ^ 0x7fff_ffff_ffff_ffff
    } else {
        bits
    }
}

/// Inverse of [`float64_to_int64`].
pub fn int64_to_float64(value: i64) -> f64 {
    let bits = if value < 0 {
        value ^ 0x7fff_ffff_ffff_ffff
    } else {
        value
    };
    f64::from_bits(bits as u64)
}

/// Encode a sortable `i64` as a fixed-width term.
pub fn encode_i64(value: i64) -> String {
    format!("{:016x}", (value as u64) ^ (1 << 63))
}

/// Decode a term produced by [`encode_i64`].
pub fn decode_i64(term: &str) -> Option<i64> {
    if term.len() != 16 {
        return None;
    }
    u64::from_str_radix(term, 16)
        .ok()
        .map(|raw| (raw ^ (1 << 63)) as i64)
}

/// Encode a float as an order-preserving term.
pub fn encode_f64(value: f64) -> String {
    encode_i64(float64_to_int64(value))
}

/// Decode a term produced by [`encode_f64`].
pub fn decode_f64(term: &str) -> Option<f64> {
    decode_i64(term).map(int64_to_float64)
}
