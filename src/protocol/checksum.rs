//! Internet checksum (RFC 1071)
//!
//! Bytes are summed as consecutive 16-bit pairs in wire order, so the result
//! is meant to be written back with `to_be_bytes`. A trailing odd byte is
//! padded with a zero byte, as if the buffer were one byte longer.

/// Computes the Internet checksum of `data`.
///
/// Any checksum field covered by `data` must already be zero.
pub fn checksum(data: &[u8]) -> u16 {
    fold(sum_words(data, 0))
}

/// Returns true if `data`, checksum field included, sums to zero
pub fn verify(data: &[u8]) -> bool {
    checksum(data) == 0
}

/// Adds the 16-bit words of `data` to `sum`
fn sum_words(data: &[u8], mut sum: u32) -> u32 {
    let mut words = data.chunks_exact(2);
    for word in &mut words {
        sum = sum.wrapping_add(u32::from(u16::from_be_bytes([word[0], word[1]])));
    }
    if let [last] = words.remainder() {
        sum = sum.wrapping_add(u32::from(u16::from_be_bytes([*last, 0])));
    }
    sum
}

/// Folds the carries back into the low 16 bits and complements
fn fold(mut sum: u32) -> u16 {
    while sum >> 16 != 0 {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }
    !(sum as u16)
}
