//! BER definite length encoding.

/// Encode a BER length in definite form.
///
/// Returns a stack-allocated array and the number of valid bytes. The
/// bytes are ordered for the reverse encode buffer: least-significant
/// octet first, long-form marker last, so that reversing the buffer at
/// [`EncodeBuf::finish`](super::EncodeBuf::finish) yields wire order.
pub fn encode_length(len: usize) -> ([u8; 5], usize) {
    if len < 0x80 {
        return ([len as u8, 0, 0, 0, 0], 1);
    }

    let mut out = [0u8; 5];
    let mut n = 0;
    let mut v = len;
    while v > 0 {
        out[n] = (v & 0xFF) as u8;
        v >>= 8;
        n += 1;
    }
    out[n] = 0x80 | n as u8;
    (out, n + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wire(len: usize) -> Vec<u8> {
        let (bytes, count) = encode_length(len);
        // Mirror the reverse buffer: pushed in array order, then reversed
        bytes[..count].iter().rev().copied().collect()
    }

    #[test]
    fn test_short_form() {
        assert_eq!(wire(0), vec![0x00]);
        assert_eq!(wire(42), vec![0x2A]);
        assert_eq!(wire(127), vec![0x7F]);
    }

    #[test]
    fn test_long_form() {
        assert_eq!(wire(128), vec![0x81, 0x80]);
        assert_eq!(wire(255), vec![0x81, 0xFF]);
        assert_eq!(wire(256), vec![0x82, 0x01, 0x00]);
        assert_eq!(wire(65535), vec![0x82, 0xFF, 0xFF]);
        assert_eq!(wire(65536), vec![0x83, 0x01, 0x00, 0x00]);
    }
}
