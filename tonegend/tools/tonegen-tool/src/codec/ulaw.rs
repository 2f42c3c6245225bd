//! G.711 µ-law, the companding used on T1 voice timeslots.

const BIAS: u16 = 33;

/// Encodes a 14-bit linear sample (full scale +/-8159).
pub fn encode_i14(linear: i16) -> u8 {
    let linear = linear.clamp(-8031, 8031);

    // One's complement for negative samples, so -1 lands on the zero segment.
    let (sign, magnitude) = if linear < 0 {
        (0x80u8, !linear as u16)
    } else {
        (0x00u8, linear as u16)
    };

    let biased = (magnitude + BIAS) << 3;
    let leading_zeros = biased.leading_zeros();
    debug_assert!(leading_zeros < 8);

    let exponent = (7 - leading_zeros) as u8;
    let mantissa = (biased >> (11 - leading_zeros)) as u8 & 0x0f;

    !(sign | (exponent << 4) | mantissa)
}

/// Encodes a 16-bit linear sample. The two low bits are below µ-law resolution.
pub fn encode(sample: i16) -> u8 {
    encode_i14(sample >> 2)
}

/// Decodes to 16-bit linear.
#[cfg(test)]
pub fn decode(code: u8) -> i16 {
    let code = !code;
    let exponent = (code >> 4) & 0x07;
    let mantissa = i32::from(code & 0x0f);

    let magnitude = (((mantissa << 3) + 0x84) << exponent) - 0x84;
    if code & 0x80 != 0 {
        -magnitude as i16
    } else {
        magnitude as i16
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn encoder_vs_g711_tables() {
        let expected = [
            // G.711 table 2a
            ( 8159, 0b1000_0000),
            ( 8031, 0b1000_0000),
            ( 7902, 0b1000_0001),
            ( 4191, 0b1000_1111),
            ( 4062, 0b1001_0000),
            ( 2079, 0b1001_1111),
            ( 1023, 0b1010_1111),
            (  495, 0b1011_1111),
            (  231, 0b1100_1111),
            (   99, 0b1101_1111),
            (   33, 0b1110_1111),
            (    2, 0b1111_1110),
            (    0, 0b1111_1111),

            // G.711 table 2b
            (   -1, 0b0111_1111),
            (   -2, 0b0111_1110),
            (  -33, 0b0110_1111),
            (  -99, 0b0101_1111),
            ( -231, 0b0100_1111),
            ( -495, 0b0011_1111),
            (-1023, 0b0010_1111),
            (-2079, 0b0001_1111),
            (-4191, 0b0000_1111),
            (-7775, 0b0000_0001),
            (-8031, 0b0000_0000),
            (-8191, 0b0000_0000),
        ];

        for (linear, code) in expected {
            assert_eq!(super::encode_i14(linear), code, "encoding {linear}");
        }
    }

    #[test]
    fn decoder_segment_ends() {
        assert_eq!(super::decode(0x80), 32124);
        assert_eq!(super::decode(0x00), -32124);
        assert_eq!(super::decode(0xff), 0);
        assert_eq!(super::decode(0x7f), 0);
        assert_eq!(super::decode(0xef), 132);
    }

    #[test]
    fn sixteen_bit_tracks_companding() {
        for sample in [-32767i16, -12000, -300, -4, 0, 4, 300, 12000, 32767] {
            let decoded = super::decode(super::encode(sample));
            let error = (i32::from(decoded) - i32::from(sample)).abs();
            assert!(error <= i32::from(sample).abs() / 16 + 8, "{sample} -> {decoded}");
        }
    }
}
