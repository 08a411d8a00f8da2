//! Human-readable rendering of key components.

use rsa::BigUint;

/// The number of octets rendered per line.
pub const OCTETS_PER_LINE: usize = 15;

/// The indentation used for component values in key dumps.
pub(crate) const INDENT: &str = "    ";

/// Writes `value` to `out` as colon-separated, line-wrapped hexadecimal octets.
///
/// The lowercase hexadecimal representation of `value` is left-padded with a zero if it has an
/// odd number of digits.
/// The octets are separated by `:` and a line break is inserted before every
/// [`OCTETS_PER_LINE`]th octet.
/// Each line starts with `indent` and the output is terminated by a newline.
pub fn write_hex_blocks(out: &mut String, value: &BigUint, indent: &str) {
    let mut digits = value.to_str_radix(16);
    if digits.len() % 2 != 0 {
        digits.insert(0, '0');
    }

    for (index, octet) in digits.as_bytes().chunks(2).enumerate() {
        if index > 0 {
            out.push(':');
            if index % OCTETS_PER_LINE == 0 {
                out.push('\n');
            }
        }
        if index % OCTETS_PER_LINE == 0 {
            out.push_str(indent);
        }
        // the digits are ASCII only
        out.extend(octet.iter().map(|digit| char::from(*digit)));
    }
    out.push('\n');
}

/// Returns `value` as colon-separated, line-wrapped hexadecimal octets.
///
/// # Examples
///
/// ```
/// use rsa::BigUint;
/// use signstar_pkey::text::hex_blocks;
///
/// assert_eq!(hex_blocks(&BigUint::from(0u32)), "00\n");
/// assert_eq!(hex_blocks(&BigUint::from(0xabcu32)), "0a:bc\n");
/// ```
pub fn hex_blocks(value: &BigUint) -> String {
    let mut out = String::new();
    write_hex_blocks(&mut out, value, "");
    out
}

/// Writes a labelled key component to `out`.
pub(crate) fn write_component(out: &mut String, label: &str, value: &BigUint) {
    out.push_str(label);
    out.push_str(":\n");
    write_hex_blocks(out, value, INDENT);
}

/// Writes a labelled small integer, such as a public exponent, in decimal and hexadecimal to
/// `out`.
pub(crate) fn write_integer(out: &mut String, label: &str, value: &BigUint) {
    out.push_str(&format!(
        "{label}: {} (0x{})\n",
        value.to_str_radix(10),
        value.to_str_radix(16)
    ));
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn strip(formatted: &str) -> String {
        formatted
            .chars()
            .filter(|char| char.is_ascii_hexdigit())
            .collect()
    }

    #[rstest]
    #[case(0, "00\n")]
    #[case(1, "01\n")]
    #[case(0xff, "ff\n")]
    #[case(0x100, "01:00\n")]
    #[case(0x10001, "01:00:01\n")]
    #[case(0xdeadbeef, "de:ad:be:ef\n")]
    fn small_values(#[case] value: u64, #[case] expected: &str) {
        assert_eq!(hex_blocks(&BigUint::from(value)), expected);
    }

    #[test]
    fn exactly_one_line() {
        let value = BigUint::from_bytes_be(&[0x11; OCTETS_PER_LINE]);
        assert_eq!(
            hex_blocks(&value),
            "11:11:11:11:11:11:11:11:11:11:11:11:11:11:11\n"
        );
    }

    #[test]
    fn wraps_before_sixteenth_octet() {
        let bytes: Vec<u8> = (1..=17).collect();
        let value = BigUint::from_bytes_be(&bytes);
        assert_eq!(
            hex_blocks(&value),
            "01:02:03:04:05:06:07:08:09:0a:0b:0c:0d:0e:0f:\n10:11\n"
        );
    }

    #[test]
    fn indents_every_line() {
        let bytes: Vec<u8> = (1..=31).collect();
        let mut out = String::new();
        write_hex_blocks(&mut out, &BigUint::from_bytes_be(&bytes), "    ");

        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines.iter().all(|line| line.starts_with("    ")));
        assert_eq!(lines[2], "    1f");
    }

    #[rstest]
    #[case(&[0x0f, 0xff, 0x00, 0x12])]
    #[case(&[0x80; 64])]
    #[case(&[0xc3, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d, 0x0e, 0x0f, 0x10])]
    fn stripped_output_parses_to_value(#[case] bytes: &[u8]) {
        let value = BigUint::from_bytes_be(bytes);
        let formatted = hex_blocks(&value);

        assert!(formatted.ends_with('\n'));
        assert_eq!(strip(&formatted).len() % 2, 0);
        assert_eq!(
            BigUint::parse_bytes(strip(&formatted).as_bytes(), 16),
            Some(value)
        );
    }

    #[test]
    fn integer_component() {
        let mut out = String::new();
        write_integer(&mut out, "publicExponent", &BigUint::from(65537u32));
        assert_eq!(out, "publicExponent: 65537 (0x10001)\n");
    }
}
