/// Formats a byte slice as a comma separated list of hexadecimal values (`0xF0, 0x79, ...`).
pub fn format_as_hex(slice: &[u8]) -> String {
    slice
        .iter()
        .map(|byte| format!("0x{:02X}", byte))
        .collect::<Vec<String>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_as_hex() {
        assert_eq!(format_as_hex(&[]), "");
        assert_eq!(format_as_hex(&[0xF9, 0x02, 0x06]), "0xF9, 0x02, 0x06");
    }
}
