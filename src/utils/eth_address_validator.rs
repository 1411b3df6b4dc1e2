use crate::utils::keccak::keccak256;

/// Checks that `address` is a `0x`-prefixed, 20-byte hex address.
///
/// All-lowercase and all-uppercase addresses carry no checksum and are
/// accepted as-is. Mixed-case addresses must satisfy EIP-55.
pub fn is_valid_eth_address(address: &str) -> bool {
    if address.len() != 42 {
        return false;
    }

    let Some(addr_part) = address.strip_prefix("0x").or_else(|| address.strip_prefix("0X")) else {
        return false;
    };

    if !addr_part.chars().all(|c| c.is_ascii_hexdigit()) {
        return false;
    }

    let has_lower = addr_part.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = addr_part.chars().any(|c| c.is_ascii_uppercase());
    if !(has_lower && has_upper) {
        return true;
    }

    to_checksum_address(addr_part)[2..] == *addr_part
}

/// EIP-55 mixed-case rendering of an address, with or without `0x`.
pub fn to_checksum_address(address: &str) -> String {
    let lower = address
        .strip_prefix("0x")
        .or_else(|| address.strip_prefix("0X"))
        .unwrap_or(address)
        .to_ascii_lowercase();
    let hash = keccak256(lower.as_bytes());

    let checksummed: String = lower
        .chars()
        .enumerate()
        .map(|(i, c)| {
            let nibble = if i % 2 == 0 { hash[i / 2] >> 4 } else { hash[i / 2] & 0x0f };
            if c.is_ascii_alphabetic() && nibble >= 8 {
                c.to_ascii_uppercase()
            } else {
                c
            }
        })
        .collect();

    format!("0x{}", checksummed)
}
