// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Test data generators for attack simulation.

/// Generate a pool of distinct addresses in the 10.x.x.x private range.
pub fn generate_addresses(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| {
            let a = (i >> 16) & 0xFF;
            let b = (i >> 8) & 0xFF;
            let c = i & 0xFF;
            format!("10.{a}.{b}.{c}")
        })
        .collect()
}

/// Generate a pool of declared usernames.
pub fn generate_usernames(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("user-{i}")).collect()
}

/// Address/username pairs that must be rejected before any store access.
pub fn generate_blank_identities() -> Vec<(&'static str, &'static str)> {
    vec![
        ("", "alice"),
        ("   ", "alice"),
        ("\t", "alice"),
        ("10.0.0.1", ""),
        ("10.0.0.1", "  "),
        ("", ""),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_addresses() {
        let addresses = generate_addresses(300);
        assert_eq!(addresses.len(), 300);
        // All should be unique
        let unique: std::collections::HashSet<_> = addresses.iter().collect();
        assert_eq!(unique.len(), 300);
        assert_eq!(addresses[257], "10.0.1.1");
    }

    #[test]
    fn test_generate_usernames() {
        let names = generate_usernames(3);
        assert_eq!(names, vec!["user-0", "user-1", "user-2"]);
    }
}
