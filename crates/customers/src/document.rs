//! Brazilian document and postal code helpers.

fn digits(raw: &str) -> Vec<u32> {
    raw.chars().filter_map(|c| c.to_digit(10)).collect()
}

/// Strip punctuation from a CPF, keeping only its digits.
pub fn normalize_cpf(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

/// Check length, punctuation and both mod-11 verification digits.
pub fn is_valid_cpf(raw: &str) -> bool {
    if raw.chars().any(|c| !(c.is_ascii_digit() || c == '.' || c == '-' || c == ' ')) {
        return false;
    }
    let d = digits(raw);
    if d.len() != 11 || d.iter().all(|&x| x == d[0]) {
        return false;
    }

    [9usize, 10].iter().all(|&n| {
        let sum: u32 = d[..n]
            .iter()
            .enumerate()
            .map(|(i, &x)| x * (n as u32 + 1 - i as u32))
            .sum();
        let check = match sum * 10 % 11 {
            10 => 0,
            v => v,
        };
        check == d[n]
    })
}

/// Returns the eight CEP digits, or `None` when the input is not a CEP.
pub fn normalize_cep(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.chars().any(|c| !(c.is_ascii_digit() || c == '-')) {
        return None;
    }
    let only: String = trimmed.chars().filter(char::is_ascii_digit).collect();
    (only.len() == 8).then_some(only)
}
