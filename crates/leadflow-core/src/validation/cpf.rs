use super::FieldError;

const CPF_LENGTH: usize = 11;

/// Validate a CPF (Brazilian individual taxpayer id) and return its 11 digits.
///
/// Punctuation is ignored, so `529.982.247-25` and `52998224725` are equivalent.
pub fn validate_cpf(raw: &str) -> Result<String, FieldError> {
    let digits: Vec<u32> = raw.chars().filter_map(|c| c.to_digit(10)).collect();

    if digits.len() != CPF_LENGTH {
        return Err(FieldError::CpfLength);
    }

    if digits.iter().all(|d| *d == digits[0]) {
        return Err(FieldError::InvalidCpf);
    }

    if check_digit(&digits[..9]) != digits[9] || check_digit(&digits[..10]) != digits[10] {
        return Err(FieldError::InvalidCpf);
    }

    Ok(digits
        .iter()
        .filter_map(|d| char::from_digit(*d, 10))
        .collect())
}

/// Weighted sum mod 11 with weights running from `len + 1` down to 2.
fn check_digit(digits: &[u32]) -> u32 {
    let top = digits.len() as u32 + 1;
    let sum: u32 = digits
        .iter()
        .enumerate()
        .map(|(i, d)| d * (top - i as u32))
        .sum();
    match (sum * 10) % 11 {
        10 => 0,
        rest => rest,
    }
}
