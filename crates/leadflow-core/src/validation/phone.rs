use phonenumber::{country, Mode};

use super::FieldError;

/// Region assumed for numbers written without an international prefix
pub const DEFAULT_REGION: country::Id = country::Id::BR;

/// Normalized phone used for every comparison and write.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalPhone {
    /// Country calling code without the plus sign, e.g. `55`
    pub dial_code: String,
    /// ISO 3166-1 region, e.g. `BR`
    pub region_code: String,
    /// National significant number formatted nationally, digits only
    pub national: String,
}

/// Parse `raw` against [`DEFAULT_REGION`] and canonicalize it.
pub fn validate_phone(raw: &str) -> Result<CanonicalPhone, FieldError> {
    let number =
        phonenumber::parse(Some(DEFAULT_REGION), raw.trim()).map_err(|_| FieldError::InvalidPhone)?;

    if !phonenumber::is_valid(&number) {
        return Err(FieldError::InvalidPhone);
    }

    let region_code = number
        .country()
        .id()
        .map(|id| id.as_ref().to_string())
        .unwrap_or_default();

    let national: String = number
        .format()
        .mode(Mode::National)
        .to_string()
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect();

    Ok(CanonicalPhone {
        dial_code: number.code().value().to_string(),
        region_code,
        national,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_brazilian_mobile_without_prefix() {
        let phone = validate_phone("11987654321").unwrap();
        assert_eq!(phone.dial_code, "55");
        assert_eq!(phone.region_code, "BR");
        assert_eq!(phone.national, "11987654321");
    }

    #[test]
    fn test_textual_variants_canonicalize_identically() {
        let variants = [
            "+55 11 98765-4321",
            "(11) 98765-4321",
            "+5511987654321",
            "11 98765 4321",
        ];
        let canonical: Vec<CanonicalPhone> = variants
            .iter()
            .map(|v| validate_phone(v).unwrap())
            .collect();
        for phone in &canonical {
            assert_eq!(phone, &canonical[0]);
        }
    }

    #[test]
    fn test_foreign_number_keeps_its_region() {
        let phone = validate_phone("+351 912 345 678").unwrap();
        assert_eq!(phone.dial_code, "351");
        assert_eq!(phone.region_code, "PT");
        assert_eq!(phone.national, "912345678");
    }

    #[test]
    fn test_rejects_garbage_and_short_numbers() {
        assert_eq!(validate_phone("not a phone"), Err(FieldError::InvalidPhone));
        assert_eq!(validate_phone("123"), Err(FieldError::InvalidPhone));
        assert_eq!(validate_phone(""), Err(FieldError::InvalidPhone));
    }
}
