use std::io::Write;

use anyhow::{Context, Result};
use rand::seq::IndexedRandom;
use rand::Rng;

const FIRST_NAMES: [&str; 20] = [
    "Ana", "Bruno", "Carlos", "Diana", "Eduardo", "Fernanda", "Gabriel", "Helena", "Igor",
    "Julia", "Lucas", "Maria", "Nicolas", "Olivia", "Pedro", "Rafaela", "Samuel", "Tatiana",
    "Vitor", "Yasmin",
];

const LAST_NAMES: [&str; 20] = [
    "Silva", "Santos", "Oliveira", "Souza", "Pereira", "Costa", "Ferreira", "Almeida",
    "Nascimento", "Lima", "Araújo", "Ribeiro", "Carvalho", "Gomes", "Martins", "Rocha",
    "Rodrigues", "Moreira", "Barbosa", "Lopes",
];

const TAG_POOL: [&str; 10] = [
    "ortho",
    "implant",
    "cleaning",
    "whitening",
    "braces",
    "checkup",
    "urgent",
    "vip",
    "returning",
    "new-patient",
];

/// Brazilian area codes that carry mobile numbers
const AREA_CODES: [u8; 67] = [
    11, 12, 13, 14, 15, 16, 17, 18, 19, 21, 22, 24, 27, 28, 31, 32, 33, 34, 35, 37, 38, 41, 42,
    43, 44, 45, 46, 47, 48, 49, 51, 53, 54, 55, 61, 62, 64, 63, 65, 66, 67, 68, 69, 71, 73, 74,
    75, 77, 79, 81, 82, 83, 84, 85, 88, 86, 89, 87, 91, 93, 94, 92, 97, 95, 96, 98, 99,
];

const CPF_RATIO: f64 = 0.7;
const EMAIL_RATIO: f64 = 0.8;
const MAX_TAGS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedLead {
    pub name: String,
    pub phone: String,
    pub cpf: String,
    pub email: String,
    pub tags: String,
}

impl GeneratedLead {
    /// Row `index` (1-based) of a generated file
    pub fn random<R: Rng + ?Sized>(rng: &mut R, index: usize) -> Self {
        let cpf = if rng.random_bool(CPF_RATIO) {
            random_cpf(rng)
        } else {
            String::new()
        };
        let email = if rng.random_bool(EMAIL_RATIO) {
            format!("lead{}@example.com", index)
        } else {
            String::new()
        };

        Self {
            name: random_name(rng),
            phone: random_phone(rng),
            cpf,
            email,
            tags: random_tags(rng),
        }
    }

    fn record(&self) -> [&str; 5] {
        [&self.name, &self.phone, &self.cpf, &self.email, &self.tags]
    }
}

fn random_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    let first = FIRST_NAMES.choose(rng).copied().unwrap_or("Ana");
    let last = LAST_NAMES.choose(rng).copied().unwrap_or("Silva");
    format!("{} {}", first, last)
}

/// `+55{area}9{8 digits}`, subscriber never starting with 0
fn random_phone<R: Rng + ?Sized>(rng: &mut R) -> String {
    let area = AREA_CODES.choose(rng).copied().unwrap_or(11);
    let subscriber: u32 = rng.random_range(10_000_000..100_000_000);
    format!("+55{}9{}", area, subscriber)
}

fn cpf_check_digit(digits: &[u32]) -> u32 {
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

/// Eleven digits with valid check digits; repeated-digit bases are redrawn
fn random_cpf<R: Rng + ?Sized>(rng: &mut R) -> String {
    let mut digits: Vec<u32> = loop {
        let base: Vec<u32> = (0..9).map(|_| rng.random_range(0..10)).collect();
        if base.iter().any(|d| *d != base[0]) {
            break base;
        }
    };
    digits.push(cpf_check_digit(&digits));
    digits.push(cpf_check_digit(&digits));

    digits
        .iter()
        .filter_map(|d| char::from_digit(*d, 10))
        .collect()
}

fn random_tags<R: Rng + ?Sized>(rng: &mut R) -> String {
    let count = rng.random_range(0..=MAX_TAGS);
    TAG_POOL
        .choose_multiple(rng, count)
        .copied()
        .collect::<Vec<_>>()
        .join(", ")
}

/// Write a header plus `rows` generated leads as CSV
pub fn write_leads_csv<W: Write, R: Rng + ?Sized>(out: W, rows: usize, rng: &mut R) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    writer
        .write_record(leadflow_processing::EXPECTED_COLUMNS)
        .context("Failed to write header")?;

    for index in 1..=rows {
        let lead = GeneratedLead::random(rng, index);
        writer
            .write_record(lead.record())
            .with_context(|| format!("Failed to write row {}", index))?;
    }

    writer.flush().context("Failed to flush CSV output")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadflow_processing::FileParser;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_generated_file_passes_validation() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut buffer = Vec::new();
        write_leads_csv(&mut buffer, 300, &mut rng).unwrap();

        let rows = FileParser::new().parse(&buffer, "leads.csv").unwrap();
        assert_eq!(rows.len(), 300);
        assert!(rows.iter().all(|r| r.dial_code == "55"));
        assert!(rows.iter().all(|r| r.tags.len() <= MAX_TAGS));
    }

    #[test]
    fn test_cpf_has_valid_check_digits() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..50 {
            let cpf = random_cpf(&mut rng);
            assert_eq!(cpf.len(), 11);
            let digits: Vec<u32> = cpf.chars().filter_map(|c| c.to_digit(10)).collect();
            assert_eq!(cpf_check_digit(&digits[..9]), digits[9]);
            assert_eq!(cpf_check_digit(&digits[..10]), digits[10]);
        }
    }

    #[test]
    fn test_email_uses_row_index() {
        let mut rng = StdRng::seed_from_u64(3);
        let lead = (0..20)
            .map(|_| GeneratedLead::random(&mut rng, 42))
            .find(|l| !l.email.is_empty())
            .unwrap();
        assert_eq!(lead.email, "lead42@example.com");
        assert!(lead.phone.starts_with("+55"));
        assert_eq!(lead.phone.len(), 14);
    }
}
