//! Row validators
//!
//! Pure functions turning raw spreadsheet cells into canonical values. They never touch
//! I/O, so the parser can run them for every row before anything is persisted.

pub mod cpf;
pub mod email;
pub mod phone;

pub use cpf::validate_cpf;
pub use email::{validate_email, MAX_EMAIL_LENGTH};
pub use phone::{validate_phone, CanonicalPhone, DEFAULT_REGION};

/// Semantic failure of a single cell. The display text is what clients see in row errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    #[error("invalid phone number")]
    InvalidPhone,

    #[error("CPF must have 11 digits")]
    CpfLength,

    #[error("invalid CPF")]
    InvalidCpf,

    #[error("email must be at most {MAX_EMAIL_LENGTH} characters")]
    EmailTooLong,

    #[error("invalid email format")]
    InvalidEmail,
}
