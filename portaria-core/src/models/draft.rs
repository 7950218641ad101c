use serde::Serialize;
use std::fmt;

use super::visitor::VisitorRecord;
use crate::format::{digits, format_cpf, format_phone, CPF_DIGITS, PHONE_MIN_DIGITS};

/// The entry form while it is being filled in.
///
/// Values are kept as typed (masked or not); normalization happens when the
/// record is built.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EntryDraft {
    pub full_name: String,
    pub cpf: String,
    pub phone: String,
    pub responsible: String,
    /// Set when name and phone were prefilled from an earlier visit.
    pub returning: bool,
}

impl EntryDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_full_name(mut self, full_name: impl Into<String>) -> Self {
        self.full_name = full_name.into().to_uppercase();
        self
    }

    pub fn with_cpf(mut self, cpf: impl AsRef<str>) -> Self {
        self.set_cpf(cpf.as_ref());
        self
    }

    /// Masks the CPF as typed. Input longer than eleven digits is kept as
    /// bare digits so lookup and validation still see the overflow.
    pub fn set_cpf(&mut self, cpf: &str) {
        let cpf_digits = digits(cpf);
        self.cpf = if cpf_digits.len() > CPF_DIGITS {
            cpf_digits
        } else {
            format_cpf(&cpf_digits)
        };
    }

    pub fn with_phone(mut self, phone: impl AsRef<str>) -> Self {
        self.phone = format_phone(phone.as_ref());
        self
    }

    pub fn with_responsible(mut self, responsible: impl Into<String>) -> Self {
        self.responsible = responsible.into();
        self
    }

    /// CPF digits of the draft.
    pub fn cpf_digits(&self) -> String {
        digits(&self.cpf)
    }

    /// Copies name and phone from an earlier visit and flags the draft as
    /// returning.
    pub fn prefill_from(&mut self, previous: &VisitorRecord) {
        self.full_name = previous.full_name.clone();
        self.phone = format_phone(&previous.phone);
        self.returning = true;
    }

    /// Per-field validation. Any flag set blocks submission.
    pub fn validate(&self) -> FieldErrors {
        FieldErrors {
            cpf: digits(&self.cpf).len() != CPF_DIGITS,
            full_name: self.full_name.trim().is_empty(),
            phone: digits(&self.phone).len() < PHONE_MIN_DIGITS,
            responsible: self.responsible.trim().is_empty(),
        }
    }
}

/// Validation flags for the entry form, one per field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FieldErrors {
    pub cpf: bool,
    pub full_name: bool,
    pub phone: bool,
    pub responsible: bool,
}

impl FieldErrors {
    pub fn any(&self) -> bool {
        self.cpf || self.full_name || self.phone || self.responsible
    }

    fn fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.cpf {
            fields.push("cpf (11 digits)");
        }
        if self.full_name {
            fields.push("full name");
        }
        if self.phone {
            fields.push("phone (at least 10 digits)");
        }
        if self.responsible {
            fields.push("responsible");
        }
        fields
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Missing or invalid: {}", self.fields().join(", "))
    }
}
