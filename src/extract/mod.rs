//! Turning OCR text into structured CV fields.
//!
//! This is a best-effort, rule-based extractor. It knows a handful of English
//! and French section labels and some loose patterns for contact details, and
//! nothing else. Fields that don't match stay empty; there is no such thing as
//! an extraction error.

use schemars::JsonSchema;

use crate::prelude::*;

use self::rules::{COMPILED_RULES, Extracted, Field};

pub mod rules;

/// The fields we pull out of a CV.
///
/// Missing values are empty strings or empty lists, never `null`.
#[derive(Clone, Debug, Default, Deserialize, JsonSchema, PartialEq, Eq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StructuredRecord {
    /// The first of the first pair of capitalized words.
    pub name: String,

    /// The second of the first pair of capitalized words.
    pub surname: String,

    pub email: String,
    pub phone: String,

    /// Up to two address-like fragments, joined with a space.
    pub address: String,

    pub skills: Vec<String>,

    /// Years of experience, as digit strings.
    pub experience: Vec<String>,

    /// Degrees, formatted as `"<degree> <year>"`.
    pub education: Vec<String>,

    pub languages: Vec<String>,
    pub certifications: Vec<String>,
}

impl StructuredRecord {
    /// Store the output of a rule for `field`.
    fn assign(&mut self, field: Field, value: Extracted) {
        match (field, value) {
            (Field::Email, Extracted::Text(v)) => self.email = v,
            (Field::Phone, Extracted::Text(v)) => self.phone = v,
            (Field::Address, Extracted::Text(v)) => self.address = v,
            (Field::NameSurname, Extracted::Pair(name, surname)) => {
                self.name = name;
                self.surname = surname;
            }
            (Field::Skills, Extracted::List(v)) => self.skills = v,
            (Field::Experience, Extracted::List(v)) => self.experience = v,
            (Field::Education, Extracted::List(v)) => self.education = v,
            (Field::Languages, Extracted::List(v)) => self.languages = v,
            (Field::Certifications, Extracted::List(v)) => self.certifications = v,
            (field, value) => {
                unreachable!("rule for {field:?} produced mismatched value {value:?}")
            }
        }
    }
}

/// Extract structured fields from flattened OCR text.
///
/// Pure and deterministic: the same text always gives the same record.
pub fn extract_fields(text: &str) -> StructuredRecord {
    let mut record = StructuredRecord::default();
    for compiled in COMPILED_RULES.iter() {
        if let Some(value) = compiled.apply(text) {
            record.assign(compiled.rule.field, value);
        }
    }
    record
}
