//! The extraction rule table.
//!
//! Each [`Rule`] pairs a target [`Field`] with a regex and a [`Policy`] that
//! says which matches to keep and how to shape them. Rules know nothing about
//! each other, so each one can be tested on its own.

use std::sync::LazyLock;

use regex::Regex;

/// Which part of a [`super::StructuredRecord`] a rule fills in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    Email,
    Phone,
    /// Fills both `name` and `surname`.
    NameSurname,
    Address,
    Skills,
    Experience,
    Education,
    Languages,
    Certifications,
}

/// How matches of a rule's pattern become a value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Policy {
    /// The first whole match.
    FirstMatch,
    /// Groups 1 and 2 of the first match.
    FirstPair,
    /// The first `n` whole matches, joined with spaces.
    JoinFirst(usize),
    /// Group 1 of the first match, split on commas and periods. Segments are
    /// trimmed and empty ones dropped.
    LabeledList,
    /// Group 1 of every match.
    EveryCapture,
    /// `"<group 1> <group 2>"` for every match.
    CapturePairs,
}

/// A value produced by a rule.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Extracted {
    Text(String),
    Pair(String, String),
    List(Vec<String>),
}

/// One row of the rule table.
#[derive(Debug)]
pub struct Rule {
    pub field: Field,
    pub pattern: &'static str,
    pub policy: Policy,
}

/// Street and locale words that end an address match.
macro_rules! address_keywords {
    () => {
        "Street|Avenue|Road|Rue|Blvd|Building|Apartment|Block|Tower|City|State|Zip|Postal|Country"
    };
}

/// The value window after a section label. It may start on the line after the
/// label, but it never runs past the end of its own line.
macro_rules! labeled_list {
    ($labels:literal) => {
        concat!(r"(?i)(?:", $labels, r")[:\s]+([\w \t,.-]+)")
    };
}

/// Every rule we apply, in evaluation order. Order does not affect results.
pub static RULES: &[Rule] = &[
    Rule {
        field: Field::Email,
        pattern: r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}",
        policy: Policy::FirstMatch,
    },
    Rule {
        field: Field::Phone,
        pattern: r"(\+?\d{1,3}[-.\s]?)?(\(?\d{2,4}\)?[-.\s]?)?\d{3,4}[-.\s]?\d{3,4}",
        policy: Policy::FirstMatch,
    },
    Rule {
        field: Field::NameSurname,
        pattern: r"([A-Z][a-z]+)\s+([A-Z][a-z]+)",
        policy: Policy::FirstPair,
    },
    Rule {
        field: Field::Address,
        pattern: concat!(r"(?i)\d{1,5}[\w\s]+(?:", address_keywords!(), ")"),
        policy: Policy::JoinFirst(2),
    },
    Rule {
        field: Field::Skills,
        pattern: labeled_list!("skills|compétences"),
        policy: Policy::LabeledList,
    },
    Rule {
        field: Field::Experience,
        pattern: r"(?i)(\d{1,2})\s?(?:years?|ans?)\s?(?:of experience|expérience)?",
        policy: Policy::EveryCapture,
    },
    Rule {
        field: Field::Education,
        pattern: r"(B\.?Sc|M\.?Sc|B\.?Tech|M\.?Tech|Ph\.?D|MBA|BE|BS|MS)\s?.*?(\d{4})",
        policy: Policy::CapturePairs,
    },
    Rule {
        field: Field::Languages,
        pattern: labeled_list!("languages|langues"),
        policy: Policy::LabeledList,
    },
    Rule {
        field: Field::Certifications,
        pattern: labeled_list!("certifications"),
        policy: Policy::LabeledList,
    },
];

/// A [`Rule`] with its regex compiled.
#[derive(Debug)]
pub struct CompiledRule {
    pub rule: &'static Rule,
    regex: Regex,
}

impl CompiledRule {
    /// Run this rule against `text`. Returns `None` if nothing matched.
    pub fn apply(&self, text: &str) -> Option<Extracted> {
        let group = |caps: &regex::Captures<'_>, i: usize| {
            caps.get(i).map_or("", |m| m.as_str()).to_owned()
        };
        match self.rule.policy {
            Policy::FirstMatch => self
                .regex
                .find(text)
                .map(|m| Extracted::Text(m.as_str().to_owned())),
            Policy::FirstPair => self
                .regex
                .captures(text)
                .map(|caps| Extracted::Pair(group(&caps, 1), group(&caps, 2))),
            Policy::JoinFirst(n) => {
                let matches = self
                    .regex
                    .find_iter(text)
                    .take(n)
                    .map(|m| m.as_str())
                    .collect::<Vec<_>>();
                (!matches.is_empty()).then(|| Extracted::Text(matches.join(" ")))
            }
            Policy::LabeledList => {
                let caps = self.regex.captures(text)?;
                Some(Extracted::List(split_list(caps.get(1)?.as_str())))
            }
            Policy::EveryCapture => {
                let values = self
                    .regex
                    .captures_iter(text)
                    .map(|caps| group(&caps, 1))
                    .collect::<Vec<_>>();
                (!values.is_empty()).then_some(Extracted::List(values))
            }
            Policy::CapturePairs => {
                let values = self
                    .regex
                    .captures_iter(text)
                    .map(|caps| format!("{} {}", group(&caps, 1), group(&caps, 2)))
                    .collect::<Vec<_>>();
                (!values.is_empty()).then_some(Extracted::List(values))
            }
        }
    }
}

/// Split a list window on commas and periods.
fn split_list(window: &str) -> Vec<String> {
    window
        .split([',', '.'])
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_owned)
        .collect()
}

/// [`RULES`], compiled once.
pub static COMPILED_RULES: LazyLock<Vec<CompiledRule>> = LazyLock::new(|| {
    RULES
        .iter()
        .map(|rule| CompiledRule {
            rule,
            regex: Regex::new(rule.pattern).expect("built-in extraction pattern should compile"),
        })
        .collect()
});
