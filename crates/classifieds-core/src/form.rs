//! Listing upload form rules.
//!
//! Covers the behaviour every per-category upload form shares:
//!
//! - cascading selects (`state -> district -> city`, `brand -> model`): changing
//!   a parent clears every dependent child;
//! - the [`OTHER`] sentinel, which swaps an id select for a free-text field and
//!   exempts the select from id validation;
//! - field validation on blur, and full validation on submit that marks every
//!   field touched and reports the first invalid field for focus.

use std::collections::{BTreeMap, BTreeSet};

/// Select value meaning "not in the list, let me type it".
pub const OTHER: &str = "other";

/// An ordered parent-to-child chain of dependent selects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CascadeChain {
    levels: Vec<String>,
}

impl CascadeChain {
    pub fn new<I, S>(levels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            levels: levels.into_iter().map(Into::into).collect(),
        }
    }

    /// Fields that depend on `field`, nearest first. Empty when `field` is the
    /// last level or not part of the chain.
    #[must_use]
    pub fn dependents(&self, field: &str) -> &[String] {
        match self.levels.iter().position(|l| l == field) {
            Some(idx) => &self.levels[idx + 1..],
            None => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    Required,
    MinLen(usize),
    MaxLen(usize),
    /// Must parse as a number within the inclusive range.
    Range { min: f64, max: f64 },
    /// Must be a positive integer id from a select. [`OTHER`] is accepted and
    /// makes `other_field` required instead.
    SelectId { other_field: Option<String> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub label: String,
    pub rules: Vec<Rule>,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, label: impl Into<String>, rules: Vec<Rule>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            rules,
        }
    }
}

/// Ordered field specs; the order is the focus order on submit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormSchema {
    pub fields: Vec<FieldSpec>,
}

impl FormSchema {
    #[must_use]
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self { fields }
    }

    fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// The select whose `other` companion is `name`, if any.
    fn owner_of_other(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| {
            f.rules.iter().any(|r| {
                matches!(r, Rule::SelectId { other_field: Some(o) } if o == name)
            })
        })
    }
}

/// Returned by [`FormState::submit`] when any field is invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitRejected {
    /// Field to focus: the first invalid one in schema order.
    pub first_invalid: String,
    pub errors: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    values: BTreeMap<String, String>,
    touched: BTreeSet<String>,
    errors: BTreeMap<String, String>,
}

impl FormState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn value(&self, field: &str) -> &str {
        self.values.get(field).map_or("", String::as_str)
    }

    #[must_use]
    pub fn error(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    #[must_use]
    pub fn is_touched(&self, field: &str) -> bool {
        self.touched.contains(field)
    }

    /// Whether `field` currently shows the free-text input instead of the select.
    #[must_use]
    pub fn is_other(&self, field: &str) -> bool {
        self.value(field) == OTHER
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.values.insert(field.into(), value.into());
    }

    /// Sets a select that is part of `chain` and clears every dependent
    /// selection (value, touched flag and error). Returns the cleared fields.
    pub fn set_cascading(
        &mut self,
        chain: &CascadeChain,
        schema: &FormSchema,
        field: &str,
        value: impl Into<String>,
    ) -> Vec<String> {
        let value = value.into();
        let unchanged = self.value(field) == value;
        self.set(field, value);
        if unchanged {
            return Vec::new();
        }

        let mut cleared = Vec::new();
        for child in chain.dependents(field) {
            self.clear_field(child);
            cleared.push(child.clone());
            if let Some(other) = schema.field(child).and_then(other_field_of) {
                self.clear_field(&other);
                cleared.push(other);
            }
        }
        cleared
    }

    fn clear_field(&mut self, field: &str) {
        self.values.remove(field);
        self.touched.remove(field);
        self.errors.remove(field);
    }

    /// Blur handler: marks the field touched and validates it alone.
    pub fn blur(&mut self, schema: &FormSchema, field: &str) -> Option<&str> {
        self.touched.insert(field.to_string());
        match self.validate_field(schema, field) {
            Some(msg) => {
                self.errors.insert(field.to_string(), msg);
            }
            None => {
                self.errors.remove(field);
            }
        }
        self.error(field)
    }

    /// Submit handler: marks every field touched and validates the full schema.
    ///
    /// # Errors
    ///
    /// Returns [`SubmitRejected`] naming the first invalid field when any rule fails.
    pub fn submit(&mut self, schema: &FormSchema) -> Result<(), SubmitRejected> {
        self.errors.clear();
        let mut first_invalid = None;
        for spec in &schema.fields {
            self.touched.insert(spec.name.clone());
            if let Some(msg) = self.validate_field(schema, &spec.name) {
                if first_invalid.is_none() {
                    first_invalid = Some(spec.name.clone());
                }
                self.errors.insert(spec.name.clone(), msg);
            }
        }

        match first_invalid {
            None => Ok(()),
            Some(first_invalid) => Err(SubmitRejected {
                first_invalid,
                errors: self.errors.clone(),
            }),
        }
    }

    fn validate_field(&self, schema: &FormSchema, field: &str) -> Option<String> {
        // A free-text companion is only validated while its select reads "other".
        if let Some(owner) = schema.owner_of_other(field) {
            if !self.is_other(&owner.name) {
                return None;
            }
            let value = self.value(field).trim();
            if value.is_empty() {
                return Some(format!("Please enter the {}", owner.label.to_lowercase()));
            }
        }

        let spec = schema.field(field)?;
        let value = self.value(field).trim();

        for rule in &spec.rules {
            let failed = match rule {
                Rule::Required => value.is_empty().then(|| format!("{} is required", spec.label)),
                Rule::MinLen(n) => (!value.is_empty() && value.chars().count() < *n)
                    .then(|| format!("{} must be at least {n} characters", spec.label)),
                Rule::MaxLen(n) => (value.chars().count() > *n)
                    .then(|| format!("{} must be at most {n} characters", spec.label)),
                Rule::Range { min, max } => {
                    if value.is_empty() {
                        None
                    } else {
                        match value.parse::<f64>() {
                            Ok(v) if v >= *min && v <= *max => None,
                            Ok(_) => Some(format!("{} must be between {min} and {max}", spec.label)),
                            Err(_) => Some(format!("{} must be a number", spec.label)),
                        }
                    }
                }
                Rule::SelectId { .. } => {
                    if value.is_empty() || value == OTHER {
                        None
                    } else {
                        match value.parse::<u64>() {
                            Ok(id) if id > 0 => None,
                            _ => Some(format!("Please select a valid {}", spec.label.to_lowercase())),
                        }
                    }
                }
            };
            if failed.is_some() {
                return failed;
            }
        }
        None
    }
}

fn other_field_of(spec: &FieldSpec) -> Option<String> {
    spec.rules.iter().find_map(|r| match r {
        Rule::SelectId { other_field } => other_field.clone(),
        _ => None,
    })
}
