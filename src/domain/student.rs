//! Student attribute types for exam score prediction.
//!
//! Field names follow the "Students Exam Scores" dataset the artifacts were
//! fitted on. Form fields use camelCase, artifact columns use PascalCase.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Errors raised while turning submitted form fields into attributes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AttributeError {
    #[error("Missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("Invalid value for {field}: {value:?} is not an integer")]
    NotAnInteger { field: &'static str, value: String },
}

/// Raw student attributes submitted by the form.
///
/// Categorical values are kept verbatim; only the preprocessor knows which
/// categories are valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentAttributes {
    pub gender: String,
    pub ethnic_group: String,
    pub parent_educ: String,
    pub lunch_type: String,
    pub test_prep: String,
    pub parent_marital_status: String,
    pub practice_sport: String,
    pub is_first_child: String,
    pub nr_siblings: i64,
    pub transport_means: String,
    pub wkly_study_hours: String,
}

/// Form field names, in submission order.
pub const FORM_FIELDS: [&str; 11] = [
    "gender",
    "ethnicGroup",
    "parentEduc",
    "lunchType",
    "testPrep",
    "parentMaritalStatus",
    "practiceSport",
    "isFirstChild",
    "nrSiblings",
    "transportMeans",
    "wklyStudyHours",
];

fn required<'a>(
    form: &'a HashMap<String, String>,
    field: &'static str,
) -> Result<&'a str, AttributeError> {
    form.get(field)
        .map(String::as_str)
        .filter(|v| !v.trim().is_empty())
        .ok_or(AttributeError::MissingField { field })
}

fn required_integer(
    form: &HashMap<String, String>,
    field: &'static str,
) -> Result<i64, AttributeError> {
    let raw = required(form, field)?;
    raw.trim()
        .parse::<i64>()
        .map_err(|_| AttributeError::NotAnInteger {
            field,
            value: raw.to_string(),
        })
}

impl StudentAttributes {
    /// Build attributes from submitted form fields.
    ///
    /// Fields are checked in form order, so the first offending field is the
    /// one reported.
    ///
    /// # Errors
    /// Returns `MissingField` for absent or blank fields and `NotAnInteger`
    /// when `nrSiblings` cannot be parsed.
    pub fn from_form(form: &HashMap<String, String>) -> Result<Self, AttributeError> {
        Ok(Self {
            gender: required(form, "gender")?.to_string(),
            ethnic_group: required(form, "ethnicGroup")?.to_string(),
            parent_educ: required(form, "parentEduc")?.to_string(),
            lunch_type: required(form, "lunchType")?.to_string(),
            test_prep: required(form, "testPrep")?.to_string(),
            parent_marital_status: required(form, "parentMaritalStatus")?.to_string(),
            practice_sport: required(form, "practiceSport")?.to_string(),
            is_first_child: required(form, "isFirstChild")?.to_string(),
            nr_siblings: required_integer(form, "nrSiblings")?,
            transport_means: required(form, "transportMeans")?.to_string(),
            wkly_study_hours: required(form, "wklyStudyHours")?.to_string(),
        })
    }
}

#[cfg(test)]
pub(crate) fn sample_form() -> HashMap<String, String> {
    [
        ("gender", "female"),
        ("ethnicGroup", "group C"),
        ("parentEduc", "bachelor's degree"),
        ("lunchType", "standard"),
        ("testPrep", "completed"),
        ("parentMaritalStatus", "married"),
        ("practiceSport", "regularly"),
        ("isFirstChild", "yes"),
        ("nrSiblings", "2"),
        ("transportMeans", "school_bus"),
        ("wklyStudyHours", "5 - 10"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_form() {
        let attrs = StudentAttributes::from_form(&sample_form()).expect("Should parse");
        assert_eq!(attrs.gender, "female");
        assert_eq!(attrs.parent_educ, "bachelor's degree");
        assert_eq!(attrs.nr_siblings, 2);
        assert_eq!(attrs.wkly_study_hours, "5 - 10");
    }

    #[test]
    fn test_missing_field() {
        let mut form = sample_form();
        form.remove("lunchType");
        let err = StudentAttributes::from_form(&form).expect_err("must fail");
        assert_eq!(err, AttributeError::MissingField { field: "lunchType" });
    }

    #[test]
    fn test_every_field_is_required() {
        for field in FORM_FIELDS {
            let mut form = sample_form();
            form.remove(field);
            let err = StudentAttributes::from_form(&form).expect_err("must fail");
            assert_eq!(err, AttributeError::MissingField { field });
        }
    }

    #[test]
    fn test_blank_field_is_missing() {
        let mut form = sample_form();
        form.insert("gender".into(), "   ".into());
        let err = StudentAttributes::from_form(&form).expect_err("must fail");
        assert_eq!(err, AttributeError::MissingField { field: "gender" });
    }

    #[test]
    fn test_nr_siblings_not_an_integer() {
        let mut form = sample_form();
        form.insert("nrSiblings".into(), "two".into());
        let err = StudentAttributes::from_form(&form).expect_err("must fail");
        assert_eq!(
            err,
            AttributeError::NotAnInteger {
                field: "nrSiblings",
                value: "two".into()
            }
        );
        assert!(err.to_string().contains("nrSiblings"));
    }

    #[test]
    fn test_nr_siblings_trimmed() {
        let mut form = sample_form();
        form.insert("nrSiblings".into(), " 4 ".into());
        let attrs = StudentAttributes::from_form(&form).expect("Should parse");
        assert_eq!(attrs.nr_siblings, 4);
    }
}
