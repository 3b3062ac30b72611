//! Feature engineering over student attributes.

use super::student::StudentAttributes;

const HIGH_EDUCATION: [&str; 2] = ["bachelor's degree", "master's degree"];
const SUFFICIENT_STUDY_HOURS: [&str; 2] = ["5 - 10", "> 10"];
const ACTIVE_SPORT: [&str; 2] = ["regularly", "sometimes"];

/// A single column value as seen by the preprocessor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FeatureValue<'a> {
    Categorical(&'a str),
    Numeric(f64),
}

/// Student attributes augmented with the four derived indicators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineeredAttributes {
    pub attributes: StudentAttributes,
    pub is_parent_highly_educated: bool,
    pub good_study_habits: bool,
    pub stable_family: bool,
    pub balanced_lifestyle: bool,
}

/// Column names of the engineered row, raw columns first.
pub const COLUMN_NAMES: [&str; 15] = [
    "Gender",
    "EthnicGroup",
    "ParentEduc",
    "LunchType",
    "TestPrep",
    "ParentMaritalStatus",
    "PracticeSport",
    "IsFirstChild",
    "NrSiblings",
    "TransportMeans",
    "WklyStudyHours",
    "IsParentHighlyEducated",
    "GoodStudyHabits",
    "StableFamily",
    "BalancedLifestyle",
];

/// Kind of value a column carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Categorical,
    Numeric,
}

/// Value kinds, parallel to [`COLUMN_NAMES`].
const COLUMN_KINDS: [ColumnKind; 15] = [
    ColumnKind::Categorical,
    ColumnKind::Categorical,
    ColumnKind::Categorical,
    ColumnKind::Categorical,
    ColumnKind::Categorical,
    ColumnKind::Categorical,
    ColumnKind::Categorical,
    ColumnKind::Categorical,
    ColumnKind::Numeric,
    ColumnKind::Categorical,
    ColumnKind::Categorical,
    ColumnKind::Numeric,
    ColumnKind::Numeric,
    ColumnKind::Numeric,
    ColumnKind::Numeric,
];

/// Kind of the named column, or `None` if the row has no such column.
#[must_use]
pub fn column_kind(name: &str) -> Option<ColumnKind> {
    COLUMN_NAMES
        .iter()
        .position(|column| *column == name)
        .map(|i| COLUMN_KINDS[i])
}

fn indicator(flag: bool) -> FeatureValue<'static> {
    FeatureValue::Numeric(if flag { 1.0 } else { 0.0 })
}

impl EngineeredAttributes {
    /// Derive the engineered indicators from raw attributes.
    ///
    /// Unrecognized values never fail here; they simply yield a 0 indicator.
    #[must_use]
    pub fn from_attributes(attributes: StudentAttributes) -> Self {
        let studies_enough = SUFFICIENT_STUDY_HOURS.contains(&attributes.wkly_study_hours.as_str());

        Self {
            is_parent_highly_educated: HIGH_EDUCATION.contains(&attributes.parent_educ.as_str()),
            good_study_habits: attributes.test_prep == "completed" && studies_enough,
            stable_family: attributes.parent_marital_status == "married",
            balanced_lifestyle: ACTIVE_SPORT.contains(&attributes.practice_sport.as_str())
                && studies_enough,
            attributes,
        }
    }

    /// Look up a column by its dataset name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<FeatureValue<'_>> {
        let a = &self.attributes;
        let value = match name {
            "Gender" => FeatureValue::Categorical(&a.gender),
            "EthnicGroup" => FeatureValue::Categorical(&a.ethnic_group),
            "ParentEduc" => FeatureValue::Categorical(&a.parent_educ),
            "LunchType" => FeatureValue::Categorical(&a.lunch_type),
            "TestPrep" => FeatureValue::Categorical(&a.test_prep),
            "ParentMaritalStatus" => FeatureValue::Categorical(&a.parent_marital_status),
            "PracticeSport" => FeatureValue::Categorical(&a.practice_sport),
            "IsFirstChild" => FeatureValue::Categorical(&a.is_first_child),
            "NrSiblings" => FeatureValue::Numeric(a.nr_siblings as f64),
            "TransportMeans" => FeatureValue::Categorical(&a.transport_means),
            "WklyStudyHours" => FeatureValue::Categorical(&a.wkly_study_hours),
            "IsParentHighlyEducated" => indicator(self.is_parent_highly_educated),
            "GoodStudyHabits" => indicator(self.good_study_habits),
            "StableFamily" => indicator(self.stable_family),
            "BalancedLifestyle" => indicator(self.balanced_lifestyle),
            _ => return None,
        };
        Some(value)
    }
}
