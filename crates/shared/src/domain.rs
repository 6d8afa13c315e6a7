use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

id_newtype!(FormId);

impl FormId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last six characters, used as a human-facing session number.
    pub fn short(&self) -> &str {
        let start = self
            .0
            .char_indices()
            .rev()
            .nth(5)
            .map(|(idx, _)| idx)
            .unwrap_or(0);
        &self.0[start..]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Single,
    Multi,
}

/// Questionnaire fields of an intake form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKey {
    ReasonsForTherapy,
    GoalsInTherapy,
    AgeGroup,
    TherapistKnowledge,
    TherapistGender,
    SessionActiveness,
}

impl FieldKey {
    pub const ALL: [FieldKey; 6] = [
        FieldKey::ReasonsForTherapy,
        FieldKey::GoalsInTherapy,
        FieldKey::AgeGroup,
        FieldKey::TherapistKnowledge,
        FieldKey::TherapistGender,
        FieldKey::SessionActiveness,
    ];

    pub fn kind(self) -> FieldKind {
        match self {
            FieldKey::ReasonsForTherapy
            | FieldKey::GoalsInTherapy
            | FieldKey::TherapistKnowledge => FieldKind::Multi,
            FieldKey::AgeGroup | FieldKey::TherapistGender | FieldKey::SessionActiveness => {
                FieldKind::Single
            }
        }
    }

    pub fn wire_name(self) -> &'static str {
        match self {
            FieldKey::ReasonsForTherapy => "reasons_for_therapy",
            FieldKey::GoalsInTherapy => "goals_in_therapy",
            FieldKey::AgeGroup => "age_group",
            FieldKey::TherapistKnowledge => "therapist_knowledge",
            FieldKey::TherapistGender => "therapist_gender",
            FieldKey::SessionActiveness => "session_activeness",
        }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Single(String),
    Multi(Vec<String>),
}

impl FieldValue {
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Single(_) => FieldKind::Single,
            FieldValue::Multi(_) => FieldKind::Multi,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Single(value) => value.is_empty(),
            FieldValue::Multi(values) => values.is_empty(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("field {field} expects a {expected:?} value, got {actual:?}")]
pub struct FieldKindMismatch {
    pub field: FieldKey,
    pub expected: FieldKind,
    pub actual: FieldKind,
}

/// One intake form record. Every field is absent until answered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntakeFormData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<FormId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasons_for_therapy: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goals_in_therapy: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub therapist_knowledge: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub therapist_gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_activeness: Option<String>,
}

impl IntakeFormData {
    /// A record holding a single answered field.
    pub fn with_field(field: FieldKey, value: FieldValue) -> Result<Self, FieldKindMismatch> {
        let mut data = Self::default();
        data.set(field, value)?;
        Ok(data)
    }

    pub fn get(&self, field: FieldKey) -> Option<FieldValue> {
        match field {
            FieldKey::ReasonsForTherapy => self.reasons_for_therapy.clone().map(FieldValue::Multi),
            FieldKey::GoalsInTherapy => self.goals_in_therapy.clone().map(FieldValue::Multi),
            FieldKey::AgeGroup => self.age_group.clone().map(FieldValue::Single),
            FieldKey::TherapistKnowledge => {
                self.therapist_knowledge.clone().map(FieldValue::Multi)
            }
            FieldKey::TherapistGender => self.therapist_gender.clone().map(FieldValue::Single),
            FieldKey::SessionActiveness => self.session_activeness.clone().map(FieldValue::Single),
        }
    }

    pub fn is_answered(&self, field: FieldKey) -> bool {
        match field {
            FieldKey::ReasonsForTherapy => self.reasons_for_therapy.is_some(),
            FieldKey::GoalsInTherapy => self.goals_in_therapy.is_some(),
            FieldKey::AgeGroup => self.age_group.is_some(),
            FieldKey::TherapistKnowledge => self.therapist_knowledge.is_some(),
            FieldKey::TherapistGender => self.therapist_gender.is_some(),
            FieldKey::SessionActiveness => self.session_activeness.is_some(),
        }
    }

    pub fn set(&mut self, field: FieldKey, value: FieldValue) -> Result<(), FieldKindMismatch> {
        let mismatch = |actual: FieldKind| FieldKindMismatch {
            field,
            expected: field.kind(),
            actual,
        };

        match (field, value) {
            (FieldKey::ReasonsForTherapy, FieldValue::Multi(v)) => self.reasons_for_therapy = Some(v),
            (FieldKey::GoalsInTherapy, FieldValue::Multi(v)) => self.goals_in_therapy = Some(v),
            (FieldKey::TherapistKnowledge, FieldValue::Multi(v)) => {
                self.therapist_knowledge = Some(v)
            }
            (FieldKey::AgeGroup, FieldValue::Single(v)) => self.age_group = Some(v),
            (FieldKey::TherapistGender, FieldValue::Single(v)) => self.therapist_gender = Some(v),
            (FieldKey::SessionActiveness, FieldValue::Single(v)) => {
                self.session_activeness = Some(v)
            }
            (_, other) => return Err(mismatch(other.kind())),
        }
        Ok(())
    }

    /// Overwrites every field present in `delta`; absent fields are left alone.
    pub fn merge(&mut self, delta: &IntakeFormData) {
        fn overlay<T: Clone>(target: &mut Option<T>, source: &Option<T>) {
            if let Some(value) = source {
                *target = Some(value.clone());
            }
        }

        overlay(&mut self.id, &delta.id);
        overlay(&mut self.email, &delta.email);
        overlay(&mut self.submitted_at, &delta.submitted_at);
        overlay(&mut self.reasons_for_therapy, &delta.reasons_for_therapy);
        overlay(&mut self.goals_in_therapy, &delta.goals_in_therapy);
        overlay(&mut self.age_group, &delta.age_group);
        overlay(&mut self.therapist_knowledge, &delta.therapist_knowledge);
        overlay(&mut self.therapist_gender, &delta.therapist_gender);
        overlay(&mut self.session_activeness, &delta.session_activeness);
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted_at.is_some()
    }

    pub fn answered_count(&self) -> usize {
        FieldKey::ALL
            .iter()
            .filter(|field| self.is_answered(**field))
            .count()
    }
}
