//! The ordered question sequence the wizard walks through.

use std::fmt;

use shared::domain::{FieldKey, FieldKind, IntakeFormData};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    PersonalSituation,
    TherapistPreferences,
    SessionPreferences,
}

impl Category {
    pub fn label(self) -> &'static str {
        match self {
            Category::PersonalSituation => "personal situation",
            Category::TherapistPreferences => "therapist preferences",
            Category::SessionPreferences => "session preferences",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Inclusive span of step indices belonging to one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryRange {
    pub start: usize,
    pub end: usize,
}

impl CategoryRange {
    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntakeFormStep {
    pub category: Category,
    pub field: FieldKey,
    pub question: String,
    pub multiselect: bool,
    pub optional: bool,
    /// Display order is insertion order.
    pub options: Vec<SelectOption>,
}

impl IntakeFormStep {
    pub fn new(category: Category, field: FieldKey, question: impl Into<String>) -> Self {
        Self {
            category,
            field,
            question: question.into(),
            multiselect: false,
            optional: false,
            options: Vec::new(),
        }
    }

    pub fn multiselect(mut self) -> Self {
        self.multiselect = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn option(mut self, value: impl Into<String>, label: impl Into<String>) -> Self {
        self.options.push(SelectOption {
            value: value.into(),
            label: label.into(),
        });
        self
    }

    /// Adds options whose label equals their value.
    pub fn plain_options<'a>(self, values: impl IntoIterator<Item = &'a str>) -> Self {
        values
            .into_iter()
            .fold(self, |step, value| step.option(value, value))
    }

    pub fn option_label(&self, value: &str) -> Option<&str> {
        self.options
            .iter()
            .find(|option| option.value == value)
            .map(|option| option.label.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("question catalog has no steps")]
    Empty,
    #[error("step {index} ({field}) has no options")]
    NoOptions { index: usize, field: FieldKey },
    #[error("step {index} ({field}) multiselect flag disagrees with the field's {kind:?} value")]
    KindMismatch {
        index: usize,
        field: FieldKey,
        kind: FieldKind,
    },
    #[error("field {field} is asked by both step {first} and step {second}")]
    DuplicateField {
        field: FieldKey,
        first: usize,
        second: usize,
    },
}

#[derive(Debug, Clone)]
pub struct QuestionCatalog {
    steps: Vec<IntakeFormStep>,
    ranges: Vec<(Category, CategoryRange)>,
}

impl QuestionCatalog {
    pub fn new(steps: Vec<IntakeFormStep>) -> Result<Self, CatalogError> {
        if steps.is_empty() {
            return Err(CatalogError::Empty);
        }

        for (index, step) in steps.iter().enumerate() {
            if step.options.is_empty() {
                return Err(CatalogError::NoOptions {
                    index,
                    field: step.field,
                });
            }

            let kind = step.field.kind();
            if step.multiselect != (kind == FieldKind::Multi) {
                return Err(CatalogError::KindMismatch {
                    index,
                    field: step.field,
                    kind,
                });
            }

            if let Some(first) = steps[..index].iter().position(|s| s.field == step.field) {
                return Err(CatalogError::DuplicateField {
                    field: step.field,
                    first,
                    second: index,
                });
            }
        }

        let ranges = category_ranges(&steps);
        Ok(Self { steps, ranges })
    }

    /// The therapy-matching questionnaire.
    pub fn standard() -> Result<Self, CatalogError> {
        Self::new(standard_steps())
    }

    pub fn steps(&self) -> &[IntakeFormStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn last_index(&self) -> usize {
        self.steps.len() - 1
    }

    pub fn step(&self, index: usize) -> Option<&IntakeFormStep> {
        self.steps.get(index)
    }

    /// Category ranges in the order categories first appear.
    pub fn category_ranges(&self) -> &[(Category, CategoryRange)] {
        &self.ranges
    }

    pub fn range_for(&self, category: Category) -> Option<CategoryRange> {
        self.ranges
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, range)| *range)
    }

    pub fn first_unanswered(&self, record: &IntakeFormData) -> Option<usize> {
        self.steps
            .iter()
            .position(|step| !record.is_answered(step.field))
    }
}

fn category_ranges(steps: &[IntakeFormStep]) -> Vec<(Category, CategoryRange)> {
    steps
        .iter()
        .enumerate()
        .fold(Vec::new(), |mut ranges, (index, step)| {
            match ranges.iter_mut().find(|(c, _)| *c == step.category) {
                Some((_, range)) => range.end = index,
                None => ranges.push((
                    step.category,
                    CategoryRange {
                        start: index,
                        end: index,
                    },
                )),
            }
            ranges
        })
}

fn standard_steps() -> Vec<IntakeFormStep> {
    vec![
        IntakeFormStep::new(
            Category::PersonalSituation,
            FieldKey::ReasonsForTherapy,
            "What do you need help with?",
        )
        .multiselect()
        .plain_options([
            "Abortion",
            "Addiction",
            "Adoption",
            "Anxiety",
            "Bullying",
            "Cancer",
            "Climate",
            "Death",
            "Depression",
            "Discrimination",
        ])
        .option("DomesticViolence", "Domestic Violence")
        .option("EatingDisorder", "Eating Disorder")
        .plain_options(["Family", "Gambling"])
        .option("GenderIdentity", "Gender Identity")
        .plain_options(["Hoarding", "Loneliness", "Money"])
        .option("NegativeThoughts", "Negative Thoughts")
        .option("PanicAttacks", "Panic Attacks")
        .option("PetLoss", "Pet Loss")
        .plain_options(["Racism"])
        .option("SelfHarm", "Self Harm")
        .plain_options(["Sexuality"])
        .option("SocialMedia", "Social Media")
        .plain_options(["Trauma", "War"])
        .option("WorldEvents", "World Events"),
        IntakeFormStep::new(
            Category::PersonalSituation,
            FieldKey::GoalsInTherapy,
            "What do you want to work on or learn in therapy?",
        )
        .multiselect()
        .plain_options(["Acceptance"])
        .option("BoundarySetting", "Boundary Setting")
        .plain_options(["Communication"])
        .option("ConflictManagement", "Conflict Management")
        .option("FindBalance", "Find Balance")
        .option("GetInTouchWithFeelings", "Get In Touch With Feelings")
        .option("HandleDiscrimination", "Handle Discrimination")
        .option("HandleNegativeThoughts", "Handle Negative Thoughts")
        .option("HandleRacism", "Handle Racism")
        .option("ImpulseControl", "Impulse Control")
        .option("MoodManagement", "Mood Management")
        .option("SelfUnderstanding", "Self-Understanding")
        .option("StructureAndPlanning", "Structure And Planning")
        .option("TraumaHealing", "Trauma Healing")
        .option("DontKnow", "I Don't Know"),
        IntakeFormStep::new(
            Category::PersonalSituation,
            FieldKey::AgeGroup,
            "How old are you?",
        )
        .option("18-25", "18 - 25")
        .option("26-35", "26 - 35")
        .option("36-45", "36 - 45")
        .option("46-55", "46 - 55")
        .option("56-65", "56 - 65")
        .option("66+", "Over 66"),
        IntakeFormStep::new(
            Category::TherapistPreferences,
            FieldKey::TherapistKnowledge,
            "Do you want your therapist to have knowledge in any of these areas? (optional)",
        )
        .multiselect()
        .optional()
        .plain_options(["LGBTQ+"])
        .option("MinorityStress", "Minority Stress")
        .plain_options(["Neurodivergent"])
        .option("PolyamorousRelationships", "Polyamorous Relationships")
        .option("RacebasedTraumaticStress", "Race-based Traumatic Stress")
        .option("TransgenderKnowledge", "Transgender Knowledge"),
        IntakeFormStep::new(
            Category::TherapistPreferences,
            FieldKey::TherapistGender,
            "What would you prefer your therapist to identify as?",
        )
        .plain_options(["Woman", "Man"])
        .option("NonBinary", "Non-Binary")
        .option("Any", "Doesn't Matter"),
        IntakeFormStep::new(
            Category::SessionPreferences,
            FieldKey::SessionActiveness,
            "How active do you want your therapist to be?",
        )
        .option(
            "Active",
            "Active - Your therapist will take the lead and guide you",
        )
        .option(
            "Passive",
            "Passive - Your therapist will listen and follow your exploration",
        )
        .option("Any", "Doesn't Matter"),
    ]
}
