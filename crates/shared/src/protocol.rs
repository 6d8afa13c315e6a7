use serde::{Deserialize, Serialize};

use crate::domain::IntakeFormData;

pub const INTAKE_FORMS_ROUTE: &str = "/api/intake-forms";

pub fn intake_form_route(form_id: &str) -> String {
    format!("{INTAKE_FORMS_ROUTE}/{form_id}")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListIntakeFormsResponse {
    pub data: Vec<IntakeFormData>,
}

/// Envelope returned by create and update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntakeFormResponse {
    pub data: IntakeFormData,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FormId;

    #[test]
    fn builds_item_route() {
        assert_eq!(intake_form_route("abc"), "/api/intake-forms/abc");
    }

    #[test]
    fn list_envelope_wraps_records_under_data() {
        let body = ListIntakeFormsResponse {
            data: vec![IntakeFormData {
                id: Some(FormId::new("f1")),
                ..Default::default()
            }],
        };
        let json = serde_json::to_value(&body).expect("json");
        assert_eq!(json, serde_json::json!({ "data": [{ "id": "f1" }] }));
    }
}
