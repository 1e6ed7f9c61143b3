use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calculators::repo::CalculatorType;

/// Optional calculator snapshot attached to a lead at submission time.
#[derive(Debug, Deserialize)]
pub struct CalculatorContext {
    #[serde(rename = "type")]
    pub calc_type: CalculatorType,
    pub input_data: serde_json::Value,
    pub result_data: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct SubmitLeadRequest {
    pub full_name: String,
    pub mobile: String,
    pub email: Option<String>,
    pub city: Option<String>,
    pub income: Option<String>,
    #[serde(default)]
    pub consent: bool,
    pub calculator_data: Option<CalculatorContext>,
}

#[derive(Debug, Serialize)]
pub struct SubmitLeadResponse {
    pub success: bool,
    pub message: String,
    pub lead_id: Uuid,
}
