use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::repo::CalculatorType;

/// Autosave payload: one calculator's inputs and computed outputs.
#[derive(Debug, Deserialize)]
pub struct SaveEntryRequest {
    #[serde(rename = "type")]
    pub calc_type: CalculatorType,
    pub input_data: serde_json::Value,
    pub result_data: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct UpdateEntryRequest {
    pub input_data: serde_json::Value,
    pub result_data: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct SavedEntryResponse {
    pub message: String,
    pub id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_request_uses_type_wire_name() {
        let req: SaveEntryRequest = serde_json::from_str(
            r#"{"type":"EMI","input_data":{"principal":100000},"result_data":{"emi":2124.7}}"#,
        )
        .unwrap();
        assert_eq!(req.calc_type, CalculatorType::Emi);
        assert_eq!(req.input_data["principal"], 100000);
    }
}
