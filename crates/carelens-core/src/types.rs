//! Request and response types shared by the services and the HTTP layer.
//!
//! Field names follow the public JSON API, which is why several of them are
//! not snake_case on the wire.

use serde::{Deserialize, Serialize};

// === Symptom prediction ===

/// Patient vitals and reported symptoms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymptomRequest {
    #[serde(rename = "Age")]
    pub age: i64,

    #[serde(rename = "Gender")]
    pub gender: String,

    #[serde(rename = "Heart_Rate_bpm")]
    pub heart_rate_bpm: i64,

    #[serde(rename = "Body_Temperature_C")]
    pub body_temperature_c: f64,

    #[serde(rename = "Oxygen_Saturation_%", alias = "oxygen_saturation_percent")]
    pub oxygen_saturation_percent: f64,

    #[serde(rename = "Systolic_BP")]
    pub systolic_bp: i64,

    #[serde(rename = "Diastolic_BP")]
    pub diastolic_bp: i64,

    pub symptoms: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymptomResponse {
    pub predicted_diagnosis: String,
}

// === Scan analysis ===

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanRequest {
    pub image_base64: String,
}

/// Classifier verdict for a chest X-ray.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanAnalysis {
    /// Predicted class label
    pub predicted_condition: String,

    /// Confidence in the predicted class, in [0.5, 1.0] for the default threshold
    pub confidence_score: f32,
}

// === Assistant ===

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub question: String,

    /// Previous turns as `[speaker, text]` pairs
    #[serde(default)]
    pub chat_history: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub answer: String,
}

/// Document to summarize. Exactly one of the two fields must be set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SummarizeRequest {
    #[serde(default)]
    pub pdf_base64: Option<String>,

    #[serde(default)]
    pub raw_text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummarizeResponse {
    pub summary: String,
}

// === Analytics charts ===

/// Chart-ready aggregate: one label per x-axis point and one or more series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

/// One chart series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub label: String,
    pub data: Vec<i64>,

    #[serde(flatten)]
    pub style: DatasetStyle,
}

/// Rendering hints for the frontend chart library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DatasetStyle {
    Line {
        #[serde(rename = "borderColor")]
        border_color: String,
        fill: bool,
        tension: f64,
    },
    Bar {
        #[serde(rename = "backgroundColor")]
        background_color: Vec<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symptom_request_wire_names() {
        let json = r#"{
            "Age": 52,
            "Gender": "Female",
            "Heart_Rate_bpm": 90,
            "Body_Temperature_C": 38.5,
            "Oxygen_Saturation_%": 94.0,
            "Systolic_BP": 140,
            "Diastolic_BP": 90,
            "symptoms": ["Cough", "Fever", "Body ache"]
        }"#;
        let req: SymptomRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.age, 52);
        assert_eq!(req.oxygen_saturation_percent, 94.0);
        assert_eq!(req.symptoms.len(), 3);
    }

    #[test]
    fn test_symptom_request_accepts_field_alias() {
        let json = r#"{
            "Age": 30, "Gender": "Male", "Heart_Rate_bpm": 70,
            "Body_Temperature_C": 36.8, "oxygen_saturation_percent": 98.0,
            "Systolic_BP": 120, "Diastolic_BP": 80, "symptoms": []
        }"#;
        let req: SymptomRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.oxygen_saturation_percent, 98.0);
    }

    #[test]
    fn test_symptom_request_rejects_wrong_types() {
        let json = r#"{"Age": "fifty-two", "Gender": "Female", "symptoms": []}"#;
        assert!(serde_json::from_str::<SymptomRequest>(json).is_err());
    }

    #[test]
    fn test_chat_history_defaults_to_empty() {
        let req: ChatRequest = serde_json::from_str(r#"{"question": "What is flu?"}"#).unwrap();
        assert!(req.chat_history.is_empty());
    }

    #[test]
    fn test_line_dataset_serializes_chart_keys() {
        let dataset = Dataset {
            label: "Flu".to_string(),
            data: vec![1, 0, 2],
            style: DatasetStyle::Line {
                border_color: "#F97316".to_string(),
                fill: false,
                tension: 0.1,
            },
        };
        let value = serde_json::to_value(&dataset).unwrap();
        assert_eq!(value["borderColor"], "#F97316");
        assert_eq!(value["fill"], false);
        assert_eq!(value["data"], serde_json::json!([1, 0, 2]));
        assert!(value.get("style").is_none());
    }

    #[test]
    fn test_bar_dataset_serializes_background_colors() {
        let dataset = Dataset {
            label: "Common Queries".to_string(),
            data: vec![3],
            style: DatasetStyle::Bar {
                background_color: vec!["#22C55E".to_string()],
            },
        };
        let value = serde_json::to_value(&dataset).unwrap();
        assert_eq!(value["backgroundColor"][0], "#22C55E");
    }
}
