use crate::Result;
use crate::model::{Bucket, ExtractedQuestion};
use serde::Serialize;

/// Complete JSON export structure
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    /// Number of questions in each bucket
    pub counts: JsonCounts,
    /// Questions with a detected correct option
    pub main: Vec<JsonQuestion>,
    /// Questions without a detected correct option
    pub undetected: Vec<JsonQuestion>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct JsonCounts {
    pub main: usize,
    pub undetected: usize,
}

/// A question in JSON output
#[derive(Debug, Clone, Serialize)]
pub struct JsonQuestion {
    pub question: String,
    pub options: Vec<JsonOption>,
    /// Label of the correct option
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct JsonOption {
    pub label: String,
    pub text: String,
    pub correct: bool,
}

/// Configuration for JSON output
#[derive(Debug, Clone, Default)]
pub struct JsonConfig {
    /// Pretty print JSON output
    pub pretty: bool,
}

/// JSON formatter for classified questions
pub struct JsonFormatter {
    config: JsonConfig,
}

impl JsonFormatter {
    pub fn new(config: JsonConfig) -> Self {
        Self { config }
    }

    /// Convert questions to a JSON string
    pub fn convert(&self, questions: &[ExtractedQuestion]) -> Result<String> {
        convert_to_json(questions, &self.config)
    }
}

impl From<&ExtractedQuestion> for JsonQuestion {
    fn from(q: &ExtractedQuestion) -> Self {
        let options = q
            .options()
            .iter()
            .enumerate()
            .map(|(i, o)| JsonOption { label: o.label.clone(), text: o.text.clone(), correct: q.correct() == Some(i) })
            .collect();

        Self {
            question: q.question().to_string(),
            options,
            answer: q.correct().map(|i| q.options()[i].label.clone()),
            explanation: q.explanation().map(String::from),
        }
    }
}

/// Build the export structure, splitting questions by bucket
pub fn to_json_output(questions: &[ExtractedQuestion]) -> JsonOutput {
    let (main, undetected): (Vec<&ExtractedQuestion>, Vec<&ExtractedQuestion>) =
        questions.iter().partition(|q| q.bucket() == Bucket::Main);

    JsonOutput {
        counts: JsonCounts { main: main.len(), undetected: undetected.len() },
        main: main.into_iter().map(JsonQuestion::from).collect(),
        undetected: undetected.into_iter().map(JsonQuestion::from).collect(),
    }
}

/// Convert questions to JSON format
pub fn convert_to_json(questions: &[ExtractedQuestion], config: &JsonConfig) -> Result<String> {
    let output = to_json_output(questions);

    if config.pretty { Ok(serde_json::to_string_pretty(&output)?) } else { Ok(serde_json::to_string(&output)?) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<ExtractedQuestion> {
        let mut a = ExtractedQuestion::new("Capital of France?", ["Paris", "Rome"], Some("Seat of power.".into()));
        a.set_correct(0);
        let b = ExtractedQuestion::new("Largest planet?", ["Mars", "Jupiter"], None);
        vec![a, b]
    }

    #[test]
    fn test_split_by_bucket() {
        let output = to_json_output(&sample());

        assert_eq!(output.counts.main, 1);
        assert_eq!(output.counts.undetected, 1);
        assert_eq!(output.main[0].answer.as_deref(), Some("a"));
        assert!(output.main[0].options[0].correct);
        assert!(output.undetected[0].answer.is_none());
    }

    #[test]
    fn test_convert_to_json() {
        let json = convert_to_json(&sample(), &JsonConfig::default()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["main"][0]["question"], "Capital of France?");
        assert_eq!(value["main"][0]["explanation"], "Seat of power.");
        assert!(value["undetected"][0].get("explanation").is_none());
    }

    #[test]
    fn test_pretty_output() {
        let formatter = JsonFormatter::new(JsonConfig { pretty: true });
        let json = formatter.convert(&sample()).unwrap();
        assert!(json.contains('\n'));
    }
}
