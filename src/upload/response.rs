//! Classifier response schema.
//!
//! The endpoint answers either with one object or with an array.  Array
//! items come in three shapes:
//!
//! ```json
//! [
//!   { "filename": "a.wav", "label": "Genuine", "confidence": 0.93 },
//!   { "filename": "b.wav", "error": "could not read audio" },
//!   { "EER": "12.50%" }
//! ]
//! ```

use serde::{Deserialize, Serialize};

use super::client::UploadError;

/// One labelled file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    #[serde(default)]
    pub filename: Option<String>,
    pub label: String,
    pub confidence: f64,
}

/// A file the service could not process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileFailure {
    #[serde(default)]
    pub filename: Option<String>,
    pub error: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Item {
    Prediction(Prediction),
    Failure(FileFailure),
    Eer {
        #[serde(rename = "EER")]
        eer: String,
    },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Body {
    Many(Vec<Item>),
    One(Item),
}

/// Everything the classifier said about one upload.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ClassifyResponse {
    pub predictions: Vec<Prediction>,
    pub failures: Vec<FileFailure>,
    /// Equal error rate summary, present when the batch held both classes.
    pub eer: Option<String>,
}

impl ClassifyResponse {
    /// Parse a response body.
    pub fn from_json(body: &str) -> Result<Self, UploadError> {
        let body: Body =
            serde_json::from_str(body).map_err(|e| UploadError::Parse(e.to_string()))?;

        let items = match body {
            Body::Many(items) => items,
            Body::One(item) => vec![item],
        };

        let mut out = Self::default();
        for item in items {
            match item {
                Item::Prediction(p) => out.predictions.push(p),
                Item::Failure(f) => out.failures.push(f),
                Item::Eer { eer } => out.eer = Some(eer),
            }
        }
        Ok(out)
    }

    /// The first prediction, which for a single upload is the answer.
    pub fn primary(&self) -> Option<&Prediction> {
        self.predictions.first()
    }

    /// Append `other`'s predictions and failures.  A later EER replaces an
    /// earlier one.
    pub fn merge(&mut self, other: ClassifyResponse) {
        self.predictions.extend(other.predictions);
        self.failures.extend(other.failures);
        if other.eer.is_some() {
            self.eer = other.eer;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_object_without_filename() {
        let r = ClassifyResponse::from_json(r#"{"label":"Spoof","confidence":0.71}"#).unwrap();
        let p = r.primary().unwrap();
        assert_eq!(p.label, "Spoof");
        assert!((p.confidence - 0.71).abs() < 1e-12);
        assert!(p.filename.is_none());
        assert!(r.failures.is_empty());
    }

    #[test]
    fn mixed_array() {
        let body = r#"[
            {"filename":"a.wav","label":"Genuine","confidence":0.9},
            {"filename":"b.wav","error":"bad header"},
            {"filename":"c.wav","label":"Spoof","confidence":0.2},
            {"EER":"12.50%"}
        ]"#;
        let r = ClassifyResponse::from_json(body).unwrap();
        assert_eq!(r.predictions.len(), 2);
        assert_eq!(r.predictions[1].filename.as_deref(), Some("c.wav"));
        assert_eq!(r.failures, vec![FileFailure {
            filename: Some("b.wav".into()),
            error: "bad header".into(),
        }]);
        assert_eq!(r.eer.as_deref(), Some("12.50%"));
    }

    #[test]
    fn merge_keeps_order_and_latest_eer() {
        let mut r = ClassifyResponse::from_json(
            r#"[{"filename":"a.wav","label":"Genuine","confidence":0.9},{"EER":"1%"}]"#,
        )
        .unwrap();
        r.merge(ClassifyResponse::from_json(r#"{"filename":"b.wav","error":"too short"}"#).unwrap());
        r.merge(
            ClassifyResponse::from_json(r#"[{"filename":"c.wav","label":"Spoof","confidence":0.3}]"#)
                .unwrap(),
        );

        let names: Vec<_> = r.predictions.iter().map(|p| p.filename.as_deref()).collect();
        assert_eq!(names, [Some("a.wav"), Some("c.wav")]);
        assert_eq!(r.failures.len(), 1);
        assert_eq!(r.eer.as_deref(), Some("1%"));
    }

    #[test]
    fn empty_array_is_an_empty_response() {
        let r = ClassifyResponse::from_json("[]").unwrap();
        assert!(r.primary().is_none());
    }

    #[test]
    fn unrelated_json_is_a_parse_error() {
        assert!(matches!(
            ClassifyResponse::from_json(r#"{"detail":"Not Found"}"#),
            Err(UploadError::Parse(_))
        ));
        assert!(matches!(
            ClassifyResponse::from_json("<html>"),
            Err(UploadError::Parse(_))
        ));
    }
}
