//! Hand-off of normalized WAV files to the remote classifier.
//!
//! * [`Classifier`] — async trait the orchestrator talks to.
//! * [`HttpClassifier`] — multipart `POST` with `reqwest`.
//! * [`ClassifyResponse`] — parsed `{filename?, label, confidence}` answers.

pub mod client;
pub mod response;

pub use client::{Classifier, HttpClassifier, UploadError};
pub use response::{ClassifyResponse, FileFailure, Prediction};
