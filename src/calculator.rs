//! Calculation orchestration
//!
//! Turns a canvas snapshot into a backend request, interprets the answer and
//! keeps the variable bindings that later requests send back.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::api::{ApiError, CalculationRequest, CalculatorApi, Credentials};
use crate::format::format_number;

/// Expression shown for a response that does not have the expected shape
pub const ERROR_EXPRESSION: &str = "Error";

/// Result text paired with [`ERROR_EXPRESSION`]
pub const INVALID_RESPONSE_MESSAGE: &str = "Invalid response format";

/// Expression shown when the request itself failed
pub const TRANSPORT_ERROR_EXPRESSION: &str = "Error in API call";

/// One displayed result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalculationResult {
    pub expression: String,
    /// Result exactly as the backend sent it
    pub raw_result: String,
    /// [`format_number`] applied to `raw_result`
    pub result: String,
    pub is_assignment: bool,
}

impl CalculationResult {
    fn from_item(item: ResultItem) -> Self {
        let raw_result = match item.result {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        };

        Self {
            expression: item.expr,
            result: format_number(&raw_result),
            raw_result,
            is_assignment: item.assign,
        }
    }

    fn synthetic(expression: &str, message: String) -> Self {
        Self {
            expression: expression.to_string(),
            result: message.clone(),
            raw_result: message,
            is_assignment: false,
        }
    }

    /// Placeholder for an unusable backend answer
    pub fn invalid_response() -> Self {
        Self::synthetic(ERROR_EXPRESSION, INVALID_RESPONSE_MESSAGE.to_string())
    }

    /// Placeholder for a failed request
    pub fn transport_error(err: &ApiError) -> Self {
        Self::synthetic(TRANSPORT_ERROR_EXPRESSION, err.to_string())
    }
}

#[derive(Deserialize)]
struct ResultItem {
    expr: String,
    result: serde_json::Value,
    #[serde(default)]
    assign: bool,
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: Option<String>,
    data: Option<Vec<ResultItem>>,
}

/// Why a response body was rejected
#[derive(Error, Debug, PartialEq)]
pub enum ResponseError {
    #[error("response is not a result envelope: {0}")]
    Shape(String),

    #[error("response type is {0:?}, expected \"success\"")]
    NotSuccess(Option<String>),

    #[error("response has no result list")]
    MissingData,
}

/// Decode a `/calculator/process` body into formatted results
///
/// Only `{"type": "success", "data": [...]}` is accepted; backend error
/// envelopes count as malformed.
pub fn interpret_response(body: serde_json::Value) -> Result<Vec<CalculationResult>, ResponseError> {
    let envelope: Envelope =
        serde_json::from_value(body).map_err(|e| ResponseError::Shape(e.to_string()))?;

    if envelope.kind.as_deref() != Some("success") {
        return Err(ResponseError::NotSuccess(envelope.kind));
    }

    let items = envelope.data.ok_or(ResponseError::MissingData)?;
    Ok(items.into_iter().map(CalculationResult::from_item).collect())
}

/// Variable name to last assigned (formatted) value
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariableBindings(BTreeMap<String, String>);

impl VariableBindings {
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Upsert every assignment in `results`
    pub fn absorb(&mut self, results: &[CalculationResult]) {
        for item in results.iter().filter(|r| r.is_assignment) {
            tracing::debug!("Binding {} = {}", item.expression, item.result);
            self.insert(item.expression.clone(), item.result.clone());
        }
    }
}

/// Errors building a [`CanvasImage`]
#[derive(Error, Debug, PartialEq)]
pub enum ImageError {
    #[error("not a base64 image data URL")]
    NotDataUrl,

    #[error("image is empty")]
    Empty,
}

/// Canvas snapshot in the `data:<mime>;base64,<payload>` form the backend
/// splits on `,`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanvasImage {
    data_url: String,
}

impl CanvasImage {
    /// Wrap a data URL as produced by `HTMLCanvasElement.toDataURL()`
    pub fn from_data_url(data_url: impl Into<String>) -> Result<Self, ImageError> {
        let data_url = data_url.into();
        let (header, payload) = data_url.split_once(',').ok_or(ImageError::NotDataUrl)?;

        if !header.starts_with("data:image/") || !header.ends_with(";base64") {
            return Err(ImageError::NotDataUrl);
        }
        if payload.is_empty() {
            return Err(ImageError::Empty);
        }

        Ok(Self { data_url })
    }

    /// Encode raw image bytes
    pub fn from_bytes(mime: &str, bytes: &[u8]) -> Result<Self, ImageError> {
        if bytes.is_empty() {
            return Err(ImageError::Empty);
        }
        Ok(Self {
            data_url: format!("data:{};base64,{}", mime, STANDARD.encode(bytes)),
        })
    }

    pub fn from_png(bytes: &[u8]) -> Result<Self, ImageError> {
        Self::from_bytes("image/png", bytes)
    }

    pub fn as_data_url(&self) -> &str {
        &self.data_url
    }
}

/// Result list, variable bindings and loading flag of the calculation screen
#[derive(Debug, Clone, Default)]
pub struct Calculator {
    results: Vec<CalculationResult>,
    bindings: VariableBindings,
    loading: bool,
}

impl Calculator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn results(&self) -> &[CalculationResult] {
        &self.results
    }

    pub fn bindings(&self) -> &VariableBindings {
        &self.bindings
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Mark a request in flight and build its body.
    ///
    /// Returns `None` while another request is outstanding.
    pub fn begin(&mut self, image: &CanvasImage) -> Option<CalculationRequest> {
        if self.loading {
            tracing::debug!("Calculation already in flight, ignoring submission");
            return None;
        }
        self.loading = true;

        Some(CalculationRequest {
            image: image.as_data_url().to_string(),
            dict_of_vars: self.bindings.clone(),
        })
    }

    /// Replace the result list with the outcome of the request started by
    /// [`Calculator::begin`]. Clears the loading flag whatever happened.
    pub fn apply(&mut self, outcome: Result<serde_json::Value, ApiError>) -> &[CalculationResult] {
        self.loading = false;

        self.results = match outcome {
            Ok(body) => match interpret_response(body) {
                Ok(results) => {
                    self.bindings.absorb(&results);
                    results
                }
                Err(e) => {
                    tracing::error!("Invalid response format: {}", e);
                    vec![CalculationResult::invalid_response()]
                }
            },
            Err(e) => {
                tracing::error!("Calculation request failed: {}", e);
                vec![CalculationResult::transport_error(&e)]
            }
        };

        &self.results
    }

    /// Send `image` with the current bindings and apply the answer
    pub async fn submit<A: CalculatorApi + ?Sized>(
        &mut self,
        api: &A,
        credentials: &Credentials,
        image: &CanvasImage,
    ) -> &[CalculationResult] {
        match self.begin(image) {
            Some(request) => {
                let outcome = api.process(credentials, &request).await;
                self.apply(outcome)
            }
            None => &self.results,
        }
    }

    pub fn clear_results(&mut self) {
        self.results.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeBackend;
    use serde_json::json;

    fn image() -> CanvasImage {
        CanvasImage::from_png(&[0x89, b'P', b'N', b'G']).unwrap()
    }

    #[test]
    fn test_interpret_success() {
        let results = interpret_response(json!({
            "message": "Image Processor",
            "type": "success",
            "data": [
                {"expr": "2 + 2", "result": 4, "assign": false},
                {"expr": "x", "result": "2.5", "assign": true},
                {"expr": "y / 3", "result": "1/3"}
            ]
        }))
        .unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].raw_result, "4");
        assert_eq!(results[0].result, "4");
        assert_eq!(results[1].result, "2.500");
        assert!(results[1].is_assignment);
        assert!(!results[2].is_assignment);
    }

    #[test]
    fn test_interpret_rejects_error_envelope() {
        let err = interpret_response(json!({
            "type": "error",
            "data": [{"expr": "Error", "result": "bad image", "assign": false}]
        }))
        .unwrap_err();
        assert_eq!(err, ResponseError::NotSuccess(Some("error".into())));

        assert_eq!(
            interpret_response(json!({"type": "success"})).unwrap_err(),
            ResponseError::MissingData
        );
        assert!(matches!(
            interpret_response(json!("Internal Server Error")),
            Err(ResponseError::Shape(_))
        ));
    }

    #[tokio::test]
    async fn test_assignment_updates_bindings() {
        let backend = FakeBackend::default();
        backend.answer_process(Ok(json!({
            "type": "success",
            "data": [{"expr": "x", "result": "5", "assign": true}]
        })));

        let mut calculator = Calculator::new();
        calculator
            .submit(&backend, &Credentials::bearer("t"), &image())
            .await;

        assert_eq!(calculator.bindings().get("x"), Some("5"));
        assert!(!calculator.is_loading());
        assert_eq!(backend.calls(), vec!["process Bearer t"]);
    }

    #[tokio::test]
    async fn test_bindings_sent_with_next_request() {
        let backend = FakeBackend::default();
        backend.answer_process(Ok(json!({
            "type": "success",
            "data": [{"expr": "x", "result": "5", "assign": true}]
        })));

        let mut calculator = Calculator::new();
        let credentials = Credentials::bearer("t");
        calculator.submit(&backend, &credentials, &image()).await;

        backend.answer_process(Ok(json!({
            "type": "success",
            "data": [{"expr": "x * 2", "result": "10"}]
        })));
        calculator.submit(&backend, &credentials, &image()).await;

        let requests = backend.requests();
        assert!(requests[0].dict_of_vars.is_empty());
        assert_eq!(requests[1].dict_of_vars.get("x"), Some("5"));
        assert!(requests[1].image.starts_with("data:image/png;base64,"));
        // Non-assignments leave bindings alone
        assert_eq!(calculator.bindings().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_type_yields_single_error_item() {
        let backend = FakeBackend::default();
        backend.answer_process(Ok(json!({"data": [{"expr": "1+1", "result": "2"}]})));

        let mut calculator = Calculator::new();
        let results = calculator
            .submit(&backend, &Credentials::bearer("t"), &image())
            .await
            .to_vec();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].expression, ERROR_EXPRESSION);
        assert_eq!(results[0].result, INVALID_RESPONSE_MESSAGE);
        assert!(calculator.bindings().is_empty());
    }

    #[tokio::test]
    async fn test_transport_error_item() {
        let backend = FakeBackend::default();
        backend.answer_process(Err(ApiError::Network("connection refused".into())));

        let mut calculator = Calculator::new();
        calculator
            .submit(&backend, &Credentials::bearer("t"), &image())
            .await;

        let results = calculator.results();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].expression, TRANSPORT_ERROR_EXPRESSION);
        assert_eq!(results[0].result, "Network error: connection refused");
        assert!(!calculator.is_loading());
    }

    #[test]
    fn test_results_replaced_wholesale() {
        let mut calculator = Calculator::new();

        calculator.begin(&image()).unwrap();
        calculator.apply(Ok(json!({
            "type": "success",
            "data": [{"expr": "a", "result": "1"}, {"expr": "b", "result": "2"}]
        })));
        assert_eq!(calculator.results().len(), 2);

        calculator.begin(&image()).unwrap();
        calculator.apply(Ok(json!({
            "type": "success",
            "data": [{"expr": "c", "result": "3"}]
        })));
        assert_eq!(calculator.results().len(), 1);
        assert_eq!(calculator.results()[0].expression, "c");
    }

    #[test]
    fn test_submissions_are_serialized() {
        let mut calculator = Calculator::new();

        assert!(calculator.begin(&image()).is_some());
        assert!(calculator.is_loading());
        assert!(calculator.begin(&image()).is_none());

        calculator.apply(Err(ApiError::Timeout));
        assert!(calculator.begin(&image()).is_some());
    }

    #[test]
    fn test_canvas_image_data_url() {
        let img = CanvasImage::from_data_url("data:image/png;base64,iVBORw0KGgo=").unwrap();
        assert_eq!(img.as_data_url(), "data:image/png;base64,iVBORw0KGgo=");

        assert_eq!(
            CanvasImage::from_data_url("iVBORw0KGgo="),
            Err(ImageError::NotDataUrl)
        );
        assert_eq!(
            CanvasImage::from_data_url("data:text/plain;base64,aGk="),
            Err(ImageError::NotDataUrl)
        );
        assert_eq!(
            CanvasImage::from_data_url("data:image/png;base64,"),
            Err(ImageError::Empty)
        );
        assert_eq!(
            image().as_data_url(),
            format!("data:image/png;base64,{}", STANDARD.encode([0x89, b'P', b'N', b'G']))
        );
    }
}
