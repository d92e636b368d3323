//! services/api/src/web/validation.rs
//!
//! Declarative input validation. A [`Schema`] is a list of [`Field`] rules over
//! a flat JSON object; it either yields the normalized values or every
//! offending field with its own message. The middleware functions here run a
//! schema against the request body or path parameters before any extractor or
//! handler does, and hand the result to handlers through [`Valid`].

use axum::{
    body::{to_bytes, Body},
    extract::{FromRequestParts, RawPathParams, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
    RequestExt,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::web::error::RequestError;

/// Upper bound on a buffered request body.
pub const BODY_LIMIT: usize = 64 * 1024;

//=========================================================================================
// Rules
//=========================================================================================

#[derive(Clone, Copy)]
enum Check {
    MinChars(usize, &'static str),
    MaxChars(usize, &'static str),
    ExactChars(usize, &'static str),
    Pattern(&'static Lazy<Regex>, &'static str),
    Predicate(fn(&str) -> bool, &'static str),
}

impl Check {
    /// Returns the failure message, if any.
    fn apply(&self, value: &str) -> Option<&'static str> {
        let chars = || value.chars().count();
        match *self {
            Check::MinChars(min, message) => (chars() < min).then_some(message),
            Check::MaxChars(max, message) => (chars() > max).then_some(message),
            Check::ExactChars(len, message) => (chars() != len).then_some(message),
            Check::Pattern(pattern, message) => (!pattern.is_match(value)).then_some(message),
            Check::Predicate(predicate, message) => (!predicate(value)).then_some(message),
        }
    }
}

/// Rules for one string field. Checks run in declaration order; the first
/// failure is the one reported.
pub struct Field {
    name: &'static str,
    required: Option<&'static str>,
    empty: &'static str,
    lowercase: bool,
    checks: Vec<Check>,
}

impl Field {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            required: None,
            empty: "must not be empty",
            lowercase: false,
            checks: Vec::new(),
        }
    }

    /// Makes the field mandatory, reporting `message` when it is absent.
    pub fn required(mut self, message: &'static str) -> Self {
        self.required = Some(message);
        self
    }

    /// Message for an empty string value.
    pub fn empty(mut self, message: &'static str) -> Self {
        self.empty = message;
        self
    }

    /// Lower-cases the value once it has passed every check.
    pub fn lowercase(mut self) -> Self {
        self.lowercase = true;
        self
    }

    pub fn min_chars(mut self, min: usize, message: &'static str) -> Self {
        self.checks.push(Check::MinChars(min, message));
        self
    }

    pub fn max_chars(mut self, max: usize, message: &'static str) -> Self {
        self.checks.push(Check::MaxChars(max, message));
        self
    }

    pub fn exact_chars(mut self, len: usize, message: &'static str) -> Self {
        self.checks.push(Check::ExactChars(len, message));
        self
    }

    pub fn pattern(mut self, pattern: &'static Lazy<Regex>, message: &'static str) -> Self {
        self.checks.push(Check::Pattern(pattern, message));
        self
    }

    pub fn predicate(mut self, predicate: fn(&str) -> bool, message: &'static str) -> Self {
        self.checks.push(Check::Predicate(predicate, message));
        self
    }

    /// `Ok(None)` means an optional field was left out.
    fn check(&self, value: Option<&Value>) -> Result<Option<String>, &'static str> {
        let raw = match value {
            None => return self.required.map_or(Ok(None), Err),
            Some(Value::String(raw)) => raw,
            Some(_) => return Err("must be a string"),
        };
        if raw.is_empty() {
            return Err(self.empty);
        }
        if let Some(message) = self.checks.iter().find_map(|check| check.apply(raw)) {
            return Err(message);
        }
        Ok(Some(if self.lowercase {
            raw.to_lowercase()
        } else {
            raw.clone()
        }))
    }
}

/// A named input shape: the body of one route or its path parameters.
pub struct Schema {
    fields: Vec<Field>,
}

impl Schema {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Checks every field and rejects unknown keys. Pure; never touches the store.
    pub fn validate(&self, input: &Map<String, Value>) -> Result<Map<String, Value>, RequestError> {
        let mut values = Map::new();
        let mut violations = Vec::new();

        for field in &self.fields {
            match field.check(input.get(field.name)) {
                Ok(Some(value)) => {
                    values.insert(field.name.to_string(), Value::String(value));
                }
                Ok(None) => {}
                Err(message) => violations.push((field.name.to_string(), message.to_string())),
            }
        }
        for key in input.keys() {
            if !self.fields.iter().any(|field| field.name == key) {
                violations.push((key.clone(), "is not allowed".to_string()));
            }
        }

        if violations.is_empty() {
            Ok(values)
        } else {
            Err(RequestError::invalid(violations))
        }
    }
}

//=========================================================================================
// Middleware
//=========================================================================================

/// Normalized input left in the request extensions by the validation middleware.
#[derive(Clone, Debug)]
pub struct Validated(pub Map<String, Value>);

/// Validates the JSON body against `schema`. The handler receives the
/// normalized values through [`Valid`]; the body itself is consumed.
pub async fn validate_body(
    State(schema): State<&'static Schema>,
    req: Request,
    next: Next,
) -> Result<Response, RequestError> {
    let (mut parts, body) = req.into_parts();
    let bytes = to_bytes(body, BODY_LIMIT)
        .await
        .map_err(|_| RequestError::bad_request("request body could not be read"))?;

    let input = if bytes.iter().all(u8::is_ascii_whitespace) {
        Map::new()
    } else {
        match serde_json::from_slice::<Value>(&bytes) {
            Ok(Value::Object(map)) => map,
            Ok(_) => return Err(RequestError::bad_request("request body must be a JSON object")),
            Err(_) => return Err(RequestError::bad_request("request body must be valid JSON")),
        }
    };

    let values = schema.validate(&input)?;
    parts.extensions.insert(Validated(values));
    Ok(next.run(Request::from_parts(parts, Body::empty())).await)
}

/// Validates the matched path parameters against `schema`.
pub async fn validate_params(
    State(schema): State<&'static Schema>,
    mut req: Request,
    next: Next,
) -> Result<Response, RequestError> {
    let params = req
        .extract_parts::<RawPathParams>()
        .await
        .map_err(|e| RequestError::internal(format!("path parameters unavailable: {e}")))?;

    let input: Map<String, Value> = params
        .iter()
        .map(|(key, value)| (key.to_string(), Value::String(value.to_string())))
        .collect();

    let values = schema.validate(&input)?;
    req.extensions_mut().insert(Validated(values));
    Ok(next.run(req).await)
}

//=========================================================================================
// Extractor
//=========================================================================================

/// The validated input of a route, deserialized into `T`.
#[derive(Debug)]
pub struct Valid<T>(pub T);

impl<S, T> FromRequestParts<S> for Valid<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = RequestError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Validated(values) = parts
            .extensions
            .get::<Validated>()
            .cloned()
            .ok_or_else(|| RequestError::internal("route has no validation layer"))?;

        serde_json::from_value(Value::Object(values))
            .map(Valid)
            .map_err(|e| RequestError::internal(format!("validated input does not fit: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::error::ErrorKind;
    use serde_json::json;

    static LETTERS: Lazy<Regex> = Lazy::new(|| Regex::new("^[a-z]+$").unwrap());

    fn schema() -> Schema {
        Schema::new(vec![
            Field::new("name")
                .required("name is required")
                .min_chars(2, "too short")
                .max_chars(5, "too long")
                .pattern(&LETTERS, "letters only"),
            Field::new("email").lowercase(),
        ])
    }

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn fields(err: RequestError) -> Vec<(String, String)> {
        let translated = err.translate();
        assert_eq!(translated.kind, ErrorKind::BadRequest);
        translated.fields.unwrap().into_iter().collect()
    }

    #[test]
    fn valid_input_is_normalized() {
        let values = schema()
            .validate(&object(json!({ "name": "anna", "email": "A@B.COM" })))
            .unwrap();
        assert_eq!(values["email"], "a@b.com");
        assert_eq!(values["name"], "anna");
    }

    #[test]
    fn optional_fields_may_be_omitted() {
        let values = schema().validate(&object(json!({ "name": "anna" }))).unwrap();
        assert!(!values.contains_key("email"));
    }

    #[test]
    fn first_failing_rule_wins_per_field() {
        let err = schema().validate(&object(json!({ "name": "a1" }))).unwrap_err();
        assert_eq!(fields(err), [("name".to_string(), "letters only".to_string())]);

        let err = schema().validate(&object(json!({ "name": "a" }))).unwrap_err();
        assert_eq!(fields(err), [("name".to_string(), "too short".to_string())]);
    }

    #[test]
    fn every_offending_field_is_reported() {
        let err = schema()
            .validate(&object(json!({ "email": 7, "extra": "x" })))
            .unwrap_err();
        let reported = fields(err);
        assert_eq!(
            reported,
            [
                ("email".to_string(), "must be a string".to_string()),
                ("extra".to_string(), "is not allowed".to_string()),
                ("name".to_string(), "name is required".to_string()),
            ]
        );
    }

    #[test]
    fn empty_strings_are_rejected_even_when_optional() {
        let err = schema()
            .validate(&object(json!({ "name": "anna", "email": "" })))
            .unwrap_err();
        assert_eq!(fields(err), [("email".to_string(), "must not be empty".to_string())]);
    }

    #[test]
    fn message_names_each_field() {
        let err = schema().validate(&object(json!({ "name": null }))).unwrap_err();
        assert_eq!(err.translate().message, "name: must be a string");
    }
}
