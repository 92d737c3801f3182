//! Request validation.
//!
//! [`validate_request`] parses the body, query string and path parameters of
//! a request as one object `{ body, query, params }` and runs the schema's
//! `validator` rules over it. Every failing field is reported with its full
//! path (`body.title`, `query.page`, `params.category_id`) in a single 400
//! `VALIDATION_ERROR`.
//!
//! The extractors are thin adapters:
//!
//! - [`Validated<S>`] for schemas that span several request parts
//! - [`ValidatedJson<T>`] for a JSON body alone (paths start with `body.`)
//! - [`ValidatedQuery<T>`] for a query string alone (paths start with `query.`)
//! - [`PathId`] and [`PathUuid`] for a single typed path segment

use std::collections::HashMap;
use std::str::FromStr;

use axum::{
    Json,
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Path, Query, Request, rejection::JsonRejection},
    http::Uri,
};
use crystaltides_core::{AppError, FieldError};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors, ValidationErrorsKind};

/// The three inputs of a request, as JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestData {
    pub body: Value,
    pub query: Value,
    pub params: Value,
}

impl Default for RequestData {
    fn default() -> Self {
        Self {
            body: Value::Object(Map::new()),
            query: Value::Object(Map::new()),
            params: Value::Object(Map::new()),
        }
    }
}

impl RequestData {
    fn into_value(self) -> Value {
        json!({ "body": self.body, "query": self.query, "params": self.params })
    }
}

/// Parses and validates the combined request against `S`.
pub fn validate_request<S>(data: RequestData) -> Result<S, AppError>
where
    S: DeserializeOwned + Validate,
{
    parse_and_validate(data.into_value(), None)
}

/// Upper bound on type errors collected from one request.
const MAX_TYPE_ERRORS: usize = 32;

/// Deserializes `value` as `S`, then runs its rules.
///
/// A field of the wrong type is reported under its own path and dropped from
/// the input so the rest of the request can still be parsed and checked.
/// Rule failures on a dropped field are not reported twice.
fn parse_and_validate<S>(mut value: Value, prefix: Option<&str>) -> Result<S, AppError>
where
    S: DeserializeOwned + Validate,
{
    let prefix = prefix.unwrap_or_default();
    let mut type_errors: Vec<FieldError> = Vec::new();

    let parsed = loop {
        let error = match serde_path_to_error::deserialize::<_, S>(&value) {
            Ok(parsed) => break Some(parsed),
            Err(error) => error,
        };

        let segments = path_segments(error.path());
        let message = error.inner().to_string();

        if let Some(missing) = missing_field(&message) {
            let parent = join(prefix, &segments.join("."));
            let field = join(parent.trim_end_matches('.'), missing);
            if !type_errors.iter().any(|e| e.field == field) {
                type_errors.push(FieldError::new(field, format!("{missing} is required")));
            }
            break None;
        }

        let field = match (prefix, segments.is_empty()) {
            ("", true) => "request".to_string(),
            (_, true) => prefix.to_string(),
            _ => join(prefix, &segments.join(".")),
        };
        let removed = remove_at(&mut value, &segments);
        type_errors.push(FieldError::new(field, message));

        if !removed || type_errors.len() >= MAX_TYPE_ERRORS {
            break None;
        }
    };

    let Some(parsed) = parsed else {
        type_errors.sort_by(|a, b| a.field.cmp(&b.field));
        return Err(AppError::validation(type_errors));
    };

    let mut errors = type_errors;
    if let Err(rule_errors) = parsed.validate() {
        let rule_errors = field_errors(&rule_errors, Some(prefix).filter(|p| !p.is_empty()));
        for rule_error in rule_errors {
            if !errors.iter().any(|e| e.field == rule_error.field) {
                errors.push(rule_error);
            }
        }
    }

    if errors.is_empty() {
        return Ok(parsed);
    }
    errors.sort_by(|a, b| a.field.cmp(&b.field));
    Err(AppError::validation(errors))
}

fn path_segments(path: &serde_path_to_error::Path) -> Vec<String> {
    path.iter()
        .filter_map(|segment| match segment {
            serde_path_to_error::Segment::Map { key } => Some(key.clone()),
            serde_path_to_error::Segment::Seq { index } => Some(index.to_string()),
            serde_path_to_error::Segment::Enum { variant } => Some(variant.clone()),
            _ => None,
        })
        .collect()
}

/// The field named by serde's "missing field `x`" message.
fn missing_field(message: &str) -> Option<&str> {
    message
        .strip_prefix("missing field `")
        .and_then(|rest| rest.split('`').next())
}

/// Removes the object entry at `segments`; `false` when it is not an object
/// entry (array items are left in place so later indexes stay correct).
fn remove_at(value: &mut Value, segments: &[String]) -> bool {
    let Some((last, parents)) = segments.split_last() else {
        return false;
    };

    let mut current = value;
    for segment in parents {
        current = match current {
            Value::Object(map) => match map.get_mut(segment) {
                Some(next) => next,
                None => return false,
            },
            Value::Array(items) => {
                match segment.parse::<usize>().ok().and_then(|i| items.get_mut(i)) {
                    Some(next) => next,
                    None => return false,
                }
            }
            _ => return false,
        };
    }

    match current {
        Value::Object(map) => map.remove(last).is_some(),
        _ => false,
    }
}

/// Flattens nested `validator` errors into sorted, dotted field paths.
pub fn field_errors(errors: &ValidationErrors, prefix: Option<&str>) -> Vec<FieldError> {
    let mut out = Vec::new();
    collect(errors, prefix.unwrap_or_default(), &mut out);
    out.sort_by(|a, b| a.field.cmp(&b.field));
    out
}

fn join(prefix: &str, segment: &str) -> String {
    if prefix.is_empty() {
        segment.to_string()
    } else {
        format!("{prefix}.{segment}")
    }
}

fn collect(errors: &ValidationErrors, prefix: &str, out: &mut Vec<FieldError>) {
    for (field, kind) in errors.errors() {
        let path = join(prefix, field.as_ref());
        match kind {
            ValidationErrorsKind::Field(list) => {
                for error in list {
                    out.push(FieldError::new(path.clone(), describe(field.as_ref(), error)));
                }
            }
            ValidationErrorsKind::Struct(nested) => collect(nested, &path, out),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect(nested, &join(&path, &index.to_string()), out);
                }
            }
        }
    }
}

fn describe(field: &str, error: &ValidationError) -> String {
    if let Some(message) = &error.message {
        return message.to_string();
    }

    let min = error.params.get("min");
    let max = error.params.get("max");
    match error.code.as_ref() {
        "length" => match (min, max, error.params.get("equal")) {
            (_, _, Some(equal)) => format!("{field} must be exactly {equal} characters"),
            (Some(min), Some(max), _) => {
                format!("{field} must be between {min} and {max} characters")
            }
            (Some(min), None, _) => format!("{field} must be at least {min} characters"),
            (None, Some(max), _) => format!("{field} must be at most {max} characters"),
            (None, None, _) => format!("{field} has an invalid length"),
        },
        "range" => match (min, max) {
            (Some(min), Some(max)) => format!("{field} must be between {min} and {max}"),
            (Some(min), None) => format!("{field} must be at least {min}"),
            (None, Some(max)) => format!("{field} must be at most {max}"),
            (None, None) => format!("{field} is out of range"),
        },
        "required" => format!("{field} is required"),
        "email" => format!("{field} must be a valid email address"),
        "url" => format!("{field} must be a valid URL"),
        _ => format!("{field} is invalid"),
    }
}

fn query_value(uri: &Uri) -> Value {
    let pairs = Query::<HashMap<String, String>>::try_from_uri(uri)
        .map(|Query(pairs)| pairs)
        .unwrap_or_default();
    Value::Object(pairs.into_iter().map(|(k, v)| (k, Value::String(v))).collect())
}

fn body_value(bytes: &[u8]) -> Result<Value, AppError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Map::new()));
    }
    serde_json::from_slice(bytes).map_err(|e| {
        AppError::validation(vec![FieldError::new("body", format!("Invalid JSON: {e}"))])
    })
}

/// Extracts and validates a schema spanning body, query and path parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct Validated<S>(pub S);

impl<S, St> FromRequest<St> for Validated<S>
where
    S: DeserializeOwned + Validate,
    St: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &St) -> Result<Self, Self::Rejection> {
        let (mut parts, body) = req.into_parts();

        let params = Path::<HashMap<String, String>>::from_request_parts(&mut parts, state)
            .await
            .map(|Path(params)| params)
            .unwrap_or_default();
        let query = query_value(&parts.uri);

        let bytes = Bytes::from_request(Request::from_parts(parts, body), state)
            .await
            .map_err(|e| AppError::bad_request(anyhow::anyhow!(e.body_text())))?;

        let data = RequestData {
            body: body_value(&bytes)?,
            query,
            params: Value::Object(
                params
                    .into_iter()
                    .map(|(k, v)| (k, Value::String(v)))
                    .collect(),
            ),
        };

        validate_request(data).map(Validated)
    }
}

/// A validated JSON body.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<Value>::from_request(req, state)
            .await
            .map_err(|rejection| match rejection {
                JsonRejection::MissingJsonContentType(_) => AppError::bad_request(
                    anyhow::anyhow!("Missing 'Content-Type: application/json' header"),
                ),
                other => AppError::validation(vec![FieldError::new("body", other.body_text())]),
            })?;

        parse_and_validate(value, Some("body")).map(ValidatedJson)
    }
}

/// A validated query string.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parse_and_validate(query_value(&parts.uri), Some("query")).map(ValidatedQuery)
    }
}

fn path_error(name: &str, expected: &str) -> AppError {
    AppError::validation(vec![FieldError::new(
        format!("params.{name}"),
        format!("{name} must be {expected}"),
    )])
}

/// Parses the single path parameter of a route as `T`, returning its name too.
async fn single_path_param<T, S>(
    parts: &mut axum::http::request::Parts,
    state: &S,
    expected: &str,
) -> Result<(String, T), AppError>
where
    T: FromStr,
    S: Send + Sync,
{
    let params = Path::<HashMap<String, String>>::from_request_parts(parts, state)
        .await
        .map(|Path(params)| params)
        .unwrap_or_default();

    let Some((name, raw)) = params.into_iter().next() else {
        return Err(AppError::internal_error("Route has no path parameter"));
    };
    match raw.parse::<T>() {
        Ok(value) => Ok((name, value)),
        Err(_) => Err(path_error(&name, expected)),
    }
}

/// A positive numeric id from the path (`/rules/{id}`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathId(pub i64);

impl<S> FromRequestParts<S> for PathId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        const EXPECTED: &str = "a positive integer";
        let (name, id) = single_path_param::<i64, _>(parts, state, EXPECTED).await?;
        if id < 1 {
            return Err(path_error(&name, EXPECTED));
        }
        Ok(PathId(id))
    }
}

/// A UUID from the path (`/users/{id}`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathUuid(pub Uuid);

impl<S> FromRequestParts<S> for PathUuid
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        single_path_param(parts, state, "a valid UUID")
            .await
            .map(|(_, id)| PathUuid(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use crystaltides_core::PaginationParams;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Validate)]
    struct ThreadBody {
        #[serde(default)]
        #[validate(length(min = 5, max = 150))]
        title: String,
        #[serde(default)]
        #[validate(length(min = 10, message = "content is too short"))]
        content: String,
    }

    #[derive(Debug, Deserialize, Validate)]
    struct Listing {
        #[serde(default)]
        #[validate(nested)]
        query: PaginationParams,
    }

    #[derive(Debug, Deserialize, Validate)]
    struct CreateThread {
        #[validate(nested)]
        body: ThreadBody,
    }

    #[derive(Debug, Deserialize, Validate)]
    struct Poll {
        #[validate(nested)]
        options: Vec<Choice>,
    }

    #[derive(Debug, Deserialize, Validate)]
    struct Choice {
        #[validate(length(min = 1))]
        label: String,
    }

    fn body(value: Value) -> RequestData {
        RequestData {
            body: value,
            ..RequestData::default()
        }
    }

    #[test]
    fn test_valid_request_passes_through() {
        let parsed: CreateThread = validate_request(body(json!({
            "title": "Welcome to season 4",
            "content": "Read the rules before building."
        })))
        .unwrap();
        assert_eq!(parsed.body.title, "Welcome to season 4");
    }

    #[test]
    fn test_every_failing_field_is_listed() {
        let err = validate_request::<CreateThread>(body(json!({ "title": "Hey" }))).unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.code, "VALIDATION_ERROR");
        assert_eq!(
            err.details,
            vec![
                FieldError::new("body.content", "content is too short"),
                FieldError::new("body.title", "title must be between 5 and 150 characters"),
            ]
        );
    }

    #[test]
    fn test_query_paths_and_string_numbers() {
        let ok: Listing = validate_request(RequestData {
            query: json!({ "page": "2", "limit": "20" }),
            ..RequestData::default()
        })
        .unwrap();
        assert_eq!(ok.query.page, Some(2));

        let err = validate_request::<Listing>(RequestData {
            query: json!({ "page": "0" }),
            ..RequestData::default()
        })
        .unwrap_err();
        assert_eq!(err.details[0].field, "query.page");
        assert_eq!(err.details[0].message, "page must be between 1 and 1000000");
    }

    #[test]
    fn test_unparseable_input_is_a_validation_error() {
        let err = validate_request::<Listing>(RequestData {
            query: json!({ "page": "two" }),
            ..RequestData::default()
        })
        .unwrap_err();
        assert_eq!(err.code, "VALIDATION_ERROR");
        assert_eq!(err.details[0].field, "query.page");
    }

    #[test]
    fn test_wrong_type_and_rule_failures_are_listed_together() {
        let err = validate_request::<CreateThread>(body(json!({
            "title": 12345,
            "content": "short"
        })))
        .unwrap_err();
        assert_eq!(err.details.len(), 2);
        assert_eq!(err.details[0], FieldError::new("body.content", "content is too short"));
        assert_eq!(err.details[1].field, "body.title");
        assert!(err.details[1].message.contains("invalid type"));
    }

    #[test]
    fn test_every_wrong_type_is_listed() {
        let err = validate_request::<CreateThread>(body(json!({
            "title": 12345,
            "content": ["not", "text"]
        })))
        .unwrap_err();
        let fields: Vec<&str> = err.details.iter().map(|d| d.field.as_str()).collect();
        assert_eq!(fields, ["body.content", "body.title"]);
    }

    #[test]
    fn test_missing_required_field_is_named() {
        #[derive(Debug, Deserialize, Validate)]
        struct CreatePoll {
            #[validate(nested)]
            body: Poll,
        }

        let err = validate_request::<CreatePoll>(body(json!({ "options": [{}] }))).unwrap_err();
        assert_eq!(
            err.details,
            vec![FieldError::new("body.options.0.label", "label is required")]
        );
    }

    #[test]
    fn test_single_part_extractor_prefix() {
        let err = parse_and_validate::<ThreadBody>(json!({ "title": true }), Some("body"))
            .unwrap_err();
        let fields: Vec<&str> = err.details.iter().map(|d| d.field.as_str()).collect();
        assert_eq!(fields, ["body.content", "body.title"]);
    }

    #[test]
    fn test_list_items_are_indexed() {
        let poll = Poll {
            options: vec![
                Choice { label: "Yes".into() },
                Choice { label: String::new() },
            ],
        };
        let errors = poll.validate().unwrap_err();
        let fields = field_errors(&errors, Some("body"));
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].field, "body.options.1.label");
        assert_eq!(fields[0].message, "label must be at least 1 characters");
    }

    #[test]
    fn test_query_value_from_uri() {
        let uri: Uri = "/api/donations?page=2&search=steve".parse().unwrap();
        assert_eq!(query_value(&uri), json!({ "page": "2", "search": "steve" }));
        assert_eq!(query_value(&"/api/rules".parse().unwrap()), json!({}));
    }

    #[test]
    fn test_blank_body_reads_as_empty_object() {
        assert_eq!(body_value(b"").unwrap(), json!({}));
        assert_eq!(body_value(b"  \n").unwrap(), json!({}));
        assert!(body_value(b"{not json").is_err());
    }
}
