//! Id parsing and plausibility checks for correction requests.

use serde_json::Value;

use super::error::CorrectionError;

/// Canonical ids must fall strictly between these bounds.
pub const CANONICAL_ID_MIN_EXCLUSIVE: i64 = 0;
pub const CANONICAL_ID_MAX_EXCLUSIVE: i64 = 10_000_000;

/// Accepts integral JSON numbers and strings holding an integer.
pub fn parse_movie_id(field: &str, value: Option<&Value>) -> Result<i64, CorrectionError> {
    let not_an_integer = |got: &Value| CorrectionError::InvalidArgument {
        message: format!("{} must be an integer", field),
        hint: Some(format!("send {} as a JSON number, e.g. 550", field)),
        got: Some(got.clone()),
    };

    let value = match value {
        None | Some(Value::Null) => {
            return Err(CorrectionError::InvalidArgument {
                message: format!("{} is required", field),
                hint: Some("body must be {\"tempId\": <int>, \"newId\": <int>}".to_string()),
                got: None,
            })
        }
        Some(value) => value,
    };

    match value {
        Value::Number(number) => {
            if let Some(id) = number.as_i64() {
                return Ok(id);
            }
            match number.as_f64() {
                Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Ok(f as i64),
                _ => Err(not_an_integer(value)),
            }
        }
        Value::String(s) => s.trim().parse::<i64>().map_err(|_| not_an_integer(value)),
        _ => Err(not_an_integer(value)),
    }
}

pub fn validate_canonical_id(canonical_id: i64) -> Result<(), CorrectionError> {
    if canonical_id <= CANONICAL_ID_MIN_EXCLUSIVE || canonical_id >= CANONICAL_ID_MAX_EXCLUSIVE {
        return Err(CorrectionError::InvalidArgument {
            message: "newId is not a plausible external catalog id".to_string(),
            hint: Some(format!(
                "newId must be greater than {} and less than {}",
                CANONICAL_ID_MIN_EXCLUSIVE, CANONICAL_ID_MAX_EXCLUSIVE
            )),
            got: Some(Value::from(canonical_id)),
        });
    }
    Ok(())
}

pub fn validate_ids(placeholder_id: i64, canonical_id: i64) -> Result<(), CorrectionError> {
    if placeholder_id == canonical_id {
        return Err(CorrectionError::InvalidArgument {
            message: "tempId and newId must differ".to_string(),
            hint: None,
            got: Some(Value::from(canonical_id)),
        });
    }
    validate_canonical_id(canonical_id)
}
