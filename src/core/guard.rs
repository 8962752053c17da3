use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// `guard`가 검사할 수 있는 JSON 값의 형태.
pub trait Shape<'a>: Sized {
    /// 오류 메시지에 쓰이는 형태 이름.
    const NAME: &'static str;

    fn cast(value: &'a Value) -> Option<Self>;
}

impl<'a> Shape<'a> for &'a str {
    const NAME: &'static str = "string";

    fn cast(value: &'a Value) -> Option<Self> {
        value.as_str()
    }
}

impl<'a> Shape<'a> for String {
    const NAME: &'static str = "string";

    fn cast(value: &'a Value) -> Option<Self> {
        value.as_str().map(str::to_string)
    }
}

impl<'a> Shape<'a> for i64 {
    const NAME: &'static str = "integer";

    fn cast(value: &'a Value) -> Option<Self> {
        value.as_i64()
    }
}

impl<'a> Shape<'a> for f64 {
    const NAME: &'static str = "number";

    fn cast(value: &'a Value) -> Option<Self> {
        value.as_f64()
    }
}

impl<'a> Shape<'a> for bool {
    const NAME: &'static str = "boolean";

    fn cast(value: &'a Value) -> Option<Self> {
        value.as_bool()
    }
}

impl<'a> Shape<'a> for &'a Vec<Value> {
    const NAME: &'static str = "array";

    fn cast(value: &'a Value) -> Option<Self> {
        value.as_array()
    }
}

impl<'a> Shape<'a> for &'a Map<String, Value> {
    const NAME: &'static str = "object";

    fn cast(value: &'a Value) -> Option<Self> {
        value.as_object()
    }
}

/// JSON 값의 실제 형태 이름.
pub fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// 값을 기대한 형태 `T`로 꺼낸다.
///
/// 키가 없는 경우(`None`)는 null과 같이 취급한다. null은 `allow_null`이 참이면
/// `Ok(None)`이 되고, 그 외에 형태가 맞지 않는 값은 모두 `SchemaMismatch`가 된다.
pub fn guard<'a, T: Shape<'a>>(value: Option<&'a Value>, allow_null: bool) -> Result<Option<T>> {
    match value {
        None | Some(Value::Null) if allow_null => Ok(None),
        None => Err(Error::SchemaMismatch {
            expected: T::NAME,
            actual: "null",
        }),
        Some(v) => T::cast(v).map(Some).ok_or(Error::SchemaMismatch {
            expected: T::NAME,
            actual: describe(v),
        }),
    }
}

/// 문서 최상위 값이 객체인지 확인한다.
pub fn required_object(value: &Value) -> Result<&Map<String, Value>> {
    value.as_object().ok_or(Error::SchemaMismatch {
        expected: "object",
        actual: describe(value),
    })
}

/// 객체의 `key` 필드를 꺼낸다. 없거나 null이면 `None`.
pub fn field<'a, T: Shape<'a>>(object: &'a Map<String, Value>, key: &str) -> Result<Option<T>> {
    guard(object.get(key), true)
}

/// 객체의 `key` 필드를 꺼낸다. 없거나 null이면 `SchemaMismatch`.
pub fn required<'a, T: Shape<'a>>(object: &'a Map<String, Value>, key: &str) -> Result<T> {
    guard(object.get(key), false)?.ok_or(Error::SchemaMismatch {
        expected: T::NAME,
        actual: "null",
    })
}

/// 경로를 따라 중첩 객체를 찾아 내려간다. 중간 객체가 없으면 `None`.
pub fn descend<'a>(
    object: &'a Map<String, Value>,
    path: &[&str],
) -> Result<Option<&'a Map<String, Value>>> {
    let mut current = object;
    for key in path {
        match field::<&Map<String, Value>>(current, key)? {
            Some(next) => current = next,
            None => return Ok(None),
        }
    }
    Ok(Some(current))
}

/// 문자열 배열 필드. 없으면 빈 Vec, null 원소는 건너뛴다.
pub fn string_list(object: &Map<String, Value>, key: &str) -> Result<Vec<String>> {
    let mut values = Vec::new();
    if let Some(items) = field::<&Vec<Value>>(object, key)? {
        for item in items {
            if let Some(s) = guard::<String>(Some(item), true)? {
                values.push(s);
            }
        }
    }
    Ok(values)
}

/// 객체 배열 필드. 없으면 빈 Vec, null 원소는 건너뛴다.
pub fn object_list<'a>(
    object: &'a Map<String, Value>,
    key: &str,
) -> Result<Vec<&'a Map<String, Value>>> {
    let mut values = Vec::new();
    if let Some(items) = field::<&Vec<Value>>(object, key)? {
        for item in items {
            if let Some(o) = guard::<&Map<String, Value>>(Some(item), true)? {
                values.push(o);
            }
        }
    }
    Ok(values)
}

/// 빈 문자열은 값이 없는 것으로 본다.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_null_allowed() {
        let v = Value::Null;
        assert_eq!(guard::<i64>(Some(&v), true).unwrap(), None);
        assert_eq!(guard::<i64>(None, true).unwrap(), None);
    }

    #[test]
    fn test_null_rejected() {
        let err = guard::<i64>(None, false).unwrap_err();
        assert!(matches!(
            err,
            Error::SchemaMismatch {
                expected: "integer",
                actual: "null"
            }
        ));
    }

    #[test]
    fn test_matching_shape_returned_unchanged() {
        let v = json!("노래");
        assert_eq!(guard::<&str>(Some(&v), true).unwrap(), Some("노래"));
        let v = json!(42);
        assert_eq!(guard::<i64>(Some(&v), false).unwrap(), Some(42));
    }

    #[test]
    fn test_wrong_shape_reports_both_sides() {
        let v = json!("42");
        match guard::<i64>(Some(&v), true) {
            Err(Error::SchemaMismatch { expected, actual }) => {
                assert_eq!(expected, "integer");
                assert_eq!(actual, "string");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_float_is_not_integer() {
        let v = json!(1.5);
        assert!(guard::<i64>(Some(&v), true).is_err());
    }

    #[test]
    fn test_descend_missing_parent() {
        let doc = json!({"a": {"b": {}}});
        let obj = doc.as_object().unwrap();
        assert!(descend(obj, &["a", "b"]).unwrap().is_some());
        assert!(descend(obj, &["a", "x", "y"]).unwrap().is_none());
    }

    #[test]
    fn test_descend_wrong_parent_type() {
        let doc = json!({"a": [1, 2]});
        let obj = doc.as_object().unwrap();
        assert!(descend(obj, &["a", "b"]).is_err());
    }

    #[test]
    fn test_string_list() {
        let doc = json!({"alia": ["a", null, "b"], "bad": ["a", 1]});
        let obj = doc.as_object().unwrap();
        assert_eq!(string_list(obj, "alia").unwrap(), vec!["a", "b"]);
        assert!(string_list(obj, "missing").unwrap().is_empty());
        assert!(string_list(obj, "bad").is_err());
    }

    #[test]
    fn test_object_list_rejects_scalars() {
        let doc = json!({"ar": [{"id": 1}, "x"]});
        let obj = doc.as_object().unwrap();
        assert!(object_list(obj, "ar").is_err());
    }

    #[test]
    fn test_required_field() {
        let doc = json!({"code": 0});
        let obj = doc.as_object().unwrap();
        assert_eq!(required::<i64>(obj, "code").unwrap(), 0);
        assert!(required::<i64>(obj, "missing").is_err());
    }
}
