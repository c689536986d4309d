use crate::reference::parse_reference;
use crate::resource::{Coding, FhirDocument, FhirResource, FhirValue, ResourceKind};
use medbridge_record::{ParseError, ParseLimits, Result};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Keys a plain `Coding` may carry; anything else makes it a complex value.
const CODING_KEYS: &[&str] = &["system", "version", "code", "display", "userSelected"];

struct Pending<'a> {
    value: &'a Value,
    /// Bundles enclosing this value.
    depth: usize,
    full_url: Option<&'a str>,
    location: String,
}

/// Walk a JSON tree into a flat [`FhirDocument`].
///
/// Bundles are unwrapped with an explicit work list so nesting costs no
/// call stack; entry order is preserved.
pub fn decode(json: &Value, limits: &ParseLimits) -> Result<FhirDocument> {
    let mut document = FhirDocument::default();
    let mut pending = vec![Pending {
        value: json,
        depth: 0,
        full_url: None,
        location: "$".to_string(),
    }];

    while let Some(item) = pending.pop() {
        let Some(object) = item.value.as_object() else {
            return Err(ParseError::TypeMismatch {
                resource: item.location,
                field: "$".into(),
                expected: "JSON object",
            });
        };
        let Some(type_name) = object.get("resourceType").and_then(Value::as_str) else {
            return Err(ParseError::MissingRequiredField {
                resource: item.location,
                field: "resourceType".into(),
            });
        };

        let kind = ResourceKind::from_type_name(type_name);
        if kind == ResourceKind::Bundle {
            limits.check_depth(item.depth + 1)?;
            let entries = object
                .get("entry")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default();
            // reversed so entries pop in document order
            for (index, entry) in entries.iter().enumerate().rev() {
                let Some(resource) = entry.get("resource") else {
                    continue;
                };
                pending.push(Pending {
                    value: resource,
                    depth: item.depth + 1,
                    full_url: entry.get("fullUrl").and_then(Value::as_str),
                    location: format!("{}.entry[{index}]", item.location),
                });
            }
            continue;
        }

        if let ResourceKind::Unknown(name) = &kind {
            tracing::warn!(resource_type = %name, location = %item.location, "passing through unmapped resource type");
        }
        limits.check_elements(document.resources.len() + 1)?;
        document.resources.push(FhirResource {
            kind,
            id: object.get("id").and_then(Value::as_str).map(str::to_string),
            full_url: item.full_url.map(str::to_string),
            elements: elements(object),
        });
    }

    tracing::debug!(resources = document.resources.len(), "decoded FHIR document");
    Ok(document)
}

fn elements(object: &Map<String, Value>) -> BTreeMap<String, FhirValue> {
    object
        .iter()
        .filter(|(key, _)| !matches!(key.as_str(), "resourceType" | "id"))
        .filter_map(|(key, value)| convert(value).map(|value| (key.clone(), value)))
        .collect()
}

fn convert(value: &Value) -> Option<FhirValue> {
    match value {
        Value::Null => None,
        Value::Bool(flag) => Some(FhirValue::Boolean(*flag)),
        Value::Number(number) => number.as_f64().map(FhirValue::Number),
        Value::String(text) => Some(FhirValue::Text(text.clone())),
        Value::Array(items) => Some(FhirValue::List(items.iter().filter_map(convert).collect())),
        Value::Object(object) => Some(convert_object(object)),
    }
}

fn convert_object(object: &Map<String, Value>) -> FhirValue {
    if let Some(reference) = object.get("reference").and_then(Value::as_str) {
        return FhirValue::Reference(parse_reference(reference));
    }
    let text = |key: &str| object.get(key).and_then(Value::as_str).map(str::to_string);
    if let Some(code) = text("code") {
        if object.contains_key("system") && object.keys().all(|key| CODING_KEYS.contains(&key.as_str())) {
            return FhirValue::Code(Coding {
                system: text("system"),
                code,
                display: text("display"),
            });
        }
    }
    FhirValue::Complex(elements(object))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn limits() -> ParseLimits {
        ParseLimits::default()
    }

    #[test]
    fn references_and_codings_are_recognised() {
        let document = decode(
            &json!({
                "resourceType": "Observation",
                "id": "o1",
                "subject": {"reference": "Patient/p1", "display": "Jane"},
                "code": {"coding": [{"system": "http://loinc.org", "code": "29463-7"}]},
                "valueQuantity": {"value": 72.5, "unit": "kg", "system": "http://unitsofmeasure.org", "code": "kg"},
                "note": null
            }),
            &limits(),
        )
        .unwrap();
        let observation = &document.resources[0];
        assert_eq!(observation.id.as_deref(), Some("o1"));
        assert!(matches!(observation.get("subject"), Some(FhirValue::Reference(_))));
        assert!(matches!(
            observation.path("code.coding"),
            Some(FhirValue::Code(Coding { code, .. })) if code == "29463-7"
        ));
        assert!(matches!(observation.get("valueQuantity"), Some(FhirValue::Complex(_))));
        assert!(observation.get("note").is_none());
        assert!(observation.get("resourceType").is_none());
    }

    #[test]
    fn nested_bundles_keep_entry_order() {
        let document = decode(
            &json!({
                "resourceType": "Bundle",
                "entry": [
                    {"fullUrl": "urn:uuid:1", "resource": {"resourceType": "Patient", "id": "a"}},
                    {"resource": {"resourceType": "Bundle", "entry": [
                        {"resource": {"resourceType": "Encounter", "id": "b"}}
                    ]}},
                    {"resource": {"resourceType": "Observation", "id": "c"}},
                    {"request": {"method": "DELETE"}}
                ]
            }),
            &limits(),
        )
        .unwrap();
        let ids: Vec<_> = document.resources.iter().filter_map(|r| r.id.as_deref()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
        assert_eq!(document.resources[0].full_url.as_deref(), Some("urn:uuid:1"));
    }

    #[test]
    fn missing_resource_type() {
        assert_eq!(
            decode(&json!({"resourceType": "Bundle", "entry": [{"resource": {"id": "x"}}]}), &limits()),
            Err(ParseError::MissingRequiredField {
                resource: "$.entry[0]".into(),
                field: "resourceType".into()
            })
        );
        assert!(matches!(
            decode(&json!([1, 2]), &limits()),
            Err(ParseError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn bundle_nesting_is_capped() {
        let mut json = json!({"resourceType": "Patient", "id": "deep"});
        for _ in 0..4 {
            json = json!({"resourceType": "Bundle", "entry": [{"resource": json}]});
        }
        let shallow = ParseLimits {
            max_depth: 3,
            ..ParseLimits::default()
        };
        assert_eq!(
            decode(&json, &shallow),
            Err(ParseError::ResourceLimitExceeded {
                limit: "nesting levels",
                max: 3
            })
        );
        assert_eq!(decode(&json, &limits()).unwrap().resources.len(), 1);
    }
}
