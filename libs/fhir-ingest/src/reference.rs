use medbridge_record::Reference;

/// Split a FHIR reference string into `(type, id)`.
///
/// Accepts `Type/id`, `Type/id/_history/n` and absolute URLs ending in
/// either. Anything else (`urn:uuid:...`, `#contained`) keeps the whole
/// string as id and no type.
pub fn parse_reference(raw: &str) -> Reference {
    let trimmed = raw.trim();
    let path = match trimmed.split_once("/_history/") {
        Some((path, _version)) => path,
        None => trimmed,
    };
    let mut segments = path.rsplit('/');
    if let (Some(id), Some(kind)) = (segments.next(), segments.next()) {
        if is_type_name(kind) && !id.is_empty() {
            return Reference::new(Some(kind), id);
        }
    }
    Reference::new(None, trimmed)
}

fn is_type_name(segment: &str) -> bool {
    let mut chars = segment.chars();
    chars.next().is_some_and(|c| c.is_ascii_uppercase()) && chars.all(|c| c.is_ascii_alphanumeric())
}
