//! Rule 4: identifiers are unique within an entity type.
//!
//! Every entity sharing an identifier gets its own finding, naming the
//! locations of the others. Empty identifiers are left to the required rule.

use super::{Location, RecordSet};
use crate::report::{Finding, FindingCode};
use medbridge_record::{EntityKind, EntityRef};
use std::collections::HashMap;

pub fn check_duplicates(set: &RecordSet<'_>, findings: &mut Vec<Finding>) {
    report(
        EntityKind::Patient,
        set.patients().map(|(location, p)| (location, p.identifier.as_str())),
        findings,
    );
    report(
        EntityKind::Encounter,
        set.encounters().map(|(location, e)| (location, e.identifier.as_str())),
        findings,
    );
    report(
        EntityKind::Observation,
        set.observations().map(|(location, o)| (location, o.identifier.as_str())),
        findings,
    );
}

fn report<'a>(
    kind: EntityKind,
    entities: impl Iterator<Item = (Location, &'a str)>,
    findings: &mut Vec<Finding>,
) {
    let entities: Vec<_> = entities.filter(|(_, id)| !id.trim().is_empty()).collect();
    let mut seen: HashMap<&str, Vec<Location>> = HashMap::new();
    for (location, id) in &entities {
        seen.entry(*id).or_default().push(*location);
    }

    for (location, id) in &entities {
        let Some(all) = seen.get(id).filter(|all| all.len() > 1) else {
            continue;
        };
        let others: Vec<String> = all
            .iter()
            .filter(|other| *other != location)
            .map(Location::to_string)
            .collect();
        findings.push(
            Finding::error(
                FindingCode::DuplicateIdentifier,
                EntityRef::new(kind, *id),
                format!("{kind} identifier {id:?} is also used at {}", others.join(", ")),
            )
            .with_location(location.to_string()),
        );
    }
}
