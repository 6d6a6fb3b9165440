//! Instance-store volumes per instance family

/// Instance families that ship with local instance-store volumes
const FAMILIES_WITH_LOCAL_VOLUMES: &[(&str, u32)] = &[
    ("c1", 1),
    ("c3", 1),
    ("c5ad", 1),
    ("c5d", 1),
    ("c6gd", 1),
    ("d2", 1),
    ("f1", 1),
    ("g2", 1),
    ("g4dn", 1),
    ("h1", 1),
    ("i2", 1),
    ("i3", 1),
    ("i3en", 1),
    ("i3p", 1),
    ("m1", 1),
    ("m2", 1),
    ("m3", 1),
    ("m5ad", 1),
    ("m5d", 1),
    ("m5dn", 1),
    ("m6gd", 1),
    ("p3dn", 1),
    ("r3", 1),
    ("r5ad", 1),
    ("r5d", 1),
    ("r5dn", 1),
    ("r6gd", 1),
    ("x1", 1),
    ("x1e", 1),
    ("z1d", 1),
];

/// Number of local volumes for an instance type such as `m5d.large`.
///
/// The family is everything before the first `.`; unknown families have none.
pub fn number_of_local_volumes(instance_type: &str) -> u32 {
    let family = instance_type.split('.').next().unwrap_or_default();
    FAMILIES_WITH_LOCAL_VOLUMES
        .iter()
        .find(|(f, _)| *f == family)
        .map(|(_, volumes)| *volumes)
        .unwrap_or(0)
}
