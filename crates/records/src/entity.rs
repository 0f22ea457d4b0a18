use std::collections::BTreeMap;

use foundation::{ElementId, LatLng, Vec2, format_number};

/// Suffix of the numeric shadow entry written next to each text field.
///
/// The shadow exists only for cells with a numeric value, so for a text-only
/// dimension `{{fields.<key>_num}}` renders as empty, never as `NaN`.
pub const NUMERIC_SUFFIX: &str = "_num";

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(f64),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            FieldValue::Number(_) => None,
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Number(n) => f.write_str(&format_number(*n)),
        }
    }
}

/// Named field values in first-insertion order.
///
/// Re-assigning a key replaces its value but keeps its original position, so
/// colliding safe keys resolve to the last writer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityFields {
    pub pairs: Vec<(String, FieldValue)>,
}

impl EntityFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: FieldValue) {
        let key = key.into();
        match self.pairs.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.pairs.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> + '_ {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawDimension {
    pub text: String,
    pub numeric: f64,
}

/// Composite identity of a row: `"{lat}-{lng}-{name}"`.
///
/// Two rows at the same coordinates with the same name share an id, and then
/// also share a stored card position.
pub fn entity_id(latitude: f64, longitude: f64, name: &str) -> String {
    format!(
        "{}-{}-{}",
        format_number(latitude),
        format_number(longitude),
        name
    )
}

/// Uppercased first character of `name`, or `?`.
pub fn initial_of(name: &str) -> String {
    match name.chars().next() {
        Some(c) => c.to_uppercase().collect(),
        None => "?".to_string(),
    }
}

/// A geolocated point record derived from one cube row.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: String,
    /// Index of the source row within the matrix it came from.
    pub row: usize,
    pub latitude: f64,
    pub longitude: f64,
    pub name: String,
    pub initial: String,
    pub element: ElementId,
    pub fields: EntityFields,
    pub raw_dimensions: BTreeMap<usize, RawDimension>,
    pub size_value: Option<f64>,
    pub size_text: Option<String>,
    /// Placement priority in `[0, 1]`; higher places first.
    pub priority: f64,
    pub manually_positioned: bool,
    pub stored_position: Option<Vec2>,
}

impl Entity {
    pub fn location(&self) -> LatLng {
        LatLng::new(self.latitude, self.longitude)
    }
}

#[cfg(test)]
mod tests {
    use super::{EntityFields, FieldValue, entity_id, initial_of};

    #[test]
    fn reassignment_keeps_first_position() {
        let mut f = EntityFields::new();
        f.set("a", FieldValue::Text("1".into()));
        f.set("b", FieldValue::Text("2".into()));
        f.set("a", FieldValue::Text("3".into()));
        let keys: Vec<&str> = f.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(f.get("a"), Some(&FieldValue::Text("3".into())));
    }

    #[test]
    fn ids_join_coordinates_and_name() {
        assert_eq!(entity_id(48.8566, 2.3522, "Paris"), "48.8566-2.3522-Paris");
        assert_eq!(entity_id(-33.0, 151.0, "Sydney"), "-33-151-Sydney");
    }

    #[test]
    fn initials() {
        assert_eq!(initial_of("oslo"), "O");
        assert_eq!(initial_of(""), "?");
        assert_eq!(initial_of("ßtadt"), "SS");
    }

    #[test]
    fn numbers_display_without_trailing_fraction() {
        assert_eq!(FieldValue::Number(12.0).to_string(), "12");
        assert_eq!(FieldValue::Text("x".into()).to_string(), "x");
    }
}
