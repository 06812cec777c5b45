//! Properties: named lists of string values with derived typed forms.
//!
//! The string values are canonical. Integer, float and colour readings are
//! derived on `recompute()` and dropped again by any mutation, so a typed
//! accessor either sees values that match the strings or reports
//! `ValueError::NotComputed`.

use std::fmt;

use crate::error::{ValueError, ValueKind};

use super::colour::Colour;
use super::key::Key;

/// The state of one derived value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueState<T> {
    /// The source string parsed as this type.
    Parsed(T),
    /// The source string is not a valid value of this type.
    Unparseable,
    /// Derived forms have not been computed since the last mutation.
    NotComputed,
}

impl<T> ValueState<T> {
    /// The parsed value, if any.
    pub fn parsed(self) -> Option<T> {
        match self {
            ValueState::Parsed(v) => Some(v),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Derived {
    ints: Vec<Option<i64>>,
    floats: Vec<Option<f64>>,
    colours: Vec<Option<Colour>>,
}

impl Derived {
    fn compute(values: &[String]) -> Self {
        Self {
            ints: values.iter().map(|v| v.parse().ok()).collect(),
            floats: values.iter().map(|v| v.parse().ok()).collect(),
            colours: values.iter().map(|v| Colour::from_hex(v)).collect(),
        }
    }
}

/// A type that can be read out of a property's derived forms.
trait Derivable: Copy {
    const KIND: ValueKind;
    fn column(derived: &Derived) -> &[Option<Self>];
}

impl Derivable for i64 {
    const KIND: ValueKind = ValueKind::Int;
    fn column(derived: &Derived) -> &[Option<Self>] {
        &derived.ints
    }
}

impl Derivable for f64 {
    const KIND: ValueKind = ValueKind::Float;
    fn column(derived: &Derived) -> &[Option<Self>] {
        &derived.floats
    }
}

impl Derivable for Colour {
    const KIND: ValueKind = ValueKind::Colour;
    fn column(derived: &Derived) -> &[Option<Self>] {
        &derived.colours
    }
}

/// A named, optionally categorised, ordered list of values.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    name: String,
    category: Option<String>,
    values: Vec<String>,
    derived: Option<Derived>,
}

impl Property {
    /// Create a property with no values. Its (empty) derived forms count as
    /// computed.
    pub fn new(name: impl Into<String>, category: Option<String>) -> Self {
        Self::with_values(name, category, Vec::<String>::new())
    }

    /// Create a property and compute its derived forms.
    pub fn with_values<I, S>(name: impl Into<String>, category: Option<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut property = Self {
            name: name.into(),
            category,
            values: values.into_iter().map(Into::into).collect(),
            derived: None,
        };
        property.recompute();
        property
    }

    /// A property whose value is still waiting on a reference.
    pub(crate) fn pending(name: impl Into<String>, category: Option<String>) -> Self {
        Self {
            name: name.into(),
            category,
            values: Vec::new(),
            derived: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    /// This property's exact `(name, category)` key.
    pub fn key(&self) -> Key<'_> {
        Key::new(&self.name, self.category.as_deref())
    }

    /// The canonical string values.
    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The first value, or `""` when there are none.
    pub fn as_str(&self) -> &str {
        self.values.first().map(String::as_str).unwrap_or("")
    }

    /// Whether derived forms match the current string values.
    pub fn is_computed(&self) -> bool {
        self.derived.is_some()
    }

    /// Recompute integer, float and colour readings from the string values.
    pub fn recompute(&mut self) {
        self.derived = Some(Derived::compute(&self.values));
    }

    /// Replace every value. Derived forms must be recomputed afterwards.
    pub fn set_values<I, S>(&mut self, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.values = values.into_iter().map(Into::into).collect();
        self.derived = None;
    }

    /// Replace every value and recompute derived forms.
    pub(crate) fn assign(&mut self, values: Vec<String>) {
        self.values = values;
        self.recompute();
    }

    /// Append a value. Derived forms must be recomputed afterwards.
    pub fn push_value(&mut self, value: impl Into<String>) {
        self.values.push(value.into());
        self.derived = None;
    }

    /// Remove every copy of `value`. Returns how many were removed.
    /// Derived forms must be recomputed afterwards.
    pub fn remove_value(&mut self, value: &str) -> usize {
        let before = self.values.len();
        self.values.retain(|v| v != value);
        self.derived = None;
        before - self.values.len()
    }

    pub fn int_at(&self, index: usize) -> Option<ValueState<i64>> {
        self.state_at(index)
    }

    pub fn float_at(&self, index: usize) -> Option<ValueState<f64>> {
        self.state_at(index)
    }

    pub fn colour_at(&self, index: usize) -> Option<ValueState<Colour>> {
        self.state_at(index)
    }

    /// The first value as an integer.
    pub fn int(&self) -> Result<i64, ValueError> {
        self.first()
    }

    /// The first value as an integer, or `fallback` when it is missing or
    /// not an integer.
    pub fn int_or(&self, fallback: i64) -> Result<i64, ValueError> {
        self.first_or(fallback)
    }

    /// Every value as an integer. Fails on the first one that is not.
    pub fn ints(&self) -> Result<Vec<i64>, ValueError> {
        self.all()
    }

    /// Every value as an integer, substituting `fallback` for bad entries.
    pub fn ints_or(&self, fallback: i64) -> Result<Vec<i64>, ValueError> {
        self.all_or(fallback)
    }

    pub fn float(&self) -> Result<f64, ValueError> {
        self.first()
    }

    pub fn float_or(&self, fallback: f64) -> Result<f64, ValueError> {
        self.first_or(fallback)
    }

    pub fn floats(&self) -> Result<Vec<f64>, ValueError> {
        self.all()
    }

    pub fn floats_or(&self, fallback: f64) -> Result<Vec<f64>, ValueError> {
        self.all_or(fallback)
    }

    pub fn colour(&self) -> Result<Colour, ValueError> {
        self.first()
    }

    pub fn colour_or(&self, fallback: Colour) -> Result<Colour, ValueError> {
        self.first_or(fallback)
    }

    pub fn colours(&self) -> Result<Vec<Colour>, ValueError> {
        self.all()
    }

    pub fn colours_or(&self, fallback: Colour) -> Result<Vec<Colour>, ValueError> {
        self.all_or(fallback)
    }

    fn column<T: Derivable>(&self) -> Result<&[Option<T>], ValueError> {
        self.derived
            .as_ref()
            .map(T::column)
            .ok_or_else(|| ValueError::NotComputed {
                property: self.to_key_string(),
                kind: T::KIND,
            })
    }

    fn state_at<T: Derivable>(&self, index: usize) -> Option<ValueState<T>> {
        if index >= self.values.len() {
            return None;
        }
        Some(match &self.derived {
            None => ValueState::NotComputed,
            Some(derived) => match T::column(derived)[index] {
                Some(v) => ValueState::Parsed(v),
                None => ValueState::Unparseable,
            },
        })
    }

    fn first<T: Derivable>(&self) -> Result<T, ValueError> {
        match self.column::<T>()?.first() {
            Some(Some(v)) => Ok(*v),
            Some(None) => Err(self.unparseable(0, T::KIND)),
            None => Err(ValueError::Missing {
                property: self.to_key_string(),
                index: 0,
            }),
        }
    }

    fn first_or<T: Derivable>(&self, fallback: T) -> Result<T, ValueError> {
        Ok(self
            .column::<T>()?
            .first()
            .copied()
            .flatten()
            .unwrap_or(fallback))
    }

    fn all<T: Derivable>(&self) -> Result<Vec<T>, ValueError> {
        self.column::<T>()?
            .iter()
            .enumerate()
            .map(|(i, v)| v.ok_or_else(|| self.unparseable(i, T::KIND)))
            .collect()
    }

    fn all_or<T: Derivable>(&self, fallback: T) -> Result<Vec<T>, ValueError> {
        Ok(self
            .column::<T>()?
            .iter()
            .map(|v| v.unwrap_or(fallback))
            .collect())
    }

    fn unparseable(&self, index: usize, kind: ValueKind) -> ValueError {
        ValueError::Unparseable {
            property: self.to_key_string(),
            index,
            value: self.values[index].clone(),
            kind,
        }
    }

    fn to_key_string(&self) -> String {
        self.key().to_string()
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key(), self.values.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prop(values: &[&str]) -> Property {
        Property::with_values("stat", None, values.iter().copied())
    }

    #[test]
    fn test_derived_forms_computed_on_creation() {
        let p = prop(&["10", "2.5", "ff0000"]);
        assert!(p.is_computed());
        assert_eq!(p.int_at(0), Some(ValueState::Parsed(10)));
        assert_eq!(p.int_at(1), Some(ValueState::Unparseable));
        assert_eq!(p.float_at(1), Some(ValueState::Parsed(2.5)));
        assert_eq!(p.colour_at(2), Some(ValueState::Parsed(Colour::rgb(255, 0, 0))));
        assert_eq!(p.int_at(3), None);
    }

    #[test]
    fn test_first_value_accessors() {
        let p = prop(&["42"]);
        assert_eq!(p.as_str(), "42");
        assert_eq!(p.int(), Ok(42));
        assert_eq!(p.float(), Ok(42.0));
        assert_eq!(p.int_or(7), Ok(42));
    }

    #[test]
    fn test_unparseable_first_value() {
        let p = prop(&["iron"]);
        assert!(matches!(
            p.int(),
            Err(ValueError::Unparseable { index: 0, ref value, kind: ValueKind::Int, .. }) if value == "iron"
        ));
        assert_eq!(p.int_or(5), Ok(5));
        assert_eq!(p.colour_or(Colour::WHITE), Ok(Colour::WHITE));
    }

    #[test]
    fn test_empty_property() {
        let p = Property::new("flag", None);
        assert_eq!(p.as_str(), "");
        assert!(matches!(p.int(), Err(ValueError::Missing { index: 0, .. })));
        assert_eq!(p.int_or(3), Ok(3));
        assert_eq!(p.ints(), Ok(vec![]));
    }

    #[test]
    fn test_mutation_invalidates_derived_forms() {
        let mut p = prop(&["1", "2"]);
        p.push_value("3");
        assert!(!p.is_computed());
        assert_eq!(p.int_at(2), Some(ValueState::NotComputed));
        assert!(matches!(p.ints(), Err(ValueError::NotComputed { kind: ValueKind::Int, .. })));
        assert!(matches!(p.int_or(0), Err(ValueError::NotComputed { .. })));

        p.recompute();
        assert_eq!(p.ints(), Ok(vec![1, 2, 3]));
    }

    #[test]
    fn test_remove_value_removes_every_copy() {
        let mut p = prop(&["a", "b", "a"]);
        assert_eq!(p.remove_value("a"), 2);
        assert_eq!(p.values(), ["b".to_string()]);
        assert!(!p.is_computed());
    }

    #[test]
    fn test_partial_sequences() {
        let p = prop(&["1", "x", "3"]);
        assert!(matches!(
            p.ints(),
            Err(ValueError::Unparseable { index: 1, .. })
        ));
        assert_eq!(p.ints_or(0), Ok(vec![1, 0, 3]));
    }

    #[test]
    fn test_colour_sequence() {
        let p = prop(&["000000", "FFFFFF80"]);
        assert_eq!(
            p.colours(),
            Ok(vec![Colour::BLACK, Colour::new(255, 255, 255, 128)])
        );
    }

    #[test]
    fn test_pending_property_is_not_computed() {
        let p = Property::pending("hp", None);
        assert!(!p.is_computed());
        assert!(matches!(p.int_or(1), Err(ValueError::NotComputed { .. })));
    }

    #[test]
    fn test_display() {
        let p = Property::with_values("sword", Some("weapon".to_string()), ["iron", "sharp"]);
        assert_eq!(p.to_string(), "weapon:sword=iron,sharp");
        assert_eq!(prop(&[]).to_string(), "stat=");
    }
}
