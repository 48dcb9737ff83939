//! Slot and package window types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::time::{InvalidTimeFormat, TimeOfDay, duration};

/// Primary key of a stored slot.
pub type SlotId = i64;

/// Daily window granted by a subscription package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageWindow {
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

impl PackageWindow {
    #[must_use]
    pub const fn new(start: TimeOfDay, end: TimeOfDay) -> Self {
        Self { start, end }
    }

    /// Parses both window bounds.
    pub fn parse(start: &str, end: &str) -> Result<Self, InvalidTimeFormat> {
        Ok(Self {
            start: TimeOfDay::parse(start)?,
            end: TimeOfDay::parse(end)?,
        })
    }

    /// Total daily duration the package allows, in seconds.
    #[must_use]
    pub const fn allowed_seconds(&self) -> u32 {
        duration(self.start, self.end)
    }
}

/// Raw package window as supplied by a caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageInput {
    pub start: String,
    pub end: String,
}

impl PackageInput {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }
}

/// Whether a submitted slot refers to a stored row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotIdentity {
    /// Caller wants a new slot.
    New,
    /// Caller believes this row already exists.
    ExistingRef(SlotId),
}

/// A slot as requested in the current reconciliation call, with times
/// already normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedSlot {
    pub identity: SlotIdentity,
    pub name: String,
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

impl SubmittedSlot {
    #[must_use]
    pub const fn duration_seconds(&self) -> u32 {
        duration(self.start, self.end)
    }
}

/// A persisted slot row owned by one customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredSlot {
    pub id: SlotId,
    pub customer_id: String,
    pub name: String,
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

impl StoredSlot {
    #[must_use]
    pub const fn duration_seconds(&self) -> u32 {
        duration(self.start, self.end)
    }
}

/// Raw slot as supplied by a caller, before validation.
///
/// Field names follow the camelCase JSON the surrounding workflow sends.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<SlotId>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
    #[serde(default)]
    pub is_existing: bool,
    /// Why this entry could not be read, when it arrived with the wrong shape.
    #[serde(skip)]
    pub malformed: Option<String>,
}

impl SlotInput {
    /// A slot the caller wants created.
    pub fn new(name: &str, start: &str, end: &str) -> Self {
        Self {
            id: None,
            name: Some(name.to_string()),
            start: Some(start.to_string()),
            end: Some(end.to_string()),
            is_existing: false,
            malformed: None,
        }
    }

    /// A slot the caller believes is already stored under `id`.
    pub fn existing(id: SlotId, name: &str, start: &str, end: &str) -> Self {
        Self {
            id: Some(id),
            is_existing: true,
            ..Self::new(name, start, end)
        }
    }

    /// Builds an input from one element of a JSON array.
    ///
    /// An element with mistyped fields still yields an input, marked
    /// malformed, so the batch skips and reports it instead of failing as a
    /// whole. Its name is kept when it is a string.
    pub fn from_json(value: serde_json::Value) -> Self {
        let name = value
            .get("name")
            .and_then(serde_json::Value::as_str)
            .map(str::to_string);
        match serde_json::from_value::<Self>(value) {
            Ok(input) => input,
            Err(err) => Self {
                name,
                malformed: Some(err.to_string()),
                ..Self::default()
            },
        }
    }

    /// How this slot is referred to in error messages.
    ///
    /// Surrounding whitespace in the name is dropped. Unnamed slots are
    /// referenced by their 1-based position in the batch.
    pub fn label(&self, index: usize) -> String {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("slot #{}", index + 1),
        }
    }

    /// Validates and normalizes this input into a [`SubmittedSlot`].
    ///
    /// Whitespace around the name is dropped; the trimmed name is what gets
    /// persisted.
    pub fn to_submitted(&self) -> Result<SubmittedSlot, SlotInputError> {
        if let Some(reason) = &self.malformed {
            return Err(SlotInputError::Malformed(reason.clone()));
        }
        let name = required(self.name.as_deref(), "name")?;
        let start = required(self.start.as_deref(), "start")?;
        let end = required(self.end.as_deref(), "end")?;

        let identity = match (self.is_existing, self.id) {
            (false, _) => SlotIdentity::New,
            (true, Some(id)) => SlotIdentity::ExistingRef(id),
            (true, None) => return Err(SlotInputError::MissingRequiredField("id")),
        };

        Ok(SubmittedSlot {
            identity,
            name: name.to_string(),
            start: TimeOfDay::parse(start)?,
            end: TimeOfDay::parse(end)?,
        })
    }
}

fn required<'a>(value: Option<&'a str>, field: &'static str) -> Result<&'a str, SlotInputError> {
    match value.map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(SlotInputError::MissingRequiredField(field)),
    }
}

/// Why a single submitted slot was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SlotInputError {
    #[error(transparent)]
    InvalidTimeFormat(#[from] InvalidTimeFormat),
    #[error("missing required field: {0}")]
    MissingRequiredField(&'static str),
    #[error("malformed slot: {0}")]
    Malformed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn package_window_allowed_duration_wraps() {
        let day = PackageWindow::parse("08:00", "20:00").unwrap();
        assert_eq!(day.allowed_seconds(), 43_200);

        let night = PackageWindow::parse("22:00", "6:00").unwrap();
        assert_eq!(night.allowed_seconds(), 28_800);
    }

    #[test]
    fn new_input_becomes_new_identity() {
        let slot = SlotInput::new("morning", "8:00", "12:00").to_submitted().unwrap();
        assert_eq!(slot.identity, SlotIdentity::New);
        assert_eq!(slot.start.to_string(), "08:00:00");
        assert_eq!(slot.duration_seconds(), 14_400);
    }

    #[test]
    fn stray_id_on_new_input_is_ignored() {
        let input = SlotInput {
            id: Some(9),
            ..SlotInput::new("a", "01:00", "02:00")
        };
        assert_eq!(input.to_submitted().unwrap().identity, SlotIdentity::New);
    }

    #[test]
    fn existing_input_without_id_is_missing_field() {
        let input = SlotInput {
            is_existing: true,
            ..SlotInput::new("a", "01:00", "02:00")
        };
        assert_eq!(
            input.to_submitted().unwrap_err(),
            SlotInputError::MissingRequiredField("id")
        );
    }

    #[test]
    fn blank_fields_are_missing() {
        let input = SlotInput {
            start: Some("  ".to_string()),
            ..SlotInput::new("a", "01:00", "02:00")
        };
        assert_eq!(
            input.to_submitted().unwrap_err().to_string(),
            "missing required field: start"
        );

        let input = SlotInput {
            name: None,
            ..SlotInput::new("a", "01:00", "02:00")
        };
        assert_eq!(
            input.to_submitted().unwrap_err(),
            SlotInputError::MissingRequiredField("name")
        );
    }

    #[test]
    fn bad_time_surfaces_invalid_format() {
        let err = SlotInput::new("a", "25:99:00", "02:00")
            .to_submitted()
            .unwrap_err();
        assert_eq!(
            err,
            SlotInputError::InvalidTimeFormat(InvalidTimeFormat("25:99:00".to_string()))
        );
    }

    #[test]
    fn label_falls_back_to_position() {
        assert_eq!(SlotInput::new("evening", "", "").label(0), "evening");
        let unnamed = SlotInput {
            name: None,
            ..SlotInput::default()
        };
        assert_eq!(unnamed.label(2), "slot #3");
    }

    #[test]
    fn name_is_trimmed_before_persisting() {
        let slot = SlotInput::new("  morning ", "8:00", "9:00").to_submitted().unwrap();
        assert_eq!(slot.name, "morning");
        assert_eq!(SlotInput::new("  morning ", "", "").label(0), "morning");
    }

    #[test]
    fn from_json_marks_mistyped_entry_malformed() {
        let value = serde_json::json!({"name": "typo", "start": 800, "end": "12:00"});
        let input = SlotInput::from_json(value);

        assert_eq!(input.label(4), "typo");
        let err = input.to_submitted().unwrap_err();
        assert!(
            matches!(&err, SlotInputError::Malformed(reason) if reason.contains("invalid type")),
            "{err:?}"
        );
        assert!(err.to_string().starts_with("malformed slot: "));
    }

    #[test]
    fn from_json_mistyped_entry_without_name_uses_position() {
        let input = SlotInput::from_json(serde_json::json!({"id": "5", "isExisting": true}));
        assert_eq!(input.label(1), "slot #2");
        assert!(matches!(
            input.to_submitted(),
            Err(SlotInputError::Malformed(_))
        ));

        let input = SlotInput::from_json(serde_json::json!("not an object"));
        assert!(input.malformed.is_some());
    }

    #[test]
    fn from_json_accepts_well_formed_entry() {
        let value = serde_json::json!({"id": 5, "name": "A", "start": "22:00", "end": "2:00", "isExisting": true});
        assert_eq!(
            SlotInput::from_json(value),
            SlotInput::existing(5, "A", "22:00", "2:00")
        );
    }

    #[test]
    fn input_deserializes_from_camel_case_json() {
        let json = r#"[
            {"name": "morning", "start": "8:00", "end": "12:00", "isExisting": false},
            {"id": 5, "name": "A", "start": "22:00:00", "end": "02:00:00", "isExisting": true},
            {"name": "bare", "start": "1:00", "end": "2:00"}
        ]"#;
        let inputs: Vec<SlotInput> = serde_json::from_str(json).unwrap();
        assert_eq!(inputs[0], SlotInput::new("morning", "8:00", "12:00"));
        assert_eq!(
            inputs[1],
            SlotInput::existing(5, "A", "22:00:00", "02:00:00")
        );
        assert!(!inputs[2].is_existing);
    }
}
