//! Domain DTOs for the car inventory API.
//!
//! # Design
//! These types mirror the mock-server's schema but are defined independently;
//! integration tests catch drift between the two crates. Car ids travel as
//! `_id` on the wire because the backend is document-store shaped.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A car record as returned by the backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Car {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default)]
    pub make: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub registration: String,
    #[serde(default)]
    pub owner: String,
}

impl Car {
    fn field_mut(&mut self, field: CarField) -> &mut String {
        match field {
            CarField::Make => &mut self.make,
            CarField::Model => &mut self.model,
            CarField::Registration => &mut self.registration,
            CarField::Owner => &mut self.owner,
        }
    }
}

/// The editable fields of a car.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CarField {
    Make,
    Model,
    Registration,
    Owner,
}

impl CarField {
    pub const ALL: [CarField; 4] = [
        CarField::Make,
        CarField::Model,
        CarField::Registration,
        CarField::Owner,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CarField::Make => "make",
            CarField::Model => "model",
            CarField::Registration => "registration",
            CarField::Owner => "owner",
        }
    }
}

impl fmt::Display for CarField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CarField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CarField::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| format!("unknown car field: {s}"))
    }
}

/// Staged input for the add and find forms. Submitted as-is, empty strings
/// included.
///
/// `old_owner` is `None` when bulk owner updates are switched off, which drops
/// the key from the payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CarDraft {
    #[serde(default)]
    pub make: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub registration: String,
    #[serde(default)]
    pub owner: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_owner: Option<String>,
}

impl CarDraft {
    /// An empty draft, with the `oldOwner` slot present when `bulk_update` is on.
    pub fn empty(bulk_update: bool) -> Self {
        Self {
            old_owner: bulk_update.then(String::new),
            ..Self::default()
        }
    }

    pub fn set(&mut self, field: CarField, value: impl Into<String>) {
        let value = value.into();
        match field {
            CarField::Make => self.make = value,
            CarField::Model => self.model = value,
            CarField::Registration => self.registration = value,
            CarField::Owner => self.owner = value,
        }
    }
}

/// Sparse field overrides for a single-car update. Only non-empty fields are
/// sent and applied; everything else keeps its current value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpdateDraft {
    #[serde(default, skip_serializing_if = "is_blank")]
    pub make: Option<String>,
    #[serde(default, skip_serializing_if = "is_blank")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "is_blank")]
    pub registration: Option<String>,
    #[serde(default, skip_serializing_if = "is_blank")]
    pub owner: Option<String>,
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, str::is_empty)
}

impl UpdateDraft {
    /// Set an override. An empty value removes it.
    pub fn set(&mut self, field: CarField, value: impl Into<String>) {
        let value = value.into();
        *self.slot_mut(field) = (!value.is_empty()).then_some(value);
    }

    pub fn with(mut self, field: CarField, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    pub fn get(&self, field: CarField) -> Option<&str> {
        let slot = match field {
            CarField::Make => &self.make,
            CarField::Model => &self.model,
            CarField::Registration => &self.registration,
            CarField::Owner => &self.owner,
        };
        slot.as_deref().filter(|v| !v.is_empty())
    }

    fn slot_mut(&mut self, field: CarField) -> &mut Option<String> {
        match field {
            CarField::Make => &mut self.make,
            CarField::Model => &mut self.model,
            CarField::Registration => &mut self.registration,
            CarField::Owner => &mut self.owner,
        }
    }

    /// Fields that carry an override, in declaration order.
    pub fn present_fields(&self) -> impl Iterator<Item = (CarField, &str)> + '_ {
        CarField::ALL
            .into_iter()
            .filter_map(move |field| self.get(field).map(|value| (field, value)))
    }

    pub fn is_empty(&self) -> bool {
        self.present_fields().next().is_none()
    }

    /// Merge the present overrides over `car`.
    pub fn apply_to(&self, car: &mut Car) {
        for (field, value) in self.present_fields() {
            *car.field_mut(field) = value.to_string();
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Request payload for the bulk owner update.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BulkOwnerUpdate {
    /// Cars whose owner equals this exactly are updated.
    pub owner: String,
    pub new_owner: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn car() -> Car {
        Car {
            id: "1".to_string(),
            make: "Ford".to_string(),
            model: "Focus".to_string(),
            registration: "AB12CDE".to_string(),
            owner: "Alice".to_string(),
        }
    }

    #[test]
    fn car_uses_underscore_id_on_the_wire() {
        let json = serde_json::to_value(car()).unwrap();
        assert_eq!(json["_id"], "1");
        assert!(json.get("id").is_none());
    }

    #[test]
    fn car_accepts_plain_id_and_missing_fields() {
        let car: Car = serde_json::from_str(r#"{"id":"7","make":"Audi"}"#).unwrap();
        assert_eq!(car.id, "7");
        assert_eq!(car.make, "Audi");
        assert_eq!(car.owner, "");
    }

    #[test]
    fn draft_keeps_empty_fields() {
        let draft = CarDraft::empty(true);
        let json = serde_json::to_value(&draft).unwrap();
        assert_eq!(json["make"], "");
        assert_eq!(json["oldOwner"], "");
    }

    #[test]
    fn draft_without_bulk_update_omits_old_owner() {
        let json = serde_json::to_value(CarDraft::empty(false)).unwrap();
        assert!(json.get("oldOwner").is_none());
    }

    #[test]
    fn update_draft_skips_empty_overrides() {
        let draft = UpdateDraft {
            make: Some("Toyota".to_string()),
            model: Some(String::new()),
            registration: None,
            owner: None,
        };
        let json = serde_json::to_value(&draft).unwrap();
        assert_eq!(json, serde_json::json!({"make": "Toyota"}));
    }

    #[test]
    fn setting_empty_value_removes_override() {
        let mut draft = UpdateDraft::default().with(CarField::Owner, "Carol");
        assert_eq!(draft.get(CarField::Owner), Some("Carol"));
        draft.set(CarField::Owner, "");
        assert!(draft.is_empty());
    }

    #[test]
    fn apply_changes_only_present_fields() {
        let mut target = car();
        UpdateDraft::default()
            .with(CarField::Make, "Toyota")
            .apply_to(&mut target);
        assert_eq!(target.make, "Toyota");
        assert_eq!(target.model, "Focus");
        assert_eq!(target.registration, "AB12CDE");
        assert_eq!(target.owner, "Alice");
    }

    #[test]
    fn empty_overrides_leave_car_unchanged() {
        let mut target = car();
        UpdateDraft::default().apply_to(&mut target);
        assert_eq!(target, car());
    }

    #[test]
    fn bulk_update_uses_camel_case() {
        let payload = BulkOwnerUpdate {
            owner: "Alice".to_string(),
            new_owner: "Bob".to_string(),
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json, serde_json::json!({"owner": "Alice", "newOwner": "Bob"}));
    }

    #[test]
    fn car_field_parses_from_name() {
        assert_eq!("registration".parse::<CarField>(), Ok(CarField::Registration));
        assert!("colour".parse::<CarField>().is_err());
    }
}
