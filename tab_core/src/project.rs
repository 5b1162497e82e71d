//! # Project Data Structures
//!
//! The `Project` struct is the root container for a TAB job. Projects
//! serialize to `.htab` files as human-readable JSON.
//!
//! ## Structure
//!
//! ```text
//! Project
//! ├── meta: ProjectMetadata (version, technician, job info, timestamps)
//! ├── settings: TabSettings (flow unit, tolerance, targets)
//! ├── notes: String (final notes printed on reports)
//! └── items: HashMap<Uuid, CalculationItem> (all calculations)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use tab_core::project::Project;
//!
//! let project = Project::new("Sam Tech", "J-1042", "ACME Hospital");
//! let json = serde_json::to_string_pretty(&project).unwrap();
//! assert!(json.contains("J-1042"));
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calculations::{BalanceInput, CalculationItem, ItemResult};
use crate::errors::{CalcError, CalcResult};
use crate::units::{FlowUnit, TemperatureScale};

/// Current schema version for .htab files
pub const SCHEMA_VERSION: &str = "0.1.0";

/// Root project container.
///
/// Items are stored in a flat UUID-keyed map; reports order them by label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub meta: ProjectMetadata,

    #[serde(default)]
    pub settings: TabSettings,

    /// Final notes, printed at the end of every report
    #[serde(default)]
    pub notes: String,

    pub items: HashMap<Uuid, CalculationItem>,
}

impl Project {
    /// Create a new empty project.
    ///
    /// # Example
    ///
    /// ```rust
    /// use tab_core::project::Project;
    ///
    /// let project = Project::new("Sam Tech", "J-1042", "ACME Hospital");
    /// assert_eq!(project.meta.technician, "Sam Tech");
    /// ```
    pub fn new(technician: impl Into<String>, job_id: impl Into<String>, client: impl Into<String>) -> Self {
        let now = Utc::now();
        Project {
            meta: ProjectMetadata {
                version: SCHEMA_VERSION.to_string(),
                technician: technician.into(),
                job_id: job_id.into(),
                client: client.into(),
                created: now,
                modified: now,
            },
            settings: TabSettings::default(),
            notes: String::new(),
            items: HashMap::new(),
        }
    }

    /// Add a calculation item to the project.
    ///
    /// Returns the UUID assigned to the item.
    pub fn add_item(&mut self, item: CalculationItem) -> Uuid {
        let id = Uuid::new_v4();
        self.items.insert(id, item);
        self.touch();
        id
    }

    /// Remove a calculation item by UUID.
    pub fn remove_item(&mut self, id: &Uuid) -> Option<CalculationItem> {
        let item = self.items.remove(id);
        if item.is_some() {
            self.touch();
        }
        item
    }

    pub fn get_item(&self, id: &Uuid) -> Option<&CalculationItem> {
        self.items.get(id)
    }

    /// Mutable access; marks the project modified when the item exists.
    pub fn get_item_mut(&mut self, id: &Uuid) -> Option<&mut CalculationItem> {
        if self.items.contains_key(id) {
            self.meta.modified = Utc::now();
            self.items.get_mut(id)
        } else {
            None
        }
    }

    /// Balancing sheet for editing, found by label.
    ///
    /// With no label the project must hold exactly one sheet. Marks the
    /// project modified.
    pub fn balance_sheet_mut(&mut self, label: Option<&str>) -> CalcResult<&mut BalanceInput> {
        self.meta.modified = Utc::now();
        let mut matches: Vec<&mut BalanceInput> = self
            .items
            .values_mut()
            .filter_map(|item| match item {
                CalculationItem::Balance(sheet) if label.map_or(true, |l| sheet.label == l) => Some(sheet),
                _ => None,
            })
            .collect();

        if matches.len() > 1 {
            return Err(CalcError::invalid_input(
                "sheet",
                label.unwrap_or_default(),
                "More than one balancing sheet matches; name one by label",
            ));
        }
        matches
            .pop()
            .ok_or_else(|| CalcError::invalid_input("sheet", label.unwrap_or_default(), "No such balancing sheet"))
    }

    /// Update the modified timestamp.
    pub fn touch(&mut self) {
        self.meta.modified = Utc::now();
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Items in report order: by label, then type, then id
    pub fn items_sorted(&self) -> Vec<(&Uuid, &CalculationItem)> {
        let mut items: Vec<_> = self.items.iter().collect();
        items.sort_by(|(a_id, a), (b_id, b)| {
            a.label()
                .cmp(b.label())
                .then_with(|| a.calc_type().cmp(b.calc_type()))
                .then_with(|| a_id.cmp(b_id))
        });
        items
    }

    /// Evaluate every item in report order.
    ///
    /// A failing item does not stop the others; its error is returned in
    /// place of a result.
    pub fn evaluate_all(&self) -> Vec<(&CalculationItem, CalcResult<ItemResult>)> {
        self.items_sorted()
            .into_iter()
            .map(|(_, item)| (item, item.evaluate(&self.settings)))
            .collect()
    }
}

impl Default for Project {
    fn default() -> Self {
        Project::new("", "", "")
    }
}

/// Project metadata stored in the file header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectMetadata {
    /// Schema version (for migration compatibility)
    pub version: String,

    /// Operator / technician carrying out the tests
    pub technician: String,

    /// Job number
    pub job_id: String,

    pub client: String,

    pub created: DateTime<Utc>,

    pub modified: DateTime<Utc>,
}

/// Project-wide settings.
///
/// Persisted with the project; command-line flags override them per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TabSettings {
    /// Unit used for new balancing sheets
    pub flow_unit: FlowUnit,

    /// Airflow acceptance band, ± percent of design
    pub tolerance_pct: f64,

    /// Total flow target for fan systems set by traverse, percent of design
    pub fan_total_target_pct: f64,

    pub temperature_scale: TemperatureScale,
}

impl Default for TabSettings {
    fn default() -> Self {
        TabSettings {
            flow_unit: FlowUnit::Cfm,
            tolerance_pct: 10.0,
            fan_total_target_pct: 105.0,
            temperature_scale: TemperatureScale::Fahrenheit,
        }
    }
}

impl TabSettings {
    pub fn validate(&self) -> CalcResult<()> {
        if !self.tolerance_pct.is_finite() || self.tolerance_pct < 0.0 {
            return Err(CalcError::invalid_input(
                "settings.tolerance_pct",
                self.tolerance_pct.to_string(),
                "Tolerance must be a non-negative percentage",
            ));
        }
        if !self.fan_total_target_pct.is_finite() || self.fan_total_target_pct <= 0.0 {
            return Err(CalcError::invalid_input(
                "settings.fan_total_target_pct",
                self.fan_total_target_pct.to_string(),
                "Target must be a positive percentage",
            ));
        }
        Ok(())
    }
}
