//! Data model for reference entries and material change history

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// Placement machine type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Machine {
    Axial,
    Radial,
}

impl Machine {
    pub fn as_str(&self) -> &'static str {
        match self {
            Machine::Axial => "AXIAL",
            Machine::Radial => "RADIAL",
        }
    }
}

impl fmt::Display for Machine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Machine {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "AXIAL" => Ok(Machine::Axial),
            "RADIAL" => Ok(Machine::Radial),
            "" => Err(Error::InvalidInput("machine is required".to_string())),
            other => Err(Error::InvalidInput(format!(
                "machine must be AXIAL or RADIAL, got '{}'",
                other
            ))),
        }
    }
}

/// Normalized lookup key into the reference table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceKey {
    pub part_number: String,
    pub machine: Machine,
    /// Production line identifier, ASCII letters upper-cased
    pub line: String,
}

impl ReferenceKey {
    /// Build a key from raw request values
    ///
    /// Trims every value, parses the machine and upper-cases the line. Only
    /// ASCII letters are folded, the same way the store's `UPPER()` folds, so
    /// a line holding other letters matches when written exactly as stored.
    /// Part number case is preserved; the lookup itself is case-insensitive.
    pub fn new(part_number: &str, machine: &str, line: &str) -> Result<Self> {
        let part_number = part_number.trim();
        if part_number.is_empty() {
            return Err(Error::InvalidInput("part_number is required".to_string()));
        }
        let machine = machine.parse::<Machine>()?;
        let line = line.trim();
        if line.is_empty() {
            return Err(Error::InvalidInput("line is required".to_string()));
        }

        Ok(Self {
            part_number: part_number.to_string(),
            machine,
            line: line.to_ascii_uppercase(),
        })
    }
}

/// One row of the externally maintained reference table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferenceEntry {
    pub part_number: String,
    pub machine: Machine,
    pub line: String,
    pub feeder: String,
    /// `None` means any polarity is accepted
    pub polarity: Option<String>,
    pub spec: String,
}

impl ReferenceEntry {
    /// Composite feeder position shown to operators, e.g. `AXIAL_3`
    pub fn feeder_position(&self) -> String {
        format!("{}_{}", self.machine, self.feeder)
    }
}

/// Confirmed material change as submitted by the scan client
///
/// Field names on the wire follow the established client payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewHistoryRecord {
    #[serde(rename = "posicion_de_feeder", default)]
    pub feeder_position: String,
    #[serde(rename = "qr_almacen", default)]
    pub qr_warehouse: String,
    #[serde(rename = "numero_de_parte", default)]
    pub part_number: String,
    #[serde(default)]
    pub spec: String,
    #[serde(rename = "qr_de_proveedor", default)]
    pub qr_supplier: String,
    #[serde(rename = "numero_de_lote_proveedor", default)]
    pub supplier_lot: String,
    #[serde(rename = "polaridad", default)]
    pub polarity: String,
    #[serde(rename = "persona", default)]
    pub operator: String,
    #[serde(default)]
    pub line: String,
}

impl NewHistoryRecord {
    /// Check that every required field is present and non-blank
    ///
    /// Reports the first offending field by its wire name. `spec` is optional.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("posicion_de_feeder", &self.feeder_position),
            ("qr_almacen", &self.qr_warehouse),
            ("numero_de_parte", &self.part_number),
            ("qr_de_proveedor", &self.qr_supplier),
            ("numero_de_lote_proveedor", &self.supplier_lot),
            ("polaridad", &self.polarity),
            ("persona", &self.operator),
            ("line", &self.line),
        ];

        match required.iter().find(|(_, value)| value.trim().is_empty()) {
            Some((field, _)) => Err(Error::InvalidInput(format!(
                "missing required field: {}",
                field
            ))),
            None => Ok(()),
        }
    }
}

/// Stored history row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryRecord {
    pub id: i64,
    pub date: NaiveDate,
    pub time: NaiveTime,
    /// `None` only for rows written before the line column existed
    pub line: Option<String>,
    pub feeder_position: String,
    pub qr_warehouse: String,
    pub part_number: String,
    pub spec: Option<String>,
    pub qr_supplier: Option<String>,
    pub supplier_lot: Option<String>,
    pub polarity: Option<String>,
    pub operator: Option<String>,
    pub created_at: NaiveDateTime,
}
