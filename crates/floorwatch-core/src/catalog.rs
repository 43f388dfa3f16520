//! Machine and company metadata.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A sub-component of a machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachinePart {
    pub machine_part_id: String,
    pub machine_part_name: String,
    pub machine_part_serial_no: String,
    #[serde(default)]
    pub machine_image_path: Option<String>,
    #[serde(default)]
    pub machine_image_name: Option<String>,
}

/// A monitored machine.
///
/// `machine_uid` identifies the catalog entry; `machine_id` is the device
/// identifier its telemetry samples are recorded under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Machine {
    pub machine_uid: String,
    pub machine_id: String,
    pub machine_name: String,
    #[serde(default)]
    pub machine_plant: Option<String>,
    #[serde(default)]
    pub machine_model: Option<String>,
    #[serde(default)]
    pub machine_customer: Option<String>,
    #[serde(default)]
    pub machine_location: Option<String>,
    #[serde(default)]
    pub machine_longitude: Option<f64>,
    #[serde(default)]
    pub machine_latitude: Option<f64>,
    pub machine_type_name: String,
    pub company_id: String,
    #[serde(default, rename = "model_data")]
    pub parts: Vec<MachinePart>,
}

/// Read access to machine metadata.
pub trait MachineCatalog: Send + Sync {
    /// Every machine owned by a company, in catalog order.
    fn machines_by_company(&self, company_id: &str) -> Result<Vec<Machine>>;

    /// A single machine by catalog identifier.
    fn machine(&self, machine_uid: &str) -> Result<Option<Machine>>;
}
