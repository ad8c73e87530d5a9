//! Asset Module
//!
//! The car-part certificate registry built on the world state.
//!
//! ## Layout
//! - `codec`: asset ↔ persisted JSON record
//! - `service`: CRUD operations enforcing existence rules
//! - `transaction`: named transaction functions parsed from string arguments

mod codec;
mod service;
mod transaction;

use serde::{Deserialize, Serialize};

pub use codec::{decode_asset, encode_asset};
pub use service::AssetService;
pub use transaction::Transaction;

/// A certified car part
///
/// `id` is the part's serial number and doubles as its world-state key.
/// Every field is free text; dates are kept as written (`DD/MM/YYYY`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Asset {
    #[serde(rename = "ID")]
    pub id: String,

    /// Car models that use this part
    #[serde(rename = "Car")]
    pub car: String,

    #[serde(rename = "Brand")]
    pub brand: String,

    #[serde(rename = "ProductionDate")]
    pub production_date: String,

    #[serde(rename = "ProductionLocation")]
    pub production_location: String,

    #[serde(rename = "Description")]
    pub description: String,
}

impl Asset {
    pub fn new(
        id: impl Into<String>,
        car: impl Into<String>,
        brand: impl Into<String>,
        production_date: impl Into<String>,
        production_location: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            car: car.into(),
            brand: brand.into(),
            production_date: production_date.into(),
            production_location: production_location.into(),
            description: description.into(),
        }
    }
}

/// The base set of parts loaded by `InitLedger`
pub fn seed_assets() -> Vec<Asset> {
    vec![
        Asset::new(
            "120.47021-15486957423",
            "Audi Q1, Audi Q2, Audi Q3, Volkswagen Tiguan",
            "Volkswagen",
            "04/11/2004",
            "Stuttgart, Germany",
            "Chassis",
        ),
        Asset::new(
            "115.15442-68495214587",
            "Ford F150, Ford F250",
            "Ford",
            "23/06/2011",
            "Detroit, US",
            "Drive Train",
        ),
        Asset::new(
            "254.51488-54875265847",
            "Tesla model S, Tesla model 3, Tesla model Y",
            "Tesla",
            "30/04/2019",
            "Austin, Texas",
            "Battery",
        ),
        Asset::new(
            "151.51847-84956877413",
            "Toyota Corolla, Toyota rav4, Yahama  MT-15",
            "Toyota",
            "12/09/2015",
            "Shanghai, China",
            "Chip",
        ),
        Asset::new(
            "58.41684-65184543156",
            "Volkswagen Golf, Mini cooper S",
            "Thyssenkrupp Steering",
            "19/02/2021",
            "Liechtenstein, Liechtenstein",
            "Steering",
        ),
        Asset::new(
            "456.56488-56464864115",
            "Renault 5",
            "Renault",
            "10/06/1996",
            "Montbéliard, France",
            "Headlights",
        ),
    ]
}
