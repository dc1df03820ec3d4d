//! Stop catalog flattening.
//!
//! The catalog groups stop posts under named stop groups. Only the posts are
//! kept; group-level data is discarded.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;

/// A physical stop post with its display name and coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

/// Top level of the catalog document.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopCatalog {
    pub stop_groups: Vec<StopGroup>,
}

#[derive(Debug, Deserialize)]
pub struct StopGroup {
    #[serde(default)]
    pub stops: Vec<CatalogStop>,
}

/// A stop entry as it appears inside a group.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogStop {
    pub id: String,
    pub alt_idos_name: String,
    pub lat: f64,
    pub lon: f64,
}

impl StopCatalog {
    /// Flattens groups into stops in traversal order.
    ///
    /// Duplicated ids are kept as separate entries.
    pub fn flatten(&self) -> Vec<Stop> {
        self.stop_groups
            .iter()
            .flat_map(|group| group.stops.iter())
            .map(|stop| Stop {
                id: stop.id.clone(),
                name: stop.alt_idos_name.clone(),
                lat: stop.lat,
                lon: stop.lon,
            })
            .collect()
    }
}

/// Decodes a JSON catalog document and flattens it into [`Stop`]s.
pub fn parse_catalog(bytes: &[u8]) -> Result<Vec<Stop>> {
    let catalog: StopCatalog = serde_json::from_slice(bytes)?;
    let stops = catalog.flatten();
    debug!(
        groups = catalog.stop_groups.len(),
        stops = stops.len(),
        "Stop catalog flattened"
    );
    Ok(stops)
}
