//! Service area configuration.
//!
//! A region is described by a TOML file: a rectangular service-area bound,
//! the city center used by the weather watcher, and a list of named zones
//! for the weather overview. The Hyderabad region is embedded at compile
//! time and used unless `REGION_CONFIG` points at another file.

use std::path::Path;

use relief_map_geography_models::{BoundingBox, Coordinate, NamedZone};
use serde::Deserialize;

use crate::GeoError;

const DEFAULT_REGION_TOML: &str = include_str!("../regions/hyderabad.toml");

#[derive(Debug, Deserialize)]
struct RegionFile {
    name: String,
    area_label: String,
    bounds: BoundingBox,
    center: Coordinate,
    #[serde(default)]
    zones: Vec<ZoneEntry>,
}

#[derive(Debug, Deserialize)]
struct ZoneEntry {
    name: String,
    latitude: f64,
    longitude: f64,
    radius_meters: f64,
}

/// The geographic region this deployment serves.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceArea {
    /// Region name (e.g. "Hyderabad").
    pub name: String,
    /// Label used for city-wide alerts (e.g. "Hyderabad City").
    pub area_label: String,
    /// Inclusive bounds within which reports are accepted.
    pub bounds: BoundingBox,
    /// Reference point for the weather watcher.
    pub center: Coordinate,
    /// Named localities for the weather overview.
    pub zones: Vec<NamedZone>,
}

impl ServiceArea {
    /// Parses a region from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::Parse`] if the TOML is malformed, or
    /// [`GeoError::InvalidRegion`] if the bounds are inverted, the center
    /// falls outside them, or a zone has a non-positive radius.
    pub fn from_toml_str(s: &str) -> Result<Self, GeoError> {
        let file: RegionFile = toml::from_str(s)?;

        let bounds = file.bounds;
        if !(bounds.west < bounds.east && bounds.south < bounds.north) {
            return Err(GeoError::InvalidRegion {
                message: format!("bounds for {} are empty or inverted", file.name),
            });
        }
        if !bounds.contains_coordinate(file.center) {
            return Err(GeoError::InvalidRegion {
                message: format!("center of {} lies outside its bounds", file.name),
            });
        }

        let zones = file
            .zones
            .into_iter()
            .map(|z| {
                if z.radius_meters > 0.0 {
                    Ok(NamedZone {
                        name: z.name,
                        center: Coordinate::new(z.latitude, z.longitude),
                        radius_meters: z.radius_meters,
                    })
                } else {
                    Err(GeoError::InvalidRegion {
                        message: format!("zone {} must have a positive radius", z.name),
                    })
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            name: file.name,
            area_label: file.area_label,
            bounds,
            center: file.center,
            zones,
        })
    }

    /// Returns the embedded default region.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError`] if the embedded TOML is invalid.
    pub fn default_region() -> Result<Self, GeoError> {
        Self::from_toml_str(DEFAULT_REGION_TOML)
    }

    /// Loads a region from a TOML file on disk.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, GeoError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Loads the region named by `REGION_CONFIG`, or the embedded default.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError`] if the configured region cannot be loaded.
    pub fn from_env() -> Result<Self, GeoError> {
        match std::env::var("REGION_CONFIG") {
            Ok(path) if !path.is_empty() => {
                log::info!("Loading region configuration from {path}");
                Self::load(Path::new(&path))
            }
            _ => Self::default_region(),
        }
    }

    /// Whether the point falls within the service area (inclusive).
    #[must_use]
    pub fn is_within_service_area(&self, latitude: f64, longitude: f64) -> bool {
        self.bounds.contains(latitude, longitude)
    }

    /// Builds the geofence overlay as a `GeoJSON` feature.
    #[must_use]
    pub fn geofence_feature(&self) -> geojson::Feature {
        let b = self.bounds;
        let rect = geo::Rect::new(
            geo::Coord {
                x: b.west,
                y: b.south,
            },
            geo::Coord {
                x: b.east,
                y: b.north,
            },
        );
        let polygon = rect.to_polygon();

        let mut properties = geojson::JsonObject::new();
        properties.insert("name".to_string(), self.name.clone().into());
        properties.insert("areaLabel".to_string(), self.area_label.clone().into());

        geojson::Feature {
            bbox: Some(vec![b.west, b.south, b.east, b.north]),
            geometry: Some(geojson::Geometry::new(geojson::Value::from(&polygon))),
            id: None,
            properties: Some(properties),
            foreign_members: None,
        }
    }
}
