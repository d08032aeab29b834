use crate::error::Result;
use geo::Polygon;
use log::info;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Scalar attribute attached to a feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

/// A polygon with uniquely named attributes, in insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRecord {
    pub geometry: Polygon<f64>,
    pub attributes: Vec<(String, AttributeValue)>,
}

impl FeatureRecord {
    pub fn new(geometry: Polygon<f64>) -> Self {
        Self {
            geometry,
            attributes: Vec::new(),
        }
    }

    /// Add an attribute. Setting an existing name replaces its value in place.
    pub fn with_attribute(mut self, name: impl Into<String>, value: AttributeValue) -> Self {
        let name = name.into();
        match self.attributes.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = value,
            None => self.attributes.push((name, value)),
        }
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }
}

/// Vector file output.
pub trait VectorIo {
    fn write_features(&self, path: &Path, records: &[FeatureRecord]) -> Result<()>;
}

#[derive(Debug, Serialize)]
struct GeoJsonFeatureCollection<'a> {
    #[serde(rename = "type")]
    type_: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    features: Vec<GeoJsonFeature<'a>>,
}

#[derive(Debug, Serialize)]
struct GeoJsonFeature<'a> {
    #[serde(rename = "type")]
    type_: &'static str,
    geometry: GeoJsonGeometry,
    properties: GeoJsonProperties<'a>,
}

/// Attributes written as a JSON object in record order.
#[derive(Debug)]
struct GeoJsonProperties<'a>(&'a [(String, AttributeValue)]);

impl Serialize for GeoJsonProperties<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in self.0 {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
enum GeoJsonGeometry {
    Polygon { coordinates: Vec<Vec<[f64; 2]>> },
}

impl GeoJsonGeometry {
    fn from_polygon(polygon: &Polygon<f64>) -> Self {
        let ring = |ls: &geo::LineString<f64>| ls.coords().map(|c| [c.x, c.y]).collect::<Vec<_>>();
        let mut coordinates = vec![ring(polygon.exterior())];
        coordinates.extend(polygon.interiors().iter().map(ring));
        GeoJsonGeometry::Polygon { coordinates }
    }
}

/// Writes features as a GeoJSON FeatureCollection.
#[derive(Debug, Clone, Default)]
pub struct GeoJsonWriter {
    layer_name: Option<String>,
    pretty: bool,
}

impl GeoJsonWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the collection's `name` member.
    pub fn with_layer_name(mut self, name: impl Into<String>) -> Self {
        self.layer_name = Some(name.into());
        self
    }

    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}

impl VectorIo for GeoJsonWriter {
    fn write_features(&self, path: &Path, records: &[FeatureRecord]) -> Result<()> {
        let collection = GeoJsonFeatureCollection {
            type_: "FeatureCollection",
            name: self.layer_name.as_deref(),
            features: records
                .iter()
                .map(|record| GeoJsonFeature {
                    type_: "Feature",
                    geometry: GeoJsonGeometry::from_polygon(&record.geometry),
                    properties: GeoJsonProperties(&record.attributes),
                })
                .collect(),
        };

        info!("Writing {} features to {}", records.len(), path.display());
        let mut writer = BufWriter::new(File::create(path)?);
        if self.pretty {
            serde_json::to_writer_pretty(&mut writer, &collection)?;
        } else {
            serde_json::to_writer(&mut writer, &collection)?;
        }
        writer.flush()?;
        Ok(())
    }
}
