//! Features and feature collections: geometries paired with identifiers,
//! attributes, and an explicit CRS tag.
//!
//! Every collection carries its own [`Crs`]. Cross-collection operations
//! (joins, nearest assignment) compare tags and fail fast on mismatch
//! instead of producing silently wrong distances.

use crate::error::{Result, VeldError};
use crate::geometry::{BoundingBox, Geometry};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Coordinate Reference System identified by EPSG code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Crs {
    pub epsg: u32,
}

impl Crs {
    pub const fn epsg(code: u32) -> Self {
        Self { epsg: code }
    }

    /// WGS 84 (EPSG:4326)
    pub const fn wgs84() -> Self {
        Self::epsg(4326)
    }

    /// Web Mercator (EPSG:3857)
    pub const fn web_mercator() -> Self {
        Self::epsg(3857)
    }
}

impl Default for Crs {
    fn default() -> Self {
        Self::wgs84()
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg)
    }
}

/// Unique identifier of a feature within a collection.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct FeatureId(pub u64);

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Scalar attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl AttrValue {
    /// Numeric view; integers widen to float.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttrValue::Int(v) => Some(*v as f64),
            AttrValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            AttrValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttrValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Text(v) => Some(v),
            _ => None,
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

/// A geometry with an identifier and named scalar attributes.
///
/// # Example
///
/// ```rust
/// use veld::{AttrValue, Feature, FeatureId, Geometry};
///
/// let feature = Feature::new(FeatureId(1), Geometry::point(2.0, 3.0).unwrap())
///     .with_attr("name", AttrValue::from("depot"));
/// assert_eq!(feature.attr("name").and_then(|v| v.as_str()), Some("depot"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub id: FeatureId,
    pub geometry: Geometry,
    #[serde(default, skip_serializing_if = "FxHashMap::is_empty")]
    pub attributes: FxHashMap<String, AttrValue>,
}

impl Feature {
    pub fn new(id: FeatureId, geometry: Geometry) -> Self {
        Self {
            id,
            geometry,
            attributes: FxHashMap::default(),
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: AttrValue) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }

    pub fn attr(&self, name: &str) -> Option<&AttrValue> {
        self.attributes.get(name)
    }

    pub fn bounding_box(&self) -> BoundingBox {
        self.geometry.bounding_box()
    }
}

/// Reprojection capability provided by an external collaborator.
///
/// The engine itself performs no projection math; callers hand in an
/// implementation when collections need to move between coordinate
/// spaces.
pub trait Reproject {
    fn reproject(&self, geometry: &Geometry, target: &Crs) -> Result<Geometry>;
}

/// An ordered sequence of features sharing one CRS tag.
///
/// Identifiers are unique within the collection; inserting a duplicate
/// id is an error. The collection is the unit every engine operation
/// consumes and produces.
///
/// # Example
///
/// ```rust
/// use veld::{Crs, Feature, FeatureCollection, FeatureId, Geometry};
///
/// let mut fc = FeatureCollection::new(Crs::wgs84());
/// fc.push(Feature::new(FeatureId(1), Geometry::point(0.0, 0.0).unwrap()))?;
/// fc.push(Feature::new(FeatureId(2), Geometry::point(1.0, 1.0).unwrap()))?;
/// assert_eq!(fc.len(), 2);
/// assert!(fc.get(FeatureId(1)).is_some());
/// # Ok::<(), veld::VeldError>(())
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawFeatureCollection")]
pub struct FeatureCollection {
    crs: Crs,
    features: Vec<Feature>,
    #[serde(skip)]
    slots: FxHashMap<FeatureId, usize>,
}

/// Serialized shape of a collection; `TryFrom` re-validates id
/// uniqueness on the way in.
#[derive(Deserialize)]
struct RawFeatureCollection {
    crs: Crs,
    features: Vec<Feature>,
}

impl TryFrom<RawFeatureCollection> for FeatureCollection {
    type Error = VeldError;

    fn try_from(raw: RawFeatureCollection) -> Result<Self> {
        let mut fc = FeatureCollection::new(raw.crs);
        for feature in raw.features {
            fc.push(feature)?;
        }
        Ok(fc)
    }
}

impl FeatureCollection {
    pub fn new(crs: Crs) -> Self {
        Self {
            crs,
            features: Vec::new(),
            slots: FxHashMap::default(),
        }
    }

    /// Build a collection from features, rejecting duplicate ids.
    pub fn from_features(crs: Crs, features: Vec<Feature>) -> Result<Self> {
        let mut fc = Self::new(crs);
        for feature in features {
            fc.push(feature)?;
        }
        Ok(fc)
    }

    pub fn crs(&self) -> &Crs {
        &self.crs
    }

    /// Append a feature.
    ///
    /// # Errors
    ///
    /// `DuplicateFeature` if the id is already present.
    pub fn push(&mut self, feature: Feature) -> Result<()> {
        if self.slots.contains_key(&feature.id) {
            return Err(VeldError::DuplicateFeature(feature.id));
        }
        self.slots.insert(feature.id, self.features.len());
        self.features.push(feature);
        Ok(())
    }

    pub fn get(&self, id: FeatureId) -> Option<&Feature> {
        self.slots.get(&id).map(|&slot| &self.features[slot])
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// A new collection with the same CRS, keeping features matching the
    /// predicate.
    pub fn filter<F>(&self, mut keep: F) -> Self
    where
        F: FnMut(&Feature) -> bool,
    {
        let mut fc = Self::new(self.crs.clone());
        for feature in &self.features {
            if keep(feature) {
                // Ids were unique in the source collection.
                let _ = fc.push(feature.clone());
            }
        }
        fc
    }

    /// Union bounding box over all features.
    ///
    /// # Errors
    ///
    /// `EmptyCollection` when the collection has no features.
    pub fn extent(&self) -> Result<BoundingBox> {
        let mut iter = self.features.iter();
        let first = iter
            .next()
            .ok_or(VeldError::EmptyCollection("extent"))?;
        let mut bbox = first.bounding_box();
        for feature in iter {
            bbox = bbox.merge(&feature.bounding_box());
        }
        Ok(bbox)
    }

    /// Reproject every geometry through the provided projector, yielding
    /// a new collection tagged with the target CRS. The original is
    /// untouched.
    pub fn reproject<P: Reproject + ?Sized>(
        &self,
        projector: &P,
        target: Crs,
    ) -> Result<FeatureCollection> {
        let mut fc = FeatureCollection::new(target.clone());
        for feature in &self.features {
            let geometry = projector.reproject(&feature.geometry, &target)?;
            fc.push(Feature {
                id: feature.id,
                geometry,
                attributes: feature.attributes.clone(),
            })?;
        }
        Ok(fc)
    }
}
