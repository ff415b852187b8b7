/////////////////////////////////////////////////////////////////////////////////////////////
//
// Defines pose samples, the indexed pose set, and assembly of the pose matrices.
//
// Created on: 19 Oct 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! Pose samples and their assembly into driver and driven matrices.

use crate::{matrix::Matrix, rbf::RbfError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One sampled property value.
///
/// `identifier` is opaque to the solver; only `value` is used numerically.
/// `original` optionally records the value the property had before the
/// pose was applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseProperty {
    pub identifier: String,
    pub value: f64,
    pub original: Option<f64>,
}

impl PoseProperty {
    pub fn new(identifier: impl Into<String>, value: f64) -> Self {
        Self {
            identifier: identifier.into(),
            value,
            original: None,
        }
    }

    /// Records the property's original value.
    pub fn with_original(mut self, original: f64) -> Self {
        self.original = Some(original);
        self
    }
}

impl From<(String, f64, Option<f64>)> for PoseProperty {
    fn from((identifier, value, original): (String, f64, Option<f64>)) -> Self {
        Self {
            identifier,
            value,
            original,
        }
    }
}

impl From<(&str, f64)> for PoseProperty {
    fn from((identifier, value): (&str, f64)) -> Self {
        Self::new(identifier, value)
    }
}

/// A pose sample: driver values mapped to driven values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// Stable index, unique within the owning [`PoseSet`].
    pub index: usize,
    pub drivers: Vec<PoseProperty>,
    pub driven: Vec<PoseProperty>,
}

impl Pose {
    pub fn driver_values(&self) -> Vec<f64> {
        self.drivers.iter().map(|p| p.value).collect()
    }

    pub fn driven_values(&self) -> Vec<f64> {
        self.driven.iter().map(|p| p.value).collect()
    }
}

/// An ordered collection of poses.
///
/// Indices come from a counter that only ever increases, so an index is
/// never handed out twice, even after the pose holding it is removed or
/// the set is cleared.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoseSet {
    poses: Vec<Pose>,
    next_index: usize,
}

impl PoseSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a pose and returns its index.
    pub fn add(&mut self, drivers: Vec<PoseProperty>, driven: Vec<PoseProperty>) -> usize {
        let index = self.next_index;
        self.next_index += 1;
        self.poses.push(Pose {
            index,
            drivers,
            driven,
        });
        index
    }

    /// Removes and returns the pose with `index`.
    pub fn remove(&mut self, index: usize) -> Option<Pose> {
        let pos = self.poses.iter().position(|p| p.index == index)?;
        Some(self.poses.remove(pos))
    }

    pub fn get(&self, index: usize) -> Option<&Pose> {
        self.poses.iter().find(|p| p.index == index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Pose> {
        self.poses.iter_mut().find(|p| p.index == index)
    }

    /// Poses in index order.
    pub fn as_slice(&self) -> &[Pose] {
        &self.poses
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Pose> {
        self.poses.iter()
    }

    pub fn len(&self) -> usize {
        self.poses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.poses.is_empty()
    }

    /// Removes every pose. The index counter is kept.
    pub fn clear(&mut self) {
        self.poses.clear();
    }

    /// Index the next added pose will receive.
    pub fn next_index(&self) -> usize {
        self.next_index
    }
}

/// Which half of a pose a property list belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    Driver,
    Driven,
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyKind::Driver => write!(f, "driver"),
            PropertyKind::Driven => write!(f, "driven"),
        }
    }
}

/// Returns the poses sorted by their index.
pub(crate) fn ordered_poses(poses: &[Pose]) -> Vec<&Pose> {
    let mut ordered: Vec<&Pose> = poses.iter().collect();
    ordered.sort_by_key(|p| p.index);
    ordered
}

/// Builds the driver matrix (poses x driver values) and driven matrix
/// (poses x driven values), one row per pose in index order.
///
/// Every pose must have as many driver and driven values as the first pose
/// in index order. All poses are checked before anything is assembled.
pub fn build_pose_matrices(poses: &[Pose]) -> Result<(Matrix, Matrix), RbfError> {
    let ordered = ordered_poses(poses);

    let Some(first) = ordered.first() else {
        return Err(RbfError::EmptyPoseSet);
    };

    let driver_len = first.drivers.len();
    let driven_len = first.driven.len();

    for pose in &ordered {
        for (kind, expected, found) in [
            (PropertyKind::Driver, driver_len, pose.drivers.len()),
            (PropertyKind::Driven, driven_len, pose.driven.len()),
        ] {
            if found != expected {
                return Err(RbfError::PropertyCountMismatch {
                    pose_index: pose.index,
                    kind,
                    expected,
                    found,
                });
            }
        }
    }

    let driver_matrix = Matrix::from_fn(ordered.len(), driver_len, |i, j| {
        ordered[i].drivers[j].value
    });
    let driven_matrix = Matrix::from_fn(ordered.len(), driven_len, |i, j| {
        ordered[i].driven[j].value
    });

    Ok((driver_matrix, driven_matrix))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(prefix: &str, values: &[f64]) -> Vec<PoseProperty> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| PoseProperty::new(format!("{prefix}[{i}]"), *v))
            .collect()
    }

    #[test]
    fn indices_are_monotonic_and_never_reused() {
        let mut set = PoseSet::new();
        let a = set.add(props("loc", &[0.0]), props("key", &[0.0]));
        let b = set.add(props("loc", &[1.0]), props("key", &[1.0]));
        assert_eq!((a, b), (0, 1));

        assert!(set.remove(b).is_some());
        assert!(set.remove(b).is_none());
        let c = set.add(props("loc", &[2.0]), props("key", &[2.0]));
        assert_eq!(c, 2);

        set.clear();
        assert!(set.is_empty());
        assert_eq!(set.add(props("loc", &[3.0]), props("key", &[3.0])), 3);
    }

    #[test]
    fn lookup_by_index() {
        let mut set = PoseSet::new();
        set.add(props("loc", &[0.0]), props("key", &[5.0]));
        let idx = set.add(props("loc", &[1.0]), props("key", &[6.0]));
        assert_eq!(set.get(idx).unwrap().driven_values(), vec![6.0]);
        set.get_mut(idx).unwrap().driven[0].value = 7.0;
        assert_eq!(set.get(idx).unwrap().driven_values(), vec![7.0]);
        assert!(set.get(42).is_none());
    }

    #[test]
    fn empty_pose_set_is_rejected() {
        assert!(matches!(build_pose_matrices(&[]), Err(RbfError::EmptyPoseSet)));
    }

    #[test]
    fn matrices_follow_index_order() {
        let poses = vec![
            Pose {
                index: 4,
                drivers: props("rot", &[0.4, 0.5]),
                driven: props("key", &[40.0]),
            },
            Pose {
                index: 1,
                drivers: props("rot", &[0.1, 0.2]),
                driven: props("key", &[10.0]),
            },
        ];
        let (drivers, driven) = build_pose_matrices(&poses).unwrap();
        assert_eq!(drivers.flatten(), vec![0.1, 0.2, 0.4, 0.5]);
        assert_eq!(driven.flatten(), vec![10.0, 40.0]);
    }

    #[test]
    fn mismatched_driver_length_is_rejected() {
        let mut set = PoseSet::new();
        set.add(props("loc", &[0.0, 1.0]), props("key", &[0.0]));
        let bad = set.add(props("loc", &[1.0]), props("key", &[1.0]));

        match build_pose_matrices(set.as_slice()) {
            Err(RbfError::PropertyCountMismatch {
                pose_index,
                kind,
                expected,
                found,
            }) => {
                assert_eq!(pose_index, bad);
                assert_eq!(kind, PropertyKind::Driver);
                assert_eq!((expected, found), (2, 1));
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn mismatched_driven_length_is_rejected() {
        let mut set = PoseSet::new();
        set.add(props("loc", &[0.0]), props("key", &[0.0]));
        set.add(props("loc", &[1.0]), props("key", &[1.0, 2.0]));

        assert!(matches!(
            build_pose_matrices(set.as_slice()),
            Err(RbfError::PropertyCountMismatch {
                kind: PropertyKind::Driven,
                ..
            })
        ));
    }

    #[test]
    fn tuple_conversions() {
        let p: PoseProperty = ("location[0]", 1.5).into();
        assert_eq!(p, PoseProperty::new("location[0]", 1.5));
        let q: PoseProperty = ("value".to_string(), 0.25, Some(0.0)).into();
        assert_eq!(q, PoseProperty::new("value", 0.25).with_original(0.0));
    }
}
