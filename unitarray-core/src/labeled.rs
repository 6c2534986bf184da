//! Labeled array: numeric buffer plus named dimensions and metadata

use std::collections::BTreeMap;
use ndarray::{Array1, ArrayD, ArrayView, IxDyn, Zip};
use crate::{ArrayError, Attrs};

/// An n-dimensional `f64` buffer with dimension names, coordinates and
/// attributes.
///
/// Binary operations broadcast numpy-style: the operand whose shape the
/// other can be broadcast to donates dims, coords and shape to the result.
/// Attributes are always taken from the left operand; callers that need
/// different attributes set them on the result.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledArray {
    data: ArrayD<f64>,
    dims: Vec<String>,
    coords: BTreeMap<String, Array1<f64>>,
    attrs: Attrs,
}

impl LabeledArray {
    /// Create from a buffer and one name per axis
    pub fn new(data: ArrayD<f64>, dims: Vec<String>) -> Result<Self, ArrayError> {
        if dims.len() != data.ndim() {
            return Err(ArrayError::InvalidDims { ndim: data.ndim(), dims });
        }
        Ok(LabeledArray {
            data,
            dims,
            coords: BTreeMap::new(),
            attrs: Attrs::default(),
        })
    }

    /// Create from a buffer with default dimension names `dim_0, dim_1, ...`
    pub fn from_data(data: ArrayD<f64>) -> Self {
        let dims = (0..data.ndim()).map(|i| format!("dim_{}", i)).collect();
        LabeledArray {
            data,
            dims,
            coords: BTreeMap::new(),
            attrs: Attrs::default(),
        }
    }

    /// 0-dimensional array holding a single value
    pub fn scalar(value: f64) -> Self {
        Self::from_data(ArrayD::from_elem(IxDyn(&[]), value))
    }

    /// Builder: replace attributes
    pub fn with_attrs(mut self, attrs: Attrs) -> Self {
        self.attrs = attrs;
        self
    }

    /// Builder: attach a coordinate to a named dimension
    pub fn with_coord(mut self, dim: &str, values: Vec<f64>) -> Result<Self, ArrayError> {
        let axis = self.dims.iter().position(|d| d == dim).ok_or_else(|| ArrayError::InvalidDims {
            ndim: self.data.ndim(),
            dims: vec![dim.to_string()],
        })?;
        let expected = self.data.shape()[axis];
        if values.len() != expected {
            return Err(ArrayError::InvalidCoord {
                name: dim.to_string(),
                len: values.len(),
                expected,
            });
        }
        self.coords.insert(dim.to_string(), Array1::from_vec(values));
        Ok(self)
    }

    pub fn values(&self) -> &ArrayD<f64> {
        &self.data
    }

    pub fn dims(&self) -> &[String] {
        &self.dims
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    pub fn coords(&self) -> &BTreeMap<String, Array1<f64>> {
        &self.coords
    }

    pub fn attrs(&self) -> &Attrs {
        &self.attrs
    }

    pub fn attrs_mut(&mut self) -> &mut Attrs {
        &mut self.attrs
    }

    /// Elementwise map into a new array with the same labels
    pub fn map(&self, f: impl Fn(f64) -> f64) -> LabeledArray {
        LabeledArray {
            data: self.data.mapv(f),
            dims: self.dims.clone(),
            coords: self.coords.clone(),
            attrs: self.attrs.clone(),
        }
    }

    pub fn map_inplace(&mut self, f: impl Fn(f64) -> f64) {
        self.data.mapv_inplace(f);
    }

    /// Elementwise binary operation with broadcasting
    pub fn zip_with(&self, other: &LabeledArray, f: impl Fn(f64, f64) -> f64) -> Result<LabeledArray, ArrayError> {
        self.check_dims(other)?;

        if let Some(rhs) = other.data.broadcast(self.data.raw_dim()) {
            let data = Zip::from(self.data.view()).and(rhs).map_collect(|&a, &b| f(a, b));
            return Ok(self.relabel(data, self));
        }
        if let Some(lhs) = self.data.broadcast(other.data.raw_dim()) {
            let data = Zip::from(lhs).and(other.data.view()).map_collect(|&a, &b| f(a, b));
            return Ok(self.relabel(data, other));
        }
        Err(self.shape_mismatch(other))
    }

    /// In-place elementwise binary operation. `other` must broadcast to the
    /// receiver's shape; nothing is written when it does not.
    pub fn zip_with_inplace(&mut self, other: &LabeledArray, f: impl Fn(f64, f64) -> f64) -> Result<(), ArrayError> {
        let rhs = self.broadcast_other(other)?;
        Zip::from(&mut self.data).and(&rhs).for_each(|a, &b| *a = f(*a, b));
        Ok(())
    }

    /// Check that `other` can be combined into the receiver in place
    pub fn check_inplace(&self, other: &LabeledArray) -> Result<(), ArrayError> {
        self.broadcast_other(other).map(|_| ())
    }

    /// Elementwise comparison with broadcasting
    pub fn compare_with(&self, other: &LabeledArray, f: impl Fn(f64, f64) -> bool) -> Result<ArrayD<bool>, ArrayError> {
        self.check_dims(other)?;

        if let Some(rhs) = other.data.broadcast(self.data.raw_dim()) {
            return Ok(Zip::from(self.data.view()).and(rhs).map_collect(|&a, &b| f(a, b)));
        }
        if let Some(lhs) = self.data.broadcast(other.data.raw_dim()) {
            return Ok(Zip::from(lhs).and(other.data.view()).map_collect(|&a, &b| f(a, b)));
        }
        Err(self.shape_mismatch(other))
    }

    fn broadcast_other<'a>(&self, other: &'a LabeledArray) -> Result<ArrayView<'a, f64, IxDyn>, ArrayError> {
        self.check_dims(other)?;
        other.data.broadcast(self.data.raw_dim()).ok_or_else(|| self.shape_mismatch(other))
    }

    // Same-rank operands must agree on dimension names; lower-rank operands
    // broadcast positionally.
    fn check_dims(&self, other: &LabeledArray) -> Result<(), ArrayError> {
        if self.dims.len() == other.dims.len() && self.dims != other.dims {
            return Err(ArrayError::DimsMismatch {
                left: self.dims.clone(),
                right: other.dims.clone(),
            });
        }
        Ok(())
    }

    fn relabel(&self, data: ArrayD<f64>, donor: &LabeledArray) -> LabeledArray {
        LabeledArray {
            data,
            dims: donor.dims.clone(),
            coords: donor.coords.clone(),
            attrs: self.attrs.clone(),
        }
    }

    fn shape_mismatch(&self, other: &LabeledArray) -> ArrayError {
        ArrayError::ShapeMismatch {
            left: self.data.shape().to_vec(),
            right: other.data.shape().to_vec(),
        }
    }
}

impl From<ArrayD<f64>> for LabeledArray {
    fn from(data: ArrayD<f64>) -> Self {
        LabeledArray::from_data(data)
    }
}

impl From<Vec<f64>> for LabeledArray {
    fn from(values: Vec<f64>) -> Self {
        LabeledArray::from_data(Array1::from_vec(values).into_dyn())
    }
}

impl From<f64> for LabeledArray {
    fn from(value: f64) -> Self {
        LabeledArray::scalar(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr2, IxDyn};

    fn grid() -> LabeledArray {
        LabeledArray::new(arr2(&[[1.0, 2.0], [3.0, 4.0]]).into_dyn(), vec!["y".into(), "x".into()]).unwrap()
    }

    #[test]
    fn test_new_checks_dims() {
        let data = ArrayD::zeros(IxDyn(&[2, 3]));
        let err = LabeledArray::new(data, vec!["x".into()]).unwrap_err();
        assert!(matches!(err, ArrayError::InvalidDims { ndim: 2, .. }));
    }

    #[test]
    fn test_zip_with_same_shape() {
        let a = grid();
        let b = grid();
        let sum = a.zip_with(&b, |x, y| x + y).unwrap();
        assert_eq!(sum.values(), &arr2(&[[2.0, 4.0], [6.0, 8.0]]).into_dyn());
        assert_eq!(sum.dims(), a.dims());
    }

    #[test]
    fn test_zip_with_broadcasts_scalar_both_ways() {
        let a = grid();
        let s = LabeledArray::scalar(10.0);

        let right = a.zip_with(&s, |x, y| x * y).unwrap();
        assert_eq!(right.shape(), &[2, 2]);
        assert_eq!(right.values()[[1, 1]], 40.0);

        let left = s.zip_with(&a, |x, y| x - y).unwrap();
        assert_eq!(left.shape(), &[2, 2]);
        assert_eq!(left.dims(), a.dims());
        assert_eq!(left.values()[[0, 0]], 9.0);
    }

    #[test]
    fn test_shape_mismatch() {
        let a = LabeledArray::from(vec![1.0, 2.0, 3.0]);
        let b = LabeledArray::from(vec![1.0, 2.0]);
        let err = a.zip_with(&b, |x, y| x + y).unwrap_err();
        assert!(matches!(err, ArrayError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_dims_mismatch() {
        let a = grid();
        let b = LabeledArray::new(a.values().clone(), vec!["x".into(), "y".into()]).unwrap();
        assert!(matches!(a.zip_with(&b, |x, _| x), Err(ArrayError::DimsMismatch { .. })));
    }

    #[test]
    fn test_inplace_leaves_receiver_untouched_on_error() {
        let mut a = LabeledArray::scalar(1.0);
        let b = grid();
        let err = a.zip_with_inplace(&b, |x, y| x + y).unwrap_err();
        assert!(matches!(err, ArrayError::ShapeMismatch { .. }));
        assert_eq!(a.values()[IxDyn(&[])], 1.0);
    }

    #[test]
    fn test_compare_with() {
        let a = LabeledArray::from(vec![1.0, 5.0]);
        let b = LabeledArray::scalar(2.0);
        let lt = a.compare_with(&b, |x, y| x < y).unwrap();
        assert_eq!(lt.iter().copied().collect::<Vec<_>>(), vec![true, false]);
    }

    #[test]
    fn test_coords_follow_shape_donor() {
        let a = LabeledArray::from(vec![1.0, 2.0]).with_coord("dim_0", vec![100.0, 200.0]).unwrap();
        let s = LabeledArray::scalar(1.0);
        let out = s.zip_with(&a, |x, y| x + y).unwrap();
        assert_eq!(out.coords().get("dim_0").map(|c| c.len()), Some(2));

        let bad = LabeledArray::from(vec![1.0]).with_coord("dim_0", vec![1.0, 2.0]);
        assert!(matches!(bad, Err(ArrayError::InvalidCoord { .. })));
    }
}
