use ndarray::{Array4, ArrayView3, Axis};

use crate::error::FormatError;

/// Field samples on a regular grid, indexed `[comp, x, y, z]`.
/// Row-major storage, z fastest: `index = ((c * sx + x) * sy + y) * sz + z`.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldArray {
    data: Array4<f32>,
}

impl FieldArray {
    /// Reshapes a flat sample vector without copying.
    pub fn from_flat(shape: [usize; 4], samples: Vec<f32>) -> Result<Self, FormatError> {
        let found = samples.len();
        Array4::from_shape_vec(shape, samples)
            .map(|data| Self { data })
            .map_err(|_| FormatError::SampleCount { shape, found })
    }

    pub fn from_array(data: Array4<f32>) -> Self {
        // keep samples() and the on-disk order in step
        let data = if data.is_standard_layout() {
            data
        } else {
            data.as_standard_layout().into_owned()
        };
        Self { data }
    }

    /// `[comp, sx, sy, sz]`
    pub fn shape(&self) -> [usize; 4] {
        let dim = self.data.dim();
        [dim.0, dim.1, dim.2, dim.3]
    }

    pub fn components(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, comp: usize, x: usize, y: usize, z: usize) -> Option<f32> {
        self.data.get([comp, x, y, z]).copied()
    }

    /// All samples in on-disk order.
    pub fn samples(&self) -> &[f32] {
        self.data
            .as_slice()
            .expect("FieldArray is always kept in standard layout")
    }

    /// One component as an `(sx, sy, sz)` view.
    pub fn component(&self, comp: usize) -> Option<ArrayView3<'_, f32>> {
        (comp < self.components()).then(|| self.data.index_axis(Axis(0), comp))
    }

    /// One component's samples, flat in on-disk order.
    pub fn component_values(&self, comp: usize) -> Option<&[f32]> {
        let [_, sx, sy, sz] = self.shape();
        let per_component = sx * sy * sz;
        (comp < self.components())
            .then(|| &self.samples()[comp * per_component..(comp + 1) * per_component])
    }

    /// `(min, max)` over one component, ignoring NaNs.
    pub fn component_range(&self, comp: usize) -> Option<(f32, f32)> {
        self.component_values(comp)?
            .iter()
            .filter(|v| !v.is_nan())
            .fold(None, |acc, &v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    pub fn as_array(&self) -> &Array4<f32> {
        &self.data
    }

    pub fn into_array(self) -> Array4<f32> {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(shape: [usize; 4]) -> FieldArray {
        let n = shape.iter().product();
        FieldArray::from_flat(shape, (0..n).map(|v| v as f32).collect()).unwrap()
    }

    #[test]
    fn test_from_flat_checks_length() {
        assert_eq!(
            FieldArray::from_flat([1, 2, 2, 2], vec![0.0; 7]),
            Err(FormatError::SampleCount { shape: [1, 2, 2, 2], found: 7 })
        );
        assert_eq!(ramp([1, 2, 2, 2]).len(), 8);
    }

    #[test]
    fn test_component_slices() {
        let field = ramp([3, 2, 2, 2]);
        assert_eq!(field.components(), 3);
        let values = field.component_values(2).unwrap();
        assert_eq!(values.len(), 8);
        assert_eq!(values[0], 16.0);
        assert_eq!(values[7], 23.0);

        let view = field.component(1).unwrap();
        assert_eq!(view.dim(), (2, 2, 2));
        assert_eq!(view[[1, 0, 1]], 8.0 + 4.0 + 1.0);
        assert!(field.component(3).is_none());
        assert!(field.component_values(3).is_none());
    }

    #[test]
    fn test_component_range() {
        let mut data = Array4::<f32>::zeros((2, 1, 1, 3));
        data[[1, 0, 0, 0]] = -4.0;
        data[[1, 0, 0, 1]] = f32::NAN;
        data[[1, 0, 0, 2]] = 9.5;
        let field = FieldArray::from_array(data);
        assert_eq!(field.component_range(0), Some((0.0, 0.0)));
        assert_eq!(field.component_range(1), Some((-4.0, 9.5)));
    }

    #[test]
    fn test_from_array_normalizes_layout() {
        let base =
            Array4::from_shape_vec((1, 2, 3, 1), (0..6).map(|v| v as f32).collect()).unwrap();
        let permuted = base.permuted_axes([0, 2, 1, 3]);
        let field = FieldArray::from_array(permuted);
        assert_eq!(field.shape(), [1, 3, 2, 1]);
        assert_eq!(field.samples(), &[0.0, 3.0, 1.0, 4.0, 2.0, 5.0]);
    }
}
