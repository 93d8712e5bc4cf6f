// SPDX-License-Identifier: GPL-3.0-only

//! Bounds-checked strided views over raw vertex bytes
//!
//! Capture backends hand out geometry as a byte buffer plus a layout
//! (count, stride, offset, format). All offset arithmetic lives here so that
//! callers only ever deal in logical element indices.

use crate::constants::layout::{FLOAT_SIZE, FLOAT3_SIZE};
use crate::errors::ReconstructionError;
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Component layout of one buffer element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VertexFormat {
    /// Three packed 32-bit floats (the only layout that can be read or written)
    #[default]
    Float3,
    /// Two packed 32-bit floats
    Float2,
    /// Four packed 32-bit floats
    Float4,
    /// Three packed 16-bit floats
    Half3,
}

impl VertexFormat {
    /// Payload size of one element in bytes
    pub fn element_size(self) -> usize {
        match self {
            VertexFormat::Float3 => FLOAT3_SIZE,
            VertexFormat::Float2 => 2 * FLOAT_SIZE,
            VertexFormat::Float4 => 4 * FLOAT_SIZE,
            VertexFormat::Half3 => 6,
        }
    }
}

/// Physical placement of elements inside a byte buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BufferLayout {
    /// Number of elements
    pub count: usize,
    /// Bytes between the starts of consecutive elements
    pub stride: usize,
    /// Byte offset of the first element
    pub offset: usize,
    /// Component format of each element
    pub format: VertexFormat,
}

impl BufferLayout {
    /// Tightly packed layout starting at byte 0
    pub fn packed(count: usize, format: VertexFormat) -> Self {
        Self {
            count,
            stride: format.element_size(),
            offset: 0,
            format,
        }
    }

    /// Minimum backing length: `offset + stride * (count - 1) + element_size`
    ///
    /// None when the length does not fit in `usize`.
    pub fn required_len(&self) -> Option<usize> {
        if self.count == 0 {
            return Some(self.offset);
        }
        self.stride
            .checked_mul(self.count - 1)?
            .checked_add(self.offset)?
            .checked_add(self.format.element_size())
    }

    /// Check this layout against a backing buffer of `len` bytes
    pub fn validate(&self, len: usize) -> Result<(), ReconstructionError> {
        if self.stride < self.format.element_size() {
            return Err(ReconstructionError::InvalidLayout(format!(
                "stride {} is smaller than {:?} element size {}",
                self.stride,
                self.format,
                self.format.element_size()
            )));
        }
        let Some(required) = self.required_len() else {
            return Err(ReconstructionError::InvalidLayout(format!(
                "{} elements with stride {} at offset {} overflow the address space",
                self.count, self.stride, self.offset
            )));
        };
        if required > len {
            return Err(ReconstructionError::InvalidLayout(format!(
                "{} elements need {} bytes, buffer has {}",
                self.count, required, len
            )));
        }
        Ok(())
    }

    fn element_offset(&self, index: usize) -> usize {
        self.offset + self.stride * index
    }
}

/// Typed, strided view over a byte buffer
///
/// `B` is the backing storage: `&[u8]` for a borrowed read-only view,
/// `&mut [u8]` for in-place rewriting, `Vec<u8>` for an owned buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct RawBufferView<B> {
    buffer: B,
    layout: BufferLayout,
}

impl<B: AsRef<[u8]>> RawBufferView<B> {
    /// Wrap `buffer`, validating that every element lies inside it
    pub fn new(buffer: B, layout: BufferLayout) -> Result<Self, ReconstructionError> {
        layout.validate(buffer.as_ref().len())?;
        Ok(Self { buffer, layout })
    }

    pub fn len(&self) -> usize {
        self.layout.count
    }

    pub fn is_empty(&self) -> bool {
        self.layout.count == 0
    }

    pub fn stride(&self) -> usize {
        self.layout.stride
    }

    pub fn offset(&self) -> usize {
        self.layout.offset
    }

    pub fn format(&self) -> VertexFormat {
        self.layout.format
    }

    pub fn layout(&self) -> BufferLayout {
        self.layout
    }

    /// Raw backing bytes, including padding between elements
    pub fn as_bytes(&self) -> &[u8] {
        self.buffer.as_ref()
    }

    pub fn into_inner(self) -> B {
        self.buffer
    }

    /// Borrow this view without re-validating the layout
    pub fn as_view(&self) -> RawBufferView<&[u8]> {
        RawBufferView {
            buffer: self.buffer.as_ref(),
            layout: self.layout,
        }
    }

    /// Copy the backing bytes into an owned view with the same layout
    pub fn to_owned_view(&self) -> RawBufferView<Vec<u8>> {
        RawBufferView {
            buffer: self.buffer.as_ref().to_vec(),
            layout: self.layout,
        }
    }

    /// Read element `index` as three floats
    pub fn read(&self, index: usize) -> Result<Vec3, ReconstructionError> {
        let start = self.float3_offset(index)?;
        let bytes = &self.buffer.as_ref()[start..start + FLOAT3_SIZE];
        let components: [f32; 3] = bytemuck::pod_read_unaligned(bytes);
        Ok(Vec3::from_array(components))
    }

    /// Read every element in index order
    pub fn read_all(&self) -> Result<Vec<Vec3>, ReconstructionError> {
        (0..self.len()).map(|i| self.read(i)).collect()
    }

    fn float3_offset(&self, index: usize) -> Result<usize, ReconstructionError> {
        if index >= self.layout.count {
            return Err(ReconstructionError::OutOfBounds {
                index,
                count: self.layout.count,
            });
        }
        if self.layout.format != VertexFormat::Float3 {
            return Err(ReconstructionError::UnsupportedFormat(self.layout.format));
        }
        Ok(self.layout.element_offset(index))
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> RawBufferView<B> {
    /// Overwrite the first three floats of element `index`
    ///
    /// Any bytes the stride reserves past the 12-byte payload are left as is.
    pub fn write(&mut self, index: usize, value: Vec3) -> Result<(), ReconstructionError> {
        let start = self.float3_offset(index)?;
        let components = value.to_array();
        self.buffer.as_mut()[start..start + FLOAT3_SIZE]
            .copy_from_slice(bytemuck::bytes_of(&components));
        Ok(())
    }
}

impl RawBufferView<Vec<u8>> {
    /// Build a tightly packed Float3 buffer from positions
    pub fn from_vec3s(values: &[Vec3]) -> Self {
        let mut buffer = Vec::with_capacity(values.len() * FLOAT3_SIZE);
        for value in values {
            buffer.extend_from_slice(bytemuck::bytes_of(&value.to_array()));
        }
        Self {
            buffer,
            layout: BufferLayout::packed(values.len(), VertexFormat::Float3),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn padded_layout(count: usize) -> BufferLayout {
        BufferLayout {
            count,
            stride: 16,
            offset: 8,
            format: VertexFormat::Float3,
        }
    }

    #[test]
    fn test_write_then_read_with_padding() {
        let layout = padded_layout(3);
        let mut bytes = vec![0xAAu8; layout.required_len().unwrap()];
        let mut view = RawBufferView::new(bytes.as_mut_slice(), layout).unwrap();

        view.write(1, Vec3::new(1.5, -2.25, 3.0)).unwrap();
        assert_eq!(view.read(1).unwrap(), Vec3::new(1.5, -2.25, 3.0));

        // Padding word after element 1 is untouched
        let pad_start = 8 + 16 + 12;
        assert_eq!(&bytes[pad_start..pad_start + 4], &[0xAA; 4]);
        // Offset prefix is untouched
        assert_eq!(&bytes[..8], &[0xAA; 8]);
    }

    #[test]
    fn test_round_trip_for_various_strides() {
        for stride in [12usize, 13, 16, 20, 32] {
            let layout = BufferLayout {
                count: 4,
                stride,
                offset: 3,
                format: VertexFormat::Float3,
            };
            let mut view = RawBufferView::new(vec![0u8; layout.required_len().unwrap()], layout).unwrap();
            let value = Vec3::new(stride as f32, 0.1, -7.75);
            view.write(3, value).unwrap();
            assert_eq!(view.read(3).unwrap(), value, "stride {}", stride);
        }
    }

    #[test]
    fn test_out_of_bounds() {
        let view = RawBufferView::from_vec3s(&[Vec3::ONE, Vec3::ZERO]);
        assert_eq!(
            view.read(2),
            Err(ReconstructionError::OutOfBounds { index: 2, count: 2 })
        );
    }

    #[test]
    fn test_unsupported_format() {
        let layout = BufferLayout::packed(2, VertexFormat::Float4);
        let mut view = RawBufferView::new(vec![0u8; 32], layout).unwrap();
        assert_eq!(
            view.write(0, Vec3::ONE),
            Err(ReconstructionError::UnsupportedFormat(VertexFormat::Float4))
        );
        assert_eq!(
            view.read(1),
            Err(ReconstructionError::UnsupportedFormat(VertexFormat::Float4))
        );
    }

    #[test]
    fn test_layout_validation() {
        let short = BufferLayout {
            count: 2,
            stride: 8,
            offset: 0,
            format: VertexFormat::Float3,
        };
        assert!(matches!(
            RawBufferView::new(vec![0u8; 64], short),
            Err(ReconstructionError::InvalidLayout(_))
        ));

        // offset + stride * (count - 1) + 12 = 4 + 16 + 12 = 32
        let layout = BufferLayout {
            count: 2,
            stride: 16,
            offset: 4,
            format: VertexFormat::Float3,
        };
        assert_eq!(layout.required_len(), Some(32));
        assert!(RawBufferView::new(vec![0u8; 32], layout).is_ok());
        assert!(RawBufferView::new(vec![0u8; 31], layout).is_err());
    }

    #[test]
    fn test_overflowing_layout_is_rejected() {
        let layout = BufferLayout {
            count: 3,
            stride: usize::MAX / 2 + 1,
            offset: 0,
            format: VertexFormat::Float3,
        };
        assert_eq!(layout.required_len(), None);
        assert!(matches!(
            RawBufferView::new(vec![0u8; 12], layout),
            Err(ReconstructionError::InvalidLayout(_))
        ));

        let layout = BufferLayout {
            count: 1,
            stride: 12,
            offset: usize::MAX - 4,
            format: VertexFormat::Float3,
        };
        assert!(RawBufferView::new(vec![0u8; 12], layout).is_err());
    }

    #[test]
    fn test_empty_view() {
        let view = RawBufferView::new(Vec::<u8>::new(), BufferLayout::packed(0, VertexFormat::Float3))
            .unwrap();
        assert!(view.is_empty());
        assert!(view.read_all().unwrap().is_empty());
    }
}
