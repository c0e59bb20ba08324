// Copyright (c) 2026, Sage Developers
// Licensed under the BSD 3-Clause License

use std::slice::ChunksExact;

use num_traits::{FromPrimitive, ToPrimitive};

use crate::error::SageError;

/// A row-major container storing an image buffer or grid of pixels.
///
/// The struct is generic over the subpixel data type `T`. The length of the
/// backing vector must equal the product of `w` * `h` * `c`.
///
/// # Examples
///
/// ```
/// use sage_core::im::SageBuffer;
///
/// let width = 10;
/// let height = 10;
/// let channels = 3; // RGB
/// let data = vec![0u8; (width * height * channels) as usize];
///
/// let buffer = SageBuffer::new(width, height, channels, data);
///
/// assert_eq!(buffer.unwrap().len(), (width * height * channels) as usize);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SageBuffer<T> {
    w: u32,                 // Width
    h: u32,                 // Height
    c: u32,                 // Channels
    pub buffer: Vec<T>,     // Subpixels
}

impl<T> SageBuffer<T>
where
    T: ToPrimitive + FromPrimitive + Clone,
{
    /// Initializes a buffer from a vector of subpixels
    ///
    /// # Arguments
    ///
    /// * `width` - Image width
    /// * `height` - Image height
    /// * `channels` - Number of image channels (e.g. 1 for grayscale)
    /// * `buffer` - Row-major subpixel data
    pub fn new(width: u32, height: u32, channels: u32, buffer: Vec<T>) -> Result<Self, SageError> {
        if width * height * channels == buffer.len() as u32 {
            Ok(SageBuffer {
                w: width,
                h: height,
                c: channels,
                buffer,
            })
        } else {
            Err(SageError::BufferSizeError)
        }
    }

    /// Initializes a buffer with every subpixel set to `value`
    pub fn filled(width: u32, height: u32, channels: u32, value: T) -> Self {
        SageBuffer {
            w: width,
            h: height,
            c: channels,
            buffer: vec![value; (width * height * channels) as usize],
        }
    }
}

// >>> PROPERTY METHODS

impl<T> SageBuffer<T>
where
    T: ToPrimitive + FromPrimitive + Clone,
{
    /// Width of the image
    pub fn width(&self) -> u32 {
        self.w
    }

    /// Height of the image
    pub fn height(&self) -> u32 {
        self.h
    }

    /// Number of channels in the image
    pub fn channels(&self) -> u32 {
        self.c
    }

    /// Shape/dimensions of the image
    pub fn shape(&self) -> (u32, u32, u32) {
        (self.h, self.w, self.c)
    }

    /// Length of the raw image
    pub fn len(&self) -> usize {
        (self.w * self.h * self.c) as usize
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// <<< PROPERTY METHODS

// >>> CONVERSION METHODS

impl<T> SageBuffer<T>
where
    T: ToPrimitive + FromPrimitive + Clone,
{
    /// Returns the raw image
    pub fn into_raw(self) -> Vec<T> {
        self.buffer
    }

    /// Returns a reference to the raw image
    pub fn as_raw(&self) -> &[T] {
        &self.buffer
    }

    /// Cast subpixels to u8 and return the buffer
    pub fn to_u8(&self) -> Vec<u8> {
        self.buffer
            .iter()
            .map(|x| x.to_u8().unwrap_or(0u8))
            .collect()
    }

    /// Cast subpixels to u32 and return the buffer
    pub fn to_u32(&self) -> Vec<u32> {
        self.buffer
            .iter()
            .map(|x| x.to_u32().unwrap_or(0u32))
            .collect()
    }

    /// Cast subpixels to f32 and return the buffer
    pub fn to_f32(&self) -> Vec<f32> {
        self.buffer
            .iter()
            .map(|x| x.to_f32().unwrap_or(0f32))
            .collect()
    }

    // An iterator over the raw buffer
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.buffer.iter()
    }

    // An iterator over pixel-level chunks of the raw buffer
    pub fn iter_pixels(&self) -> ChunksExact<T> {
        self.buffer.chunks_exact(self.c as usize)
    }
}

// <<< CONVERSION METHODS

// >>> ACCESS METHODS

impl<T> SageBuffer<T>
where
    T: ToPrimitive + FromPrimitive + Clone,
{
    /// Subpixel at (x, y) in the first channel of a single-channel buffer
    pub fn get(&self, x: u32, y: u32) -> Option<&T> {
        if x >= self.w || y >= self.h || self.c != 1 {
            return None;
        }

        self.buffer.get((y * self.w + x) as usize)
    }

    /// Set the subpixel at (x, y) in a single-channel buffer
    pub fn set(&mut self, x: u32, y: u32, value: T) -> Result<(), SageError> {
        if x >= self.w || y >= self.h || self.c != 1 {
            return Err(SageError::ChannelBoundsError);
        }

        self.buffer[(y * self.w + x) as usize] = value;
        Ok(())
    }
}

// <<< ACCESS METHODS

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn test_buffer_new_success() {
        let buffer = SageBuffer::new(1, 3, 2, vec![1, 2, 3, 4, 5, 6]);
        assert!(buffer.is_ok());
    }

    #[test]
    fn test_buffer_new_error() {
        let buffer = SageBuffer::new(2, 3, 2, vec![1, 2, 3, 4, 5, 6]);
        assert!(buffer.is_err());
    }

    #[test]
    fn test_buffer_shape() {
        let buffer = SageBuffer::new(1, 3, 2, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(buffer.unwrap().shape(), (3, 1, 2));
    }

    #[test]
    fn test_buffer_filled() {
        let buffer = SageBuffer::filled(2, 2, 1, 7u8);
        assert_eq!(buffer.as_raw(), &[7, 7, 7, 7]);
    }

    #[test]
    fn test_buffer_to_u8() {
        let buffer = SageBuffer::new(1, 2, 2, vec![2.5, 3.9, 4.8, 2.2]).unwrap();
        assert_eq!(buffer.to_u8(), [2, 3, 4, 2]);
    }

    #[test]
    fn test_buffer_get_set() {
        let mut buffer = SageBuffer::filled(3, 2, 1, 0u8);

        buffer.set(2, 1, 9).unwrap();
        assert_eq!(buffer.get(2, 1), Some(&9));
        assert_eq!(buffer.get(3, 1), None);
        assert!(buffer.set(0, 2, 1).is_err());
    }

    #[test]
    fn test_iter_pixels() {
        let buffer = SageBuffer::new(1, 4, 2, vec![1, 2, 3, 4, 5, 6, 7, 8]).unwrap();

        for (a, b) in buffer.iter_pixels().zip([[1, 2], [3, 4], [5, 6], [7, 8]]) {
            assert_eq!(a[0], b[0]);
            assert_eq!(a[1], b[1]);
        }
    }
}
