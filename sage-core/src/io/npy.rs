// Copyright (c) 2026, Sage Developers
// Licensed under the BSD 3-Clause License

use std::path::Path;

use npyz::{self, WriterBuilder};

use crate::error::SageError;

/// Write a numpy file from a vector of specified shape
///
/// # Arguments
///
/// * `path` - Path to output numpy file
/// * `data` - Vector of numeric type
/// * `shape` - Shape of the vector (shape product must equal length of data)
pub fn write_numpy<T, P: AsRef<Path>>(
    path: P,
    data: Vec<T>,
    shape: Vec<u64>,
) -> Result<(), SageError>
where
    T: npyz::Serialize + npyz::AutoSerialize,
{
    let mut buffer = vec![];
    let mut writer = npyz::WriteOptions::<T>::new()
        .default_dtype()
        .shape(&shape)
        .writer(&mut buffer)
        .begin_nd()
        .map_err(|_| SageError::ImageWriteError)?;

    for d in data {
        let _ = writer.push(&d);
    }

    writer.finish().map_err(|_| SageError::ImageWriteError)?;
    std::fs::write(path, buffer).map_err(|_| SageError::ImageWriteError)?;
    Ok(())
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn test_write_numpy() {
        let path = "TEST_WRITE_NUMPY.npy";

        write_numpy(path, vec![0u8, 1, 2, 3, 4, 5], vec![2, 3]).unwrap();

        let bytes = std::fs::read(path).unwrap();
        let npy = npyz::NpyFile::new(&bytes[..]).unwrap();

        assert_eq!(npy.shape(), &[2, 3]);
        assert_eq!(npy.into_vec::<u8>().unwrap(), vec![0, 1, 2, 3, 4, 5]);

        std::fs::remove_file(path).unwrap();
    }
}
