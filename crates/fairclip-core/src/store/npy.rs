//! NumPy `.npy` embedding files.
//!
//! Writes a C-order `<f4` array of shape `(1, dim)`, so files load directly
//! with `numpy.load`. Reads `<f4` arrays of shape `(dim,)` or `(1, dim)`.

use std::path::Path;

use npyz::WriterBuilder;

use crate::error::StoreError;

/// Write a single embedding as a `(1, dim)` array.
pub fn write(path: &Path, values: &[f32]) -> Result<(), StoreError> {
    let format_err = |e: std::io::Error| StoreError::Format {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    let mut bytes = Vec::with_capacity(128 + values.len() * 4);
    let mut writer = npyz::WriteOptions::<f32>::new()
        .default_dtype()
        .shape(&[1, values.len() as u64])
        .writer(&mut bytes)
        .begin_nd()
        .map_err(format_err)?;
    writer.extend(values.iter().copied()).map_err(format_err)?;
    writer.finish().map_err(format_err)?;

    std::fs::write(path, &bytes).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Read an embedding, flattened.
pub fn read(path: &Path) -> Result<Vec<f32>, StoreError> {
    let bytes = std::fs::read(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    decode(&bytes).map_err(|message| StoreError::Format {
        path: path.to_path_buf(),
        message,
    })
}

fn decode(bytes: &[u8]) -> Result<Vec<f32>, String> {
    let npy = npyz::NpyFile::new(bytes).map_err(|e| format!("not an npy array: {e}"))?;

    let len = embedding_len(npy.shape())?;
    if len.checked_mul(4).map_or(true, |size| size > bytes.len()) {
        return Err(format!("shape {:?} does not fit in file", npy.shape()));
    }

    let values = npy
        .into_vec::<f32>()
        .map_err(|e| format!("unsupported array data: {e}"))?;
    if values.len() != len {
        return Err(format!("expected {len} values, read {}", values.len()));
    }
    Ok(values)
}

/// Element count for an embedding shape: `(dim,)` or `(1, dim)`.
fn embedding_len(shape: &[u64]) -> Result<usize, String> {
    let dim = match shape {
        [dim] | [1, dim] => *dim,
        other => return Err(format!("expected shape (dim,) or (1, dim), got {other:?}")),
    };
    usize::try_from(dim).map_err(|_| format!("dimension {dim} is too large"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn npy_bytes(descr: &str, shape: &str, data: &[u8]) -> Vec<u8> {
        let header = format!("{{'descr': '{descr}', 'fortran_order': False, 'shape': {shape}, }}");
        let padding = 64 - (10 + header.len() + 1) % 64;
        let header = format!("{header}{}\n", " ".repeat(padding % 64));

        let mut bytes = b"\x93NUMPY\x01\x00".to_vec();
        bytes.extend_from_slice(&(header.len() as u16).to_le_bytes());
        bytes.extend_from_slice(header.as_bytes());
        bytes.extend_from_slice(data);
        bytes
    }

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("face.npy");
        let values: Vec<f32> = (0..512).map(|i| (i as f32 * 0.37).sin()).collect();

        write(&path, &values).unwrap();
        let loaded = read(&path).unwrap();

        assert_eq!(loaded, values);
    }

    #[test]
    fn test_writes_row_vector_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("row.npy");
        write(&path, &[1.0, 2.0, 3.0]).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        let npy = npyz::NpyFile::new(&bytes[..]).unwrap();
        assert_eq!(npy.shape(), &[1, 3]);
    }

    #[test]
    fn test_reads_one_dimensional_shape() {
        let data: Vec<u8> = [1.5f32, -2.0].iter().flat_map(|f| f.to_le_bytes()).collect();
        let bytes = npy_bytes("<f4", "(2,)", &data);

        assert_eq!(decode(&bytes).unwrap(), vec![1.5, -2.0]);
    }

    #[test]
    fn test_rejects_non_npy() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pickle.npy");
        std::fs::write(&path, b"PK\x03\x04 torch zip archive").unwrap();

        let err = read(&path).unwrap_err();
        assert!(matches!(err, StoreError::Format { .. }));
    }

    #[test]
    fn test_rejects_float64() {
        let bytes = npy_bytes("<f8", "(1,)", &1.0f64.to_le_bytes());
        assert!(decode(&bytes).is_err());
    }

    #[test]
    fn test_rejects_matrix_shape() {
        let bytes = npy_bytes("<f4", "(2, 2)", &[0u8; 16]);
        assert!(decode(&bytes).unwrap_err().contains("shape"));
    }

    #[test]
    fn test_rejects_oversized_shape_without_data() {
        let bytes = npy_bytes("<f4", "(1, 4294967296)", &[]);
        assert!(decode(&bytes).is_err());
    }

    #[test]
    fn test_rejects_truncated_data() {
        let bytes = npy_bytes("<f4", "(1, 4)", &[0u8; 8]);
        assert!(decode(&bytes).is_err());
    }
}
