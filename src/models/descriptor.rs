use serde::{Deserialize, Serialize};

/// Row-major matrix of descriptor vectors, one row per keypoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DescriptorParts", into = "DescriptorParts")]
pub struct DescriptorMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

#[derive(Serialize, Deserialize)]
struct DescriptorParts {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

impl TryFrom<DescriptorParts> for DescriptorMatrix {
    type Error = String;

    fn try_from(parts: DescriptorParts) -> Result<Self, Self::Error> {
        Self::from_vec(parts.rows, parts.cols, parts.data).ok_or_else(|| {
            format!(
                "descriptor data does not fill a {}x{} matrix",
                parts.rows, parts.cols
            )
        })
    }
}

impl From<DescriptorMatrix> for DescriptorParts {
    fn from(m: DescriptorMatrix) -> Self {
        Self {
            rows: m.rows,
            cols: m.cols,
            data: m.data,
        }
    }
}

impl DescriptorMatrix {
    /// Create an empty matrix whose rows will have `cols` entries
    pub fn new(cols: usize) -> Self {
        Self {
            rows: 0,
            cols,
            data: Vec::new(),
        }
    }

    /// Wrap an existing row-major buffer; `None` if the length does not match
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f32>) -> Option<Self> {
        if data.len() != rows * cols {
            return None;
        }
        Some(Self { rows, cols, data })
    }

    /// Build from individual rows; `None` if the rows are ragged
    pub fn from_rows(cols: usize, rows: &[Vec<f32>]) -> Option<Self> {
        let mut m = Self::new(cols);
        for row in rows {
            if row.len() != cols {
                return None;
            }
            m.push_row(row);
        }
        Some(m)
    }

    /// Append a row. Panics if its length differs from `cols`.
    pub fn push_row(&mut self, row: &[f32]) {
        assert_eq!(row.len(), self.cols, "descriptor row length mismatch");
        self.data.extend_from_slice(row);
        self.rows += 1;
    }

    /// Number of descriptors
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Descriptor length
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// True when the matrix holds no descriptors
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Borrow row `i`
    pub fn row(&self, i: usize) -> &[f32] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    /// Iterate over rows in order
    pub fn iter_rows(&self) -> impl Iterator<Item = &[f32]> {
        // chunks_exact(0) panics; an empty matrix has no rows to yield
        self.data.chunks_exact(self.cols.max(1)).take(self.rows)
    }

    /// Raw little-endian float bytes, row-major
    pub fn to_le_bytes(&self) -> Vec<u8> {
        self.data.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    /// Rebuild from raw little-endian float bytes
    pub fn from_le_bytes(rows: usize, cols: usize, bytes: &[u8]) -> Option<Self> {
        if bytes.len() != rows * cols * 4 {
            return None;
        }
        let data = bytes
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        Self::from_vec(rows, cols, data)
    }
}

impl Default for DescriptorMatrix {
    fn default() -> Self {
        Self::new(crate::features::sift::DESCRIPTOR_SIZE)
    }
}
