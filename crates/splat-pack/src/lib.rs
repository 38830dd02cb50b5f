pub mod accessor;
pub mod encode;
pub mod error;
pub mod header;
pub mod importance;
pub mod schema;

#[cfg(test)]
mod tests;

pub use encode::{PACKED_SPLAT_SIZE, PackedSplat};
pub use error::ConvertError;
pub use schema::ColorSource;

use accessor::VertexRows;
use header::PlyHeader;
use schema::{Schema, SplatLayout};

/// Leading bytes of every ply file.
pub const PLY_MAGIC: [u8; 4] = *b"ply\n";

#[derive(Debug, Clone)]
pub struct ConvertMetadata {
    pub total_splats: usize,
    /// Bytes per source row.
    pub stride: usize,
    /// Offset of the first row in the source buffer.
    pub header_len: usize,
    pub has_scale_rotation: bool,
    pub color_source: ColorSource,
    pub has_opacity: bool,
}

/// Packed splats sorted by importance, [`PACKED_SPLAT_SIZE`] bytes each.
pub struct SplatBuffer {
    pub meta: ConvertMetadata,
    pub data: Vec<u8>,
}

impl SplatBuffer {
    pub fn len(&self) -> usize {
        self.meta.total_splats
    }

    pub fn is_empty(&self) -> bool {
        self.meta.total_splats == 0
    }

    pub fn splats(&self) -> impl ExactSizeIterator<Item = PackedSplat> + '_ {
        self.data
            .chunks_exact(PACKED_SPLAT_SIZE)
            .map(PackedSplat::from_bytes)
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

pub fn is_ply(data: &[u8]) -> bool {
    data.starts_with(&PLY_MAGIC)
}

/// Convert a ply file to a buffer of packed splats, largest and most opaque splats first.
///
/// Input that doesn't start with the ply magic is rejected with
/// [`ConvertError::UnsupportedFormat`] before anything is parsed.
pub fn convert(data: &[u8]) -> Result<SplatBuffer, ConvertError> {
    if !is_ply(data) {
        return Err(ConvertError::UnsupportedFormat {
            magic: data.iter().take(PLY_MAGIC.len()).copied().collect(),
        });
    }

    let header = PlyHeader::parse(data)?;
    let schema = Schema::from_header(&header);
    log::info!("Vertex count = {}", header.vertex_count);
    log::debug!("Bytes per row = {}", schema.stride());

    let layout = SplatLayout::resolve(&schema)?;
    let rows = VertexRows::new(&schema, &data[header.body_offset..], header.vertex_count)?;

    let scores = importance::importance_scores(&rows, &layout);
    let order = importance::rank_by_importance(&scores);
    let packed = encode::encode_splats(&rows, &layout, &order);

    Ok(SplatBuffer {
        meta: ConvertMetadata {
            total_splats: rows.len(),
            stride: schema.stride(),
            header_len: header.body_offset,
            has_scale_rotation: layout.scale_rotation.is_some(),
            color_source: layout.color_source(),
            has_opacity: layout.opacity.is_some(),
        },
        data: packed,
    })
}
