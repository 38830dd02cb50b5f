use bytemuck::{Pod, Zeroable};
use glam::{Vec3, Vec4};
use rayon::prelude::*;

use crate::accessor::{VertexRow, VertexRows};
use crate::importance::sigmoid;
use crate::schema::{ColorFields, SplatLayout};

pub const SH_C0: f64 = 0.28209479177387814;

/// Scale used for splats that don't have one.
pub const DEFAULT_SCALE: f32 = 0.01;

/// Rotation bytes used for splats that don't have a scale.
pub const DEFAULT_ROTATION: [u8; 4] = [255, 0, 0, 0];

/// One splat as laid out in the output buffer.
///
/// Floats are stored little endian regardless of the host, use the accessors
/// to read them back.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct PackedSplat {
    position: [f32; 3],
    scale: [f32; 3],
    color: [u8; 4],
    rotation: [u8; 4],
}

pub const PACKED_SPLAT_SIZE: usize = size_of::<PackedSplat>();

const _: () = assert!(PACKED_SPLAT_SIZE == 32);

fn to_le(v: [f32; 3]) -> [f32; 3] {
    v.map(|x| f32::from_bits(x.to_bits().to_le()))
}

fn from_le(v: [f32; 3]) -> [f32; 3] {
    v.map(|x| f32::from_bits(u32::from_le(x.to_bits())))
}

impl PackedSplat {
    pub fn new(position: Vec3, scale: Vec3, color: [u8; 4], rotation: [u8; 4]) -> Self {
        Self {
            position: to_le(position.to_array()),
            scale: to_le(scale.to_array()),
            color,
            rotation,
        }
    }

    /// Read a splat back from (at least) 32 bytes of an output buffer.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        bytemuck::pod_read_unaligned(&bytes[..PACKED_SPLAT_SIZE])
    }

    pub fn position(&self) -> Vec3 {
        Vec3::from_array(from_le(self.position))
    }

    pub fn scale(&self) -> Vec3 {
        Vec3::from_array(from_le(self.scale))
    }

    pub fn color(&self) -> [u8; 4] {
        self.color
    }

    pub fn rotation(&self) -> [u8; 4] {
        self.rotation
    }
}

/// Round half to even and clamp to 0-255. NaN becomes 0.
pub fn saturate_u8(value: f64) -> u8 {
    // Float to int casts saturate and map NaN to 0.
    value.round_ties_even() as u8
}

/// A quaternion that can't be normalized (zero length) encodes as all zero bytes.
fn quat_to_bytes(rotation: Vec4) -> [u8; 4] {
    rotation.try_normalize().map_or([0; 4], |normed| {
        normed
            .to_array()
            .map(|c| saturate_u8(f64::from(c) * 128.0 + 128.0))
    })
}

pub fn encode_splat(row: &VertexRow<'_>, layout: &SplatLayout) -> PackedSplat {
    let position = Vec3::from_array(layout.position.map(|field| row.read_f32(field)));

    let (scale, rotation) = match &layout.scale_rotation {
        Some(fields) => {
            let scale = Vec3::from_array(fields.log_scale.map(|field| row.read(field).exp() as f32));
            let rotation = Vec4::from_array(fields.rotation.map(|field| row.read_f32(field)));
            (scale, quat_to_bytes(rotation))
        }
        None => (Vec3::splat(DEFAULT_SCALE), DEFAULT_ROTATION),
    };

    let [r, g, b] = match layout.color {
        ColorFields::ShDc(fields) => {
            fields.map(|field| saturate_u8((0.5 + SH_C0 * row.read(field)) * 255.0))
        }
        ColorFields::Rgb(fields) => {
            fields.map(|field| field.map_or(0, |field| saturate_u8(row.read(field))))
        }
    };

    let alpha = layout
        .opacity
        .map_or(u8::MAX, |field| saturate_u8(255.0 * sigmoid(row.read(field))));

    PackedSplat::new(position, scale, [r, g, b, alpha], rotation)
}

/// Write one packed splat per entry of `order`, in that order.
pub fn encode_splats(rows: &VertexRows<'_>, layout: &SplatLayout, order: &[usize]) -> Vec<u8> {
    let _span = tracing::trace_span!("Build buffer").entered();

    let mut data = vec![0; order.len() * PACKED_SPLAT_SIZE];
    data.par_chunks_exact_mut(PACKED_SPLAT_SIZE)
        .zip(order.par_iter())
        .for_each(|(out, &index)| {
            let splat = encode_splat(&rows.row(index), layout);
            out.copy_from_slice(bytemuck::bytes_of(&splat));
        });
    data
}
