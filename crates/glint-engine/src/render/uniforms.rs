use bytemuck::{Pod, Zeroable};
use glam::Mat4;

use crate::math::Color;

/// Group 0: per-frame globals.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(crate) struct GlobalsUniform {
    pub projection: [f32; 16],
}

impl GlobalsUniform {
    pub fn new(projection: Mat4) -> Self {
        Self {
            projection: projection.to_cols_array(),
        }
    }
}

/// Group 1: per-draw values, bound with a dynamic offset.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(crate) struct DrawUniform {
    pub view: [f32; 16],
    pub transform: [f32; 16],
    pub color: [f32; 4],
}

impl DrawUniform {
    pub const SIZE: u64 = std::mem::size_of::<DrawUniform>() as u64;

    pub fn new(view: Mat4, transform: Mat4, color: Color) -> Self {
        Self {
            view: view.to_cols_array(),
            transform: transform.to_cols_array(),
            color: color.to_array(),
        }
    }

    /// Distance between consecutive draws in the uniform buffer.
    pub fn stride(min_alignment: u32) -> u64 {
        wgpu::util::align_to(Self::SIZE, min_alignment.max(1) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draw_uniform_matches_wgsl_layout() {
        use crate::resource::linkage::{DRAW_UNIFORM_SIZE, GLOBALS_UNIFORM_SIZE};

        assert_eq!(DrawUniform::SIZE, 144);
        assert_eq!(DrawUniform::SIZE, DRAW_UNIFORM_SIZE as u64);
        assert_eq!(std::mem::size_of::<GlobalsUniform>(), GLOBALS_UNIFORM_SIZE as usize);
    }

    #[test]
    fn stride_respects_alignment() {
        assert_eq!(DrawUniform::stride(256), 256);
        assert_eq!(DrawUniform::stride(64), 192);
        assert_eq!(DrawUniform::stride(0), 144);
    }
}
