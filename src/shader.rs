//! WGSL sources and the uniform layouts they expect.

use bytemuck::{Pod, Zeroable};

/// Point-cloud render shader.
pub const POINTS_WGSL: &str = include_str!("shaders/points.wgsl");
/// Fullscreen vertex stage and bindings shared by every post pass.
pub const POST_COMMON_WGSL: &str = include_str!("shaders/post_common.wgsl");
pub const BLOOM_WGSL: &str = include_str!("shaders/bloom.wgsl");
pub const FILM_WGSL: &str = include_str!("shaders/film.wgsl");
pub const FOCUS_WGSL: &str = include_str!("shaders/focus.wgsl");

/// Full source of one post pass.
pub fn post_pass_source(fragment: &str) -> String {
    format!("{POST_COMMON_WGSL}\n{fragment}")
}

/// Per-frame camera and fog data.
#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
pub struct FrameUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub fog_color: [f32; 3],
    pub fog_density: f32,
    pub viewport: [f32; 2],
    pub _padding: [f32; 2],
}

/// Per-draw transform and material.
#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
pub struct DrawUniforms {
    pub model: [[f32; 4]; 4],
    pub color: [f32; 3],
    pub point_size: f32,
}

/// Parameters of the post chain.
#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
pub struct PostUniforms {
    pub resolution: [f32; 2],
    pub time: f32,
    pub bloom_strength: f32,
    pub noise_intensity: f32,
    pub scanline_intensity: f32,
    pub scanline_count: f32,
    pub grayscale: u32,
    pub sample_distance: f32,
    pub wave_factor: f32,
    pub _padding: [f32; 2],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_sizes_match_wgsl_layout() {
        assert_eq!(std::mem::size_of::<FrameUniforms>(), 160);
        assert_eq!(std::mem::size_of::<DrawUniforms>(), 80);
        assert_eq!(std::mem::size_of::<PostUniforms>(), 48);
    }

    #[test]
    fn test_post_pass_source_includes_common() {
        let src = post_pass_source(FILM_WGSL);
        assert!(src.contains("fn vs_main"));
        assert!(src.contains("fn rand"));
    }
}
