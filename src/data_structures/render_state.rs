//! Renderer-facing state of a loaded effect.
//!
//! [`RenderState`] is what a renderer reads when it draws an effect. It is
//! filled once from the effect's [`RenderRecipe`] while the effect loads.
//! Afterwards only the light colour moves, and only when an animation drives
//! it.

use crate::data_structures::recipe::{BlendMode, DepthMode, RenderRecipe};

/// Independent state block for the secondary mesh-blend pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SecondaryPass {
    pub channel: u32,
    pub mode: BlendMode,
    pub blend: wgpu::BlendState,
    pub intensity: f32,
}

/// Which of an effect's passes a draw call belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Layer {
    Primary,
    Secondary { channel: u32 },
}

#[derive(Clone, Debug, PartialEq)]
pub struct RenderState {
    pub mode: BlendMode,
    pub blend: wgpu::BlendState,
    pub depth_mode: DepthMode,
    pub depth: wgpu::DepthStencilState,
    pub lighting: bool,
    pub light_color: [f32; 3],
    pub transparent: bool,
    pub secondary: Option<SecondaryPass>,
}

impl RenderState {
    /// Pushes every knob of `recipe` into a fresh state.
    pub fn from_recipe(recipe: &RenderRecipe) -> Self {
        let secondary = recipe.mesh_blend().map(|mesh_blend| SecondaryPass {
            channel: mesh_blend.channel,
            mode: mesh_blend.state,
            blend: mesh_blend.state.to_wgpu(),
            intensity: mesh_blend.intensity,
        });
        Self {
            mode: recipe.blend(),
            blend: recipe.blend().to_wgpu(),
            depth_mode: recipe.depth(),
            depth: recipe.depth().to_wgpu(),
            lighting: recipe.lighting(),
            light_color: recipe.light_color().into(),
            transparent: recipe.transparent(),
            secondary,
        }
    }

    pub(crate) fn set_light_color(&mut self, light_color: cgmath::Vector3<f32>) {
        self.light_color = light_color.into();
    }

    /// Whether the primary pass can go with the opaque batch.
    pub fn is_opaque(&self) -> bool {
        self.mode == BlendMode::Opaque && !self.transparent
    }

    pub fn blend_for(&self, layer: Layer) -> wgpu::BlendState {
        match (layer, self.secondary) {
            (Layer::Secondary { .. }, Some(secondary)) => secondary.blend,
            _ => self.blend,
        }
    }

    /// Uniform block for `layer`, ready for `queue.write_buffer`.
    pub fn uniform(&self, layer: Layer) -> EffectUniform {
        let intensity = match (layer, self.secondary) {
            (Layer::Secondary { .. }, Some(secondary)) => secondary.intensity,
            _ => 1.0,
        };
        EffectUniform {
            light_color: self.light_color,
            lighting: self.lighting as u32,
            intensity,
            transparent: self.transparent as u32,
            _padding: [0; 2],
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct EffectUniform {
    pub light_color: [f32; 3],
    pub lighting: u32,
    pub intensity: f32,
    pub transparent: u32,
    // Uniforms require 16 byte spacing
    _padding: [u32; 2],
}
