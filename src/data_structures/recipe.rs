//! Render recipes and visibility policies.
//!
//! A [`RenderRecipe`] is the fixed bundle of blend, depth, lighting and
//! transparency settings an effect is built with. It is handed to the effect
//! once and never changes afterwards, except for the light colour which the
//! effect's own animation may drive.

use cgmath::Vector3;

const WHITE: Vector3<f32> = Vector3 {
    x: 1.0,
    y: 1.0,
    z: 1.0,
};

/// Depth buffer format every effect state is built against.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// How an effect's colour is composited with what is already drawn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BlendMode {
    #[default]
    Opaque,
    Additive,
    AlphaBlend,
}

impl BlendMode {
    pub fn to_wgpu(self) -> wgpu::BlendState {
        match self {
            BlendMode::Opaque => wgpu::BlendState::REPLACE,
            BlendMode::Additive => {
                let additive = wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::SrcAlpha,
                    dst_factor: wgpu::BlendFactor::One,
                    operation: wgpu::BlendOperation::Add,
                };
                wgpu::BlendState {
                    color: additive,
                    alpha: additive,
                }
            }
            BlendMode::AlphaBlend => wgpu::BlendState::ALPHA_BLENDING,
        }
    }
}

/// How an effect interacts with the depth buffer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DepthMode {
    /// Test and write.
    #[default]
    Default,
    /// Test but never write, so effects behind each other all show up.
    ReadOnly,
    Custom {
        write_enabled: bool,
        test_enabled: bool,
    },
}

impl DepthMode {
    pub fn write_enabled(self) -> bool {
        match self {
            DepthMode::Default => true,
            DepthMode::ReadOnly => false,
            DepthMode::Custom { write_enabled, .. } => write_enabled,
        }
    }

    pub fn test_enabled(self) -> bool {
        match self {
            DepthMode::Default | DepthMode::ReadOnly => true,
            DepthMode::Custom { test_enabled, .. } => test_enabled,
        }
    }

    pub fn to_wgpu(self) -> wgpu::DepthStencilState {
        wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: Some(self.write_enabled()),
            depth_compare: Some(if self.test_enabled() {
                wgpu::CompareFunction::Less
            } else {
                wgpu::CompareFunction::Always
            }),
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }
    }
}

/// Secondary material pass layered over the primary one.
///
/// Used by model effects that render a solid or tinted base plus a glow over
/// the same geometry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeshBlend {
    pub channel: u32,
    pub state: BlendMode,
    pub intensity: f32,
}

/// Whether an effect defers to the generic cull test.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum VisibilityPolicy {
    #[default]
    Automatic,
    /// Never culled. For effects that must not pop out near the screen edge.
    AlwaysVisible,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderRecipe {
    blend: BlendMode,
    depth: DepthMode,
    lighting: bool,
    light_color: Vector3<f32>,
    transparent: bool,
    mesh_blend: Option<MeshBlend>,
}

impl RenderRecipe {
    pub const fn opaque() -> Self {
        Self {
            blend: BlendMode::Opaque,
            depth: DepthMode::Default,
            lighting: false,
            light_color: WHITE,
            transparent: false,
            mesh_blend: None,
        }
    }

    /// Additive, depth read-only, transparent. The usual glow/flare setup.
    pub const fn additive() -> Self {
        Self {
            blend: BlendMode::Additive,
            depth: DepthMode::ReadOnly,
            lighting: false,
            light_color: WHITE,
            transparent: true,
            mesh_blend: None,
        }
    }

    pub const fn alpha_blended() -> Self {
        Self {
            blend: BlendMode::AlphaBlend,
            depth: DepthMode::ReadOnly,
            lighting: false,
            light_color: WHITE,
            transparent: true,
            mesh_blend: None,
        }
    }

    pub const fn with_blend(mut self, blend: BlendMode) -> Self {
        self.blend = blend;
        self
    }

    pub const fn with_depth(mut self, depth: DepthMode) -> Self {
        self.depth = depth;
        self
    }

    /// Enables lighting with the given colour. Components above `1.0` are kept.
    pub const fn with_light(mut self, light_color: Vector3<f32>) -> Self {
        self.lighting = true;
        self.light_color = light_color;
        self
    }

    pub const fn with_transparency(mut self, transparent: bool) -> Self {
        self.transparent = transparent;
        self
    }

    pub const fn with_mesh_blend(mut self, mesh_blend: MeshBlend) -> Self {
        self.mesh_blend = Some(mesh_blend);
        self
    }

    pub fn blend(&self) -> BlendMode {
        self.blend
    }

    pub fn depth(&self) -> DepthMode {
        self.depth
    }

    pub fn lighting(&self) -> bool {
        self.lighting
    }

    pub fn light_color(&self) -> Vector3<f32> {
        self.light_color
    }

    pub fn transparent(&self) -> bool {
        self.transparent
    }

    pub fn mesh_blend(&self) -> Option<MeshBlend> {
        self.mesh_blend
    }

    /// Only the owning effect's animation may call this.
    pub(crate) fn set_light_color(&mut self, light_color: Vector3<f32>) {
        self.light_color = light_color;
    }
}

impl Default for RenderRecipe {
    fn default() -> Self {
        Self::opaque()
    }
}
