//! Draw composition and pass batching.
//!
//! Effects describe what they want drawn with a [`Render`] value. The frame
//! loop sorts those into batches per pass (opaque, transparent, after) and
//! hands each [`DrawCall`] to a [`Renderer`]. The renderer owns the device,
//! pipelines and buffers; this crate only decides what goes where, in which
//! order and with which state.
//!
//! # Key types
//!
//! - [`Render<'a>`] is what an effect returns from its draw hooks
//! - [`DrawCall<'a>`] is one draw of one layer of one effect
//! - [`FrameBatches<'a>`] collects draw calls for a frame
//!

use cgmath::{InnerSpace, Vector3};

use crate::{
    data_structures::{
        entity::EntityId,
        instance::InstanceRaw,
        render_state::{EffectUniform, Layer, RenderState},
    },
    resources::Asset,
};

/// Render passes in submission order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Pass {
    Opaque,
    Transparent,
    /// Composited on top of everything drawn before in this frame.
    After,
}

/// Everything a renderer needs to issue a single draw.
#[derive(Clone, Debug)]
pub struct DrawCall<'a> {
    pub entity: EntityId,
    pub layer: Layer,
    pub asset: &'a Asset,
    pub state: &'a RenderState,
    pub blend: wgpu::BlendState,
    pub uniform: EffectUniform,
    pub instance: InstanceRaw,
    pub position: Vector3<f32>,
    pub frame: u32,
}

/// Specifies how an effect should be drawn this frame.
///
/// # Variants
///
/// - `None` draws nothing
/// - `Opaque(DrawCall)` joins the opaque batch
/// - `Transparent(DrawCall)` joins the back-to-front sorted transparent batch
/// - `Composed(Vec<Render>)` recursively draws several layers
///
pub enum Render<'a> {
    None,
    Opaque(DrawCall<'a>),
    Transparent(DrawCall<'a>),
    Composed(Vec<Render<'a>>),
}

impl<'a> Render<'a> {
    pub fn is_none(&self) -> bool {
        match self {
            Render::None => true,
            Render::Composed(renders) => renders.iter().all(Render::is_none),
            _ => false,
        }
    }

    /// Sorts this render into the main-pass batches.
    pub(crate) fn set_passes(self, opaque: &mut Vec<DrawCall<'a>>, trans: &mut Vec<DrawCall<'a>>) {
        match self {
            Render::Opaque(call) => opaque.push(call),
            Render::Transparent(call) => trans.push(call),
            Render::Composed(renders) => renders
                .into_iter()
                .for_each(|render| render.set_passes(opaque, trans)),
            Render::None => (),
        }
    }

    /// Flattens this render in declaration order; used for the after pass,
    /// which keeps submission order instead of sorting.
    pub(crate) fn flatten_into(self, calls: &mut Vec<DrawCall<'a>>) {
        match self {
            Render::Opaque(call) | Render::Transparent(call) => calls.push(call),
            Render::Composed(renders) => renders
                .into_iter()
                .for_each(|render| render.flatten_into(calls)),
            Render::None => (),
        }
    }
}

/// Receives the frame's draw calls, pass by pass.
pub trait Renderer {
    fn submit(&mut self, pass: Pass, call: &DrawCall<'_>);
}

/// Draw calls of one frame, grouped per pass.
#[derive(Default)]
pub struct FrameBatches<'a> {
    pub opaque: Vec<DrawCall<'a>>,
    pub transparent: Vec<DrawCall<'a>>,
    pub after: Vec<DrawCall<'a>>,
}

impl<'a> FrameBatches<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_main(&mut self, render: Render<'a>) {
        render.set_passes(&mut self.opaque, &mut self.transparent);
    }

    pub fn push_after(&mut self, render: Render<'a>) {
        render.flatten_into(&mut self.after);
    }

    pub fn len(&self) -> usize {
        self.opaque.len() + self.transparent.len() + self.after.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Orders transparent calls back to front as seen from `eye`.
    ///
    /// The sort is stable, so layers of the same effect keep their order.
    pub fn sort_transparent(&mut self, eye: Vector3<f32>) {
        self.transparent.sort_by(|a, b| {
            let da = (a.position - eye).magnitude2();
            let db = (b.position - eye).magnitude2();
            db.total_cmp(&da)
        });
    }

    /// Submits opaque, then transparent, then after calls. Returns the count.
    pub fn submit(self, renderer: &mut dyn Renderer) -> usize {
        let mut submitted = 0;
        for (pass, calls) in [
            (Pass::Opaque, self.opaque),
            (Pass::Transparent, self.transparent),
            (Pass::After, self.after),
        ] {
            for call in &calls {
                renderer.submit(pass, call);
            }
            submitted += calls.len();
        }
        submitted
    }
}
