use std::{
    cell::{Cell, RefCell},
    rc::Rc,
    sync::Arc,
};

use flow_fx::{
    Vector3,
    context::CullTest,
    data_structures::{
        entity::EntityId,
        render_state::{EffectUniform, Layer},
    },
    effects::{FIRE_MODEL, FLARE_TEXTURE, LIGHT_AURA_MODEL, THUNDER_TEXTURE},
    error::{EffectError, Result},
    flow::{EffectFlow, FrameStats},
    render::{DrawCall, Pass, Renderer},
    resources::{Asset, AssetLoader, Bounds, MemoryLoader, MeshData, Sprite},
};
use futures::{FutureExt, future::LocalBoxFuture};
use instant::Duration;

/// Owned copy of the interesting parts of a submitted draw call.
#[derive(Clone, Debug)]
pub(crate) struct Submitted {
    pub pass: Pass,
    pub entity: EntityId,
    pub layer: Layer,
    pub blend: wgpu::BlendState,
    pub depth_write: bool,
    pub depth_compare: wgpu::CompareFunction,
    pub uniform: EffectUniform,
    pub position: Vector3<f32>,
    pub frame: u32,
}

#[derive(Default)]
pub(crate) struct RecordingRenderer {
    pub calls: Vec<Submitted>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }

    pub fn for_entity(&self, id: EntityId) -> Vec<&Submitted> {
        self.calls.iter().filter(|call| call.entity == id).collect()
    }

    pub fn in_pass(&self, pass: Pass) -> Vec<&Submitted> {
        self.calls.iter().filter(|call| call.pass == pass).collect()
    }
}

impl Renderer for RecordingRenderer {
    fn submit(&mut self, pass: Pass, call: &DrawCall<'_>) {
        self.calls.push(Submitted {
            pass,
            entity: call.entity,
            layer: call.layer,
            blend: call.blend,
            depth_write: call.state.depth.depth_write_enabled == Some(true),
            depth_compare: call
                .state
                .depth
                .depth_compare
                .unwrap_or(wgpu::CompareFunction::Always),
            uniform: call.uniform,
            position: call.position,
            frame: call.frame,
        });
    }
}

/// Cull test with a fixed verdict that counts how often it is asked.
pub(crate) struct CountingCull {
    calls: Rc<Cell<usize>>,
    out_of_view: bool,
}

impl CountingCull {
    pub fn new(out_of_view: bool) -> (Box<Self>, Rc<Cell<usize>>) {
        let calls = Rc::new(Cell::new(0));
        let cull = Box::new(Self {
            calls: Rc::clone(&calls),
            out_of_view,
        });
        (cull, calls)
    }
}

impl CullTest for CountingCull {
    fn is_out_of_view(&self, _position: Vector3<f32>, _bounds: &Bounds) -> bool {
        self.calls.set(self.calls.get() + 1);
        self.out_of_view
    }
}

/// Wraps a [`MemoryLoader`], records every requested path and injects
/// failures.
pub(crate) struct RecordingLoader {
    inner: MemoryLoader,
    requests: RefCell<Vec<String>>,
    // (path, first failing request of that path, zero based)
    failures: Vec<(&'static str, usize)>,
}

impl RecordingLoader {
    pub fn new(inner: MemoryLoader) -> Self {
        Self {
            inner,
            requests: RefCell::new(Vec::new()),
            failures: Vec::new(),
        }
    }

    pub fn failing(self, path: &'static str) -> Self {
        self.failing_from(path, 0)
    }

    /// Lets the first `nth` requests of `path` through, fails the rest.
    pub fn failing_from(mut self, path: &'static str, nth: usize) -> Self {
        self.failures.push((path, nth));
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }
}

impl AssetLoader for RecordingLoader {
    fn prepare<'a>(&'a self, path: &'a str) -> LocalBoxFuture<'a, Result<Arc<Asset>>> {
        let previous = self
            .requests
            .borrow()
            .iter()
            .filter(|requested| requested.as_str() == path)
            .count();
        self.requests.borrow_mut().push(path.to_owned());
        let fails = self
            .failures
            .iter()
            .any(|(failing, nth)| *failing == path && previous >= *nth);
        if fails {
            return async move { Err(EffectError::asset(path, "injected failure")) }.boxed_local();
        }
        self.inner.prepare(path)
    }
}

pub(crate) fn sprite(name: &str) -> Asset {
    let pixels = image::RgbaImage::from_pixel(2, 2, image::Rgba([255, 255, 255, 255]));
    Asset::Sprite(Sprite::from_image(name, pixels))
}

pub(crate) fn quad(name: &str) -> Asset {
    Asset::Model(MeshData::new(
        name,
        vec![
            [-1.0, 0.0, -1.0],
            [1.0, 0.0, -1.0],
            [1.0, 0.0, 1.0],
            [-1.0, 0.0, 1.0],
        ],
        vec![0, 1, 2, 0, 2, 3],
    ))
}

/// Every asset the presets ask for.
pub(crate) fn fixture_loader() -> MemoryLoader {
    MemoryLoader::new()
        .with(FLARE_TEXTURE, sprite(FLARE_TEXTURE))
        .with(THUNDER_TEXTURE, sprite(THUNDER_TEXTURE))
        .with(FIRE_MODEL, quad(FIRE_MODEL))
        .with(LIGHT_AURA_MODEL, quad(LIGHT_AURA_MODEL))
}

/// Runs `count` frames of `dt` and returns the stats of the last one.
pub(crate) fn run_frames(
    flow: &mut EffectFlow,
    renderer: &mut RecordingRenderer,
    dt: Duration,
    count: usize,
) -> FrameStats {
    let mut stats = FrameStats::default();
    for _ in 0..count {
        stats = flow.frame(dt, renderer);
    }
    stats
}

pub(crate) fn close_to(a: [f32; 3], b: [f32; 3]) -> bool {
    a.iter().zip(b.iter()).all(|(a, b)| (a - b).abs() < 1e-5)
}
