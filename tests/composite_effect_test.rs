use flow_fx::{
    Vector3,
    data_structures::{
        composite::{CompositeEffect, CompositeState},
        entity::{EffectEntity, SceneEntity},
    },
    effects::{
        self, FLARE_TEXTURE, LEVEL_UP_AURA_OFFSET, LEVEL_UP_FLARE_OFFSET, LEVEL_UP_FLARES,
        LEVEL_UP_LIFETIME, LIGHT_AURA_MODEL,
    },
    error::EffectError,
    flow::EffectFlow,
    resources::MemoryLoader,
};
use futures::executor::block_on;
use instant::Duration;

use crate::common::test_utils::{RecordingLoader, RecordingRenderer, fixture_loader, run_frames};

mod common;

const TICK: Duration = Duration::from_millis(100);

fn spawn_level_up(flow: &mut EffectFlow, loader: &MemoryLoader) -> flow_fx::EntityId {
    block_on(flow.spawn_composite(effects::level_up(Vector3::new(4.0, 0.0, -2.0)), loader))
        .unwrap()
}

#[test]
fn level_up_spawns_one_anchor_then_thirty_flares() {
    let loader = RecordingLoader::new(fixture_loader());
    let mut flow = EffectFlow::default();
    let origin = Vector3::new(4.0, 0.0, -2.0);

    let id = block_on(flow.spawn_composite(effects::level_up(origin), &loader)).unwrap();

    let scene = flow.scene();
    let composite = scene.get_as::<CompositeEffect>(id).unwrap();
    assert_eq!(composite.children().len(), 1 + LEVEL_UP_FLARES);
    assert_eq!(composite.state(), CompositeState::Active);
    assert_eq!(composite.remaining(), LEVEL_UP_LIFETIME);

    // children precede the composite, in spawn order
    let ids = scene.ids();
    assert_eq!(&ids[..ids.len() - 1], composite.children());
    assert_eq!(ids.last(), Some(&id));
    assert_eq!(scene.owned_by(id), composite.children());

    let anchor = scene.get_as::<EffectEntity>(composite.children()[0]).unwrap();
    assert_eq!(anchor.name(), "light_aura");
    assert_eq!(anchor.position(), origin + LEVEL_UP_AURA_OFFSET);
    for child in &composite.children()[1..] {
        let flare = scene.get_as::<EffectEntity>(*child).unwrap();
        assert_eq!(flare.name(), "flare");
        assert_eq!(flare.position(), origin + LEVEL_UP_FLARE_OFFSET);
    }

    let requests = loader.requests();
    assert_eq!(requests.len(), 1 + LEVEL_UP_FLARES);
    assert_eq!(requests[0], LIGHT_AURA_MODEL);
    assert!(requests[1..].iter().all(|path| path == FLARE_TEXTURE));
}

#[test]
fn level_up_is_present_at_3_4_seconds_and_gone_at_3_6() {
    let loader = fixture_loader();
    let mut flow = EffectFlow::default();
    let id = spawn_level_up(&mut flow, &loader);
    let mut renderer = RecordingRenderer::new();

    run_frames(&mut flow, &mut renderer, TICK, 34);
    assert!(flow.scene().contains(id));
    assert_eq!(flow.scene().len(), 2 + LEVEL_UP_FLARES);

    run_frames(&mut flow, &mut renderer, TICK, 2);
    assert!(!flow.scene().contains(id));
    assert!(flow.scene().is_empty());
}

#[test]
fn removal_happens_on_the_first_tick_reaching_the_lifetime() {
    let loader = fixture_loader();
    let mut flow = EffectFlow::default();
    let id = spawn_level_up(&mut flow, &loader);
    let mut renderer = RecordingRenderer::new();

    let stats = run_frames(&mut flow, &mut renderer, TICK, 34);
    assert_eq!(stats.removed, 0);
    assert_eq!(
        flow.scene().get_as::<CompositeEffect>(id).unwrap().remaining(),
        TICK
    );

    renderer.clear();
    let stats = flow.frame(TICK, &mut renderer);
    assert_eq!(flow.ctx().time.total, LEVEL_UP_LIFETIME);
    assert_eq!(stats.removed, 2 + LEVEL_UP_FLARES);
    assert_eq!(stats.drawn, 0);
    assert!(renderer.calls.is_empty());
    assert!(flow.scene().is_empty());
}

#[test]
fn one_large_step_past_the_lifetime_removes_everything() {
    let loader = fixture_loader();
    let mut flow = EffectFlow::default();
    spawn_level_up(&mut flow, &loader);
    let mut renderer = RecordingRenderer::new();

    let stats = flow.frame(Duration::from_secs(10), &mut renderer);
    assert_eq!(stats.removed, 2 + LEVEL_UP_FLARES);
    assert!(flow.scene().is_empty());
}

#[test]
fn expiry_leaves_unrelated_effects_alone() {
    let loader = fixture_loader();
    let mut flow = EffectFlow::default();
    let thunder = block_on(flow.spawn(effects::thunder(Vector3::new(0.0, 0.0, 0.0)), &loader)).unwrap();
    spawn_level_up(&mut flow, &loader);
    let mut renderer = RecordingRenderer::new();

    run_frames(&mut flow, &mut renderer, TICK, 40);
    assert_eq!(flow.scene().ids(), vec![thunder]);
}

#[test]
fn anchor_failure_constructs_no_flare() {
    let loader = RecordingLoader::new(fixture_loader()).failing(LIGHT_AURA_MODEL);
    let mut flow = EffectFlow::default();

    let err = block_on(flow.spawn_composite(effects::level_up(Vector3::new(0.0, 0.0, 0.0)), &loader))
        .unwrap_err();

    match &err {
        EffectError::SpawnSequence {
            effect,
            index,
            child,
            ..
        } => {
            assert_eq!(*effect, "level_up");
            assert_eq!(*index, 0);
            assert_eq!(*child, "light_aura");
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(err.asset_path(), LIGHT_AURA_MODEL);
    assert_eq!(loader.requests(), vec![LIGHT_AURA_MODEL.to_owned()]);
    assert!(flow.scene().is_empty());
}

#[test]
fn mid_spawn_failure_rolls_back_inserted_children() {
    // anchor plus ten flares load, the eleventh flare fails
    let loader = RecordingLoader::new(fixture_loader()).failing_from(FLARE_TEXTURE, 10);
    let mut flow = EffectFlow::default();

    let err = block_on(flow.spawn_composite(effects::level_up(Vector3::new(0.0, 0.0, 0.0)), &loader))
        .unwrap_err();

    assert!(matches!(err, EffectError::SpawnSequence { index: 11, .. }));
    assert_eq!(loader.requests().len(), 12);
    assert!(flow.scene().is_empty());
}

#[test]
fn removing_a_composite_takes_its_children_along() {
    let loader = fixture_loader();
    let mut flow = EffectFlow::default();
    let id = spawn_level_up(&mut flow, &loader);

    assert_eq!(flow.scene_mut().remove(id), 2 + LEVEL_UP_FLARES);
    assert!(flow.scene().is_empty());
}

#[test]
fn children_keep_drawing_while_the_composite_is_active() {
    let loader = fixture_loader();
    let mut flow = EffectFlow::default();
    let id = spawn_level_up(&mut flow, &loader);
    let mut renderer = RecordingRenderer::new();

    let stats = flow.frame(TICK, &mut renderer);
    let composite = flow.scene().get(id).unwrap();
    assert!(composite.is_visible());
    assert!(renderer.for_entity(id).is_empty());
    assert_eq!(stats.updated, 2 + LEVEL_UP_FLARES);
    assert_eq!(stats.drawn + stats.culled, 1 + LEVEL_UP_FLARES);
}

#[test]
fn removing_one_child_by_hand_leaves_the_rest_owned() {
    let loader = fixture_loader();
    let mut flow = EffectFlow::default();
    let id = spawn_level_up(&mut flow, &loader);
    let flare = flow.scene().get_as::<CompositeEffect>(id).unwrap().children()[5];

    assert_eq!(flow.scene_mut().remove(flare), 1);

    let scene = flow.scene();
    let composite = scene.get_as::<CompositeEffect>(id).unwrap();
    assert_eq!(composite.children().len(), 1 + LEVEL_UP_FLARES);
    let live = composite.live_children(scene);
    assert_eq!(live.len(), LEVEL_UP_FLARES);
    assert!(!live.contains(&flare));
    assert_eq!(live, scene.owned_by(id));

    let mut renderer = RecordingRenderer::new();
    let stats = flow.frame(LEVEL_UP_LIFETIME, &mut renderer);
    assert_eq!(stats.removed, 1 + LEVEL_UP_FLARES);
    assert!(flow.scene().is_empty());
}
