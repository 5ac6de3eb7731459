//! Effect data structures: recipes, render state, entities and the scene.
//!
//! This module contains the core data types of the effect lifecycle:
//!
//! - `recipe` holds the fixed render-state knobs and the visibility policy
//! - `render_state` is the renderer-facing state a recipe is applied to
//! - `instance` holds per-instance transformation data
//! - `entity` contains the `SceneEntity` trait, effect builders and entities
//! - `composite` contains timed groups of child effects
//! - `scene_graph` is the ordered entity set with ownership teardown

pub mod composite;
pub mod entity;
pub mod instance;
pub mod recipe;
pub mod render_state;
pub mod scene_graph;
