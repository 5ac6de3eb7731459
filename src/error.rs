//! Error taxonomy for effect construction.
//!
//! Only loading can fail. A live entity's per-frame operations (update,
//! visibility, draw) are infallible, so there is nothing to model there.

use thiserror::Error;

type BoxedSource = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure while bringing an effect into a scene.
#[derive(Debug, Error)]
pub enum EffectError {
    /// The asset behind `path` is missing or could not be decoded.
    ///
    /// Fatal to the single entity being constructed. Never retried.
    #[error("failed to load asset `{path}`: {source}")]
    AssetLoad {
        path: String,
        #[source]
        source: BoxedSource,
    },

    /// A composite effect lost one of its children while spawning.
    ///
    /// `index` is the spawn position of the failing child (0 is the anchor).
    #[error("composite `{effect}` failed to spawn child #{index} (`{child}`)")]
    SpawnSequence {
        effect: &'static str,
        index: usize,
        child: &'static str,
        #[source]
        source: Box<EffectError>,
    },
}

impl EffectError {
    pub fn asset(path: &str, source: impl Into<BoxedSource>) -> Self {
        Self::AssetLoad {
            path: path.to_owned(),
            source: source.into(),
        }
    }

    /// The asset path at the root of this error, if any.
    pub fn asset_path(&self) -> &str {
        match self {
            Self::AssetLoad { path, .. } => path,
            Self::SpawnSequence { source, .. } => source.asset_path(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EffectError>;
