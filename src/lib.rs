//! Substrate grows a city-like web of cracks and paints sand-like color beside them.
//!
//! A scene is computed by several replicas in parallel. Every replica runs the full, seeded
//! simulation and paints only its own vertical band, so no growth state is ever shared:
//!
//! - Configure a [`SceneOptions`]
//! - Create an [`Orchestrator`] with a [`SceneSink`] and a [`PreferenceStore`]
//! - [`Orchestrator::run`] scenes, optionally calibrating the replica count first
#![forbid(unsafe_code)]

pub mod calibration;
pub mod config;
pub mod encode;
pub mod foundation;
pub mod palette;
pub mod render;
pub mod replica;
pub mod scene;
pub mod sim;
pub mod store;

pub use crate::foundation::core::{BlendMode, Point, Rgba8, Viewport, WorldSize};
pub use crate::foundation::error::{SubstrateError, SubstrateResult};
pub use crate::foundation::random::{SeededRandom, seed_from_str};

pub use crate::calibration::{CalibrationRecord, CalibrationStep, Calibrator};
pub use crate::config::SceneOptions;
pub use crate::encode::png::PngSink;
pub use crate::encode::sink::{InMemorySink, NullSink, SceneFrame, SceneSink, SinkConfig};
pub use crate::palette::Palette;
pub use crate::render::canvas::{Canvas, Surface};
pub use crate::render::frame::{FrameRGBA, ReplicaSlice, compose_slices};
pub use crate::replica::ReplicaSet;
pub use crate::scene::fingerprint::{SceneFingerprint, scene_fingerprint};
pub use crate::scene::orchestrator::{Orchestrator, OrchestratorHandle, RunSummary, SceneState};
pub use crate::sim::engine::{CrackBudget, Engine, EngineHost, EngineSignal, ReplicaConfig};
pub use crate::store::{CalibratedPreference, JsonFileStore, MemoryStore, PreferenceStore};
