//! # strumkit-core
//!
//! Backend library for strumkit. Holds the application state, action
//! dispatch, the chord library, rhythm patterns and their editor, and
//! persistence, independent of any UI.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use strumkit_audio::AudioEngine;
//! use strumkit_core::config::Config;
//! use strumkit_core::state::AppState;
//! use strumkit_core::transport::Transport;
//! use strumkit_core::dispatch::{apply_side_effects, dispatch_action};
//!
//! let config = Config::load();
//! let mut state = AppState::from_config(&config);
//! let transport = Transport::new(
//!     Arc::new(AudioEngine::new(config.engine_settings())),
//!     config.scheduler_timing(),
//! )?;
//!
//! let mut effects = Vec::new();
//! let result = dispatch_action(&action, &mut state, &mut effects);
//! apply_side_effects(&effects, &transport);
//!
//! // Each frame, fold playback feedback into the state.
//! state.apply_feedback(transport.main().drain_feedback(), transport.preview().drain_feedback());
//! ```
//!
//! ## Module Overview
//!
//! - [`state`]: `AppState` and the per-session `PlaybackView`
//! - [`action`]: `Action` and its sub-enums, `DispatchResult`
//! - [`dispatch`]: `dispatch_action`, `PlaybackEffect`, `persist`
//! - [`transport`]: the practice player and editor preview over one output
//! - [`chords`]: chord JSON ingestion and the per-instrument library
//! - [`patterns`]: presets and custom patterns, active selection and tempo
//! - [`editor`]: grid editing rules and the editor session
//! - [`practice`]: practice set and saved sets
//! - [`persistence`]: SQLite document store and upgrades of old formats
//! - [`export`]: JSON export of user data
//! - [`config`]: TOML configuration

pub mod action;
pub mod chords;
pub mod config;
pub mod dispatch;
pub mod editor;
pub mod export;
pub mod patterns;
pub mod persistence;
pub mod practice;
pub mod state;
pub mod transport;
