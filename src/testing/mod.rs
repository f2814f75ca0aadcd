//! Test doubles for exercising agents and pipelines without a model server

pub mod mocks;

pub use mocks::{RecordedCall, ScriptedProvider};
