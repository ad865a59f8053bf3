//! Video geometry: conversion presets, round-message crop adjustments and
//! ffprobe-based source probing.

pub mod preset;
pub mod probe;

pub use preset::{CropRect, PresetVideoConverter, VideoAdjustments, VideoPreset};
pub use probe::{probe_duration, probe_video};
