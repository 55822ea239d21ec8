//! seqdraw: a desktop editor for sequence-style diagrams
//!
//! Actors are boxes along the top of the canvas with lifelines below them.
//! Interactions are labelled arrows between two actors, stacked top to bottom
//! in list order. The canvas exports to PNG (optionally with a transparent
//! background) or JPEG.

pub mod app;
pub mod config;
pub mod domain;
pub mod export;
pub mod input;
pub mod platform;
pub mod ui;
