//! Askama views for post fragments and the timeline.

pub mod views;
