//! Maps a [`ComparisonRun`] onto display slots, one per variant.
//!
//! Pure: no I/O, no mutation. Every variant gets a slot on every call so the
//! layout is stable for the whole run.

use crate::compare::{ComparisonRun, Variant};

pub const NO_RESPONSE: &str = "No response yet.";
pub const LOADING: &str = "Loading...";

/// Content of one variant's slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot<'a> {
    /// Nothing received and not currently requested.
    Empty,
    /// The variant's request is in flight.
    Loading,
    Response(&'a str),
}

impl<'a> Slot<'a> {
    /// Text to display for this slot.
    pub fn text(&self) -> &'a str {
        match self {
            Slot::Empty => NO_RESPONSE,
            Slot::Loading => LOADING,
            Slot::Response(text) => text,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SlotView<'a, V> {
    pub variant: &'a V,
    pub heading: String,
    pub slot: Slot<'a>,
}

/// View-level status shown above the slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Banner<'a> {
    pub error: Option<&'a str>,
    pub loading: bool,
}

/// One slot per variant, in variant order.
pub fn bind<V: Variant>(run: &ComparisonRun<V>) -> Vec<SlotView<'_, V>> {
    let cursor = run.cursor();
    let running = run.is_running();
    run.variants()
        .iter()
        .enumerate()
        .map(|(i, variant)| {
            let slot = match run.results().get(variant) {
                Some(text) => Slot::Response(text),
                None if running && i == cursor => Slot::Loading,
                None => Slot::Empty,
            };
            SlotView {
                variant,
                heading: variant.heading(),
                slot,
            }
        })
        .collect()
}

pub fn banner<V: Variant>(run: &ComparisonRun<V>) -> Banner<'_> {
    Banner {
        error: run.error_message(),
        loading: run.is_running(),
    }
}
