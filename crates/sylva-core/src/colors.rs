//! Deterministic category → color assignment.
//!
//! Known codes keep their fixed colors. Every other label draws from the
//! cyclic palette with fixed colors removed, in lexicographic label order, so
//! a category set always produces the same mapping regardless of input order.
//! The palette cursor lives inside each [`ColorMap`]; two maps never share it.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::config::ColorScheme;

/// Total mapping from category label to display color.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColorMap {
    assigned: BTreeMap<String, String>,
    #[serde(skip)]
    known: BTreeMap<String, String>,
    #[serde(skip)]
    free: Vec<String>,
    #[serde(skip)]
    cursor: usize,
}

impl ColorMap {
    fn new(scheme: &ColorScheme) -> Self {
        let reserved: BTreeSet<&str> = scheme.known.values().map(String::as_str).collect();
        let mut free: Vec<String> = scheme
            .palette
            .iter()
            .filter(|c| !reserved.contains(c.as_str()))
            .cloned()
            .collect();
        if free.is_empty() {
            // Every palette entry is reserved; cycling through the raw palette
            // is the only option left.
            free = scheme.palette.clone();
        }
        Self { assigned: BTreeMap::new(), known: scheme.known.clone(), free, cursor: 0 }
    }

    fn next_free(&mut self) -> String {
        if self.free.is_empty() {
            return "grey".to_string();
        }
        let c = self.free[self.cursor % self.free.len()].clone();
        self.cursor += 1;
        c
    }

    fn assign(&mut self, label: &str) -> String {
        if let Some(c) = self.assigned.get(label) {
            return c.clone();
        }
        let color = match self.known.get(label) {
            Some(c) => c.clone(),
            None => self.next_free(),
        };
        self.assigned.insert(label.to_string(), color.clone());
        color
    }

    /// Color for `label`, drawing the next free palette entry for labels not
    /// seen before.
    pub fn color(&mut self, label: &str) -> String {
        self.assign(label)
    }

    /// Color for an already assigned or known label, without drawing.
    pub fn get(&self, label: &str) -> Option<&str> {
        self.assigned
            .get(label)
            .or_else(|| self.known.get(label))
            .map(String::as_str)
    }

    pub fn assigned(&self) -> &BTreeMap<String, String> {
        &self.assigned
    }

    pub fn len(&self) -> usize {
        self.assigned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assigned.is_empty()
    }
}

/// Assign colors to a set of category labels. `None` labels are ignored.
pub fn assign_colors<'a, I>(labels: I, scheme: &ColorScheme) -> ColorMap
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let sorted: BTreeSet<&str> = labels.into_iter().flatten().collect();
    let mut map = ColorMap::new(scheme);
    for label in sorted {
        map.assign(label);
    }
    map
}
