//! Process-wide name → function table.
//!
//! Names are stored upper-cased so lookups are case-insensitive.

use crate::function::Function;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use std::sync::Arc;

static REG: Lazy<DashMap<String, Arc<dyn Function>>> = Lazy::new(DashMap::new);

/// Add or replace a function under its own name.
pub fn register(f: Arc<dyn Function>) {
    REG.insert(f.name().to_ascii_uppercase(), f);
}

pub fn get(name: &str) -> Option<Arc<dyn Function>> {
    REG.get(&name.to_ascii_uppercase())
        .map(|v| Arc::clone(v.value()))
}

