// Copyright (c) 2026, Sage Developers
// Licensed under the BSD 3-Clause License

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use chrono;

// Monotonic counter folded into the suffix so repeated calls within the
// same timestamp still produce distinct names
static NAME_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a unique name of the form `{prefix}_{timestamp}_{suffix}`.
///
/// The timestamp is second resolution (YYYYmmdd_HHMMSS) and the suffix is
/// an 8-character hex token; two successive calls never collide within a
/// process.
///
/// # Arguments
///
/// * `prefix` - Leading component of the generated name
///
/// # Examples
///
/// ```
/// use sage_core::ut::generate_unique_name;
///
/// let a = generate_unique_name("mask");
/// let b = generate_unique_name("mask");
///
/// assert!(a.starts_with("mask_"));
/// assert_ne!(a, b);
/// ```
pub fn generate_unique_name(prefix: &str) -> String {
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");

    let counter = NAME_COUNTER.fetch_add(1, Ordering::Relaxed);
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos() as u64)
        .unwrap_or(0);

    let suffix = ((nanos & 0xffff) << 16) | (counter & 0xffff);

    format!("{}_{}_{:08x}", prefix, timestamp, suffix)
}
