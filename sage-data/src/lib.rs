// Copyright (c) 2026, Sage Developers
// Licensed under the BSD 3-Clause License

use dirs::home_dir;

pub fn get_sage_cache() -> std::path::PathBuf {
    if let Ok(sage_cache) = std::env::var("SAGE_CACHE") {
        if !sage_cache.is_empty() {
            return std::path::PathBuf::from(sage_cache);
        }
    }

    if let Some(home) = home_dir() {
        return home.join(".sage_cache");
    }

    std::path::PathBuf::from("/.sage_cache")
}

pub mod data;
pub mod request;
