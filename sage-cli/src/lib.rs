// Copyright (c) 2026, Sage Developers
// Licensed under the BSD 3-Clause License

pub mod download;
pub mod segment;
