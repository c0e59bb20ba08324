// Copyright (c) 2026, Sage Developers
// Licensed under the BSD 3-Clause License

pub mod constant;
pub mod cv;
pub mod error;
pub mod im;
pub mod io;
pub mod ut;
