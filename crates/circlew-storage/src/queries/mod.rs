// SPDX-FileCopyrightText: 2026 CircleW Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query functions over the CircleW tables.
//!
//! Each module accepts `&Database` and routes through the single background
//! connection.

pub mod circles;
pub mod meetups;
pub mod signals;
