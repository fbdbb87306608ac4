// SPDX-License-Identifier: MPL-2.0

//! Output pipelines
//!
//! ```text
//! ┌────────────────┐     ┌───────────────────┐     ┌──────────────┐
//! │ RenderedSymbol │ ──▶ │  Export Pipeline  │ ──▶ │  PNG / SVG   │
//! │ (module grid)  │     │  - Rasterize      │     │   file       │
//! │                │     │  - Encode         │     │              │
//! │                │     │  - Atomic write   │     │              │
//! └────────────────┘     └───────────────────┘     └──────────────┘
//! ```
//!
//! # Modules
//!
//! - [`export`]: Symbol rasterization and file export

pub mod export;
