// SPDX-License-Identifier: GPL-3.0-or-later

//! Thin language-model client used to obtain playlist recommendations.
//!
//! Prompt construction and response interpretation live with the caller; this
//! crate only ships a system/user message pair to the provider and hands back
//! the completion text.

pub mod completion;

pub use completion::{ChatRequest, LlmClient, LlmClientBuilder, LlmError, Provider};
