// Copyright 2025 the Loupe Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors reported by the document model.

use alloc::string::String;

use thiserror::Error;

use crate::types::ElementId;

/// Errors that can occur when querying the [`Document`](crate::Document).
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum DomError {
    /// The element was removed, or is not attached under the body.
    #[error("element {0:?} is not attached to the document")]
    Detached(ElementId),

    /// A selector could not be parsed.
    #[error("invalid selector `{selector}`: {reason}")]
    InvalidSelector {
        /// The offending selector text.
        selector: String,
        /// What went wrong.
        reason: &'static str,
    },
}
