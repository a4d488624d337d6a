// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Crate-level error type uniting the pure-logic module errors.

use crate::config::ConfigError;
use crate::state::{GuardError, IllegalTransition};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    IllegalTransition(#[from] IllegalTransition),

    #[error(transparent)]
    Guard(#[from] GuardError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
