// SPDX-License-Identifier: MIT

pub mod access;
pub mod ci;
pub mod cleanup;
pub mod configuration;
pub mod deployment;
pub mod error;
pub mod orchestrator;
pub mod package;
pub mod removal;
pub mod retry;
pub mod schedule;

#[cfg(test)]
pub(crate) mod test_utils;
