//! Hybrid retrieval and ranking for agent notes, backed by `SQLite`.

// Strict rules against unsafe or non-idiomatic code
#![deny(unsafe_code)] // Only the sqlite-vec loader opts out
#![warn(missing_docs)]
#![warn(dead_code)]
#![warn(unused_imports)]
#![warn(unused_variables)]
#![deny(unused_must_use)]
#![deny(nonstandard_style)]
#![forbid(unsafe_op_in_unsafe_fn)]
// Clippy discipline
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::print_stdout)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
#![deny(clippy::unwrap_in_result)]
#![deny(clippy::redundant_clone)]
#![deny(clippy::too_many_arguments)]
#![deny(clippy::cognitive_complexity)]
#![deny(overflowing_literals)]
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::float_cmp
    )
)]

/// Note recall components (`SQLite`, retrieval, ranking, scoring).
pub mod memory;
