//! Small SAT Solver for OpenTPG
//!
//! A deliberately compact DPLL solver used by the test-generation engine.
//! It favors predictability over raw speed: two-watched-literal unit
//! propagation, a fixed variable order, chronological backtracking, and a
//! conflict budget that surfaces `Unknown` instead of running away on hard
//! cones. The engine maps `Unknown` to an aborted fault.
//!
//! The solver is fully deterministic: the same clause set always produces
//! the same result and, when satisfiable, the same model.
//!
//! # Example
//!
//! ```
//! use opentpg_sat::{Lit, SatResult, Solver};
//!
//! let mut solver = Solver::new();
//! let a = solver.new_var();
//! let b = solver.new_var();
//! solver.add_clause(&[Lit::pos(a), Lit::pos(b)]);
//! solver.add_clause(&[Lit::neg(a)]);
//!
//! match solver.solve() {
//!     SatResult::Sat(model) => {
//!         assert!(!model.value(a));
//!         assert!(model.value(b));
//!     }
//!     other => panic!("expected SAT, got {other:?}"),
//! }
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![deny(unused_must_use)]
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod solver;
pub mod types;

pub use solver::Solver;
pub use types::{Lit, Model, SatResult, Var};
