//! The reference harness's external I/O (spec §6): reading the ordered
//! event stream from a text file and writing the three output
//! artifacts. Kept out of the core engine per §1 Non-goals ("the textual
//! input/output file format used by the reference harness" is an
//! external collaborator) — this module exists only so the CLI binary
//! has somewhere to read from and write to.

pub mod line_format;
