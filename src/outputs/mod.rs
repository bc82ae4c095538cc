//! Dataset output.
//!
//! # Submodules
//!
//! - [`dataset`]: Loads the cumulative CSV dataset and writes it back in full
//!
//! # Output Structure
//!
//! ```text
//! data/
//! └── raw/
//!     └── data.csv   # every article ever collected, ordered by id
//! ```

pub mod dataset;
