//! # logchain testkit
//!
//! Testing utilities for logchain.
//!
//! - **Golden vectors**: fixed records with checksums computed independently
//! - **Generators**: proptest strategies for levels, values and records
//! - **Fixtures**: an enriched in-memory JSON log plus helpers to shuffle
//!   and tamper with its lines
//!
//! ## Golden Vectors
//!
//! ```rust
//! use logchain_testkit::vectors::all_vectors;
//!
//! for vector in all_vectors() {
//!     assert_eq!(vector.compute(), vector.expected, "{}", vector.name);
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use logchain_testkit::generators::record;
//!
//! proptest! {
//!     #[test]
//!     fn enriched_records_verify(record in record()) {
//!         // emit through a LogFixture, then scan it
//!     }
//! }
//! ```
//!
//! ## Fixtures
//!
//! ```rust
//! use logchain_core::{Level, Record};
//! use logchain_testkit::fixtures::{chained_options, LogFixture};
//!
//! let fixture = LogFixture::new(chained_options(false));
//! fixture.emit(Record::new(Level::INFO, "hello")).unwrap();
//! assert!(fixture.scan().unwrap().is_clean());
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{chained_options, scan_lines, shuffle_lines, tamper, LogFixture};
pub use vectors::{all_vectors, chain_vector, verify_all_vectors, GoldenVector};
