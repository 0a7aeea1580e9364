//! Pipeline-level scenario tests.
