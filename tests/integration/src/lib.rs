//! End-to-end tests for the realm core live in `tests/`.
