//! End-to-end scenarios for the contribution engine live in `tests/`.
