//! Workspace root for the rider client crates. Holds the shared git hooks;
//! the code lives under `crates/`.
