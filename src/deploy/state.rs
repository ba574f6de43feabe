// ABOUTME: Release flow state marker types for the type state pattern.
// ABOUTME: Zero-sized types enforce valid phase ordering at compile time.

/// Initial state: release recorded as pending.
/// Available actions: `build()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Pending;

/// Artifact built and tagged locally.
/// Available actions: `transport()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Built;

/// Artifact pushed to the registry and pulled onto the target host.
/// Available actions: `migrate()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Transported;

/// Schema migrations applied (or none declared).
/// Available actions: `await_gate()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Migrated;

/// Health gate passed: the new artifact answers healthy.
/// Available actions: `promote()`
#[derive(Debug, Clone, Copy, Default)]
pub struct HealthChecked;
