//! Domain logic for the DeskRelay host.
//!
//! This module contains pure state and arithmetic with no infrastructure
//! dependencies.
//!
//! # What is "domain" in Clean Architecture? (for beginners)
//!
//! The innermost layer of the application is the **domain**.  Domain code has
//! no imports from OS APIs, network libraries, or UI frameworks, so it can be
//! compiled and unit-tested anywhere without setup.  The host agent's
//! application layer (in `deskrelay-host`) depends on these types; they never
//! depend back on it.

/// Modifier-key press tracking.
pub mod modifiers;

/// Coordinate scaling and scroll tick arithmetic.
pub mod pointer;
