//! GPIO pin assignments for the EdgeToggle board.
//!
//! Single source of truth. Every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Toggled output
// ---------------------------------------------------------------------------

/// Digital output driven by the toggle task.  Configured in input/output
/// mode so the current level can be read back.
pub const OUTPUT_GPIO: i32 = 23;

// ---------------------------------------------------------------------------
// Edge input (active-low with internal pull-up)
// ---------------------------------------------------------------------------

/// Momentary input; a falling edge raises the edge interrupt.
pub const INPUT_GPIO: i32 = 22;
