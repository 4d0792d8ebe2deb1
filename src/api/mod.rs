// =============================================================================
// API Module
// =============================================================================
//
// Thin HTTP shell over the signal engine. No decision logic lives here:
// handlers parse the body, call the engine, and render the result.

pub mod rest;
