// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Workflow coordination only:
//   - no tensor code (Layer 5)
//   - no argument parsing or HTTP types (Layers 1 and server)
//
// Reference: Clean Architecture pattern

/// The training workflow
pub mod train_use_case;

/// Story generation with fallbacks, and model status
pub mod generate_use_case;

/// Shared, swappable slot for the served model
pub mod model_handle;
