// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Persistence concerns used by the ml and application layers:
//
//   checkpoint.rs — single-file model checkpoint: config,
//                   vocabulary and both networks' weights,
//                   written atomically, versioned
//
//   metrics.rs    — per-epoch D/G losses to a CSV file
//
// Reference: Burn Book §5 (Checkpointing)

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Training metrics CSV logger
pub mod metrics;
