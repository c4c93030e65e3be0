// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types that define what the system talks about:
// the vocabulary, generation outcomes and the fallback policy,
// and the traits the other layers implement.
//
// Rules for this layer:
//   - NO Burn framework types
//   - NO file I/O or network calls

/// Token <-> index mapping with the four reserved markers
pub mod vocabulary;

/// Generation outcomes, story cleanup and fallback selection
pub mod story;

/// Core abstractions (traits) that other layers implement
pub mod traits;
