/// Rendering layer. Every function here draws from `AppState` and never
/// fetches; data transformations live in `crate::data`.
pub mod charts;
pub mod overview;
pub mod panels;
pub mod rankings;
