mod adaptive;
mod system;

pub use adaptive::WasmAdaptiveGrid;
pub use system::WasmFractal;
