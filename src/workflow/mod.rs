pub mod full_translate;
pub mod paper_flow;

pub use full_translate::{parse_driver_output, DriverOutcome, FullTranslateResult, FullTranslator};
pub use paper_flow::PaperFlow;
