pub mod candidates;
pub mod metadata;
pub mod page_writer;
pub mod translator;

pub use candidates::{Candidate, CandidateSource, HfCandidateSource};
pub use metadata::{ArxivMetadataSource, MetadataSource, PaperMeta};
pub use translator::{OpenAiTranslator, Translation, TranslationBackend, TranslationConfig};
