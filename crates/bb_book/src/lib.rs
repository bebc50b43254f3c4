pub mod assembler;
pub mod export;
pub mod format;
pub mod organize;

pub use assembler::{AssemblerConfig, Assembly, ChapterAssembler};
pub use export::{load_structure, parse_structure, write_structure};
pub use format::{ArticleFormatter, FormatConfig};
pub use organize::BookOrganizer;
