pub mod core;
pub mod embedding;
pub mod llm;
pub mod rag;
pub mod scraper;
pub mod server;
pub mod state;
pub mod vector_math;
