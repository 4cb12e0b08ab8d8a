pub mod counter;
pub mod document;
pub mod graph;

pub use counter::ViewCounter;
pub use document::ProductRepository;
pub use graph::BrandGraph;
