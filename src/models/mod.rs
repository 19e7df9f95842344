pub mod grade;
pub mod image_ref;
pub mod loaders;
pub mod worksheet;

pub use grade::GradeLevel;
pub use image_ref::ImageRef;
pub use loaders::{load_request_file, parse_request};
pub use worksheet::{GenerationRequestParams, Section, SectionKind, WorksheetDocument};
