pub mod conversion;
pub mod document;
pub mod snapshot;

pub use conversion::*;
pub use document::*;
pub use snapshot::*;
