pub mod errors;
pub mod ids;
pub mod page;

pub use errors::OpError;
pub use ids::SessionId;
pub use page::{CatalogImage, ResultPage};
