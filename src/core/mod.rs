pub mod error;
pub mod types;
pub mod value;

pub use error::{CatalogError, Result, StoreError, StoreKind, StoreResult};
pub use types::{
    BrandId, ListQuery, Page, ProductId, ProductInput, ProductPatch, ProductRecord,
    ProductStatus, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};
pub use value::AttrValue;
