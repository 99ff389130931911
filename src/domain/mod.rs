pub mod item;
pub mod post;
pub mod session;

pub use item::FeedItem;
pub use post::{BlobRef, ByteSlice, Embed, ExternalCard, Facet, FacetFeature, PostRecord};
pub use session::{Credentials, Session};
