pub mod media;

pub use media::{MediaKind, MediaPayload, MediaReference, MediaSource, ResolvedMedia};
