//! The append-only store (§4.C), the typed `Stream` wrapper (§4.D), and the
//! integrity verifier (§4.E).

mod error;
mod filter;
mod raw;
mod stream;
mod verify;

pub use error::StreamError;
pub use filter::{Filterable, ReadFilter};
pub use raw::RawStore;
pub use stream::Stream;
pub use verify::{IntegrityError, IntegrityErrorKind, IntegrityReport};
