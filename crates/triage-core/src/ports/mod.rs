//! Ports: the seams between the engine and the remote service.
//!
//! Service ports are async (`async_trait`) but the engine awaits every call
//! in sequence. `impls::memory::InMemoryProject` implements all of them.

pub mod catalog;
pub mod clock;
pub mod grouping;
pub mod id_generator;
pub mod mutation;
pub mod source;

pub use self::catalog::Catalog;
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::grouping::GroupingService;
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::mutation::MutationService;
pub use self::source::ItemSource;
