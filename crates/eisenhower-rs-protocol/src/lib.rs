//! Wire and storage types shared by every Eisenhower context.
//!
//! The page-resident context, the background dispatcher and the store all
//! speak in these types; nothing here performs IO.

mod category;
mod message;
mod record;
mod settings;

pub use category::{Category, Preset};
pub use message::{Notice, NoticeLevel, Request, Response};
pub use record::{ItemKind, PriorityRecord, PriorityMap};
pub use settings::Settings;
