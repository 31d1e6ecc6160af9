//! Read-only entity model consumed by the generators.
//!
//! Entities reference each other by [`EntityId`] only. Generators resolve those
//! ids lazily against the [`World`] snapshot, so cyclic references between
//! menus and announcements never become cyclic object graphs.

mod destination;
mod entities;
mod id;
mod world;

pub use destination::{Destination, DestinationKind, YesNo};
pub use entities::{
    Agent, Announcement, AudioFile, DtmfConfig, IvrEntry, IvrEntryKind, IvrMenu, MiscApplication,
    Recording, RecordingRef, Repeat,
};
pub use id::EntityId;
pub use world::World;
