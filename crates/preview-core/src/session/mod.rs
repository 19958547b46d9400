//! Preview session lifecycle
//!
//! A preview session is created once, mutated only through
//! [`SessionStore::update`], and disappears on explicit invalidation or when
//! its fixed TTL lapses.

mod store;
pub mod types;


pub use store::{SessionConfig, SessionStore, UpdateOutcome};
pub use types::{
    Branding, BrandingInput, ColorPalette, ColorPaletteInput, CreateSessionInput, FontPair,
    FontPairInput, NavPage, NavigationState, PageInput, PreviewSession, SessionId, SessionPage,
    SessionSummary, SessionUpdate,
};
