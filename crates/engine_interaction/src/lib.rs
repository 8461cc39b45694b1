//! # engine_interaction
//!
//! Client-triggered interaction dispatch: the seam between a client's input
//! packet and the ECS mutations it causes. Handlers observe interactions as
//! immutable data and return a verdict rather than mutating a shared event
//! object in place (see [`interaction::HandlerResult`]).
//!
//! This crate provides:
//!
//! - [`interaction`] — the [`interaction::Interaction`] trait and the
//!   [`interaction::HandlerResult`] dispatch-chain verdict.
//! - [`dispatch`] — [`dispatch::InteractionDispatcher`], bounded-window
//!   buffering for interactions that need client-supplied data before they
//!   can run.
//! - [`projectile`] — [`projectile::ProjectileInteraction`], the canonical
//!   ballistic-firing interaction built on `engine_physics::projectile`.
//! - [`error`] — [`error::InteractionError`].

pub mod dispatch;
pub mod error;
pub mod interaction;
pub mod projectile;

pub use dispatch::InteractionDispatcher;
pub use error::InteractionError;
pub use interaction::{dispatch_chain, HandlerResult, Interaction, WaitForData};
pub use projectile::{ClientAimData, ProjectileInteraction, ProjectileSyncData};
