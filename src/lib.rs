//! Form state controller for create/edit/clone dialogs.
//!
//! [`form::FormController`] owns values, submission errors and the
//! submitting/touched flags; [`form::FieldBinding`] and [`form::FieldGroup`]
//! derive per-field identity and decoration from it. Submission outcomes pass
//! through an [`guard::AsyncGuard`] so superseded or torn-down submissions never
//! write state. [`error_tree`] classifies and renders error payloads of any
//! shape, with or without a controller.

pub mod error_tree;
pub mod form;
pub mod guard;

pub use error_tree::{ErrorTree, render};
pub use form::{FormController, FormOptions, FormSnapshot, FormValues};
pub use guard::{AsyncGuard, Settlement};
