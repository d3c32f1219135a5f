//! Application layer: use-cases over the shared form, the presenters that
//! expose them to views, and the request pipeline that turns a validated
//! form into a token.
//!
//! Network work runs on a `tokio` runtime; every callback the host sees is
//! delivered through the serial [`delivery`] queue instead.

pub mod context;
pub mod delivery;
pub mod pipeline;
pub mod presenter;
pub mod use_case;
