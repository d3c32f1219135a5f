//! Domain types: the form, its validation rules, the wire shapes and the
//! ports the application layer talks through.

pub mod card;
pub mod country;
pub mod form;
pub mod ports;
pub mod token;
pub mod validation;
