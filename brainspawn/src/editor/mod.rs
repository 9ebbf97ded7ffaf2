//! Configuration editor support: wire protocol, single-panel guard, echo
//! suppression and the editable draft.

pub mod draft;
pub mod echo;
pub mod panel;
pub mod protocol;
