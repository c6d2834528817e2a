//! Infrastructure layer: every OS or hardware boundary sits behind a
//! trait defined here, with an always-compiled mock implementation so
//! the application layer is testable on machines with no deck, no
//! display server, and no pointer backend.

pub mod capture;
pub mod deck;
pub mod imaging;
pub mod pointer;
pub mod storage;
