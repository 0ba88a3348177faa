pub mod ai;
pub mod dialogue;
pub mod extract;
pub mod ner;
pub mod scheduling;
