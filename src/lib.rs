//! Todo++: a single-screen task list with a coordinates readout and a photo
//! attachment, drawn in the terminal.

pub mod app;
