mod common;
mod progress;
mod submission;
mod validation;
