//! Client side of the external text-correction service: prompt assembly,
//! the synchronous HTTP call, response parsing, and the placeholder guard
//! that keeps corrections from mangling interpolation tokens.

mod client;
mod placeholders;
mod prompts;

pub use client::{parse_numbered_response, CorrectError, CorrectionClient};
pub use placeholders::{extract_placeholders, placeholders_preserved};
pub use prompts::{is_german, ToneMode};
