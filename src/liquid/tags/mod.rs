//! Custom tags extending the base Liquid grammar.
//!
//! Each tag is a self-contained parser + renderer: it owns its argument
//! grammar and (for block tags) its balanced content capture, and its render
//! step contains failures locally so one faulty tag never takes down the
//! whole page.

pub mod javascript;
pub mod paginate;
pub mod section;
pub mod style;
