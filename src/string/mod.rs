//! Zero-copy byte-string views, byte sets and search
//!
//! Nothing here owns or copies text: [`StrView`] borrows, [`Charset`] is a
//! 256-bit membership table, and the search functions return offsets.

pub mod charset;
pub mod search;
mod str_view;

pub use charset::Charset;
pub use search::{find, find_byte, find_charset, find_not_charset, rfind, rfind_byte, rfind_charset, rfind_not_charset};
pub use str_view::{equal, order, Matches, Split, StrView};
