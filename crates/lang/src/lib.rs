//! gdsc-lang: the version-aware Text Tokenizer (spec section 4.4) and
//! Source Reconstructor (spec section 4.5).

pub mod reconstruct;
pub mod tokenizer;

pub use reconstruct::reconstruct;
pub use tokenizer::{tokenize, TokenPayload, TokenRecord, TokenStream};
