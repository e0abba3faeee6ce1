/// A single analyzed token and its position in the token stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub position: u32,  // Position before filtering; stopword removal leaves gaps
}

impl Token {
    pub fn new(text: impl Into<String>, position: u32) -> Self {
        Token {
            text: text.into(),
            position,
        }
    }
}
