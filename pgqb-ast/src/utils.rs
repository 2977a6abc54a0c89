use pgqb_core::{Special, Token};

/// Emits `( body )` around whatever `body` pushes.
pub(crate) fn parenthesized(out: &mut Vec<Token>, body: impl FnOnce(&mut Vec<Token>)) {
    out.push(Token::Special(Special::LeftParen));
    body(out);
    out.push(Token::Special(Special::RightParen));
}
