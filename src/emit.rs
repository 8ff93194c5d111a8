//! Serializing the rewritten token stream back to text.

use crate::error::CompileError;
use crate::scan::{Token, TokenKind};

/// Build an emission error carrying the token stream as JSON.
pub fn emission_error(message: impl Into<String>, tokens: &[Token]) -> CompileError {
    let tokens = serde_json::to_string_pretty(tokens)
        .unwrap_or_else(|e| format!("<token dump unavailable: {e}>"));
    CompileError::Emission {
        message: message.into(),
        tokens,
    }
}

/// Concatenate `leading + text` of every token after checking that the
/// stream is well formed: brackets balance and every generated `+` sits
/// between two operands.
pub fn emit(tokens: &[Token]) -> Result<String, CompileError> {
    check_brackets(tokens).map_err(|m| emission_error(m, tokens))?;
    check_concatenation(tokens).map_err(|m| emission_error(m, tokens))?;
    Ok(tokens
        .iter()
        .flat_map(|t| [t.leading.as_str(), t.text.as_str()])
        .collect())
}

fn check_brackets(tokens: &[Token]) -> Result<(), String> {
    let mut open: Vec<&Token> = Vec::new();
    for t in tokens.iter().filter(|t| t.kind == TokenKind::Op) {
        let expected = match t.text.as_str() {
            "(" | "[" | "{" => {
                open.push(t);
                continue;
            }
            ")" => "(",
            "]" => "[",
            "}" => "{",
            _ => continue,
        };
        match open.pop() {
            Some(o) if o.text == expected => {}
            Some(o) => {
                return Err(format!(
                    "line {}: '{}' closes '{}' from line {}",
                    t.line, t.text, o.text, o.line
                ));
            }
            None => return Err(format!("line {}: unmatched '{}'", t.line, t.text)),
        }
    }
    match open.last() {
        Some(o) => Err(format!("line {}: '{}' never closed", o.line, o.text)),
        None => Ok(()),
    }
}

fn check_concatenation(tokens: &[Token]) -> Result<(), String> {
    let code: Vec<&Token> = tokens.iter().filter(|t| !t.is_layout()).collect();
    for (i, t) in code.iter().enumerate() {
        if !(t.synthetic && t.is_op("+")) {
            continue;
        }
        let before = i.checked_sub(1).and_then(|j| code.get(j));
        let after = code.get(i + 1);
        let bad_before = before.is_none_or(|b| ["(", "[", ",", "+"].iter().any(|op| b.is_op(op)));
        let bad_after = after.is_none_or(|a| {
            a.ends_line() || [")", "]", ",", "+"].iter().any(|op| a.is_op(op))
        });
        if bad_before || bad_after {
            return Err(format!("line {}: dangling '+' in generated code", t.line));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::{fragment, scan};

    #[test]
    fn identity_on_scanned_source() {
        let src = "x = [1, 2]\nif x:\n    print(x)  # hi\n";
        assert_eq!(emit(&scan(src).unwrap()).unwrap(), src);
    }

    #[test]
    fn unbalanced_generated_brackets_rejected() {
        let src = "x\n";
        let mut tokens = scan(src).unwrap();
        let anchor = tokens[0].clone();
        tokens.splice(0..0, fragment("run([", &anchor).unwrap());
        let err = emit(&tokens).unwrap_err();
        assert!(matches!(err, CompileError::Emission { .. }));
        assert!(err.token_dump().unwrap().contains("\"synthetic\": true"));
    }

    #[test]
    fn dangling_plus_rejected() {
        let anchor = scan("x\n").unwrap().remove(0);
        let tokens = fragment("run(['a'+])", &anchor).unwrap();
        assert!(emit(&tokens).is_err());
        let tokens = fragment("run([+'a'])", &anchor).unwrap();
        assert!(emit(&tokens).is_err());
        let tokens = fragment("run(['a'+'b', obj2args(x)+'c'])", &anchor).unwrap();
        assert!(emit(&tokens).is_ok());
    }

    #[test]
    fn source_unary_plus_allowed() {
        let src = "f(+1, [+2])\n";
        assert_eq!(emit(&scan(src).unwrap()).unwrap(), src);
    }
}
