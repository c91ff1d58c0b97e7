//! Tokenizer for lambda bodies.

use crate::error::ParseError;

#[derive(Debug, Clone, PartialEq)]
pub enum Tok {
    Var(String),
    Ident(String),
    Int(i64),
    Float(f64),
    Str(String),
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Semi,
    FatArrow,
    Arrow,
    DoubleColon,
    Question,
    Colon,
    Coalesce,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Dot,
    Bang,
    Assign,
    Eq,
    NotEq,
    Identical,
    NotIdentical,
    Lt,
    Le,
    Gt,
    Ge,
    AndAnd,
    OrOr,
}

impl Tok {
    pub fn describe(&self) -> String {
        match self {
            Tok::Var(v) => format!("${}", v),
            Tok::Ident(i) => format!("`{}`", i),
            Tok::Int(i) => i.to_string(),
            Tok::Float(f) => f.to_string(),
            Tok::Str(s) => format!("{:?}", s),
            other => format!("{:?}", other),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub tok: Tok,
    pub pos: usize,
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

pub fn tokenize(src: &str) -> Result<Vec<Token>, ParseError> {
    let chars: Vec<(usize, char)> = src.char_indices().collect();
    let mut out = Vec::new();
    let mut i = 0;

    let peek = |i: usize| chars.get(i).map(|&(_, c)| c);

    while i < chars.len() {
        let (pos, c) = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }

        if c == '$' {
            let start = i + 1;
            let mut j = start;
            while j < chars.len() && is_ident_char(chars[j].1) {
                j += 1;
            }
            if j == start || !is_ident_start(chars[start].1) {
                return Err(ParseError::UnexpectedChar { ch: c, pos });
            }
            let name: String = chars[start..j].iter().map(|&(_, c)| c).collect();
            out.push(Token {
                tok: Tok::Var(name),
                pos,
            });
            i = j;
            continue;
        }

        if is_ident_start(c) || c == '\\' {
            let mut j = i;
            while j < chars.len() && (is_ident_char(chars[j].1) || chars[j].1 == '\\') {
                j += 1;
            }
            let name: String = chars[i..j].iter().map(|&(_, c)| c).collect();
            out.push(Token {
                tok: Tok::Ident(name.trim_start_matches('\\').to_string()),
                pos,
            });
            i = j;
            continue;
        }

        if c.is_ascii_digit() || (c == '.' && peek(i + 1).is_some_and(|n| n.is_ascii_digit())) {
            let (tok, next) = lex_number(&chars, i);
            out.push(Token { tok, pos });
            i = next;
            continue;
        }

        if c == '\'' || c == '"' {
            let (s, next) = lex_string(&chars, i)?;
            out.push(Token {
                tok: Tok::Str(s),
                pos,
            });
            i = next;
            continue;
        }

        let three: String = chars[i..chars.len().min(i + 3)].iter().map(|&(_, c)| c).collect();
        let (tok, width) = if three.starts_with("===") {
            (Tok::Identical, 3)
        } else if three.starts_with("!==") {
            (Tok::NotIdentical, 3)
        } else if three.starts_with("==") {
            (Tok::Eq, 2)
        } else if three.starts_with("!=") || three.starts_with("<>") {
            (Tok::NotEq, 2)
        } else if three.starts_with("=>") {
            (Tok::FatArrow, 2)
        } else if three.starts_with("->") {
            (Tok::Arrow, 2)
        } else if three.starts_with("::") {
            (Tok::DoubleColon, 2)
        } else if three.starts_with("??") {
            (Tok::Coalesce, 2)
        } else if three.starts_with("<=") {
            (Tok::Le, 2)
        } else if three.starts_with(">=") {
            (Tok::Ge, 2)
        } else if three.starts_with("&&") {
            (Tok::AndAnd, 2)
        } else if three.starts_with("||") {
            (Tok::OrOr, 2)
        } else {
            let tok = match c {
                '(' => Tok::LParen,
                ')' => Tok::RParen,
                '[' => Tok::LBracket,
                ']' => Tok::RBracket,
                '{' => Tok::LBrace,
                '}' => Tok::RBrace,
                ',' => Tok::Comma,
                ';' => Tok::Semi,
                '?' => Tok::Question,
                ':' => Tok::Colon,
                '+' => Tok::Plus,
                '-' => Tok::Minus,
                '*' => Tok::Star,
                '/' => Tok::Slash,
                '%' => Tok::Percent,
                '.' => Tok::Dot,
                '!' => Tok::Bang,
                '=' => Tok::Assign,
                '<' => Tok::Lt,
                '>' => Tok::Gt,
                _ => return Err(ParseError::UnexpectedChar { ch: c, pos }),
            };
            (tok, 1)
        };
        out.push(Token { tok, pos });
        i += width;
    }

    Ok(out)
}

fn lex_number(chars: &[(usize, char)], start: usize) -> (Tok, usize) {
    let mut j = start;
    let mut is_float = false;
    while j < chars.len() && chars[j].1.is_ascii_digit() {
        j += 1;
    }
    if j < chars.len()
        && chars[j].1 == '.'
        && chars.get(j + 1).is_some_and(|&(_, c)| c.is_ascii_digit())
    {
        is_float = true;
        j += 1;
        while j < chars.len() && chars[j].1.is_ascii_digit() {
            j += 1;
        }
    }
    if j < chars.len() && matches!(chars[j].1, 'e' | 'E') {
        let mut k = j + 1;
        if k < chars.len() && matches!(chars[k].1, '+' | '-') {
            k += 1;
        }
        if k < chars.len() && chars[k].1.is_ascii_digit() {
            is_float = true;
            j = k;
            while j < chars.len() && chars[j].1.is_ascii_digit() {
                j += 1;
            }
        }
    }
    let text: String = chars[start..j].iter().map(|&(_, c)| c).collect();
    if !is_float {
        if let Ok(i) = text.parse::<i64>() {
            return (Tok::Int(i), j);
        }
    }
    (Tok::Float(text.parse::<f64>().unwrap_or(f64::INFINITY)), j)
}

/// Single quotes only unescape `\'` and `\\`; double quotes also know
/// `\n \t \r \0 \$ \"`. Variables are not interpolated.
fn lex_string(chars: &[(usize, char)], start: usize) -> Result<(String, usize), ParseError> {
    let quote = chars[start].1;
    let mut out = String::new();
    let mut j = start + 1;
    while j < chars.len() {
        let c = chars[j].1;
        if c == quote {
            return Ok((out, j + 1));
        }
        if c == '\\' && j + 1 < chars.len() {
            let n = chars[j + 1].1;
            let escaped = match (quote, n) {
                (_, '\\') => Some('\\'),
                (q, n) if n == q => Some(q),
                ('"', 'n') => Some('\n'),
                ('"', 't') => Some('\t'),
                ('"', 'r') => Some('\r'),
                ('"', '0') => Some('\0'),
                ('"', '$') => Some('$'),
                _ => None,
            };
            if let Some(e) = escaped {
                out.push(e);
                j += 2;
                continue;
            }
        }
        out.push(c);
        j += 1;
    }
    Err(ParseError::UnterminatedString(chars[start].0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(src: &str) -> Vec<Tok> {
        tokenize(src).unwrap().into_iter().map(|t| t.tok).collect()
    }

    #[test]
    fn test_operators_longest_match() {
        assert_eq!(
            toks("$a !== $b ?? 1.5"),
            vec![
                Tok::Var("a".into()),
                Tok::NotIdentical,
                Tok::Var("b".into()),
                Tok::Coalesce,
                Tok::Float(1.5)
            ]
        );
    }

    #[test]
    fn test_strings_and_escapes() {
        assert_eq!(toks(r#"'it\'s' "a\tb""#), vec![Tok::Str("it's".into()), Tok::Str("a\tb".into())]);
        assert!(matches!(
            tokenize("'open"),
            Err(ParseError::UnterminatedString(0))
        ));
    }

    #[test]
    fn test_member_access_tokens() {
        assert_eq!(
            toks("$p->name"),
            vec![Tok::Var("p".into()), Tok::Arrow, Tok::Ident("name".into())]
        );
    }
}
