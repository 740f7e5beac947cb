use crate::errors::InputError;
use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use std::path::Path;

const MASK_PREFIX_CHARS: usize = 6;

/// GitHub Personal Access Token
///
/// The raw value is only reachable through [`Token::expose`]; `Debug` prints
/// the masked form.
#[derive(Clone)]
pub struct Token(SecretString);

impl Token {
    pub fn new(value: impl Into<String>) -> Self {
        Token(SecretString::new(value.into()))
    }

    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    /// First six characters followed by `…`. Tokens of six characters or
    /// fewer keep only their first half.
    pub fn masked(&self) -> String {
        let value = self.expose();
        let total = value.chars().count();
        let keep = if total > MASK_PREFIX_CHARS {
            MASK_PREFIX_CHARS
        } else {
            total / 2
        };
        let prefix: String = value.chars().take(keep).collect();
        format!("{}…", prefix)
    }

    /// The label used in reports.
    pub fn display(&self, mask: bool) -> String {
        if mask {
            self.masked()
        } else {
            self.expose().to_string()
        }
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Token").field(&self.masked()).finish()
    }
}

/// One token per line; surrounding whitespace is trimmed and blank lines skipped.
pub fn parse_tokens(contents: &str) -> Vec<Token> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(Token::new)
        .collect()
}

/// トークンファイルを読み込む
pub fn load_tokens(path: &Path) -> Result<Vec<Token>, InputError> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            InputError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            InputError::Read {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })?;

    let tokens = parse_tokens(&contents);
    if tokens.is_empty() {
        return Err(InputError::Empty {
            path: path.to_path_buf(),
        });
    }

    tracing::debug!("Loaded {} tokens from {}", tokens.len(), path.display());
    Ok(tokens)
}
