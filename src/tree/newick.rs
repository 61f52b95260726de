use thiserror::Error;

use super::node::{NodeId, PhyloTree};

/// Errors raised while parsing Newick text.
#[derive(Debug, Error, PartialEq)]
pub enum NewickError {
    /// The input holds no tree.
    #[error("empty Newick input")]
    Empty,

    /// A character that cannot appear at this point.
    #[error("unexpected '{found}' at byte {offset}")]
    UnexpectedChar {
        /// Byte offset.
        offset: usize,
        /// Offending character.
        found: char,
    },

    /// Parentheses do not balance.
    #[error("unbalanced parentheses at byte {offset}")]
    Unbalanced {
        /// Byte offset.
        offset: usize,
    },

    /// A quoted label or comment is never closed.
    #[error("unterminated {what} starting at byte {offset}")]
    Unterminated {
        /// `"quoted label"` or `"comment"`.
        what: &'static str,
        /// Byte offset of the opening delimiter.
        offset: usize,
    },

    /// A branch length is not a number.
    #[error("invalid branch length '{value}' at byte {offset}")]
    InvalidBranchLength {
        /// Byte offset.
        offset: usize,
        /// Raw text.
        value: String,
    },

    /// Text follows the terminating `;`.
    #[error("unexpected input after ';' at byte {offset}")]
    TrailingInput {
        /// Byte offset.
        offset: usize,
    },
}

const DELIMITERS: &[char] = &['(', ')', ',', ':', ';', '[', '\''];

struct Cursor<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn bump(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    /// Skip whitespace and `[...]` comments.
    fn skip_trivia(&mut self) -> Result<(), NewickError> {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => self.bump(),
                Some('[') => {
                    let start = self.pos;
                    match self.text[self.pos..].find(']') {
                        Some(close) => self.pos += close + 1,
                        None => {
                            return Err(NewickError::Unterminated {
                                what: "comment",
                                offset: start,
                            })
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn take_while(&mut self, keep: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if !keep(c) {
                break;
            }
            self.bump();
        }
        &self.text[start..self.pos]
    }

    /// Quoted label; `''` inside quotes is a literal quote.
    fn quoted(&mut self) -> Result<String, NewickError> {
        let start = self.pos;
        self.bump();
        let mut label = String::new();
        loop {
            match self.peek() {
                None => {
                    return Err(NewickError::Unterminated {
                        what: "quoted label",
                        offset: start,
                    })
                }
                Some('\'') => {
                    self.bump();
                    if self.peek() == Some('\'') {
                        label.push('\'');
                        self.bump();
                    } else {
                        return Ok(label);
                    }
                }
                Some(c) => {
                    label.push(c);
                    self.bump();
                }
            }
        }
    }

    fn label(&mut self) -> Result<String, NewickError> {
        if self.peek() == Some('\'') {
            return self.quoted();
        }
        Ok(self
            .take_while(|c| !c.is_whitespace() && !DELIMITERS.contains(&c))
            .to_string())
    }
}

/// Parse a single Newick tree.
///
/// Supports nested clades, quoted and unquoted labels, branch lengths,
/// `[...]` comments and empty leaves. A missing final `;` is tolerated.
pub fn parse_newick(text: &str) -> Result<PhyloTree, NewickError> {
    let mut tree = PhyloTree::new();
    let mut cursor = Cursor { text, pos: 0 };
    let mut open: Vec<NodeId> = Vec::new();
    // Most recently completed node; labels and branch lengths attach to it.
    let mut last: Option<NodeId> = None;

    let unexpected = |cursor: &Cursor<'_>, found: char| NewickError::UnexpectedChar {
        offset: cursor.pos,
        found,
    };

    loop {
        cursor.skip_trivia()?;
        let Some(c) = cursor.peek() else {
            break;
        };
        match c {
            '(' => {
                if last.is_some() || (open.is_empty() && !tree.is_empty()) {
                    return Err(unexpected(&cursor, c));
                }
                open.push(tree.push(open.last().copied(), None));
                cursor.bump();
            }
            ',' => {
                let Some(&parent) = open.last() else {
                    return Err(unexpected(&cursor, c));
                };
                if last.is_none() {
                    tree.push(Some(parent), None);
                }
                last = None;
                cursor.bump();
            }
            ')' => {
                let Some(clade) = open.pop() else {
                    return Err(NewickError::Unbalanced { offset: cursor.pos });
                };
                if last.is_none() {
                    tree.push(Some(clade), None);
                }
                last = Some(clade);
                cursor.bump();
            }
            ':' => {
                let offset = cursor.pos;
                cursor.bump();
                cursor.skip_trivia()?;
                let raw = cursor.take_while(|c| c.is_ascii_digit() || "+-.eE".contains(c));
                let length: f64 = raw.parse().map_err(|_| NewickError::InvalidBranchLength {
                    offset,
                    value: raw.to_string(),
                })?;
                let target = match last {
                    Some(id) => id,
                    None => {
                        if open.is_empty() && !tree.is_empty() {
                            return Err(unexpected(&cursor, c));
                        }
                        let id = tree.push(open.last().copied(), None);
                        last = Some(id);
                        id
                    }
                };
                tree.node_mut(target).branch_length = Some(length);
            }
            ';' => {
                if !open.is_empty() {
                    return Err(NewickError::Unbalanced { offset: cursor.pos });
                }
                cursor.bump();
                cursor.skip_trivia()?;
                if cursor.peek().is_some() {
                    return Err(NewickError::TrailingInput { offset: cursor.pos });
                }
                break;
            }
            _ => {
                let offset = cursor.pos;
                let label = cursor.label()?;
                if label.is_empty() {
                    return Err(unexpected(&cursor, c));
                }
                match last {
                    Some(id) if tree.node(id).name.is_none() => {
                        tree.node_mut(id).name = Some(label);
                    }
                    Some(_) => return Err(NewickError::UnexpectedChar { offset, found: c }),
                    None => {
                        if open.is_empty() && !tree.is_empty() {
                            return Err(NewickError::UnexpectedChar { offset, found: c });
                        }
                        last = Some(tree.push(open.last().copied(), Some(label)));
                    }
                }
            }
        }
    }

    if !open.is_empty() {
        return Err(NewickError::Unbalanced { offset: cursor.pos });
    }
    if tree.is_empty() {
        return Err(NewickError::Empty);
    }
    Ok(tree)
}
