//! A compact outline scanner for driving the grammar from script text.
//!
//! A line starting with a bullet (`+ * - > !` then a space) opens a block
//! that lasts while the following lines are indented past the bullet. A
//! blank line is a break and a line holding only `---` is a rule.

#![allow(dead_code)]

use skein_grammar::compile_tokens;
use skein_types::{Located, Node, NodeBody, Position, Story, Target, Token, TokenKind};

/// Structural punctuation, longest first.
const PUNCTUATION: &[&str] = &[
    "---", "...", "{\"", "\"}", "{'", "'}", "->", "<-", "//", "--", "**", "<=", ">=", "==", "<>",
    "+=", "-=", "*=", "/=", "%=", "{", "}", "[", "]", "|", "@", "<", ">", "(", ")", "/", ",",
];

const BULLETS: &[char] = &['+', '*', '-', '>', '!'];

pub fn script(source: &str) -> Vec<Located<Token>> {
    let mut scanner = Scanner::default();
    for (index, line) in source.lines().enumerate() {
        scanner.line(index + 1, line);
    }
    scanner.finish()
}

#[derive(Default)]
struct Scanner {
    tokens: Vec<Located<Token>>,
    /// Content column of each open block.
    blocks: Vec<usize>,
    line: usize,
}

impl Scanner {
    fn push(&mut self, kind: TokenKind, space: &str, text: &str, col: usize) {
        let position = Position::new(self.line, col);
        self.tokens
            .push(Located::new(Token::new(kind, space, text), position));
    }

    fn line(&mut self, number: usize, line: &str) {
        self.line = number;
        let trimmed = line.trim_start();
        if trimmed.is_empty() {
            self.push(TokenKind::Break, "", "", 1);
            return;
        }
        let mut col = line.len() - trimmed.len();
        while self.blocks.last().is_some_and(|&indent| col < indent) {
            self.blocks.pop();
            self.push(TokenKind::Stop, "", "", col + 1);
        }
        if trimmed.trim_end() == "---" {
            self.push(TokenKind::Dash, "", "---", col + 1);
            return;
        }

        let mut rest = trimmed;
        loop {
            let mut chars = rest.chars();
            match (chars.next(), chars.next()) {
                (Some(bullet), Some(' ')) | (Some(bullet), None) if BULLETS.contains(&bullet) => {
                    self.push(TokenKind::Start, " ", &bullet.to_string(), col + 1);
                    self.blocks.push(col + 2);
                    let after = rest[1..].trim_start();
                    col += rest.len() - after.len();
                    rest = after;
                }
                _ => break,
            }
        }
        self.inline(col, rest);
    }

    fn inline(&mut self, col: usize, text: &str) {
        let chars: Vec<char> = text.chars().collect();
        let mut space = if self.tokens.is_empty() { "" } else { " " }.to_string();
        let mut i = 0;
        while i < chars.len() {
            let c = chars[i];
            if c.is_whitespace() {
                space = " ".to_string();
                i += 1;
                continue;
            }
            let rest: String = chars[i..].iter().collect();
            let (kind, len) = if c.is_alphabetic() || c == '_' {
                let len = chars[i..]
                    .iter()
                    .take_while(|c| c.is_alphanumeric() || **c == '_')
                    .count();
                (TokenKind::Alphanum, len)
            } else if c.is_ascii_digit() {
                let mut len = chars[i..].iter().take_while(|c| c.is_ascii_digit()).count();
                if chars.get(i + len) == Some(&'.')
                    && chars.get(i + len + 1).is_some_and(|c| c.is_ascii_digit())
                {
                    len += 1 + chars[i + len + 1..]
                        .iter()
                        .take_while(|c| c.is_ascii_digit())
                        .count();
                }
                (TokenKind::Number, len)
            } else if c == '\\' && i + 1 < chars.len() {
                (TokenKind::Literal, 2)
            } else if let Some(p) = PUNCTUATION.iter().find(|p| rest.starts_with(**p)) {
                (TokenKind::Token, p.chars().count())
            } else {
                (TokenKind::Symbol, 1)
            };
            let text: String = if kind == TokenKind::Literal {
                chars[i + 1].to_string()
            } else {
                chars[i..i + len].iter().collect()
            };
            self.push(kind, &space, &text, col + i + 1);
            space.clear();
            i += len;
        }
    }

    fn finish(mut self) -> Vec<Located<Token>> {
        self.line += 1;
        while self.blocks.pop().is_some() {
            self.push(TokenKind::Stop, "", "", 1);
        }
        self.push(TokenKind::Stop, "", "", 1);
        self.tokens
    }
}

pub fn compile(source: &str) -> Story {
    compile_tokens(script(source)).unwrap_or_else(|e| panic!("{source:?}: {e}"))
}

/// Compiles a script that must not produce any diagnostics.
pub fn compile_clean(source: &str) -> Story {
    let story = compile(source);
    assert!(
        story.diagnostics().is_empty(),
        "unexpected diagnostics: {:?}",
        story.diagnostics()
    );
    assert_linked(&story);
    story
}

pub fn node<'a>(story: &'a Story, name: &str) -> &'a Node {
    story
        .get(name)
        .unwrap_or_else(|| panic!("no node named {name} in {:?}", story.to_map().keys()))
}

/// The `next` link of a node, rendered as a name or sentinel.
pub fn next(story: &Story, name: &str) -> String {
    node(story, name)
        .next()
        .map(Target::to_string)
        .unwrap_or_default()
}

pub fn text<'a>(story: &'a Story, name: &str) -> &'a str {
    match &node(story, name).body {
        NodeBody::Text { text, .. } => text,
        other => panic!("{name} is {}, not text", other.kind()),
    }
}

/// Every link names a node that exists, or a sentinel.
pub fn assert_linked(story: &Story) {
    for node in story.nodes() {
        for (field, link) in node.links() {
            match link {
                Some(Target::Node(target)) => assert!(
                    story.contains(target),
                    "{}:{field:?} links to missing {target}",
                    node.name
                ),
                Some(_) => {}
                None => panic!("{}:{field:?} is unresolved", node.name),
            }
        }
    }
}
