//! The third-party material simulator's servant numbering
//!
//! The simulator assigns its ids by hand. They mostly follow the game's
//! collection numbers, but historical insertions and removals shifted them
//! around. [`remap_id`] reproduces those shifts.
//!
//! The simulator's own table is read out of its minified script with a small
//! parser for the JavaScript literal it is declared with, see
//! [`extract_servant_table`].

use anyhow::{bail, Context, Result};
use fgoplan::{Servant, ServantId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::HashSet;
use tracing::warn;

/// Servants whose simulator id can't be derived from their collection number.
const OVERRIDES: &[(u32, u32)] = &[
    (101700, 150),  // Miyamoto Musashi
    (602500, 151),  // King Hassan
    (303200, 152),  // Ereshkigal
    (402600, 176),  // Ishtar (Rider)
    (402700, 177),  // Artoria Pendragon (Alter) (Rider)
    (202800, 178),  // Helena Blavatsky (Archer)
    (302900, 179),  // Minamoto-no-Raikou (Lancer)
    (2500100, 191), // Abigail Williams
    (403100, 225),  // Red Hare
    (900600, 227),  // Qin Shi Huang
    (104800, 295),  // Karna (Santa)
    (304600, 296),  // Vritra
];

/// Shifts applied in order, each seeing the result of the previous ones.
const SHIFTS: &[(u32, i32)] = &[
    (149, -1),
    (153, -1),
    (167, -1),
    (188, -1),
    (192, -1),
    (211, 1),
    (237, -1),
    (329, -1),
];

/// The simulator id of a servant with the given collection number.
pub fn remap_id(id: ServantId, collection_no: u32) -> u32 {
    if let Some(&(_, overridden)) = OVERRIDES.iter().find(|(x, _)| *x == id.value()) {
        return overridden;
    }

    SHIFTS.iter().fold(collection_no, |value, &(threshold, delta)| {
        if value >= threshold {
            value.saturating_add_signed(delta)
        } else {
            value
        }
    })
}

/// Replace every servant's collection number with its simulator id.
pub fn recompute_webcrow_ids<'a>(servants: impl IntoIterator<Item = &'a mut Servant>) {
    for servant in servants {
        servant.webcrow_id = remap_id(servant.id, servant.webcrow_id);
    }
}

/// An entry of the simulator's servant table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulatorServant {
    pub id: u32,
    pub name: String,
}

/// Read the `Servantdb` table out of the simulator script.
pub fn extract_servant_table(script: &str) -> Result<Vec<SimulatorServant>> {
    let table = find_global(script, "Servantdb").context("Failed to read Servantdb")?;
    let Value::Array(entries) = table else {
        bail!("Servantdb is not an array");
    };

    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let id = entry["id"]
                .as_u64()
                .and_then(|x| u32::try_from(x).ok())
                .with_context(|| format!("Servantdb entry {} has no id", i))?;
            let name = entry["text2"]
                .as_str()
                .with_context(|| format!("Servantdb entry {} has no name", i))?;

            Ok(SimulatorServant {
                id,
                name: name.split_whitespace().collect::<Vec<_>>().join(" "),
            })
        })
        .collect()
}

/// Warn once about simulator ids which no servant maps to.
///
/// Returns the unresolved ids.
pub fn cross_check(table: &[SimulatorServant], servants: &[Servant]) -> Vec<u32> {
    let known: HashSet<u32> = servants.iter().map(|x| x.webcrow_id).collect();
    let unresolved: Vec<u32> = table
        .iter()
        .map(|x| x.id)
        .filter(|id| !known.contains(id))
        .collect();

    if !unresolved.is_empty() {
        warn!(
            "{} simulator ids have no matching servant: {:?}",
            unresolved.len(),
            unresolved
        );
    }
    unresolved
}

/// Find `name=<literal>` at a statement boundary and parse the literal.
fn find_global(script: &str, name: &str) -> Result<Value> {
    let bytes = script.as_bytes();
    let mut search = 0;

    while let Some(offset) = script[search..].find(name) {
        let start = search + offset;
        search = start + name.len();

        let boundary =
            start == 0 || (!is_ident_byte(bytes[start - 1]) && bytes[start - 1] != b'.');
        if !boundary {
            continue;
        }

        let mut parser = Parser::new(script, search);
        parser.skip_whitespace();
        if parser.eat(b'=') && parser.peek() != Some(b'=') {
            return parser.value();
        }
    }

    bail!("No assignment to {} found", name)
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

/// Parser for the JSON-like subset of JavaScript literals minifiers emit:
/// unquoted keys, single-quoted strings, `!0`/`!1`, `void 0` and trailing
/// commas.
struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str, pos: usize) -> Self {
        Self { src, pos }
    }

    fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    fn eat(&mut self, expected: u8) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: u8) -> Result<()> {
        self.skip_whitespace();
        if !self.eat(expected) {
            bail!("Expected '{}' at offset {}", expected as char, self.pos);
        }
        Ok(())
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn value(&mut self) -> Result<Value> {
        self.skip_whitespace();
        match self.peek() {
            Some(b'[') => self.array(),
            Some(b'{') => self.object(),
            Some(quote @ (b'"' | b'\'')) => Ok(Value::String(self.string(quote)?)),
            Some(b'!') => {
                self.pos += 1;
                let negated = self.value()?;
                Ok(Value::Bool(!truthy(&negated)))
            }
            Some(b'-' | b'.' | b'0'..=b'9') => self.number(),
            Some(_) => self.keyword(),
            None => bail!("Unexpected end of script"),
        }
    }

    fn keyword(&mut self) -> Result<Value> {
        for (word, value) in [
            ("true", Value::Bool(true)),
            ("false", Value::Bool(false)),
            ("null", Value::Null),
            ("undefined", Value::Null),
            ("void 0", Value::Null),
        ] {
            if self.rest().starts_with(word) {
                self.pos += word.len();
                return Ok(value);
            }
        }
        bail!("Unsupported expression at offset {}", self.pos)
    }

    fn number(&mut self) -> Result<Value> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|b| b.is_ascii_digit() || matches!(b, b'-' | b'+' | b'.' | b'e' | b'E'))
        {
            self.pos += 1;
        }

        let text = &self.src[start..self.pos];
        if let Ok(int) = text.parse::<i64>() {
            return Ok(Value::Number(int.into()));
        }
        let float: f64 = text
            .parse()
            .with_context(|| format!("Invalid number '{}' at offset {}", text, start))?;
        Number::from_f64(float)
            .map(Value::Number)
            .with_context(|| format!("Non-finite number at offset {}", start))
    }

    fn string(&mut self, quote: u8) -> Result<String> {
        self.pos += 1;
        let mut out = String::new();

        loop {
            let mut chars = self.rest().chars();
            let Some(c) = chars.next() else {
                bail!("Unterminated string");
            };
            self.pos += c.len_utf8();

            match c {
                '\\' => {
                    let Some(escaped) = self.rest().chars().next() else {
                        bail!("Unterminated escape");
                    };
                    self.pos += escaped.len_utf8();
                    match escaped {
                        'n' => out.push('\n'),
                        't' => out.push('\t'),
                        'r' => out.push('\r'),
                        'u' => out.push(self.unicode_escape()?),
                        other => out.push(other),
                    }
                }
                c if c as u32 == u32::from(quote) => return Ok(out),
                c => out.push(c),
            }
        }
    }

    fn unicode_escape(&mut self) -> Result<char> {
        let digits = self
            .rest()
            .get(..4)
            .context("Truncated unicode escape")?;
        let code = u32::from_str_radix(digits, 16)
            .with_context(|| format!("Invalid unicode escape '{}'", digits))?;
        self.pos += 4;
        Ok(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER))
    }

    fn key(&mut self) -> Result<String> {
        self.skip_whitespace();
        match self.peek() {
            Some(quote @ (b'"' | b'\'')) => self.string(quote),
            _ => {
                let start = self.pos;
                while self.peek().is_some_and(is_ident_byte) {
                    self.pos += 1;
                }
                if start == self.pos {
                    bail!("Expected a key at offset {}", self.pos);
                }
                Ok(self.src[start..self.pos].to_string())
            }
        }
    }

    fn array(&mut self) -> Result<Value> {
        self.pos += 1;
        let mut values = Vec::new();
        loop {
            self.skip_whitespace();
            if self.eat(b']') {
                return Ok(Value::Array(values));
            }
            values.push(self.value()?);
            self.skip_whitespace();
            if !self.eat(b',') {
                self.expect(b']')?;
                return Ok(Value::Array(values));
            }
        }
    }

    fn object(&mut self) -> Result<Value> {
        self.pos += 1;
        let mut object = Map::new();
        loop {
            self.skip_whitespace();
            if self.eat(b'}') {
                return Ok(Value::Object(object));
            }
            let key = self.key()?;
            self.expect(b':')?;
            let value = self.value()?;
            object.insert(key, value);
            self.skip_whitespace();
            if !self.eat(b',') {
                self.expect(b'}')?;
                return Ok(Value::Object(object));
            }
        }
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|x| x != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
