//! Built-in function identifiers and the `Print` rendering rules

use super::value::Value;

/// The built-in functions. Identifiers resolve to these only when no user
/// binding shadows the name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Print,
    Stem,
    Stern,
    Conc,
    Order,
    Null,
    IsInteger,
    IsString,
    IsTruthValue,
    IsTuple,
    IsDummy,
    IsFunction,
    ItoS,
}

impl Builtin {
    /// Look up a built-in by its source-level name. The spellings with a
    /// lower-case initial are accepted where the language accepts them.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Print" | "print" => Some(Builtin::Print),
            "Stem" | "stem" => Some(Builtin::Stem),
            "Stern" | "stern" => Some(Builtin::Stern),
            "Conc" | "conc" => Some(Builtin::Conc),
            "Order" => Some(Builtin::Order),
            "Null" => Some(Builtin::Null),
            "Isinteger" => Some(Builtin::IsInteger),
            "Isstring" => Some(Builtin::IsString),
            "Istruthvalue" => Some(Builtin::IsTruthValue),
            "Istuple" => Some(Builtin::IsTuple),
            "Isdummy" => Some(Builtin::IsDummy),
            "Isfunction" => Some(Builtin::IsFunction),
            "ItoS" | "itos" => Some(Builtin::ItoS),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Builtin::Print => "Print",
            Builtin::Stem => "Stem",
            Builtin::Stern => "Stern",
            Builtin::Conc => "Conc",
            Builtin::Order => "Order",
            Builtin::Null => "Null",
            Builtin::IsInteger => "Isinteger",
            Builtin::IsString => "Isstring",
            Builtin::IsTruthValue => "Istruthvalue",
            Builtin::IsTuple => "Istuple",
            Builtin::IsDummy => "Isdummy",
            Builtin::IsFunction => "Isfunction",
            Builtin::ItoS => "ItoS",
        }
    }
}

/// Render a value the way `Print` shows it: strings lose their quotes and
/// have their escape sequences interpreted, tuples render recursively,
/// everything else uses its conventional form.
pub fn render(value: &Value, out: &mut String) {
    match value {
        Value::Str(raw) => out.push_str(&unescape(raw)),
        Value::Tuple(items) => {
            out.push('(');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                render(item, out);
            }
            out.push(')');
        }
        other => out.push_str(&other.to_string()),
    }
}

/// Interpret the `\n`, `\t`, `\\` and `\'` escapes of a raw string.
/// Unknown escapes keep the escaped character.
pub fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some('\'') => out.push('\''),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
