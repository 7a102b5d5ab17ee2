use lachs::Span;

#[lachs::token]
pub enum Token {
    // Keywords. `list` is reserved by the lexical grammar but never parsed.
    #[terminal("let")]
    Let,
    #[terminal("in")]
    In,
    #[terminal("fn")]
    Lambda,
    #[terminal("where")]
    Where,
    #[terminal("aug")]
    Aug,
    #[terminal("or")]
    Or,
    #[terminal("not")]
    Not,
    #[terminal("gr")]
    Gr,
    #[terminal("ge")]
    Ge,
    #[terminal("ls")]
    Ls,
    #[terminal("le")]
    Le,
    #[terminal("eq")]
    EqKw,
    #[terminal("ne")]
    Ne,
    #[terminal("true")]
    True,
    #[terminal("false")]
    False,
    #[terminal("nil")]
    Nil,
    #[terminal("dummy")]
    Dummy,
    #[terminal("within")]
    Within,
    #[terminal("and")]
    And,
    #[terminal("rec")]
    Rec,
    #[terminal("list")]
    List,
    #[terminal("->")]
    Arrow,
    #[terminal("|")]
    Bar,
    #[terminal("&")]
    Amp,
    #[terminal("+")]
    Plus,
    #[terminal("-")]
    Minus,
    #[terminal("**")]
    DoubleStar,
    #[terminal("*")]
    Star,
    #[terminal("/")]
    Slash,
    #[terminal("=")]
    Equals,
    #[terminal("@")]
    At,
    #[terminal(".")]
    Dot,
    #[terminal(">=")]
    GreaterEqual,
    #[terminal(">")]
    Greater,
    #[terminal("<=")]
    LessEqual,
    #[terminal("<")]
    Less,
    #[terminal("(")]
    LParen,
    #[terminal(")")]
    RParen,
    #[terminal(",")]
    Comma,
    #[terminal(";")]
    Semicolon,
    #[literal("[a-zA-Z][a-zA-Z0-9_]*")]
    Ident,
    #[literal("[0-9]+")]
    Integer,
    #[literal(r#"'([^'\\]|\\.)*'"#)]
    StringLiteral,
}

/// Remove `//` line comments so the token definitions above never see them.
/// Quote-aware: `//` inside a string literal is left alone.
pub fn strip_comments(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        match c {
            '\'' => {
                in_string = !in_string;
                out.push(c);
            }
            '\\' if in_string => {
                out.push(c);
                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
            }
            '/' if !in_string && chars.peek() == Some(&'/') => {
                while let Some(&next) = chars.peek() {
                    if next == '\n' {
                        break;
                    }
                    chars.next();
                }
            }
            _ => out.push(c),
        }
    }

    out
}

impl Token {
    pub fn pos(&self) -> Span {
        match self {
            Token::Let(inner) => inner.position.clone(),
            Token::In(inner) => inner.position.clone(),
            Token::Lambda(inner) => inner.position.clone(),
            Token::Where(inner) => inner.position.clone(),
            Token::Aug(inner) => inner.position.clone(),
            Token::Or(inner) => inner.position.clone(),
            Token::Not(inner) => inner.position.clone(),
            Token::Gr(inner) => inner.position.clone(),
            Token::Ge(inner) => inner.position.clone(),
            Token::Ls(inner) => inner.position.clone(),
            Token::Le(inner) => inner.position.clone(),
            Token::EqKw(inner) => inner.position.clone(),
            Token::Ne(inner) => inner.position.clone(),
            Token::True(inner) => inner.position.clone(),
            Token::False(inner) => inner.position.clone(),
            Token::Nil(inner) => inner.position.clone(),
            Token::Dummy(inner) => inner.position.clone(),
            Token::Within(inner) => inner.position.clone(),
            Token::And(inner) => inner.position.clone(),
            Token::Rec(inner) => inner.position.clone(),
            Token::List(inner) => inner.position.clone(),
            Token::Arrow(inner) => inner.position.clone(),
            Token::Bar(inner) => inner.position.clone(),
            Token::Amp(inner) => inner.position.clone(),
            Token::Plus(inner) => inner.position.clone(),
            Token::Minus(inner) => inner.position.clone(),
            Token::DoubleStar(inner) => inner.position.clone(),
            Token::Star(inner) => inner.position.clone(),
            Token::Slash(inner) => inner.position.clone(),
            Token::Equals(inner) => inner.position.clone(),
            Token::At(inner) => inner.position.clone(),
            Token::Dot(inner) => inner.position.clone(),
            Token::GreaterEqual(inner) => inner.position.clone(),
            Token::Greater(inner) => inner.position.clone(),
            Token::LessEqual(inner) => inner.position.clone(),
            Token::Less(inner) => inner.position.clone(),
            Token::LParen(inner) => inner.position.clone(),
            Token::RParen(inner) => inner.position.clone(),
            Token::Comma(inner) => inner.position.clone(),
            Token::Semicolon(inner) => inner.position.clone(),
            Token::Ident(inner) => inner.position.clone(),
            Token::Integer(inner) => inner.position.clone(),
            Token::StringLiteral(inner) => inner.position.clone(),
        }
    }

    /// Returns a human-readable description of the token
    pub fn describe(&self) -> String {
        match self {
            Token::Let(_) => "'let'".to_string(),
            Token::In(_) => "'in'".to_string(),
            Token::Lambda(_) => "'fn'".to_string(),
            Token::Where(_) => "'where'".to_string(),
            Token::Aug(_) => "'aug'".to_string(),
            Token::Or(_) => "'or'".to_string(),
            Token::Not(_) => "'not'".to_string(),
            Token::Gr(_) => "'gr'".to_string(),
            Token::Ge(_) => "'ge'".to_string(),
            Token::Ls(_) => "'ls'".to_string(),
            Token::Le(_) => "'le'".to_string(),
            Token::EqKw(_) => "'eq'".to_string(),
            Token::Ne(_) => "'ne'".to_string(),
            Token::True(_) => "'true'".to_string(),
            Token::False(_) => "'false'".to_string(),
            Token::Nil(_) => "'nil'".to_string(),
            Token::Dummy(_) => "'dummy'".to_string(),
            Token::Within(_) => "'within'".to_string(),
            Token::And(_) => "'and'".to_string(),
            Token::Rec(_) => "'rec'".to_string(),
            Token::List(_) => "'list'".to_string(),
            Token::Arrow(_) => "'->'".to_string(),
            Token::Bar(_) => "'|'".to_string(),
            Token::Amp(_) => "'&'".to_string(),
            Token::Plus(_) => "'+'".to_string(),
            Token::Minus(_) => "'-'".to_string(),
            Token::DoubleStar(_) => "'**'".to_string(),
            Token::Star(_) => "'*'".to_string(),
            Token::Slash(_) => "'/'".to_string(),
            Token::Equals(_) => "'='".to_string(),
            Token::At(_) => "'@'".to_string(),
            Token::Dot(_) => "'.'".to_string(),
            Token::GreaterEqual(_) => "'>='".to_string(),
            Token::Greater(_) => "'>'".to_string(),
            Token::LessEqual(_) => "'<='".to_string(),
            Token::Less(_) => "'<'".to_string(),
            Token::LParen(_) => "'('".to_string(),
            Token::RParen(_) => "')'".to_string(),
            Token::Comma(_) => "','".to_string(),
            Token::Semicolon(_) => "';'".to_string(),
            Token::Ident(inner) => format!("identifier '{}'", inner.value),
            Token::Integer(inner) => format!("integer '{}'", inner.value),
            Token::StringLiteral(inner) => format!("string {}", inner.value),
        }
    }
}
