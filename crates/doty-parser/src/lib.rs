use doty_ast::*;
use doty_lexer::{lex, LexError, Span, Token};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    pub span: Span,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}:{}: {}", self.span.start, self.span.end, self.message)
    }
}

impl std::error::Error for ParseError {}

impl From<LexError> for ParseError {
    fn from(err: LexError) -> Self {
        ParseError {
            message: err.to_string(),
            span: err.span(),
        }
    }
}

type PResult<T> = Result<T, ParseError>;

/// Lex and parse a whole source file. The first error aborts.
pub fn parse(source: &str) -> PResult<Ast> {
    let tokens = lex(source)?;
    let mut parser = Parser::new(tokens);
    parser.parse_file()?;
    Ok(parser.ast)
}

struct Parser {
    tokens: Vec<(Token, Span)>,
    pos: usize,
    ast: Ast,
}

impl Parser {
    fn new(tokens: Vec<(Token, Span)>) -> Self {
        Self {
            tokens,
            pos: 0,
            ast: Ast::new(),
        }
    }

    // ── Token helpers ─────────────────────────────────────────────

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn peek_span(&self) -> Span {
        self.tokens
            .get(self.pos)
            .map(|(_, s)| *s)
            .unwrap_or_else(|| {
                self.tokens
                    .last()
                    .map(|(_, s)| Span::new(s.end, s.end))
                    .unwrap_or_default()
            })
    }

    /// Span of the most recently consumed token.
    fn last_span(&self) -> Span {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map(|(_, s)| *s)
            .unwrap_or_default()
    }

    fn advance(&mut self) -> Option<(Token, Span)> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn check(&self, expected: &Token) -> bool {
        self.peek() == Some(expected)
    }

    /// True unless the next token is end of input or one of `delims`.
    fn not_delim(&self, delims: &[Token]) -> bool {
        match self.peek() {
            None => false,
            Some(tok) => !delims.contains(tok),
        }
    }

    fn eat(&mut self, expected: &Token) -> Option<Span> {
        if self.check(expected) {
            self.advance().map(|(_, span)| span)
        } else {
            None
        }
    }

    fn expect(&mut self, expected: &Token) -> PResult<Span> {
        match self.eat(expected) {
            Some(span) => Ok(span),
            None => Err(self.error(expected.kind_name())),
        }
    }

    fn expect_ident(&mut self, what: &str) -> PResult<Name> {
        if let Some(Token::Ident(text)) = self.peek() {
            let text = text.clone();
            let span = self.peek_span();
            self.pos += 1;
            return Ok(Name { text, span });
        }
        Err(self.error(what))
    }

    fn error(&self, what: &str) -> ParseError {
        let found = self.peek().map(Token::kind_name).unwrap_or("EOF");
        ParseError {
            message: format!("expected {}, found {}", what, found),
            span: self.peek_span(),
        }
    }

    /// Parse `item (, item)* ,?` up to (not including) `close`.
    fn comma_list<T>(
        &mut self,
        close: &Token,
        mut item: impl FnMut(&mut Self) -> PResult<T>,
    ) -> PResult<Vec<T>> {
        let mut items = Vec::new();
        while self.not_delim(std::slice::from_ref(close)) {
            items.push(item(self)?);
            if self.eat(&Token::Comma).is_none() {
                break;
            }
        }
        Ok(items)
    }

    // ── Items ─────────────────────────────────────────────────────

    fn parse_file(&mut self) -> PResult<()> {
        while !self.at_end() {
            let item = self.parse_item()?;
            self.ast.items.push(item);
        }
        Ok(())
    }

    fn parse_item(&mut self) -> PResult<NodeId> {
        let Some(kw) = self.eat(&Token::KwMod) else {
            return Err(self.error("item"));
        };
        let name = self.expect_ident("module name")?;

        let mut type_params = Vec::new();
        if self.eat(&Token::Lt).is_some() {
            type_params = self.comma_list(&Token::Gt, |p| {
                let name = p.expect_ident("type variable name")?;
                let span = name.span;
                Ok(p.ast.alloc(NodeKind::ModTypeParam(name), span))
            })?;
            self.expect(&Token::Gt)?;
        }

        self.expect(&Token::LParen)?;
        let args = self.comma_list(&Token::RParen, |p| {
            let param = p.parse_param("argument name")?;
            let span = param.name.span;
            Ok(p.ast.alloc(NodeKind::ModArg(param), span))
        })?;
        self.expect(&Token::RParen)?;

        let mut results = Vec::new();
        if self.eat(&Token::Arrow).is_some() {
            self.expect(&Token::LParen)?;
            results = self.comma_list(&Token::RParen, |p| {
                let param = p.parse_param("result name")?;
                let span = param.name.span;
                Ok(p.ast.alloc(NodeKind::ModResult(param), span))
            })?;
            self.expect(&Token::RParen)?;
        }

        self.expect(&Token::LCurly)?;
        let mut stmts = Vec::new();
        while self.not_delim(&[Token::RCurly]) {
            stmts.push(self.parse_stmt()?);
        }
        let close = self.expect(&Token::RCurly)?;

        let span = name.span;
        Ok(self.ast.alloc(
            NodeKind::Mod(ModItem {
                name,
                type_params,
                args,
                results,
                stmts,
                full_span: kw.merge(close),
            }),
            span,
        ))
    }

    fn parse_param(&mut self, what: &str) -> PResult<Param> {
        let name = self.expect_ident(what)?;
        self.expect(&Token::Colon)?;
        let ty = self.parse_type()?;
        Ok(Param { name, ty })
    }

    // ── Statements ────────────────────────────────────────────────

    fn parse_stmt(&mut self) -> PResult<NodeId> {
        if self.eat(&Token::KwLet).is_some() {
            let name = self.expect_ident("let binding name")?;
            let ty = match self.eat(&Token::Colon) {
                Some(_) => Some(self.parse_type()?),
                None => None,
            };
            let init = match self.eat(&Token::Assign) {
                Some(_) => Some(self.parse_expr()?),
                None => None,
            };
            self.expect(&Token::Semicolon)?;
            let span = name.span;
            return Ok(self.ast.alloc(NodeKind::Let(LetStmt { name, ty, init }), span));
        }

        if self.eat(&Token::KwTypevar).is_some() {
            let name = self.expect_ident("type variable name")?;
            self.expect(&Token::Semicolon)?;
            let span = name.span;
            return Ok(self.ast.alloc(NodeKind::TypeVar(name), span));
        }

        let expr = self.parse_expr()?;

        if let Some(op) = self.eat(&Token::Assign) {
            let rhs = self.parse_expr()?;
            self.expect(&Token::Semicolon)?;
            return Ok(self.ast.alloc(NodeKind::Assign { lhs: expr, rhs }, op));
        }

        self.expect(&Token::Semicolon)?;
        let span = self.ast[expr].span;
        Ok(self.ast.alloc(NodeKind::ExprStmt(expr), span))
    }

    // ── Types ─────────────────────────────────────────────────────

    fn parse_type(&mut self) -> PResult<NodeId> {
        let start = self.peek_span();
        let kind = match self.peek() {
            Some(Token::Ident(name)) if name == "u32" => {
                self.pos += 1;
                TypeExprKind::U32
            }
            Some(Token::Ident(name)) if name == "clock" => {
                self.pos += 1;
                self.expect(&Token::Lt)?;
                let domain = self.parse_domain_ref()?;
                self.expect(&Token::Gt)?;
                TypeExprKind::Clock(domain)
            }
            _ => return Err(self.error("type")),
        };

        let domain = match self.eat(&Token::At) {
            Some(_) => Some(self.parse_domain_ref()?),
            None => None,
        };

        let span = start.merge(self.last_span());
        Ok(self.ast.alloc(NodeKind::Type(TypeExpr { kind, domain }), span))
    }

    fn parse_domain_ref(&mut self) -> PResult<NodeId> {
        let name = self.expect_ident("domain name")?;
        let span = name.span;
        Ok(self.ast.alloc(NodeKind::DomainRef(name), span))
    }

    // ── Expressions ───────────────────────────────────────────────

    fn parse_expr(&mut self) -> PResult<NodeId> {
        let name = self.expect_ident("expression")?;
        let start = name.span;
        let ident = self.ast.alloc(NodeKind::Ident(name), start);

        if self.eat(&Token::LParen).is_none() {
            return Ok(ident);
        }
        let args = self.comma_list(&Token::RParen, |p| p.parse_expr())?;
        let close = self.expect(&Token::RParen)?;
        Ok(self.ast.alloc(
            NodeKind::Call {
                callee: ident,
                args,
            },
            start.merge(close),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_and_print(source: &str) -> String {
        match parse(source) {
            Ok(ast) => dump(&ast, None),
            Err(e) => format!("ERROR: {}", e),
        }
    }

    #[test]
    fn test_parse_empty_file() {
        let ast = parse("// nothing here\n").unwrap();
        assert!(ast.items.is_empty());
        insta::assert_snapshot!(dump(&ast, None), @"Root");
    }

    #[test]
    fn test_parse_empty_module() {
        let result = parse_and_print("mod empty() {}");
        insta::assert_snapshot!(result, @r###"
        Root
        `-items[0]: ModItem @0 "empty"
        "###);
    }

    #[test]
    fn test_parse_generic_module() {
        let result = parse_and_print("mod id<D>(x: u32@D) -> (y: u32@D) { y = x; }");
        insta::assert_snapshot!(result, @r###"
        Root
        `-items[0]: ModItem @10 "id"
          |-type_params[0]: ModTypeParam @0 "D"
          |-args[0]: ModArg @3 "x"
          | `-ty: U32Type @2
          |   `-domain: DomainIdent @1 "D"
          |-results[0]: ModResult @6 "y"
          | `-ty: U32Type @5
          |   `-domain: DomainIdent @4 "D"
          `-stmts[0]: AssignStmt @9
            |-lhs: IdentExpr @7 "y"
            `-rhs: IdentExpr @8 "x"
        "###);
    }

    #[test]
    fn test_parse_statements() {
        let result =
            parse_and_print("mod m() { typevar T; let c: clock<T>; let v: u32 @T = f(c, c,); v; }");
        insta::assert_snapshot!(result, @r###"
        Root
        `-items[0]: ModItem @13 "m"
          |-stmts[0]: TypeVarStmt @0 "T"
          |-stmts[1]: LetStmt @3 "c"
          | `-ty: ClockType @2
          |   `-clock_domain: DomainIdent @1 "T"
          |-stmts[2]: LetStmt @10 "v"
          | |-ty: U32Type @5
          | | `-domain: DomainIdent @4 "T"
          | `-init: CallExpr @9
          |   |-callee: IdentExpr @6 "f"
          |   |-args[0]: IdentExpr @7 "c"
          |   `-args[1]: IdentExpr @8 "c"
          `-stmts[3]: ExprStmt @12
            `-expr: IdentExpr @11 "v"
        "###);
    }

    #[test]
    fn test_parse_let_without_type_or_init() {
        let result = parse_and_print("mod m() { let y; }");
        insta::assert_snapshot!(result, @r###"
        Root
        `-items[0]: ModItem @1 "m"
          `-stmts[0]: LetStmt @0 "y"
        "###);
    }

    #[test]
    fn test_parse_trailing_commas() {
        let ast = parse("mod m<A, B,>(a: u32@A, b: u32@B,) -> (c: u32,) {}").unwrap();
        let m = ast.as_mod(ast.items[0]).unwrap();
        assert_eq!(m.type_params.len(), 2);
        assert_eq!(m.args.len(), 2);
        assert_eq!(m.results.len(), 1);
    }

    #[test]
    fn test_parse_spans() {
        let source = "mod top(x: u32) { let y = f(x); }";
        let ast = parse(source).unwrap();
        let top = ast.items[0];
        assert_eq!(ast[top].span.slice(source), "top");
        let m = ast.as_mod(top).unwrap();
        assert_eq!(m.full_span.slice(source), source);

        let NodeKind::ModArg(x) = &ast[m.args[0]].kind else {
            panic!("expected argument");
        };
        assert_eq!(ast[x.ty].span.slice(source), "u32");

        let NodeKind::Let(let_y) = &ast[m.stmts[0]].kind else {
            panic!("expected let");
        };
        let init = let_y.init.unwrap();
        assert_eq!(ast[init].span.slice(source), "f(x)");
    }

    #[test]
    fn test_parse_annotated_clock_span() {
        let source = "mod m(c: clock<A> @B) {}";
        let ast = parse(source).unwrap();
        let m = ast.as_mod(ast.items[0]).unwrap();
        let NodeKind::ModArg(c) = &ast[m.args[0]].kind else {
            panic!("expected argument");
        };
        assert_eq!(ast[c.ty].span.slice(source), "clock<A> @B");
        assert_eq!(ast[c.ty].kind.describe(), "ClockType");
    }

    #[test]
    fn test_assign_span_is_operator() {
        let source = "mod m() { a = b; }";
        let ast = parse(source).unwrap();
        let m = ast.as_mod(ast.items[0]).unwrap();
        assert_eq!(ast[m.stmts[0]].span, Span::new(12, 13));
    }

    // ── Errors ──────────────────────────────────────────────────

    #[test]
    fn test_error_missing_argument_name() {
        let result = parse_and_print("mod m( {}");
        insta::assert_snapshot!(result, @"ERROR: 7:8: expected argument name, found LCURLY");
    }

    #[test]
    fn test_error_missing_semicolon() {
        let result = parse_and_print("mod m() { let x: u32 }");
        insta::assert_snapshot!(result, @"ERROR: 21:22: expected SEMICOLON, found RCURLY");
    }

    #[test]
    fn test_error_statement_at_top_level() {
        let result = parse_and_print("let x;");
        insta::assert_snapshot!(result, @"ERROR: 0:3: expected item, found KW_LET");
    }

    #[test]
    fn test_error_number_is_not_an_expression() {
        let result = parse_and_print("mod m() { x = 1; }");
        insta::assert_snapshot!(result, @"ERROR: 14:15: expected expression, found LIT_NUM");
    }

    #[test]
    fn test_error_unterminated_body() {
        let result = parse_and_print("mod m() {");
        insta::assert_snapshot!(result, @"ERROR: 9:9: expected RCURLY, found EOF");
    }

    #[test]
    fn test_error_unknown_type() {
        let result = parse_and_print("mod m(x: bool) {}");
        insta::assert_snapshot!(result, @"ERROR: 9:13: expected type, found IDENT");
    }

    #[test]
    fn test_error_from_lexer() {
        let err = parse("mod m() { $ }").unwrap_err();
        assert_eq!(err.message, "unknown character `$`");
        assert_eq!(err.span, Span::new(10, 11));
    }

    #[test]
    fn test_error_unclosed_comment() {
        let err = parse("mod m() {} /* trailing").unwrap_err();
        assert_eq!(err.message, "unclosed comment; missing `*/`");
    }

    #[test]
    fn test_error_first_one_wins() {
        let err = parse("mod a( {} mod b() { let }").unwrap_err();
        assert_eq!(err.span, Span::new(7, 8));
    }

    // ── Property-based tests ────────────────────────────────────

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn parse_never_panics_on_ascii(s in "\\PC{0,200}") {
                let _ = parse(&s);
            }

            #[test]
            fn parse_never_panics_on_bytes(bytes in proptest::collection::vec(any::<u8>(), 0..200)) {
                if let Ok(s) = std::str::from_utf8(&bytes) {
                    let _ = parse(s);
                }
            }

            #[test]
            fn parse_never_panics_on_doty_like_input(
                s in proptest::string::string_regex(r"(mod|let|typevar|u32|clock|[a-z]|[\(\)\{\}<>@:;,=]| |\n){0,80}")
                    .unwrap()
            ) {
                let _ = parse(&s);
            }

            #[test]
            fn dump_lists_every_item(n in 0usize..6) {
                let source: String = (0..n).map(|i| format!("mod m{}() {{}}\n", i)).collect();
                let ast = parse(&source).unwrap();
                prop_assert_eq!(ast.items.len(), n);
                prop_assert_eq!(dump(&ast, None).lines().count(), n + 1);
            }
        }
    }
}
