use crate::handler::{HandlerRegistry, Operand, PseudoPredicateHandler, Substitution};
use crate::lexer::{tokenize, Token, TokenKind};
use crate::RewriteError;
use shmarql_model::{QueryType, RewriteResult, Settings};
use std::collections::HashMap;
use std::fmt::Write;
use std::sync::Arc;
use tracing::debug;

const SETTING_MARKER: &str = "shmarql-";
const LOGGED_QUERY_LENGTH: usize = 200;

/// Rewrites pseudo-predicate triple patterns into `VALUES` blocks and extracts the settings
/// embedded in comments.
///
/// ```text
/// SELECT ?s { ?s <https://shmarql.com/fts> "culture" . ?s ?p ?o }
/// ```
///
/// becomes, for a search that finds two subjects,
///
/// ```text
/// SELECT ?s { VALUES ?s { <http://x/1> <http://x/2> } ?s ?p ?o }
/// ```
#[derive(Clone, Debug, Default)]
pub struct Rewriter {
    handlers: HandlerRegistry,
}

impl Rewriter {
    pub fn new(handlers: HandlerRegistry) -> Self {
        Self { handlers }
    }

    pub fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    /// Rewrites `query`, returning an error if it cannot be tokenized or a search fails.
    pub async fn try_rewrite(&self, query: &str) -> Result<RewriteResult, RewriteError> {
        let tokens = tokenize(query)?;
        let comments: Vec<String> = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Comment)
            .map(|t| t.text(query).trim_start_matches('#').trim().to_owned())
            .collect();
        let settings = parse_settings(&comments);
        let tokens: Vec<Token> = tokens
            .into_iter()
            .filter(|t| t.kind != TokenKind::Comment)
            .collect();
        let prefixes = prefix_declarations(query, &tokens);
        let query_type = query_type(query, &tokens);

        let mut edits = Vec::new();
        for statement in triple_statements(query, &tokens) {
            if let Some(edit) = self.rewrite_statement(query, &prefixes, &statement).await? {
                edits.push(edit);
            }
        }

        let mut rewritten_query = query.to_owned();
        for edit in edits.iter().rev() {
            rewritten_query.replace_range(edit.start..edit.end, &edit.replacement);
        }

        debug!(?comments, "Extracted query comments");
        if !edits.is_empty() {
            debug!(
                query = %truncate(&rewritten_query, LOGGED_QUERY_LENGTH),
                "Rewrote pseudo-predicates"
            );
        }

        Ok(RewriteResult {
            rewritten_query,
            comments,
            settings,
            query_type,
        })
    }

    /// Rewrites `query`. A query that cannot be tokenized is returned unmodified, without
    /// comments or settings. Failing searches are still reported.
    pub async fn rewrite(&self, query: &str) -> Result<RewriteResult, RewriteError> {
        match self.try_rewrite(query).await {
            Err(RewriteError::Syntax { position, message }) => {
                debug!(
                    position,
                    error = %message,
                    "Query is not rewritable, using it unmodified"
                );
                Ok(RewriteResult::unmodified(query))
            }
            result => result,
        }
    }

    async fn rewrite_statement(
        &self,
        query: &str,
        prefixes: &HashMap<String, String>,
        statement: &Statement,
    ) -> Result<Option<Edit>, RewriteError> {
        let variable = statement.subject.text(query);
        let mut kept = Vec::new();
        let mut values = Vec::new();
        for (verb, object) in &statement.pairs {
            let pseudo = self
                .handler_for(query, prefixes, verb)
                .zip(operand(query, prefixes, object));
            let Some((handler, operand)) = pseudo else {
                kept.push((*verb, *object));
                continue;
            };
            let substitution = handler.resolve(&operand).await?;
            debug!(
                predicate = verb.text(query),
                %operand,
                variable,
                "Resolved pseudo-predicate"
            );
            values.push(values_clause(variable, &substitution));
        }
        if values.is_empty() {
            return Ok(None);
        }

        let mut parts = Vec::with_capacity(values.len() + 1);
        if !kept.is_empty() {
            parts.push(rebuild_statement(query, variable, &kept));
        }
        parts.extend(values);
        Ok(Some(Edit {
            start: statement.start,
            end: statement.end,
            replacement: parts.join(" "),
        }))
    }

    fn handler_for(
        &self,
        query: &str,
        prefixes: &HashMap<String, String>,
        verb: &Token,
    ) -> Option<Arc<dyn PseudoPredicateHandler>> {
        let text = verb.text(query);
        let handler = match verb.kind {
            TokenKind::Iri => self.handlers.get(&text[1..text.len() - 1]),
            TokenKind::PrefixedName => self.handlers.get(text).or_else(|| {
                expand(prefixes, text).and_then(|iri| self.handlers.get(&iri))
            }),
            _ => None,
        };
        handler.map(Arc::clone)
    }
}

struct Edit {
    start: usize,
    end: usize,
    replacement: String,
}

/// A subject with its predicate-object list, as it appears in a group graph pattern.
struct Statement {
    start: usize,
    end: usize,
    subject: Token,
    pairs: Vec<(Token, Token)>,
}

fn parse_settings(comments: &[String]) -> Settings {
    let mut settings = Settings::new();
    for comment in comments {
        let Some(setting) = comment.strip_prefix(SETTING_MARKER) else {
            continue;
        };
        let pieces: Vec<&str> = setting.split(':').map(str::trim).collect();
        match pieces.as_slice() {
            [key] => settings.insert_key(*key),
            [key, value @ ..] => settings.push(*key, value.join(":")),
            [] => {}
        }
    }
    settings
}

fn prefix_declarations(query: &str, tokens: &[Token]) -> HashMap<String, String> {
    tokens
        .windows(3)
        .filter_map(|window| {
            let [keyword, prefix, iri] = window else {
                return None;
            };
            let is_declaration = keyword.kind == TokenKind::Word
                && keyword.text(query).eq_ignore_ascii_case("prefix")
                && prefix.kind == TokenKind::PrefixedName
                && prefix.text(query).ends_with(':')
                && iri.kind == TokenKind::Iri;
            is_declaration.then(|| {
                let prefix = prefix.text(query);
                let iri = iri.text(query);
                (
                    prefix[..prefix.len() - 1].to_owned(),
                    iri[1..iri.len() - 1].to_owned(),
                )
            })
        })
        .collect()
}

fn query_type(query: &str, tokens: &[Token]) -> QueryType {
    let mut i = 0;
    while let Some(token) = tokens.get(i) {
        if token.kind != TokenKind::Word {
            return QueryType::Unknown;
        }
        let keyword = token.text(query);
        if keyword.eq_ignore_ascii_case("prefix") {
            i += 3;
        } else if keyword.eq_ignore_ascii_case("base") {
            i += 2;
        } else {
            return QueryType::from_keyword(keyword);
        }
    }
    QueryType::Unknown
}

/// Finds the triple statements of the query whose subject is a variable.
///
/// Statements that use property paths, collections or blank node property lists are skipped as a
/// whole.
fn triple_statements(query: &str, tokens: &[Token]) -> Vec<Statement> {
    let mut statements = Vec::new();
    let (mut braces, mut parens, mut brackets) = (0_usize, 0_usize, 0_usize);
    let mut i = 0;
    while let Some(token) = tokens.get(i) {
        let at_statement_start = token.kind == TokenKind::Var
            && braces > 0
            && parens == 0
            && brackets == 0
            && i > 0
            && matches!(
                tokens[i - 1].kind,
                TokenKind::LBrace | TokenKind::RBrace | TokenKind::Dot | TokenKind::RParen
            );
        if at_statement_start {
            if let Some((statement, next)) = parse_statement(query, tokens, i) {
                statements.push(statement);
                i = next;
                continue;
            }
        }
        match token.kind {
            TokenKind::LBrace => braces += 1,
            TokenKind::RBrace => braces = braces.saturating_sub(1),
            TokenKind::LParen => parens += 1,
            TokenKind::RParen => parens = parens.saturating_sub(1),
            TokenKind::LBracket => brackets += 1,
            TokenKind::RBracket => brackets = brackets.saturating_sub(1),
            _ => {}
        }
        i += 1;
    }
    statements
}

fn parse_statement(query: &str, tokens: &[Token], start: usize) -> Option<(Statement, usize)> {
    let subject = tokens[start];
    let kind_at = |i: usize| tokens.get(i).map(|t| t.kind);
    let mut pairs = Vec::new();
    let mut i = start + 1;
    'verbs: loop {
        let verb = *tokens.get(i)?;
        if !is_verb(query, &verb) {
            return None;
        }
        i += 1;
        loop {
            let object = *tokens.get(i)?;
            if !is_object(query, &object) {
                return None;
            }
            pairs.push((verb, object));
            i += 1;
            if kind_at(i) != Some(TokenKind::Comma) {
                break;
            }
            i += 1;
        }
        if kind_at(i) != Some(TokenKind::Semicolon) {
            break;
        }
        while kind_at(i) == Some(TokenKind::Semicolon) {
            i += 1;
        }
        if matches!(kind_at(i), None | Some(TokenKind::Dot | TokenKind::RBrace)) {
            break 'verbs;
        }
    }
    let mut end = tokens[i - 1].end;
    if kind_at(i) == Some(TokenKind::Dot) {
        end = tokens[i].end;
        i += 1;
    }
    Some((
        Statement {
            start: subject.start,
            end,
            subject,
            pairs,
        },
        i,
    ))
}

fn is_verb(query: &str, token: &Token) -> bool {
    match token.kind {
        TokenKind::Iri | TokenKind::PrefixedName | TokenKind::Var => true,
        TokenKind::Word => token.text(query) == "a",
        _ => false,
    }
}

fn is_object(query: &str, token: &Token) -> bool {
    match token.kind {
        TokenKind::Iri
        | TokenKind::PrefixedName
        | TokenKind::Var
        | TokenKind::BlankNode
        | TokenKind::String
        | TokenKind::Number => true,
        TokenKind::Word => {
            let word = token.text(query);
            word.eq_ignore_ascii_case("true") || word.eq_ignore_ascii_case("false")
        }
        _ => false,
    }
}

fn operand(query: &str, prefixes: &HashMap<String, String>, token: &Token) -> Option<Operand> {
    let text = token.text(query);
    match token.kind {
        TokenKind::String => Some(Operand::Literal(lexical_form(text))),
        TokenKind::Number | TokenKind::Word => Some(Operand::Literal(text.to_owned())),
        TokenKind::Iri => Some(Operand::Iri(text[1..text.len() - 1].to_owned())),
        TokenKind::PrefixedName => Some(Operand::Iri(
            expand(prefixes, text).unwrap_or_else(|| text.to_owned()),
        )),
        _ => None,
    }
}

fn expand(prefixes: &HashMap<String, String>, prefixed_name: &str) -> Option<String> {
    let (prefix, local) = prefixed_name.split_once(':')?;
    prefixes.get(prefix).map(|iri| format!("{iri}{local}"))
}

/// Returns the unescaped content of a string token, dropping its language tag or datatype.
fn lexical_form(token: &str) -> String {
    let Some(quote) = token.chars().next() else {
        return String::new();
    };
    let long: String = [quote; 3].iter().collect();
    let (open, close) = if token.starts_with(&long) {
        (3, token.rfind(&long).unwrap_or(token.len()))
    } else {
        (1, token.rfind(quote).unwrap_or(token.len()))
    };
    let content = token.get(open..close.max(open)).unwrap_or_default();

    let mut value = String::with_capacity(content.len());
    let mut chars = content.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            value.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => value.push('\t'),
            Some('n') => value.push('\n'),
            Some('r') => value.push('\r'),
            Some('b') => value.push('\u{8}'),
            Some('f') => value.push('\u{C}'),
            Some(c @ ('u' | 'U')) => {
                let digits: String = chars.by_ref().take(if c == 'u' { 4 } else { 8 }).collect();
                match u32::from_str_radix(&digits, 16).ok().and_then(char::from_u32) {
                    Some(c) => value.push(c),
                    None => {
                        value.push('\\');
                        value.push(c);
                        value.push_str(&digits);
                    }
                }
            }
            Some(c) => value.push(c),
            None => value.push('\\'),
        }
    }
    value
}

fn values_clause(variable: &str, substitution: &Substitution) -> String {
    let mut clause = String::new();
    match substitution {
        Substitution::Uris(uris) => {
            let _ = write!(clause, "VALUES {variable} {{");
            for uri in uris.iter().filter(|uri| is_valid_iri(uri)) {
                let _ = write!(clause, " <{uri}>");
            }
        }
        Substitution::Counts(counts) => {
            let _ = write!(clause, "VALUES ({variable} {variable}Count) {{");
            for (uri, count) in counts.iter().filter(|(uri, _)| is_valid_iri(uri)) {
                let _ = write!(clause, " (<{uri}> {count})");
            }
        }
    }
    clause.push_str(" }");
    clause
}

fn is_valid_iri(iri: &str) -> bool {
    let valid = oxrdf::NamedNode::new(iri).is_ok();
    if !valid {
        debug!(iri, "Dropping invalid IRI returned by a search");
    }
    valid
}

fn rebuild_statement(query: &str, subject: &str, pairs: &[(Token, Token)]) -> String {
    let mut text = subject.to_owned();
    let mut previous_verb = None;
    for (verb, object) in pairs {
        if previous_verb == Some(verb.start) {
            text.push_str(", ");
        } else {
            if previous_verb.is_some() {
                text.push_str(" ;");
            }
            text.push(' ');
            text.push_str(verb.text(query));
            text.push(' ');
        }
        text.push_str(object.text(query));
        previous_verb = Some(verb.start);
    }
    text.push_str(" .");
    text
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}
