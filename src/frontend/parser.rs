use crate::frontend::ast;
use crate::frontend::diagnostic::{Diagnostic, SyntaxCategory};
use chumsky::prelude::*;

/*
 * Parses an ILOC block one line at a time.
 *
 * A malformed line produces a single diagnostic and parsing carries on with
 * the next line, so every error in the block is reported in one run.
 */
pub fn parse(source_code: &str) -> Result<Vec<ast::Line>, Vec<Diagnostic>> {
    let parser = line_parser();
    let mut lines = Vec::new();
    let mut diagnostics: Vec<Diagnostic> = Vec::new();

    for (index, text) in source_code.lines().enumerate() {
        let number = index + 1;

        match parser.parse(text).into_result() {
            Ok(Some(statement)) => lines.push(ast::Line { number, statement }),
            Ok(None) => {}
            Err(errors) => {
                for err in &errors {
                    log::trace!("line {}: {}", number, err);
                }
                if diagnostics.last().map_or(true, |d| d.line != number) {
                    diagnostics.push(Diagnostic {
                        line: number,
                        category: SyntaxCategory::of_line(text),
                    });
                }
            }
        }
    }

    log::debug!(
        "parsed {} operation(s), {} malformed line(s)",
        lines.len(),
        diagnostics.len()
    );

    if diagnostics.is_empty() {
        Ok(lines)
    } else {
        Err(diagnostics)
    }
}

fn line_parser<'src>() -> impl Parser<'src, &'src str, Option<ast::Statement>, extra::Err<Rich<'src, char>>> {
    // r12 -> 12
    let register = just('r')
        .ignore_then(text::digits(10).to_slice())
        .try_map(|digits: &str, span| {
            digits
                .parse::<usize>()
                .map_err(|_| Rich::custom(span, "register number out of range"))
        })
        .padded();

    let constant = text::digits(10)
        .to_slice()
        .try_map(|digits: &str, span| {
            digits
                .parse::<i64>()
                .map_err(|_| Rich::custom(span, "constant out of range"))
        })
        .padded();

    let comma = just(',').padded();
    let into = just("=>").padded();

    /* load rA => rB | store rA => rB */
    let memory = choice((
        text::keyword("load").to(ast::MemoryOp::Load),
        text::keyword("store").to(ast::MemoryOp::Store),
    ))
    .padded()
    .then(register.clone())
    .then_ignore(into.clone())
    .then(register.clone())
    .map(|((op, source), target)| ast::Statement::Memory { op, source, target });

    /* loadI c => rB */
    let load_immediate = text::keyword("loadI")
        .padded()
        .ignore_then(constant.clone())
        .then_ignore(into.clone())
        .then(register.clone())
        .map(|(constant, target)| ast::Statement::LoadImmediate { constant, target });

    /* add rA, rB => rC */
    let arithmetic = choice((
        text::keyword("add").to(ast::ArithOp::Add),
        text::keyword("sub").to(ast::ArithOp::Sub),
        text::keyword("mult").to(ast::ArithOp::Mult),
        text::keyword("lshift").to(ast::ArithOp::LShift),
        text::keyword("rshift").to(ast::ArithOp::RShift),
    ))
    .padded()
    .then(register.clone())
    .then_ignore(comma)
    .then(register.clone())
    .then_ignore(into)
    .then(register)
    .map(|(((op, left), right), target)| ast::Statement::Arithmetic {
        op,
        left,
        right,
        target,
    });

    let output = text::keyword("output")
        .padded()
        .ignore_then(constant)
        .map(|constant| ast::Statement::Output { constant });

    let nop = text::keyword("nop").padded().to(ast::Statement::Nop);

    let comment = just("//").then(any().repeated()).ignored();

    choice((memory, load_immediate, arithmetic, output, nop))
        .or_not()
        .padded()
        .then_ignore(comment.or_not())
        .then_ignore(end())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::ast::{ArithOp, MemoryOp, Statement};

    fn statements(source: &str) -> Vec<Statement> {
        parse(source)
            .expect("block should parse")
            .into_iter()
            .map(|line| line.statement)
            .collect()
    }

    #[test]
    fn test_every_statement_shape() {
        let source = "load r1 => r2\n\
                      store r2 => r3\n\
                      loadI 1024 => r4\n\
                      add r1, r2 => r3\n\
                      sub r1, r2 => r3\n\
                      mult r1, r2 => r3\n\
                      lshift r1, r2 => r3\n\
                      rshift r1, r2 => r3\n\
                      output 1024\n\
                      nop\n";

        assert_eq!(
            statements(source),
            vec![
                Statement::Memory { op: MemoryOp::Load, source: 1, target: 2 },
                Statement::Memory { op: MemoryOp::Store, source: 2, target: 3 },
                Statement::LoadImmediate { constant: 1024, target: 4 },
                Statement::Arithmetic { op: ArithOp::Add, left: 1, right: 2, target: 3 },
                Statement::Arithmetic { op: ArithOp::Sub, left: 1, right: 2, target: 3 },
                Statement::Arithmetic { op: ArithOp::Mult, left: 1, right: 2, target: 3 },
                Statement::Arithmetic { op: ArithOp::LShift, left: 1, right: 2, target: 3 },
                Statement::Arithmetic { op: ArithOp::RShift, left: 1, right: 2, target: 3 },
                Statement::Output { constant: 1024 },
                Statement::Nop,
            ]
        );
    }

    #[test]
    fn test_comments_blank_lines_and_spacing() {
        let source = "// header comment\n\
                      \n\
                      \tloadI 4=>r1 // trailing\n\
                      add r1,r1=>r2\n\
                      nop";
        let lines = parse(source).unwrap();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].number, 3);
        assert_eq!(lines[1].statement, Statement::Arithmetic { op: ArithOp::Add, left: 1, right: 1, target: 2 });
        // no terminating newline on the last line
        assert_eq!(lines[2].statement, Statement::Nop);
    }

    #[test]
    fn test_one_diagnostic_per_bad_line() {
        let source = "loadI 4 => r1\n\
                      add r1 r1 => r2\n\
                      load r1 r2\n\
                      loadI r1 => r2\n\
                      output r1\n\
                      nop nop\n\
                      r1 => r2\n\
                      store r1 => r2\n";

        let diagnostics = parse(source).unwrap_err();
        let rendered: Vec<String> = diagnostics.iter().map(|d| d.to_string()).collect();

        assert_eq!(
            rendered,
            vec![
                "2: incorrect syntax for arithmetic",
                "3: incorrect syntax for load/store",
                "4: incorrect syntax for loadI",
                "5: incorrect syntax for output",
                "6: incorrect syntax for nop",
                "7: statement must start with an opcode",
            ]
        );
    }

    #[test]
    fn test_keywords_need_a_word_boundary() {
        assert!(parse("loadI4 => r1").is_err());
        assert!(parse("addr1, r2 => r3").is_err());
        assert!(parse("Add r1, r2 => r3").is_err());
    }

    #[test]
    fn test_out_of_range_numbers_are_syntax_errors() {
        let diagnostics = parse("loadI 99999999999999999999 => r1\n").unwrap_err();
        assert_eq!(diagnostics[0].category, SyntaxCategory::LoadImmediate);
    }

    #[test]
    fn test_empty_source() {
        assert_eq!(parse("").unwrap(), vec![]);
        assert_eq!(parse("\n  \n// only comments\n").unwrap(), vec![]);
    }
}
