// Textual front end for the IR.
//
// The accepted form is exactly what the IR types print:
//
//   ; scale by eight
//   func @scale(%0: i32) -> i32 {
//   bb0:
//     %1 = mul i32 %0, 8
//     ret %1
//   }
//
// Parsing is split the usual way: lexer.rs turns bytes into tokens with
// line numbers, parser.rs builds the IR plus a per-element line table, and
// the structural verifier runs on the result before it is handed out, its
// rejections mapped back to source lines through that table.

mod lexer;
mod parser;

pub use lexer::{Token, lex};

use std::collections::HashSet;

use ir::{Function, Module};

/// Parse and verify a whole module. Every rejection, the verifier's
/// included, comes back as `line N: ...`.
pub fn parse_module(source: &str) -> Result<Module, String> {
    let tokens = lexer::lex(source)?;
    let (module, lines) = parser::parse(&tokens)?;

    let mut names: HashSet<&str> = HashSet::new();
    for (func, at) in module.functions.iter().zip(&lines) {
        if !names.insert(&func.name) {
            return Err(format!(
                "line {}: duplicate function '@{}'",
                at.header, func.name
            ));
        }
        ir::verify_located(func)
            .map_err(|(site, message)| format!("line {}: {message}", at.line_of(site)))?;
    }
    Ok(module)
}

/// Parse a source that holds exactly one function.
pub fn parse_function(source: &str) -> Result<Function, String> {
    let mut module = parse_module(source)?;
    if module.functions.len() != 1 {
        return Err(format!(
            "expected exactly one function, found {}",
            module.functions.len()
        ));
    }
    Ok(module.functions.remove(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROUND_TRIP: &str = "\
func @scale(%0: i32) -> i32 {
bb0:
  %1 = mul i32 %0, 8
  %2 = add i32 %1, %0
  ret %2
}

func @emit(%0: i8) {
bb0:
  call @scale(%0)
  ret
}
";

    #[test]
    fn printing_and_reparsing_is_stable() {
        let module = parse_module(ROUND_TRIP).unwrap();
        let printed = module.to_string();
        let reparsed = parse_module(&printed).unwrap();
        assert_eq!(module, reparsed);
        assert_eq!(printed, reparsed.to_string());
    }

    #[test]
    fn printed_form_matches_the_input_layout() {
        let module = parse_module(ROUND_TRIP).unwrap();
        assert_eq!(module.to_string(), ROUND_TRIP);
    }

    #[test]
    fn parse_function_wants_exactly_one() {
        let func = parse_function("func @id(%0: i64) -> i64 {\nbb0:\n  ret %0\n}").unwrap();
        assert_eq!(func.name, "id");

        assert!(parse_function(ROUND_TRIP).unwrap_err().contains("exactly one"));
    }

    #[test]
    fn verification_failures_point_at_the_offending_line() {
        // parses fine, but %9 is never defined
        let err = parse_module("func @f(%0: i32) -> i32 {\nbb0:\n  ret %9\n}").unwrap_err();
        assert_eq!(err, "line 3: @f: %9 used before definition (bb0)");

        let err = parse_module(
            "func @g(%0: i32) -> i32 {\nbb0:\n  %1 = mul i8 %0, 300\n  ret %1\n}",
        )
        .unwrap_err();
        assert_eq!(err, "line 3: @g: constant 300 does not fit i8 (bb0)");

        let err = parse_module(
            "func @h(%0: i32) -> i32 {\nbb0:\n  %1 = copy i32 %0\n  %1 = copy i32 %0\n  ret %1\n}",
        )
        .unwrap_err();
        assert_eq!(err, "line 4: @h: %1 defined more than once (bb0)");

        let err = parse_module("func @j() {\nbb0:\n  br bb7\n}").unwrap_err();
        assert_eq!(err, "line 3: @j: branch to unknown block bb7 (bb0)");

        let err = parse_module(
            "func @a() {\nbb0:\n  ret\n}\nfunc @a() {\nbb0:\n  ret\n}",
        )
        .unwrap_err();
        assert_eq!(err, "line 5: duplicate function '@a'");
    }

    #[test]
    fn comments_and_spacing_are_ignored() {
        let module = parse_module(
            ";; header\nfunc @pad(  %0: i32 ) -> i32 {\nbb0:\n%1 = shl i32 %0,1 ; double\nret %1\n}",
        )
        .unwrap();
        assert_eq!(module.functions[0].blocks[0].instructions.len(), 1);
    }
}
