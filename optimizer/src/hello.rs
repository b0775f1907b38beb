// Smallest possible pass; prints which function it visited.

use std::io::Write;

use ir::Function;

use crate::pass::{FunctionPass, PassContext};

pub struct HelloWorld;

impl FunctionPass for HelloWorld {
    fn name(&self) -> &'static str {
        "hello-world"
    }

    fn run(&mut self, func: &mut Function, cx: &mut PassContext<'_>) -> bool {
        visit(func, cx.diag());
        false
    }
}

fn visit(func: &Function, diag: &mut dyn Write) {
    let _ = writeln!(diag, "Hello from: {}", func.name);
    let _ = writeln!(diag, "  number of arguments: {}", func.params.len());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pass::FunctionPassManager;
    use ir::{FunctionBuilder, Operand, Ty};

    #[test]
    fn prints_name_and_arity_without_touching_the_function() {
        let mut b = FunctionBuilder::new("greet", Some(Ty::I32));
        let x = b.param(Ty::I32);
        let _ = b.param(Ty::I32);
        b.block();
        b.ret(Some(Operand::Var(x)));
        let mut func = b.finish();
        let before = func.to_string();

        let mut manager = FunctionPassManager::new();
        manager.add_pass(HelloWorld);
        let mut diag = Vec::new();
        assert!(!manager.run_on_function(&mut func, &mut diag));

        assert_eq!(
            String::from_utf8(diag).unwrap(),
            "Hello from: greet\n  number of arguments: 2\n"
        );
        assert_eq!(func.to_string(), before);
    }
}
