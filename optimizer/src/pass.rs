// Pass infrastructure: the FunctionPass trait, the per-run PassContext,
// and the manager that drives a pipeline over a module.

use std::collections::HashMap;
use std::io::Write;

use ir::{Function, Module};

/// A rewrite or diagnostic step that runs on one function at a time.
///
/// `run` returns whether the pass changed the function. A pass must not
/// keep state across invocations; anything a later pipeline step needs
/// goes through the [`PassContext`].
pub trait FunctionPass {
    /// Stable name, also used to look the pass up in a pipeline string.
    fn name(&self) -> &'static str;

    fn run(&mut self, func: &mut Function, cx: &mut PassContext<'_>) -> bool;
}

/// State scoped to one pipeline run over one function.
///
/// A fresh context is created per function, so concurrent managers never
/// observe each other's results. It records which passes changed the
/// function and carries the sink for diagnostic output.
pub struct PassContext<'a> {
    changed: HashMap<&'static str, bool>,
    diag: &'a mut dyn Write,
}

impl<'a> PassContext<'a> {
    pub fn new(diag: &'a mut dyn Write) -> Self {
        Self {
            changed: HashMap::new(),
            diag,
        }
    }

    /// Whether the named pass changed the current function, or `None`
    /// if it has not run in this pipeline.
    pub fn changed(&self, pass: &str) -> Option<bool> {
        self.changed.get(pass).copied()
    }

    pub fn diag(&mut self) -> &mut dyn Write {
        &mut *self.diag
    }

    fn record(&mut self, pass: &'static str, changed: bool) {
        self.changed.insert(pass, changed);
    }
}

/// Runs a fixed sequence of passes over functions.
#[derive(Default)]
pub struct FunctionPassManager {
    passes: Vec<Box<dyn FunctionPass>>,
}

impl std::fmt::Debug for FunctionPassManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionPassManager")
            .field(
                "passes",
                &self.passes.iter().map(|p| p.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl FunctionPassManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_pass(&mut self, pass: impl FunctionPass + 'static) {
        self.passes.push(Box::new(pass));
    }

    pub fn len(&self) -> usize {
        self.passes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    /// Run every pass, in order, over `func` with a fresh context.
    /// Returns whether any pass changed the function.
    pub fn run_on_function(&mut self, func: &mut Function, diag: &mut dyn Write) -> bool {
        let mut cx = PassContext::new(diag);
        let mut changed = false;
        for pass in &mut self.passes {
            let pass_changed = pass.run(func, &mut cx);
            cx.record(pass.name(), pass_changed);
            changed |= pass_changed;
        }
        changed
    }

    /// Run the pipeline over every function in the module, each with its
    /// own context.
    pub fn run_on_module(&mut self, module: &mut Module, diag: &mut dyn Write) -> bool {
        let mut changed = false;
        for func in &mut module.functions {
            changed |= self.run_on_function(func, &mut *diag);
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ir::{FunctionBuilder, Operand, Ty};

    struct FlagProbe;

    impl FunctionPass for FlagProbe {
        fn name(&self) -> &'static str {
            "flag-probe"
        }

        fn run(&mut self, _func: &mut Function, cx: &mut PassContext<'_>) -> bool {
            assert_eq!(cx.changed("renumber"), Some(true));
            assert_eq!(cx.changed("flag-probe"), None, "own flag set before run");
            false
        }
    }

    struct Renumber;

    impl FunctionPass for Renumber {
        fn name(&self) -> &'static str {
            "renumber"
        }

        fn run(&mut self, func: &mut Function, _cx: &mut PassContext<'_>) -> bool {
            func.new_var();
            true
        }
    }

    fn probe_function(name: &str) -> Function {
        let mut b = FunctionBuilder::new(name, Some(Ty::I32));
        let x = b.param(Ty::I32);
        b.block();
        b.ret(Some(Operand::Var(x)));
        b.finish()
    }

    #[test]
    fn later_passes_see_earlier_results() {
        let mut manager = FunctionPassManager::new();
        manager.add_pass(Renumber);
        manager.add_pass(FlagProbe);

        let mut func = probe_function("probe");
        let mut diag = Vec::new();
        assert!(manager.run_on_function(&mut func, &mut diag));
    }

    #[test]
    fn context_does_not_leak_across_functions() {
        struct ExpectFresh;

        impl FunctionPass for ExpectFresh {
            fn name(&self) -> &'static str {
                "expect-fresh"
            }

            fn run(&mut self, _func: &mut Function, cx: &mut PassContext<'_>) -> bool {
                assert_eq!(cx.changed("expect-fresh"), None, "stale context reused");
                true
            }
        }

        let mut module = ir::Module {
            functions: vec![probe_function("first"), probe_function("second")],
        };
        let mut manager = FunctionPassManager::new();
        manager.add_pass(ExpectFresh);
        let mut diag = Vec::new();
        // the second function would trip the assert if the context leaked
        assert!(manager.run_on_module(&mut module, &mut diag));
    }

    #[test]
    fn unknown_pass_reads_as_not_run() {
        let mut diag = Vec::new();
        let cx = PassContext::new(&mut diag);
        assert_eq!(cx.changed("never-registered"), None);
    }
}
