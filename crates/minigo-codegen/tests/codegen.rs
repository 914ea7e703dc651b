//! End-to-end generation tests: parse, analyze and generate the sample
//! programs in `testdata/`, then check the emitted pseudo-assembly.

use minigo_analysis::{analyze_package, Program};
use minigo_codegen::{generate, CodegenOptions, ErrorKind};
use minigo_common::CompilationContext;
use minigo_syntax::parse_source;

fn compile_with(options: CodegenOptions, name: &str, source: &str) -> String {
    let mut ctx = CompilationContext::new();
    let mut program = Program::new(&mut ctx.interner);
    let file = parse_source(&mut ctx, name, source).unwrap();
    let main = ctx.interner.intern("main");
    analyze_package(&mut program, &ctx.interner, main, "main", vec![file]).unwrap();
    generate(&program, &mut ctx, options).unwrap()
}

fn compile(name: &str, source: &str) -> String {
    compile_with(CodegenOptions::default(), name, source)
}

/// Line index of the first line containing `needle`.
fn line_of(asm: &str, needle: &str) -> usize {
    asm.lines()
        .position(|l| l.contains(needle))
        .unwrap_or_else(|| panic!("`{}` not found in:\n{}", needle, asm))
}

/// The `.S<n>` label holding `text`.
fn string_label(asm: &str, text: &str) -> String {
    let lines: Vec<&str> = asm.lines().collect();
    let at = lines
        .iter()
        .position(|l| l.trim() == format!(".string \"{}\"", text))
        .unwrap_or_else(|| panic!("no string {:?}", text));
    lines[at - 1].trim_end_matches(':').to_owned()
}

/// Lines of the function labelled `symbol`, up to its epilogue.
fn function<'a>(asm: &'a str, symbol: &str) -> Vec<&'a str> {
    asm.lines()
        .skip_while(|l| *l != format!("{}:", symbol))
        .take_while(|l| !l.contains("FUNC_EPILOGUE"))
        .collect()
}

#[test]
fn test_hello() {
    let asm = compile("hello.go", include_str!("../../../testdata/hello.go"));
    assert!(asm.contains("main.main:"));
    let hello = string_label(&asm, "hello");
    assert!(asm.contains(&format!("LOAD_STRING_LITERAL {} 5", hello)));
    assert!(asm.contains("FUNCALL iruntime.printstring"));
    assert!(asm.contains("FUNCALL iruntime.printint"));
    // bools print as words
    string_label(&asm, "true");
    string_label(&asm, "false");

    // The entry calls main.main after the prologue.
    let entry = function(&asm, "main");
    assert_eq!(entry[1].trim(), "FUNC_PROLOGUE");
    assert!(entry.iter().any(|l| l.trim() == "FUNCALL main.main"));
}

#[test]
fn test_data_section_comes_first() {
    let asm = compile("hello.go", include_str!("../../../testdata/hello.go"));
    assert!(line_of(&asm, ".string \"hello\"") < line_of(&asm, "main.main:"));
}

#[test]
fn test_stack_alloc_is_patched() {
    let asm = compile("structs.go", include_str!("../../../testdata/structs.go"));
    let main = function(&asm, "main.main");
    let alloc = main
        .iter()
        .find(|l| l.contains("STACK_ALLOC"))
        .expect("STACK_ALLOC");
    let size: u32 = alloc.trim().trim_start_matches("STACK_ALLOC ").parse().unwrap();
    assert!(size >= 64, "frame of {} bytes is too small", size);
    assert_eq!(size % 16, 0);
}

#[test]
fn test_struct_copy_is_size_exact() {
    let asm = compile("structs.go", include_str!("../../../testdata/structs.go"));
    // [3]byte copies as one word-half and one byte.
    assert!(asm.contains("movw 0(%rsi), %dx"));
    assert!(asm.contains("movb 2(%rsi), %dl"));
    // Point is 32 bytes: four quad moves, the last at offset 24.
    assert!(asm.contains("movq 24(%rsi), %rdx"));
    assert!(!asm.contains("movq 32(%rsi)"));
}

#[test]
fn test_methods_are_called_directly() {
    let asm = compile("structs.go", include_str!("../../../testdata/structs.go"));
    assert!(asm.contains("main.Point$Move:"));
    assert!(asm.contains("main.Point$Sum:"));
    let main = function(&asm, "main.main");
    assert!(main.iter().any(|l| l.trim() == "FUNCALL main.Point$Move"));
    assert!(main.iter().any(|l| l.trim() == "FUNCALL main.Point$Sum"));
    // A value receiver is copied into the callee's frame from its address.
    let sum = function(&asm, "main.Point$Sum");
    assert!(sum.iter().any(|l| l.trim() == "LOAD_ARG 0"));
    assert!(!sum.iter().any(|l| l.contains("STORE_ARG_TO_LOCAL 0")));
}

#[test]
fn test_interface_dispatch() {
    let asm = compile("iface.go", include_str!("../../../testdata/iface.go"));
    assert!(asm.contains("LOAD_TYPE_DESCRIPTOR .T"));
    assert!(asm.contains("LOAD_METHOD_ADDR .MN_Area"));
    assert!(asm.contains("CALL_INDIRECT"));
    assert!(asm.contains(".MN_Area:"));

    // *Rect and Square both get a thunk and a method table entry.
    let rect_thunk = asm
        .lines()
        .find(|l| l.starts_with("main.Rect$Area$iface"))
        .expect("thunk for *Rect");
    let square_thunk = asm
        .lines()
        .find(|l| l.starts_with("main.Square$Area$iface"))
        .expect("thunk for Square");
    let rect_sym = rect_thunk.trim_end_matches(':');
    assert!(asm.contains(&format!(".quad {}", rect_sym)));
    assert!(asm.contains(&format!(".quad {}", square_thunk.trim_end_matches(':'))));

    // The thunk for a pointer type loads the stored pointer.
    let body = function(&asm, rect_sym);
    assert!(body.iter().any(|l| l.trim() == "LOAD_8_BY_DEREF"));
    assert!(body.iter().any(|l| l.trim() == "FUNCALL main.Rect$Area"));
}

#[test]
fn test_type_switch_and_assertion() {
    let asm = compile("iface.go", include_str!("../../../testdata/iface.go"));
    let describe = function(&asm, "main.describe");
    let matches = describe.iter().filter(|l| l.contains("TYPE_ID_EQUALS")).count();
    assert_eq!(matches, 2);
    let main = function(&asm, "main.main");
    assert!(main.iter().any(|l| l.contains("TYPE_ID_EQUALS")));
    // The comma-ok form never panics.
    assert!(!main.iter().any(|l| l.contains("FUNCALL iruntime.panic")));
}

#[test]
fn test_maps() {
    let asm = compile("maps.go", include_str!("../../../testdata/maps.go"));
    let main = function(&asm, "main.main");
    assert!(main.iter().any(|l| l.trim() == "FUNCALL iruntime.strcmp"));
    assert!(main.iter().any(|l| l.trim() == "FUNCALL iruntime.memcopy"));
    assert!(main.iter().any(|l| l.trim() == "FUNCALL iruntime.malloc"));
    string_label(&asm, "assignment to entry in nil map");
    string_label(&asm, "ann");
    string_label(&asm, "bob");
}

#[test]
fn test_defers_run_last_first() {
    let asm = compile("defer.go", include_str!("../../../testdata/defer.go"));
    let work = function(&asm, "main.work");
    let first = format!("LOAD_STRING_LITERAL {} 5", string_label(&asm, "first"));
    let second = format!("LOAD_STRING_LITERAL {} 6", string_label(&asm, "second"));
    let at = |needle: &str| work.iter().position(|l| l.contains(needle)).unwrap();
    assert!(at(&second) < at(&first));

    // Results are saved around the deferred calls.
    let saved = work.iter().filter(|l| l.contains("PUSH_RET")).count();
    let restored = work.iter().filter(|l| l.contains("POP_TO_RET")).count();
    assert_eq!(saved, 4);
    assert!(restored >= 8);
}

#[test]
fn test_multi_value_call_assignment() {
    let asm = compile("defer.go", include_str!("../../../testdata/defer.go"));
    let main = function(&asm, "main.main");
    let call = main.iter().position(|l| l.trim() == "FUNCALL main.work").unwrap();
    let pushes: Vec<_> = main[call + 1..call + 5].iter().map(|l| l.trim()).collect();
    // The string result (slots 1..3) goes first so the int pops first.
    assert_eq!(pushes, vec!["PUSH_RET 1", "PUSH_RET 2", "PUSH_RET 3", "PUSH_RET 0"]);
}

#[test]
fn test_globals_initialize_in_dependency_order() {
    let asm = compile("loops.go", include_str!("../../../testdata/loops.go"));
    let names = line_of(&asm, "STORE_24_TO_GLOBAL main.names 0");
    let count = line_of(&asm, "STORE_8_TO_GLOBAL main.count 0");
    let total = line_of(&asm, "STORE_8_TO_GLOBAL main.total 0");
    assert!(names < count && count < total);
    assert!(asm.contains("main.names:\n  .zero 24"));
}

#[test]
fn test_loops_and_switches() {
    let asm = compile("loops.go", include_str!("../../../testdata/loops.go"));
    let main = function(&asm, "main.main");
    assert!(main.iter().any(|l| l.trim() == "FUNCALL iruntime.append8"));
    assert!(main.iter().any(|l| l.trim() == "CMP_FROM_STACK setl"));
    let kind = function(&asm, "main.kind");
    let compares = kind.iter().filter(|l| l.trim() == "FUNCALL iruntime.strcmp").count();
    assert_eq!(compares, 3);
    let sum = function(&asm, "main.sum");
    let jumps = sum.iter().filter(|l| l.trim_start().starts_with("jmp")).count();
    assert!(jumps >= 3);
}

#[test]
fn test_nesting_shows_in_indentation() {
    let asm = compile("loops.go", include_str!("../../../testdata/loops.go"));
    let sum = function(&asm, "main.sum");
    let indent = |comment: &str| {
        let line = sum
            .iter()
            .find(|l| l.trim() == comment)
            .unwrap_or_else(|| panic!("no `{}` in:\n{}", comment, sum.join("\n")));
        line.len() - line.trim_start().len()
    };
    assert_eq!(indent("FUNC_PROLOGUE"), 2);
    assert_eq!(indent("# short var decl"), 4);
    assert_eq!(indent("# for range"), 4);
    assert_eq!(indent("# if"), 6);
    assert_eq!(indent("# continue"), 8);
    assert_eq!(indent("# return"), 4);
}

#[test]
fn test_compound_assignment_evaluates_target_once() {
    let asm = compile(
        "update.go",
        "package main\n\
         var calls int\n\
         func next() int { calls++; return calls - 1 }\n\
         func main() {\n\
         xs := []int{1, 2, 3}\n\
         xs[next()] += 5\n\
         xs[next()]++\n\
         println(xs[0], xs[1], calls)\n\
         }\n",
    );
    let main = function(&asm, "main.main");
    let calls = main.iter().filter(|l| l.trim() == "FUNCALL main.next").count();
    assert_eq!(calls, 2);
    // Each update stores through the one address it computed.
    let reused = main.iter().filter(|l| l.trim() == "pushq %rdx").count();
    assert_eq!(reused, 2);
    assert!(main.iter().any(|l| l.trim() == "# op assignment"));
    assert!(main.iter().any(|l| l.trim() == "# call main.next"));
}

#[test]
fn test_positions_are_emitted_on_request() {
    let options = CodegenOptions { emit_position: true };
    let asm = compile_with(options, "hello.go", include_str!("../../../testdata/hello.go"));
    assert!(asm.contains("/*hello.go:4:"));
    let plain = compile("hello.go", include_str!("../../../testdata/hello.go"));
    assert!(!plain.contains("/*"));
}

#[test]
fn test_packages_are_generated_in_order() {
    let mut ctx = CompilationContext::new();
    let mut program = Program::new(&mut ctx.interner);
    let lib = parse_source(
        &mut ctx,
        "lib/lib.go",
        "package lib\n\
         var Base = 10\n\
         func Add(x int) int { return x + Base }\n\
         func init() { Base = Base + 1 }\n",
    )
    .unwrap();
    let lib_name = ctx.interner.intern("lib");
    analyze_package(&mut program, &ctx.interner, lib_name, "lib", vec![lib]).unwrap();
    let main = parse_source(
        &mut ctx,
        "main.go",
        "package main\nimport \"lib\"\nfunc main() { println(lib.Add(1)) }\n",
    )
    .unwrap();
    let main_name = ctx.interner.intern("main");
    analyze_package(&mut program, &ctx.interner, main_name, "main", vec![main]).unwrap();

    let asm = generate(&program, &mut ctx, CodegenOptions::default()).unwrap();
    assert!(line_of(&asm, "lib.Add:") < line_of(&asm, "main.main:"));
    let entry = function(&asm, "main");
    let init = entry.iter().position(|l| l.trim() == "FUNCALL lib.init").unwrap();
    let base = entry.iter().position(|l| l.contains("STORE_8_TO_GLOBAL lib.Base 0")).unwrap();
    let run = entry.iter().position(|l| l.trim() == "FUNCALL main.main").unwrap();
    assert!(base < init && init < run);
}

#[test]
fn test_missing_main() {
    let mut ctx = CompilationContext::new();
    let mut program = Program::new(&mut ctx.interner);
    let file = parse_source(&mut ctx, "main.go", "package main\nfunc helper() {}\n").unwrap();
    let main = ctx.interner.intern("main");
    analyze_package(&mut program, &ctx.interner, main, "main", vec![file]).unwrap();
    let err = generate(&program, &mut ctx, CodegenOptions::default()).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::MissingMain));
    assert_eq!(err.into_diagnostic().code, Some(3005));
}
